use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use hyper::{Method, StatusCode};
use tracing::{debug, warn};

use crate::context::{ExecutionContext, RequestState, RouteInfo};
use crate::descriptor::{ControllerDescriptor, HandlerFn, RoleRef};
use crate::error::{PipelineError, PipelineResult};
use crate::guard::Guard;
use crate::interceptor::{self, CallHandler, HandlerInvoker, Interceptor};
use crate::middleware::{self, Middleware};
use crate::param::{self, ExtractorFn};
use crate::pattern::PathPattern;
use nacelle_di::{Container, Instance, Scope};
use nacelle_http::{Handler, Request, Response};

struct GuardSlot {
	guard: Arc<dyn Guard>,
	name: &'static str,
}

/// A route after compilation: pattern parsed, controller and roles
/// resolved, parameter extractors built, default status applied.
/// Immutable once built.
struct CompiledRoute {
	method: Method,
	pattern: PathPattern,
	info: Arc<RouteInfo>,
	controller: Instance,
	extractors: Vec<ExtractorFn>,
	guards: Vec<GuardSlot>,
	middleware: Vec<Arc<dyn Middleware>>,
	interceptors: Vec<Arc<dyn Interceptor>>,
	status: StatusCode,
	handler: HandlerFn,
	needs_context: bool,
}

/// Compiles controller descriptors into a route table and executes the
/// pipeline for incoming requests.
///
/// For each request the stages run in a fixed order: guards, then
/// middleware, then parameter extraction and validation, then the
/// interceptor onion around the handler. Controller and role instances
/// are resolved once at registration, so per-request work is limited to
/// matching and execution.
pub struct Router {
	container: Arc<Container>,
	routes: RwLock<Vec<Arc<CompiledRoute>>>,
}

impl Router {
	pub fn new(container: Arc<Container>) -> Self {
		Self {
			container,
			routes: RwLock::new(Vec::new()),
		}
	}

	pub fn container(&self) -> &Arc<Container> {
		&self.container
	}

	/// Compiles and registers every route of a controller.
	///
	/// The controller instance and all guard, middleware, and interceptor
	/// instances are resolved here, once. Role classes must not be
	/// request-scoped.
	pub async fn register(&self, descriptor: ControllerDescriptor) -> PipelineResult<()> {
		let ControllerDescriptor {
			name,
			prefix,
			token,
			guards,
			middleware,
			interceptors,
			routes,
		} = descriptor;

		let controller = self.container.resolve_token(&token).await?;

		let mut compiled = Vec::with_capacity(routes.len());
		for route in routes {
			let path = join_paths(&prefix, &route.path);

			let mut guard_slots = Vec::new();
			for role in guards.iter().chain(route.guards.iter()) {
				guard_slots.push(GuardSlot {
					guard: self.resolve_role(role).await?,
					name: role.class_name(),
				});
			}
			let mut middleware_chain = Vec::new();
			for role in middleware.iter().chain(route.middleware.iter()) {
				middleware_chain.push(self.resolve_role(role).await?);
			}
			let mut interceptor_chain = Vec::new();
			for role in interceptors.iter().chain(route.interceptors.iter()) {
				interceptor_chain.push(self.resolve_role(role).await?);
			}

			let status = route.status.unwrap_or(if route.method == Method::POST {
				StatusCode::CREATED
			} else {
				StatusCode::OK
			});
			let needs_context = !guard_slots.is_empty()
				|| !interceptor_chain.is_empty()
				|| param::wants_context(&route.params);

			debug!(controller = name, handler = route.name, method = %route.method, path = %path, "registered route");

			compiled.push(Arc::new(CompiledRoute {
				method: route.method.clone(),
				pattern: PathPattern::parse(&path),
				info: Arc::new(RouteInfo {
					controller: name.to_string(),
					handler: route.name.to_string(),
					method: route.method,
					path,
				}),
				controller: controller.clone(),
				extractors: route.params.iter().map(param::compile).collect(),
				guards: guard_slots,
				middleware: middleware_chain,
				interceptors: interceptor_chain,
				status,
				handler: route.handler,
				needs_context,
			}));
		}

		let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
		routes.extend(compiled);
		Ok(())
	}

	/// Role instances are shared across all requests of a route, so a
	/// request-scoped role class is a registration error.
	async fn resolve_role<T: ?Sized>(&self, role: &RoleRef<T>) -> PipelineResult<Arc<T>> {
		if self.container.scope_of(role.token()) == Some(Scope::Request) {
			return Err(PipelineError::RequestScopedRole {
				class: role.class_name().to_string(),
			});
		}
		role.resolve(&self.container).await
	}

	/// The static facts of every registered route, in registration order.
	pub fn routes(&self) -> Vec<Arc<RouteInfo>> {
		let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
		routes.iter().map(|route| route.info.clone()).collect()
	}

	/// Matches and executes a request, mapping pipeline errors to their
	/// HTTP status.
	pub async fn dispatch(&self, mut request: Request) -> Response {
		let matched = {
			let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
			routes.iter().find_map(|route| {
				if route.method != request.method {
					return None;
				}
				route.pattern.matches(request.path()).map(|params| (route.clone(), params))
			})
		};
		let Some((route, params)) = matched else {
			return error_response(&PipelineError::NotFound);
		};
		for (key, value) in params {
			request.set_path_param(key, value);
		}

		match self.execute(&route, request).await {
			Ok(response) => response,
			Err(err) => {
				warn!(controller = %route.info.controller, handler = %route.info.handler, error = %err, "pipeline error");
				error_response(&err)
			}
		}
	}

	async fn execute(&self, route: &Arc<CompiledRoute>, request: Request) -> PipelineResult<Response> {
		let state = Arc::new(RequestState::new(request));
		let context = route
			.needs_context
			.then(|| Arc::new(ExecutionContext::new(state.clone(), route.info.clone())));

		if !route.guards.is_empty() {
			let Some(context) = context.as_ref() else {
				return Err(PipelineError::Handler("execution context unavailable".to_string()));
			};
			for slot in &route.guards {
				if !slot.guard.can_activate(context).await? {
					return Err(PipelineError::GuardRejected {
						guard: slot.name.to_string(),
					});
				}
			}
		}

		if !route.middleware.is_empty() {
			let completed = middleware::run_chain(&route.middleware, &state).await?;
			if !completed {
				// Silent halt: send whatever the middleware left in the
				// response slot.
				return Ok(state.response.take().unwrap_or_else(Response::no_content));
			}
		}

		let mut args = Vec::with_capacity(route.extractors.len());
		for extractor in &route.extractors {
			args.push(extractor(&state, context.as_ref())?);
		}

		let invoker: Arc<dyn CallHandler> = Arc::new(HandlerInvoker {
			handler: route.handler.clone(),
			instance: route.controller.clone(),
			args,
		});
		let chain = match (route.interceptors.as_slice(), context.as_ref()) {
			([], _) | (_, None) => invoker,
			(interceptors, Some(context)) => interceptor::wrap(interceptors, context, invoker),
		};
		let result = chain.handle().await?;

		// A response written directly to the slot wins over the
		// serialized handler result.
		if let Some(response) = state.response.take() {
			return Ok(response);
		}
		let response = Response::json(&result).map_err(|err| PipelineError::Handler(err.to_string()))?;
		Ok(response.with_status(route.status))
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, request: Request) -> nacelle_http::Result<Response> {
		Ok(self.dispatch(request).await)
	}
}

fn error_response(err: &PipelineError) -> Response {
	let status = err.status();
	Response::json(&serde_json::json!({ "error": err.to_string() }))
		.map(|response| response.with_status(status))
		.unwrap_or_else(|_| Response::new(status))
}

fn join_paths(prefix: &str, path: &str) -> String {
	let mut joined = String::new();
	for segment in prefix.split('/').chain(path.split('/')).filter(|s| !s.is_empty()) {
		joined.push('/');
		joined.push_str(segment);
	}
	if joined.is_empty() {
		joined.push('/');
	}
	joined
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/users", "/:id", "/users/:id")]
	#[case("users", ":id", "/users/:id")]
	#[case("", "/health", "/health")]
	#[case("/users/", "/", "/users")]
	#[case("", "", "/")]
	fn join_paths_normalizes_slashes(#[case] prefix: &str, #[case] path: &str, #[case] expected: &str) {
		assert_eq!(join_paths(prefix, path), expected);
	}
}
