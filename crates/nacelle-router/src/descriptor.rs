//! Declarative controller and route descriptors.
//!
//! Controllers and their routes are described as plain data: a token for
//! the controller class, a path prefix, the pipeline roles to apply, and
//! one descriptor per route. The router compiles descriptors once at
//! registration into a flat, immutable route table.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use hyper::{Method, StatusCode};
use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};
use crate::guard::Guard;
use crate::interceptor::Interceptor;
use crate::middleware::Middleware;
use crate::param::{HandlerArg, ParamSpec};
use nacelle_di::{Container, Instance, Token};

/// Type-erased route handler: the controller instance plus the extracted
/// arguments, returning a JSON value to serialize.
pub type HandlerFn =
	Arc<dyn Fn(Instance, Vec<HandlerArg>) -> BoxFuture<'static, PipelineResult<Value>> + Send + Sync>;

type ResolveFn<T> =
	Arc<dyn for<'a> Fn(&'a Container) -> BoxFuture<'a, PipelineResult<Arc<T>>> + Send + Sync>;

/// Reference to a pipeline role class, resolved through the container at
/// registration time.
pub struct RoleRef<T: ?Sized> {
	token: Token,
	class_name: &'static str,
	resolve: ResolveFn<T>,
}

impl<T: ?Sized> Clone for RoleRef<T> {
	fn clone(&self) -> Self {
		Self {
			token: self.token.clone(),
			class_name: self.class_name,
			resolve: self.resolve.clone(),
		}
	}
}

impl<T: ?Sized> RoleRef<T> {
	pub fn token(&self) -> &Token {
		&self.token
	}

	/// The role's short class name, for logging and rejection messages.
	pub fn class_name(&self) -> &'static str {
		short(self.class_name)
	}

	pub(crate) async fn resolve(&self, container: &Container) -> PipelineResult<Arc<T>> {
		(self.resolve)(container).await
	}
}

impl RoleRef<dyn Guard> {
	pub fn of<G: Guard + 'static>() -> Self {
		Self {
			token: Token::of::<G>(),
			class_name: std::any::type_name::<G>(),
			resolve: Arc::new(resolve_guard::<G>),
		}
	}
}

fn resolve_guard<G: Guard + 'static>(container: &Container) -> BoxFuture<'_, PipelineResult<Arc<dyn Guard>>> {
	Box::pin(async move {
		let guard = container.resolve::<G>().await?;
		Ok(guard as Arc<dyn Guard>)
	})
}

impl RoleRef<dyn Middleware> {
	pub fn of<M: Middleware + 'static>() -> Self {
		Self {
			token: Token::of::<M>(),
			class_name: std::any::type_name::<M>(),
			resolve: Arc::new(resolve_middleware::<M>),
		}
	}
}

fn resolve_middleware<M: Middleware + 'static>(
	container: &Container,
) -> BoxFuture<'_, PipelineResult<Arc<dyn Middleware>>> {
	Box::pin(async move {
		let middleware = container.resolve::<M>().await?;
		Ok(middleware as Arc<dyn Middleware>)
	})
}

impl RoleRef<dyn Interceptor> {
	pub fn of<I: Interceptor + 'static>() -> Self {
		Self {
			token: Token::of::<I>(),
			class_name: std::any::type_name::<I>(),
			resolve: Arc::new(resolve_interceptor::<I>),
		}
	}
}

fn resolve_interceptor<I: Interceptor + 'static>(
	container: &Container,
) -> BoxFuture<'_, PipelineResult<Arc<dyn Interceptor>>> {
	Box::pin(async move {
		let interceptor = container.resolve::<I>().await?;
		Ok(interceptor as Arc<dyn Interceptor>)
	})
}

/// One route on a controller.
pub struct RouteDescriptor {
	pub(crate) name: &'static str,
	pub(crate) method: Method,
	pub(crate) path: String,
	pub(crate) params: Vec<ParamSpec>,
	pub(crate) guards: Vec<RoleRef<dyn Guard>>,
	pub(crate) middleware: Vec<RoleRef<dyn Middleware>>,
	pub(crate) interceptors: Vec<RoleRef<dyn Interceptor>>,
	pub(crate) status: Option<StatusCode>,
	pub(crate) handler: HandlerFn,
}

impl RouteDescriptor {
	pub fn new(name: &'static str, method: Method, path: impl Into<String>, handler: HandlerFn) -> Self {
		Self {
			name,
			method,
			path: path.into(),
			params: Vec::new(),
			guards: Vec::new(),
			middleware: Vec::new(),
			interceptors: Vec::new(),
			status: None,
			handler,
		}
	}

	pub fn get(name: &'static str, path: impl Into<String>, handler: HandlerFn) -> Self {
		Self::new(name, Method::GET, path, handler)
	}

	pub fn post(name: &'static str, path: impl Into<String>, handler: HandlerFn) -> Self {
		Self::new(name, Method::POST, path, handler)
	}

	pub fn put(name: &'static str, path: impl Into<String>, handler: HandlerFn) -> Self {
		Self::new(name, Method::PUT, path, handler)
	}

	pub fn patch(name: &'static str, path: impl Into<String>, handler: HandlerFn) -> Self {
		Self::new(name, Method::PATCH, path, handler)
	}

	pub fn delete(name: &'static str, path: impl Into<String>, handler: HandlerFn) -> Self {
		Self::new(name, Method::DELETE, path, handler)
	}

	/// Adapts a typed controller method into a [`HandlerFn`], downcasting
	/// the controller instance to `C`.
	pub fn handler_for<C, F, Fut>(f: F) -> HandlerFn
	where
		C: Send + Sync + 'static,
		F: Fn(Arc<C>, Vec<HandlerArg>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = PipelineResult<Value>> + Send + 'static,
	{
		Arc::new(move |instance, args| -> BoxFuture<'static, PipelineResult<Value>> {
			match instance.downcast::<C>() {
				Ok(controller) => Box::pin(f(controller, args)),
				Err(_) => Box::pin(async {
					Err(PipelineError::Handler("controller instance type mismatch".to_string()))
				}),
			}
		})
	}

	/// Declares the next handler parameter. Order matters: parameters are
	/// extracted positionally into the handler's argument list.
	pub fn param(mut self, spec: ParamSpec) -> Self {
		self.params.push(spec);
		self
	}

	pub fn guard<G: Guard + 'static>(mut self) -> Self {
		self.guards.push(RoleRef::<dyn Guard>::of::<G>());
		self
	}

	pub fn middleware<M: Middleware + 'static>(mut self) -> Self {
		self.middleware.push(RoleRef::<dyn Middleware>::of::<M>());
		self
	}

	pub fn interceptor<I: Interceptor + 'static>(mut self) -> Self {
		self.interceptors.push(RoleRef::<dyn Interceptor>::of::<I>());
		self
	}

	/// Overrides the success status. Defaults are 201 for POST routes and
	/// 200 otherwise.
	pub fn status(mut self, status: StatusCode) -> Self {
		self.status = Some(status);
		self
	}
}

/// A controller: a resolvable class, a path prefix, class-level roles
/// applied to every route, and the routes themselves.
pub struct ControllerDescriptor {
	pub(crate) name: &'static str,
	pub(crate) prefix: String,
	pub(crate) token: Token,
	pub(crate) guards: Vec<RoleRef<dyn Guard>>,
	pub(crate) middleware: Vec<RoleRef<dyn Middleware>>,
	pub(crate) interceptors: Vec<RoleRef<dyn Interceptor>>,
	pub(crate) routes: Vec<RouteDescriptor>,
}

impl ControllerDescriptor {
	pub fn new<C: Send + Sync + 'static>(prefix: impl Into<String>) -> Self {
		Self {
			name: short(std::any::type_name::<C>()),
			prefix: prefix.into(),
			token: Token::of::<C>(),
			guards: Vec::new(),
			middleware: Vec::new(),
			interceptors: Vec::new(),
			routes: Vec::new(),
		}
	}

	/// Class-level roles run before route-level ones of the same kind.
	pub fn guard<G: Guard + 'static>(mut self) -> Self {
		self.guards.push(RoleRef::<dyn Guard>::of::<G>());
		self
	}

	pub fn middleware<M: Middleware + 'static>(mut self) -> Self {
		self.middleware.push(RoleRef::<dyn Middleware>::of::<M>());
		self
	}

	pub fn interceptor<I: Interceptor + 'static>(mut self) -> Self {
		self.interceptors.push(RoleRef::<dyn Interceptor>::of::<I>());
		self
	}

	pub fn route(mut self, route: RouteDescriptor) -> Self {
		self.routes.push(route);
		self
	}
}

fn short(name: &'static str) -> &'static str {
	name.rsplit("::").next().unwrap_or(name)
}
