use std::sync::{Arc, Mutex, PoisonError};

use hyper::Method;
use nacelle_di::RequestScope;
use nacelle_http::{Request, Response};

/// Shared write-once-ish slot for the response under construction.
///
/// Middleware and handlers may write a response directly instead of
/// returning a value; the pipeline prefers whatever was stored here over
/// the serialized handler result.
#[derive(Clone, Default)]
pub struct ResponseHandle {
	slot: Arc<Mutex<Option<Response>>>,
}

impl ResponseHandle {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, response: Response) {
		let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
		*slot = Some(response);
	}

	pub fn take(&self) -> Option<Response> {
		let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
		slot.take()
	}

	pub fn is_set(&self) -> bool {
		let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
		slot.is_some()
	}
}

/// Per-request pipeline state: the matched request, the response slot, and
/// the request-scoped dependency cache.
pub struct RequestState {
	pub request: Request,
	pub response: ResponseHandle,
	pub scope: RequestScope,
}

impl RequestState {
	pub fn new(request: Request) -> Self {
		Self {
			request,
			response: ResponseHandle::new(),
			scope: RequestScope::new(),
		}
	}
}

/// Static facts about a compiled route, exposed to guards and interceptors.
#[derive(Clone, Debug)]
pub struct RouteInfo {
	pub controller: String,
	pub handler: String,
	pub method: Method,
	pub path: String,
}

/// What guards and interceptors see: the request state plus which
/// controller and handler the request resolved to.
pub struct ExecutionContext {
	state: Arc<RequestState>,
	route: Arc<RouteInfo>,
}

impl ExecutionContext {
	pub fn new(state: Arc<RequestState>, route: Arc<RouteInfo>) -> Self {
		Self { state, route }
	}

	pub fn request(&self) -> &Request {
		&self.state.request
	}

	pub fn response(&self) -> &ResponseHandle {
		&self.state.response
	}

	pub fn scope(&self) -> &RequestScope {
		&self.state.scope
	}

	pub fn controller(&self) -> &str {
		&self.route.controller
	}

	pub fn handler(&self) -> &str {
		&self.route.handler
	}

	pub fn route(&self) -> &RouteInfo {
		&self.route
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn response_handle_clones_share_the_slot() {
		let handle = ResponseHandle::new();
		let clone = handle.clone();

		clone.set(Response::ok());

		assert!(handle.is_set());
		assert!(handle.take().is_some());
		assert!(!clone.is_set());
	}
}
