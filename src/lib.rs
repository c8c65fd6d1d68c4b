//! # Nacelle
//!
//! A modular request-serving framework: a scoped dependency injection
//! container plus a compiled guard/middleware/interceptor execution
//! pipeline.
//!
//! Nacelle is split into focused crates, re-exported here:
//!
//! - [`di`] holds the container: token-keyed providers, singleton /
//!   transient / request scopes, abstract bindings with primary and named
//!   implementations, and per-task cycle detection.
//! - [`http`] holds the request/response vocabulary shared by the pipeline.
//! - [`router`] compiles controller descriptors into a route table and
//!   runs the fixed-order pipeline that executes them.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use nacelle::prelude::*;
//! use serde_json::json;
//!
//! struct UsersController;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), PipelineError> {
//! let container = Container::new();
//! container.register_class(ClassDescriptor::new::<UsersController, _>(
//! 	Scope::Singleton,
//! 	vec![],
//! 	|_| Ok(UsersController),
//! ));
//!
//! let router = Router::new(Arc::new(container));
//! router
//! 	.register(
//! 		ControllerDescriptor::new::<UsersController>("/users").route(
//! 			RouteDescriptor::get(
//! 				"find",
//! 				"/:id",
//! 				RouteDescriptor::handler_for::<UsersController, _, _>(|_, args| async move {
//! 					Ok(json!({ "id": args[0].value().cloned() }))
//! 				}),
//! 			)
//! 			.param(ParamSpec::new(ParamSource::ParamValue("id".into()))),
//! 		),
//! 	)
//! 	.await?;
//!
//! let request = Request::builder().uri("/users/42").build().unwrap();
//! let response = router.dispatch(request).await;
//! assert_eq!(response.status, hyper::StatusCode::OK);
//! # Ok(())
//! # }
//! ```

pub use nacelle_di as di;
pub use nacelle_http as http;
pub use nacelle_router as router;

/// The common imports for building an application.
pub mod prelude {
	pub use crate::di::{
		ClassDescriptor, Container, DependencyRequest, DiError, DiResult, ImplementationRecord,
		Instance, ProviderRegistration, RequestScope, Scope, Token,
	};
	pub use crate::http::{Handler, Request, Response};
	pub use crate::router::{
		CallHandler, ControllerDescriptor, ExecutionContext, Guard, HandlerArg, Interceptor,
		Middleware, Next, ParamSource, ParamSpec, PipelineError, PipelineResult, RequestState,
		RouteDescriptor, Router, Schema, SchemaFn,
	};
}
