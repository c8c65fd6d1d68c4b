//! Route compilation and the request execution pipeline.
//!
//! Controllers are declared as [`ControllerDescriptor`]s and compiled once
//! at registration: path patterns are parsed, the controller and its
//! pipeline roles are resolved through the DI container, and the result is
//! an immutable route table. Dispatch then runs each request through a
//! fixed stage order:
//!
//! 1. [`Guard`]s decide whether the request may proceed at all.
//! 2. [`Middleware`] runs with an explicit continuation and may halt the
//!    pipeline silently.
//! 3. Handler parameters are extracted and validated against their
//!    [`Schema`]s.
//! 4. [`Interceptor`]s wrap the handler call in an onion, first declared
//!    outermost.

mod context;
mod descriptor;
mod error;
mod guard;
mod interceptor;
mod middleware;
mod param;
mod pattern;
mod router;
mod schema;

pub use context::{ExecutionContext, RequestState, ResponseHandle, RouteInfo};
pub use descriptor::{ControllerDescriptor, HandlerFn, RoleRef, RouteDescriptor};
pub use error::{PipelineError, PipelineResult};
pub use guard::Guard;
pub use interceptor::{CallHandler, Interceptor};
pub use middleware::{Middleware, Next};
pub use param::{HandlerArg, ParamSource, ParamSpec};
pub use pattern::PathPattern;
pub use router::Router;
pub use schema::{Schema, SchemaFn};
