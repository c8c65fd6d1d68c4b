//! Handler trait for HTTP request processing
//!
//! The [`Handler`] trait is the seam between the host transport and the
//! framework: a server engine buffers an inbound request, calls `handle`,
//! and writes the returned response. Routers and compiled pipelines all
//! implement this trait.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{Request, Response};

/// Boxed error escaping a handler; the host maps it to an error response.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Handler trait for processing requests.
///
/// # Examples
///
/// ```
/// use nacelle_http::{Handler, Request, Response};
/// use async_trait::async_trait;
///
/// struct Hello;
///
/// #[async_trait]
/// impl Handler for Hello {
///     async fn handle(&self, _request: Request) -> nacelle_http::Result<Response> {
///         Ok(Response::ok().with_body("hello"))
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handle an HTTP request and produce a response.
	///
	/// # Errors
	///
	/// Returns an error if the request cannot be processed.
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Blanket implementation for `Arc<T>` where `T: Handler`.
///
/// Allows `Arc<dyn Handler>` to be used as a handler, enabling shared
/// ownership across threads.
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}
