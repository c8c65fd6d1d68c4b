//! # Nacelle HTTP
//!
//! The HTTP vocabulary shared by the nacelle container and pipeline:
//! a buffered [`Request`]/[`Response`] pair and the [`Handler`] trait the
//! host transport mounts compiled pipelines behind.
//!
//! This crate owns no transport code. A server engine parses bytes into a
//! [`Request`], hands it to a [`Handler`], and serializes the returned
//! [`Response`]. Everything in between lives in `nacelle-router`.

mod handler;
mod request;
mod response;

pub use handler::{Error, Handler, Result};
pub use request::{Request, RequestBuilder};
pub use response::Response;
