//! Buffered HTTP response representation

use bytes::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use serde::Serialize;

/// HTTP response representation.
#[derive(Clone, Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new response with the given status code.
	///
	/// # Examples
	///
	/// ```
	/// use nacelle_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// Create a response with HTTP 200 OK status.
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Create a response with HTTP 201 Created status.
	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}

	/// Create a response with HTTP 204 No Content status.
	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	/// Create a response with HTTP 400 Bad Request status.
	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	/// Create a response with HTTP 401 Unauthorized status.
	pub fn unauthorized() -> Self {
		Self::new(StatusCode::UNAUTHORIZED)
	}

	/// Create a response with HTTP 403 Forbidden status.
	pub fn forbidden() -> Self {
		Self::new(StatusCode::FORBIDDEN)
	}

	/// Create a response with HTTP 404 Not Found status.
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Create a 200 response carrying a JSON body.
	///
	/// # Examples
	///
	/// ```
	/// use nacelle_http::Response;
	///
	/// let response = Response::json(&serde_json::json!({"id": "42"})).unwrap();
	/// assert_eq!(response.header("content-type"), Some("application/json"));
	/// ```
	pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
		let body = serde_json::to_vec(value)?;
		Ok(Self::ok()
			.with_header(header::CONTENT_TYPE, "application/json")
			.with_body(body))
	}

	/// Replace the body.
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Replace the status code.
	pub fn with_status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	/// Insert a header, replacing any existing value.
	///
	/// Invalid header values are silently dropped; response construction
	/// is infallible by design.
	pub fn with_header(mut self, name: header::HeaderName, value: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(value) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Get a header value as a string.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// Deserialize the body as JSON.
	pub fn json_body<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
		serde_json::from_slice(&self.body)
	}
}
