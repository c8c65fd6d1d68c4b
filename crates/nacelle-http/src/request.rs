//! Buffered HTTP request representation

use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// HTTP request representation with a fully buffered body.
///
/// Query parameters are parsed once at construction; path parameters are
/// filled in by the router when a route pattern matches.
#[derive(Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub query_params: HashMap<String, String>,
	pub path_params: HashMap<String, String>,
}

impl Request {
	/// Start building a request.
	///
	/// # Examples
	///
	/// ```
	/// use nacelle_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/api/users?page=2")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/api/users");
	/// assert_eq!(request.query_param("page"), Some("2"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Get the request path.
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Get a single query parameter value.
	pub fn query_param(&self, key: &str) -> Option<&str> {
		self.query_params.get(key).map(String::as_str)
	}

	/// Get a single path parameter value (filled in by the router).
	pub fn path_param(&self, key: &str) -> Option<&str> {
		self.path_params.get(key).map(String::as_str)
	}

	/// Get a header value as a string, by case-insensitive name.
	///
	/// # Examples
	///
	/// ```
	/// use nacelle_http::Request;
	/// use hyper::{HeaderMap, Method};
	///
	/// let mut headers = HeaderMap::new();
	/// headers.insert("x-request-id", "abc-123".parse().unwrap());
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/")
	///     .headers(headers)
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.header("X-Request-Id"), Some("abc-123"));
	/// ```
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// Set a path parameter (used by routers during pattern matching).
	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	/// Deserialize the body as JSON.
	pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
		serde_json::from_slice(&self.body)
	}

	/// Get URL-decoded query parameters.
	///
	/// Returns a new map with all query parameter keys and values
	/// percent-decoded. Useful for parameters carrying spaces or Unicode.
	pub fn decoded_query_params(&self) -> HashMap<String, String> {
		self.query_params
			.iter()
			.map(|(k, v)| {
				let key = percent_decode_str(k).decode_utf8_lossy().to_string();
				let value = percent_decode_str(v).decode_utf8_lossy().to_string();
				(key, value)
			})
			.collect()
	}

	/// Parse query parameters from a URI.
	///
	/// Splits each pair on the first `=` only, so values containing `=`
	/// (Base64 payloads, tokens) survive intact.
	fn parse_query_params(uri: &Uri) -> HashMap<String, String> {
		uri.query()
			.map(|q| {
				q.split('&')
					.filter_map(|pair| {
						let mut parts = pair.splitn(2, '=');
						Some((
							parts.next()?.to_string(),
							parts.next().unwrap_or("").to_string(),
						))
					})
					.collect()
			})
			.unwrap_or_default()
	}
}

/// Builder for [`Request`].
#[derive(Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	version: Option<Version>,
	headers: Option<HeaderMap>,
	body: Option<Bytes>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = Some(version);
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = Some(headers);
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = Some(body.into());
		self
	}

	/// Finish building, parsing the URI and its query string.
	///
	/// # Errors
	///
	/// Returns an error if the URI fails to parse.
	pub fn build(self) -> Result<Request, hyper::http::uri::InvalidUri> {
		let uri: Uri = self.uri.unwrap_or_else(|| "/".to_string()).parse()?;
		let query_params = Request::parse_query_params(&uri);
		Ok(Request {
			method: self.method.unwrap_or(Method::GET),
			uri,
			version: self.version.unwrap_or(Version::HTTP_11),
			headers: self.headers.unwrap_or_default(),
			body: self.body.unwrap_or_default(),
			query_params,
			path_params: HashMap::new(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_query_params_preserves_equals_in_value() {
		// Arrange
		let uri: Uri = "/test?token=abc==".parse().unwrap();

		// Act
		let params = Request::parse_query_params(&uri);

		// Assert
		assert_eq!(params.get("token"), Some(&"abc==".to_string()));
	}

	#[rstest]
	fn test_parse_query_params_multiple_pairs() {
		// Arrange
		let uri: Uri = "/test?a=1&b=x=y=z&c=3".parse().unwrap();

		// Act
		let params = Request::parse_query_params(&uri);

		// Assert
		assert_eq!(params.get("a"), Some(&"1".to_string()));
		assert_eq!(params.get("b"), Some(&"x=y=z".to_string()));
		assert_eq!(params.get("c"), Some(&"3".to_string()));
	}

	#[rstest]
	fn test_parse_query_params_key_without_value() {
		let uri: Uri = "/test?key=".parse().unwrap();
		let params = Request::parse_query_params(&uri);
		assert_eq!(params.get("key"), Some(&"".to_string()));
	}

	#[rstest]
	fn test_parse_query_params_no_query_string() {
		let uri: Uri = "/test".parse().unwrap();
		let params = Request::parse_query_params(&uri);
		assert!(params.is_empty());
	}

	#[rstest]
	fn test_decoded_query_params() {
		// Arrange
		let request = Request::builder()
			.method(Method::GET)
			.uri("/test?name=John%20Doe")
			.build()
			.unwrap();

		// Act
		let decoded = request.decoded_query_params();

		// Assert
		assert_eq!(decoded.get("name"), Some(&"John Doe".to_string()));
	}

	#[rstest]
	fn test_header_lookup_is_case_insensitive() {
		// Arrange
		let mut headers = HeaderMap::new();
		headers.insert("x-api-key", "secret".parse().unwrap());
		let request = Request::builder()
			.method(Method::GET)
			.uri("/")
			.headers(headers)
			.build()
			.unwrap();

		// Assert
		assert_eq!(request.header("X-API-KEY"), Some("secret"));
		assert_eq!(request.header("x-api-key"), Some("secret"));
		assert_eq!(request.header("missing"), None);
	}

	#[rstest]
	fn test_json_body_deserialization() {
		// Arrange
		let request = Request::builder()
			.method(Method::POST)
			.uri("/items")
			.body(r#"{"name":"widget"}"#)
			.build()
			.unwrap();

		// Act
		let value: serde_json::Value = request.json().unwrap();

		// Assert
		assert_eq!(value["name"], "widget");
	}

	#[rstest]
	fn test_path_params_start_empty_and_are_settable() {
		let mut request = Request::builder()
			.method(Method::GET)
			.uri("/users/42")
			.build()
			.unwrap();

		assert!(request.path_params.is_empty());
		request.set_path_param("id", "42");
		assert_eq!(request.path_param("id"), Some("42"));
	}
}
