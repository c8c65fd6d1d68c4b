//! Handler parameter extraction.
//!
//! Each handler parameter is declared as a [`ParamSpec`]: where the value
//! comes from and, optionally, a [`Schema`] that validates it. Extraction
//! happens after guards and middleware, so handlers only ever see values
//! that passed validation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::context::{ExecutionContext, RequestState, ResponseHandle};
use crate::error::{PipelineError, PipelineResult};
use crate::schema::Schema;
use nacelle_http::Request;

/// Where a handler parameter's value comes from.
#[derive(Clone, Debug)]
pub enum ParamSource {
	/// The whole request body, parsed as JSON. An empty body yields null.
	Body,
	/// One field of a JSON object body.
	BodyField(String),
	/// All query parameters as a JSON object.
	Query,
	/// One query parameter, percent-decoded.
	QueryValue(String),
	/// All path parameters as a JSON object.
	Params,
	/// One path parameter.
	ParamValue(String),
	/// All headers as a JSON object.
	Headers,
	/// One header, matched case-insensitively.
	HeaderValue(String),
	/// The request itself, bypassing validation.
	Request,
	/// The shared response slot, for handlers that write responses
	/// directly.
	Response,
	/// The execution context.
	Context,
}

impl ParamSource {
	/// The error category for validation failures on this source.
	fn kind(&self) -> &'static str {
		match self {
			Self::Body | Self::BodyField(_) => "body",
			Self::Query | Self::QueryValue(_) => "query",
			Self::Params | Self::ParamValue(_) => "param",
			Self::Headers | Self::HeaderValue(_) => "header",
			Self::Request | Self::Response | Self::Context => "request",
		}
	}

	fn key(&self) -> &str {
		match self {
			Self::BodyField(name) | Self::QueryValue(name) | Self::ParamValue(name) | Self::HeaderValue(name) => name,
			Self::Body => "body",
			Self::Query => "query",
			Self::Params => "params",
			Self::Headers => "headers",
			Self::Request | Self::Response | Self::Context => "",
		}
	}
}

/// One declared handler parameter.
#[derive(Clone)]
pub struct ParamSpec {
	pub source: ParamSource,
	pub schema: Option<Arc<dyn Schema>>,
}

impl ParamSpec {
	pub fn new(source: ParamSource) -> Self {
		Self { source, schema: None }
	}

	pub fn with_schema(mut self, schema: impl Schema + 'static) -> Self {
		self.schema = Some(Arc::new(schema));
		self
	}
}

/// A resolved handler argument.
#[derive(Clone)]
pub enum HandlerArg {
	Value(Value),
	Request(Request),
	Response(ResponseHandle),
	Context(Arc<ExecutionContext>),
}

impl HandlerArg {
	pub fn value(&self) -> Option<&Value> {
		match self {
			Self::Value(value) => Some(value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		self.value()?.as_str()
	}

	/// Deserializes a value argument into `T`.
	pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
		serde_json::from_value(self.value()?.clone()).ok()
	}

	pub fn request(&self) -> Option<&Request> {
		match self {
			Self::Request(request) => Some(request),
			_ => None,
		}
	}

	pub fn response(&self) -> Option<&ResponseHandle> {
		match self {
			Self::Response(handle) => Some(handle),
			_ => None,
		}
	}

	pub fn context(&self) -> Option<&Arc<ExecutionContext>> {
		match self {
			Self::Context(context) => Some(context),
			_ => None,
		}
	}
}

/// Whether any declared parameter needs the execution context built.
pub(crate) fn wants_context(params: &[ParamSpec]) -> bool {
	params.iter().any(|p| matches!(p.source, ParamSource::Context))
}

/// A parameter resolver compiled at route registration. The source is
/// matched once here; per request only the closure runs.
pub(crate) type ExtractorFn =
	Arc<dyn Fn(&RequestState, Option<&Arc<ExecutionContext>>) -> PipelineResult<HandlerArg> + Send + Sync>;

type ValueFn = Box<dyn Fn(&RequestState) -> PipelineResult<Value> + Send + Sync>;

pub(crate) fn compile(spec: &ParamSpec) -> ExtractorFn {
	match &spec.source {
		ParamSource::Request => Arc::new(
			|state: &RequestState, _: Option<&Arc<ExecutionContext>>| -> PipelineResult<HandlerArg> {
				Ok(HandlerArg::Request(state.request.clone()))
			},
		),
		ParamSource::Response => Arc::new(
			|state: &RequestState, _: Option<&Arc<ExecutionContext>>| -> PipelineResult<HandlerArg> {
				Ok(HandlerArg::Response(state.response.clone()))
			},
		),
		ParamSource::Context => Arc::new(
			|_: &RequestState, context: Option<&Arc<ExecutionContext>>| -> PipelineResult<HandlerArg> {
				let context = context.ok_or_else(|| {
					PipelineError::Handler("execution context unavailable".to_string())
				})?;
				Ok(HandlerArg::Context(context.clone()))
			},
		),
		ParamSource::Body => value_extractor(spec, Box::new(|state| parse_body(&state.request))),
		ParamSource::BodyField(name) => {
			let name = name.clone();
			value_extractor(
				spec,
				Box::new(move |state| match parse_body(&state.request)? {
					Value::Object(mut object) => Ok(object.remove(&name).unwrap_or(Value::Null)),
					Value::Null => Ok(Value::Null),
					_ => Err(PipelineError::ParamValidation {
						kind: "body",
						key: name.clone(),
						detail: "body is not a JSON object".to_string(),
					}),
				}),
			)
		}
		ParamSource::Query => {
			value_extractor(spec, Box::new(|state| Ok(map_to_object(state.request.decoded_query_params()))))
		}
		ParamSource::QueryValue(name) => {
			let name = name.clone();
			value_extractor(
				spec,
				Box::new(move |state| {
					Ok(state
						.request
						.decoded_query_params()
						.remove(&name)
						.map(Value::String)
						.unwrap_or(Value::Null))
				}),
			)
		}
		ParamSource::Params => {
			value_extractor(spec, Box::new(|state| Ok(map_to_object(state.request.path_params.clone()))))
		}
		ParamSource::ParamValue(name) => {
			let name = name.clone();
			value_extractor(
				spec,
				Box::new(move |state| {
					Ok(state
						.request
						.path_param(&name)
						.map(|v| Value::String(v.to_string()))
						.unwrap_or(Value::Null))
				}),
			)
		}
		ParamSource::Headers => value_extractor(
			spec,
			Box::new(|state| {
				let mut object = Map::new();
				for (name, value) in state.request.headers.iter() {
					if let Ok(value) = value.to_str() {
						object.insert(name.as_str().to_string(), Value::String(value.to_string()));
					}
				}
				Ok(Value::Object(object))
			}),
		),
		ParamSource::HeaderValue(name) => {
			let name = name.clone();
			value_extractor(
				spec,
				Box::new(move |state| {
					Ok(state
						.request
						.header(&name)
						.map(|v| Value::String(v.to_string()))
						.unwrap_or(Value::Null))
				}),
			)
		}
	}
}

/// Wraps a value source with the spec's schema check, capturing the error
/// kind and key once so validation failures name their source.
fn value_extractor(spec: &ParamSpec, value: ValueFn) -> ExtractorFn {
	let schema = spec.schema.clone();
	let kind = spec.source.kind();
	let key = spec.source.key().to_string();
	Arc::new(
		move |state: &RequestState, _: Option<&Arc<ExecutionContext>>| -> PipelineResult<HandlerArg> {
			let raw = value(state)?;
			let parsed = match &schema {
				None => raw,
				Some(schema) => {
					schema.safe_parse(&raw).map_err(|detail| PipelineError::ParamValidation {
						kind,
						key: key.clone(),
						detail,
					})?
				}
			};
			Ok(HandlerArg::Value(parsed))
		},
	)
}

fn parse_body(request: &Request) -> PipelineResult<Value> {
	if request.body.is_empty() {
		return Ok(Value::Null);
	}
	serde_json::from_slice(&request.body).map_err(|err| PipelineError::ParamValidation {
		kind: "body",
		key: "body".to_string(),
		detail: err.to_string(),
	})
}

fn map_to_object(map: HashMap<String, String>) -> Value {
	Value::Object(map.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::SchemaFn;
	use hyper::Method;
	use serde_json::json;

	fn state_for(uri: &str, body: &str) -> RequestState {
		let request = Request::builder()
			.method(Method::POST)
			.uri(uri)
			.body(body.to_string())
			.build()
			.unwrap();
		RequestState::new(request)
	}

	fn extract(spec: &ParamSpec, state: &RequestState) -> PipelineResult<HandlerArg> {
		compile(spec)(state, None)
	}

	#[test]
	fn whole_body_parses_as_json() {
		let state = state_for("/users", r#"{"name":"ada"}"#);
		let arg = extract(&ParamSpec::new(ParamSource::Body), &state).unwrap();

		assert_eq!(arg.value().unwrap(), &json!({"name": "ada"}));
	}

	#[test]
	fn empty_body_extracts_as_null() {
		let state = state_for("/users", "");
		let arg = extract(&ParamSpec::new(ParamSource::Body), &state).unwrap();

		assert_eq!(arg.value().unwrap(), &Value::Null);
	}

	#[test]
	fn body_field_on_a_non_object_fails_as_a_body_error() {
		let state = state_for("/users", "[1,2,3]");
		let Err(err) = extract(&ParamSpec::new(ParamSource::BodyField("name".into())), &state) else {
			panic!("expected a validation error");
		};

		assert!(matches!(err, PipelineError::ParamValidation { kind: "body", .. }));
	}

	#[test]
	fn missing_body_field_extracts_as_null() {
		let state = state_for("/users", r#"{"name":"ada"}"#);
		let arg = extract(&ParamSpec::new(ParamSource::BodyField("email".into())), &state).unwrap();

		assert_eq!(arg.value().unwrap(), &Value::Null);
	}

	#[test]
	fn query_values_are_percent_decoded() {
		let state = state_for("/search?q=hello%20world", "");
		let arg = extract(&ParamSpec::new(ParamSource::QueryValue("q".into())), &state).unwrap();

		assert_eq!(arg.as_str(), Some("hello world"));
	}

	#[test]
	fn full_query_map_extracts_as_an_object() {
		let state = state_for("/search?q=rust&page=2", "");
		let arg = extract(&ParamSpec::new(ParamSource::Query), &state).unwrap();

		assert_eq!(arg.value().unwrap(), &json!({"q": "rust", "page": "2"}));
	}

	#[test]
	fn path_params_extract_from_the_matched_route() {
		let mut state = state_for("/users/42", "");
		state.request.set_path_param("id", "42");

		let arg = extract(&ParamSpec::new(ParamSource::ParamValue("id".into())), &state).unwrap();
		assert_eq!(arg.as_str(), Some("42"));

		let all = extract(&ParamSpec::new(ParamSource::Params), &state).unwrap();
		assert_eq!(all.value().unwrap(), &json!({"id": "42"}));
	}

	#[test]
	fn header_lookups_are_case_insensitive() {
		let mut state = state_for("/users", "");
		state.request.headers.insert("x-request-id", "abc-123".parse().unwrap());

		let arg = extract(&ParamSpec::new(ParamSource::HeaderValue("X-Request-Id".into())), &state).unwrap();
		assert_eq!(arg.as_str(), Some("abc-123"));
	}

	#[test]
	fn full_header_map_extracts_as_an_object() {
		let mut state = state_for("/users", "");
		state.request.headers.insert("x-request-id", "abc-123".parse().unwrap());

		let arg = extract(&ParamSpec::new(ParamSource::Headers), &state).unwrap();
		assert_eq!(arg.value().unwrap()["x-request-id"], json!("abc-123"));
	}

	#[test]
	fn raw_request_and_response_bypass_validation() {
		let state = state_for("/users?q=1", "");

		let request = extract(&ParamSpec::new(ParamSource::Request), &state).unwrap();
		assert_eq!(request.request().unwrap().path(), "/users");

		let response = extract(&ParamSpec::new(ParamSource::Response), &state).unwrap();
		assert!(response.response().is_some());
	}

	#[test]
	fn context_extraction_requires_a_context() {
		let state = state_for("/users", "");

		let Err(err) = extract(&ParamSpec::new(ParamSource::Context), &state) else {
			panic!("expected a missing context error");
		};
		assert!(matches!(err, PipelineError::Handler(_)));
	}

	#[test]
	fn schema_failures_carry_the_source_kind_and_key() {
		let mut state = state_for("/users/abc", "");
		state.request.set_path_param("id", "abc");

		let spec = ParamSpec::new(ParamSource::ParamValue("id".into())).with_schema(SchemaFn::integer());
		let Err(err) = extract(&spec, &state) else {
			panic!("expected a validation error");
		};

		match err {
			PipelineError::ParamValidation { kind, key, .. } => {
				assert_eq!(kind, "param");
				assert_eq!(key, "id");
			}
			other => panic!("expected a validation error, got: {other}"),
		}
	}

	#[test]
	fn schemas_can_rewrite_the_value() {
		let mut state = state_for("/users/42", "");
		state.request.set_path_param("id", "42");

		let spec = ParamSpec::new(ParamSource::ParamValue("id".into())).with_schema(SchemaFn::integer());
		let arg = extract(&spec, &state).unwrap();

		assert_eq!(arg.value().unwrap(), &json!(42));
	}
}
