use regex::Regex;
use serde_json::Value;

/// Validates and optionally transforms an extracted parameter value.
///
/// Validation never panics: `safe_parse` returns the (possibly rewritten)
/// value or a human-readable rejection reason, which the pipeline maps to
/// a parameter validation error.
pub trait Schema: Send + Sync {
	fn safe_parse(&self, value: &Value) -> Result<Value, String>;
}

/// A [`Schema`] built from a closure.
///
/// # Examples
///
/// ```
/// use nacelle_router::{Schema, SchemaFn};
/// use serde_json::{json, Value};
///
/// let positive = SchemaFn::new(|value: &Value| {
/// 	value
/// 		.as_i64()
/// 		.filter(|n| *n > 0)
/// 		.map(Value::from)
/// 		.ok_or_else(|| "expected a positive integer".to_string())
/// });
///
/// assert!(positive.safe_parse(&json!(3)).is_ok());
/// assert!(positive.safe_parse(&json!(-1)).is_err());
/// ```
pub struct SchemaFn {
	check: Box<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>,
}

impl SchemaFn {
	pub fn new(check: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static) -> Self {
		Self { check: Box::new(check) }
	}

	/// Accepts strings matching `pattern`; `expected` names the shape for
	/// the rejection message.
	pub fn matching(pattern: Regex, expected: &'static str) -> Self {
		Self::new(move |value| match value.as_str() {
			Some(s) if pattern.is_match(s) => Ok(Value::String(s.to_string())),
			Some(s) => Err(format!("`{s}` is not a valid {expected}")),
			None => Err(format!("expected a {expected} string")),
		})
	}

	/// Accepts any string value.
	pub fn string() -> Self {
		Self::new(|value| match value.as_str() {
			Some(s) => Ok(Value::String(s.to_string())),
			None => Err("expected a string".to_string()),
		})
	}

	/// Accepts integers and strings parseable as integers, normalizing to
	/// a JSON number.
	pub fn integer() -> Self {
		Self::new(|value| match value {
			Value::Number(n) if n.is_i64() => Ok(value.clone()),
			Value::String(s) => s
				.parse::<i64>()
				.map(Value::from)
				.map_err(|_| format!("`{s}` is not an integer")),
			_ => Err("expected an integer".to_string()),
		})
	}
}

impl Schema for SchemaFn {
	fn safe_parse(&self, value: &Value) -> Result<Value, String> {
		(self.check)(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn integer_schema_normalizes_numeric_strings() {
		let schema = SchemaFn::integer();

		assert_eq!(schema.safe_parse(&json!("42")).unwrap(), json!(42));
		assert_eq!(schema.safe_parse(&json!(7)).unwrap(), json!(7));
		assert!(schema.safe_parse(&json!("seven")).is_err());
		assert!(schema.safe_parse(&json!(null)).is_err());
	}

	#[test]
	fn matching_schema_rejects_non_conforming_strings() {
		let uuid = Regex::new(
			"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
		)
		.unwrap();
		let schema = SchemaFn::matching(uuid, "UUID");

		assert!(schema
			.safe_parse(&json!("123e4567-e89b-12d3-a456-426614174000"))
			.is_ok());
		let err = schema.safe_parse(&json!("not-a-uuid")).unwrap_err();
		assert!(err.contains("UUID"));
	}
}
