use std::collections::HashMap;

/// A compiled path pattern.
///
/// Patterns are split into segments once at registration; `:name` segments
/// capture the matching request segment as a path parameter.
///
/// # Examples
///
/// ```
/// use nacelle_router::PathPattern;
///
/// let pattern = PathPattern::parse("/users/:id/posts");
///
/// let params = pattern.matches("/users/42/posts").unwrap();
/// assert_eq!(params.get("id").map(String::as_str), Some("42"));
///
/// assert!(pattern.matches("/users/42").is_none());
/// ```
#[derive(Clone, Debug)]
pub struct PathPattern {
	raw: String,
	segments: Vec<Segment>,
}

#[derive(Clone, Debug)]
enum Segment {
	Literal(String),
	Param(String),
}

impl PathPattern {
	pub fn parse(pattern: &str) -> Self {
		let segments = pattern
			.split('/')
			.filter(|s| !s.is_empty())
			.map(|s| match s.strip_prefix(':') {
				Some(name) => Segment::Param(name.to_string()),
				None => Segment::Literal(s.to_string()),
			})
			.collect();
		Self {
			raw: pattern.to_string(),
			segments,
		}
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}

	/// Matches `path`, returning the captured path parameters. Segment
	/// counts must agree exactly; a param segment never matches empty.
	pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
		let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
		if parts.len() != self.segments.len() {
			return None;
		}
		let mut params = HashMap::new();
		for (segment, part) in self.segments.iter().zip(&parts) {
			match segment {
				Segment::Literal(literal) if literal == part => {}
				Segment::Literal(_) => return None,
				Segment::Param(name) => {
					params.insert(name.clone(), (*part).to_string());
				}
			}
		}
		Some(params)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;

	#[rstest]
	#[case("/users", "/users", true)]
	#[case("/users", "/users/", true)]
	#[case("/users", "/posts", false)]
	#[case("/users/:id", "/users/42", true)]
	#[case("/users/:id", "/users", false)]
	#[case("/users/:id", "/users/42/posts", false)]
	#[case("/users/:id/posts/:post", "/users/1/posts/2", true)]
	fn pattern_matching(#[case] pattern: &str, #[case] path: &str, #[case] matches: bool) {
		assert_eq!(PathPattern::parse(pattern).matches(path).is_some(), matches);
	}

	#[test]
	fn captures_named_parameters() {
		let pattern = PathPattern::parse("/users/:user/posts/:post");
		let params = pattern.matches("/users/7/posts/abc").unwrap();

		assert_eq!(params.get("user").map(String::as_str), Some("7"));
		assert_eq!(params.get("post").map(String::as_str), Some("abc"));
	}

	proptest! {
		#[test]
		fn literal_patterns_match_themselves(segments in proptest::collection::vec("[a-z0-9_-]{1,12}", 1..5)) {
			let path = format!("/{}", segments.join("/"));
			let pattern = PathPattern::parse(&path);
			prop_assert!(pattern.matches(&path).is_some());
		}

		#[test]
		fn param_segments_capture_any_value(value in "[A-Za-z0-9._~-]{1,24}") {
			let pattern = PathPattern::parse("/items/:id");
			let params = pattern.matches(&format!("/items/{value}")).unwrap();
			prop_assert_eq!(params.get("id").map(String::as_str), Some(value.as_str()));
		}
	}
}
