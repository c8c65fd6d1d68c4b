use thiserror::Error;

/// Errors surfaced by container registration and resolution.
#[derive(Debug, Error)]
pub enum DiError {
	/// No provider, class, or binding is registered for the token.
	#[error("no provider registered for token `{token}`")]
	UnresolvedToken { token: String },

	/// The token was re-entered while already being resolved.
	#[error("circular dependency detected while resolving `{token}`: {path}")]
	CircularDependency { token: String, path: String },

	/// The resolution stack grew past the supported depth.
	#[error("maximum resolution depth exceeded ({depth} levels)")]
	MaxDepthExceeded { depth: usize },

	/// An abstract token has several implementations and none is marked
	/// primary, so the container cannot pick one.
	#[error("ambiguous binding for `{token}`: multiple implementations and no primary [{}]", .candidates.join(", "))]
	AmbiguousBinding { token: String, candidates: Vec<String> },

	/// A qualified dependency asked for a name no implementation carries.
	#[error("no implementation named `{name}` bound to `{token}` (available: [{}])", .available.join(", "))]
	NamedImplementationNotFound {
		token: String,
		name: String,
		available: Vec<String>,
	},

	/// A request-scoped registration was resolved without a request scope.
	#[error("`{token}` is request-scoped but no request scope was provided")]
	RequestScopeViolation { token: String },

	/// Unique registration refused to overwrite an existing provider.
	#[error("token `{token}` is already registered")]
	DuplicateRegistration { token: String },

	/// A resolved instance could not be downcast to the requested type.
	#[error("instance for `{token}` is not of type `{expected}`")]
	TypeMismatch { token: String, expected: &'static str },

	/// A constructor, factory, or field injection failed.
	#[error("construction failed: {0}")]
	Construction(String),
}

pub type DiResult<T> = Result<T, DiError>;
