use hyper::StatusCode;
use nacelle_di::DiError;
use thiserror::Error;

/// Errors surfaced while compiling routes or executing the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
	/// A guard returned `false`; the request never reached the handler.
	#[error("request rejected by guard `{guard}`")]
	GuardRejected { guard: String },

	/// A parameter failed extraction or schema validation. `kind` is one
	/// of `body`, `query`, `param`, or `header`.
	#[error("invalid {kind} `{key}`: {detail}")]
	ParamValidation {
		kind: &'static str,
		key: String,
		detail: String,
	},

	/// No registered route matches the request method and path.
	#[error("no route matches the request")]
	NotFound,

	/// Pipeline roles are resolved once at registration, so a
	/// request-scoped guard, middleware, or interceptor class is rejected.
	#[error("`{class}` is request-scoped and cannot serve as a pipeline role")]
	RequestScopedRole { class: String },

	/// The handler itself failed.
	#[error("handler failed: {0}")]
	Handler(String),

	#[error(transparent)]
	Di(#[from] DiError),
}

impl PipelineError {
	/// The HTTP status this error maps to at the edge.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::GuardRejected { .. } => StatusCode::FORBIDDEN,
			Self::ParamValidation { .. } => StatusCode::BAD_REQUEST,
			Self::NotFound => StatusCode::NOT_FOUND,
			Self::RequestScopedRole { .. } | Self::Handler(_) | Self::Di(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

pub type PipelineResult<T> = Result<T, PipelineError>;
