use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::PipelineResult;

/// Decides whether a request may proceed to the rest of the pipeline.
///
/// Guards run first, before middleware and parameter extraction. Returning
/// `Ok(false)` rejects the request with a forbidden response; an error
/// propagates as-is.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use nacelle_router::{ExecutionContext, Guard, PipelineResult};
///
/// struct RequireApiKey;
///
/// #[async_trait]
/// impl Guard for RequireApiKey {
/// 	async fn can_activate(&self, context: &ExecutionContext) -> PipelineResult<bool> {
/// 		Ok(context.request().header("x-api-key").is_some())
/// 	}
/// }
/// ```
#[async_trait]
pub trait Guard: Send + Sync {
	async fn can_activate(&self, context: &ExecutionContext) -> PipelineResult<bool>;
}
