use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::descriptor::HandlerFn;
use crate::error::PipelineResult;
use crate::param::HandlerArg;
use nacelle_di::Instance;

/// The continuation an interceptor wraps: either the handler itself or
/// the next interceptor inward.
#[async_trait]
pub trait CallHandler: Send + Sync {
	async fn handle(&self) -> PipelineResult<Value>;
}

/// Wraps handler invocation, seeing both the call going in and the result
/// coming out.
///
/// Interceptors form an onion around the handler: the first one declared
/// is outermost. An interceptor may short-circuit by not calling `next`,
/// or rewrite the result on the way out.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use nacelle_router::{CallHandler, ExecutionContext, Interceptor, PipelineResult};
/// use serde_json::{json, Value};
///
/// struct Envelope;
///
/// #[async_trait]
/// impl Interceptor for Envelope {
/// 	async fn intercept(
/// 		&self,
/// 		_context: &ExecutionContext,
/// 		next: Arc<dyn CallHandler>,
/// 	) -> PipelineResult<Value> {
/// 		let data = next.handle().await?;
/// 		Ok(json!({ "data": data }))
/// 	}
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync {
	async fn intercept(
		&self,
		context: &ExecutionContext,
		next: Arc<dyn CallHandler>,
	) -> PipelineResult<Value>;
}

/// Innermost link: invokes the handler with its extracted arguments.
pub(crate) struct HandlerInvoker {
	pub(crate) handler: HandlerFn,
	pub(crate) instance: Instance,
	pub(crate) args: Vec<HandlerArg>,
}

#[async_trait]
impl CallHandler for HandlerInvoker {
	async fn handle(&self) -> PipelineResult<Value> {
		(self.handler)(self.instance.clone(), self.args.clone()).await
	}
}

/// One interceptor layer around an inner continuation.
pub(crate) struct InterceptorLayer {
	pub(crate) interceptor: Arc<dyn Interceptor>,
	pub(crate) context: Arc<ExecutionContext>,
	pub(crate) next: Arc<dyn CallHandler>,
}

#[async_trait]
impl CallHandler for InterceptorLayer {
	async fn handle(&self) -> PipelineResult<Value> {
		self.interceptor.intercept(&self.context, self.next.clone()).await
	}
}

/// Builds the onion: interceptors are applied in reverse declaration
/// order so the first declared ends up outermost.
pub(crate) fn wrap(
	interceptors: &[Arc<dyn Interceptor>],
	context: &Arc<ExecutionContext>,
	innermost: Arc<dyn CallHandler>,
) -> Arc<dyn CallHandler> {
	let mut chain = innermost;
	for interceptor in interceptors.iter().rev() {
		chain = Arc::new(InterceptorLayer {
			interceptor: interceptor.clone(),
			context: context.clone(),
			next: chain,
		});
	}
	chain
}
