use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::context::RequestState;
use crate::error::PipelineResult;

/// Request middleware with an explicit continuation.
///
/// A middleware decides whether the pipeline continues by calling
/// [`Next::run`]. Not calling it halts the pipeline silently: the response
/// written to the state's response slot (or an empty one) is sent, and the
/// handler never runs.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use nacelle_router::{Middleware, Next, PipelineResult, RequestState};
///
/// struct RequestLog;
///
/// #[async_trait]
/// impl Middleware for RequestLog {
/// 	async fn handle(&self, state: &RequestState, next: Next<'_>) -> PipelineResult<()> {
/// 		tracing::info!(path = state.request.path(), "incoming request");
/// 		next.run().await
/// 	}
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn handle(&self, state: &RequestState, next: Next<'_>) -> PipelineResult<()>;
}

/// Continuation handed to each middleware.
pub struct Next<'a> {
	chain: &'a [Arc<dyn Middleware>],
	reached_end: &'a AtomicBool,
	state: &'a RequestState,
}

impl Next<'_> {
	/// Runs the rest of the chain. Consumes the continuation, so each
	/// middleware can pass control on at most once.
	pub async fn run(self) -> PipelineResult<()> {
		match self.chain.split_first() {
			None => {
				self.reached_end.store(true, Ordering::SeqCst);
				Ok(())
			}
			Some((head, tail)) => {
				head.handle(
					self.state,
					Next {
						chain: tail,
						reached_end: self.reached_end,
						state: self.state,
					},
				)
				.await
			}
		}
	}
}

/// Runs the whole chain, reporting whether the final continuation was
/// reached. `false` means some middleware halted silently.
pub(crate) async fn run_chain(
	chain: &[Arc<dyn Middleware>],
	state: &RequestState,
) -> PipelineResult<bool> {
	let reached_end = AtomicBool::new(false);
	Next {
		chain,
		reached_end: &reached_end,
		state,
	}
	.run()
	.await?;
	Ok(reached_end.load(Ordering::SeqCst))
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::Method;
	use nacelle_http::{Request, Response};
	use std::sync::Mutex;

	fn state() -> RequestState {
		let request = Request::builder()
			.method(Method::GET)
			.uri("/")
			.build()
			.unwrap();
		RequestState::new(request)
	}

	struct Tag {
		label: &'static str,
		log: Arc<Mutex<Vec<&'static str>>>,
	}

	#[async_trait]
	impl Middleware for Tag {
		async fn handle(&self, _state: &RequestState, next: Next<'_>) -> PipelineResult<()> {
			self.log.lock().unwrap().push(self.label);
			next.run().await
		}
	}

	struct Halt;

	#[async_trait]
	impl Middleware for Halt {
		async fn handle(&self, state: &RequestState, _next: Next<'_>) -> PipelineResult<()> {
			state.response.set(Response::no_content());
			Ok(())
		}
	}

	#[tokio::test]
	async fn middleware_runs_in_declaration_order() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let chain: Vec<Arc<dyn Middleware>> = vec![
			Arc::new(Tag { label: "first", log: log.clone() }),
			Arc::new(Tag { label: "second", log: log.clone() }),
		];

		let reached = run_chain(&chain, &state()).await.unwrap();

		assert!(reached);
		assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
	}

	#[tokio::test]
	async fn not_calling_next_halts_the_chain() {
		let log = Arc::new(Mutex::new(Vec::new()));
		let chain: Vec<Arc<dyn Middleware>> = vec![
			Arc::new(Halt),
			Arc::new(Tag { label: "unreached", log: log.clone() }),
		];

		let state = state();
		let reached = run_chain(&chain, &state).await.unwrap();

		assert!(!reached);
		assert!(log.lock().unwrap().is_empty());
		assert!(state.response.is_set());
	}

	#[tokio::test]
	async fn an_empty_chain_reaches_the_end() {
		let reached = run_chain(&[], &state()).await.unwrap();
		assert!(reached);
	}
}
