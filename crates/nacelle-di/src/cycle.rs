//! Cycle detection for dependency resolution.
//!
//! The active resolution stack lives in task-local storage, so concurrent
//! resolutions on different tasks never see each other's state. Entering a
//! token pushes it onto the stack and returns an RAII guard; re-entering a
//! token that is already on the stack reports the full cycle path.

use std::cell::RefCell;
use std::collections::HashSet;
use std::future::Future;

use crate::error::{DiError, DiResult};
use crate::token::Token;

/// Upper bound on resolution nesting. Real dependency graphs stay far
/// below this; hitting it means a runaway graph rather than a deep one.
const MAX_RESOLUTION_DEPTH: usize = 100;

struct ResolutionState {
	active: HashSet<Token>,
	path: Vec<Token>,
}

impl ResolutionState {
	fn new() -> Self {
		Self {
			active: HashSet::new(),
			path: Vec::new(),
		}
	}
}

tokio::task_local! {
	static RESOLUTION_STATE: RefCell<ResolutionState>;
}

/// Runs `f` inside a resolution scope, creating one when the current task
/// does not already have one. Nested calls reuse the outer scope so that
/// cycles spanning recursive resolutions are still caught.
pub(crate) async fn with_resolution_scope<F, T>(f: F) -> T
where
	F: Future<Output = T>,
{
	if RESOLUTION_STATE.try_with(|_| ()).is_ok() {
		f.await
	} else {
		RESOLUTION_STATE.scope(RefCell::new(ResolutionState::new()), f).await
	}
}

/// Marks `token` as being resolved until the returned guard drops.
pub(crate) fn begin_resolution(token: &Token) -> DiResult<ResolutionGuard> {
	RESOLUTION_STATE
		.try_with(|state| {
			let mut state = state.borrow_mut();
			if state.path.len() >= MAX_RESOLUTION_DEPTH {
				return Err(DiError::MaxDepthExceeded {
					depth: state.path.len() + 1,
				});
			}
			if state.active.contains(token) {
				return Err(DiError::CircularDependency {
					token: token.short_name().to_string(),
					path: cycle_path(&state.path, token),
				});
			}
			state.active.insert(token.clone());
			state.path.push(token.clone());
			Ok(ResolutionGuard { token: token.clone() })
		})
		.map_err(|_| DiError::Construction("resolution attempted outside a resolution scope".to_string()))?
}

/// Renders the cycle as `A -> B -> C -> A`, starting from the first
/// occurrence of the repeated token.
fn cycle_path(path: &[Token], repeated: &Token) -> String {
	let start = path.iter().position(|t| t == repeated).unwrap_or(0);
	let mut names: Vec<&str> = path[start..].iter().map(Token::short_name).collect();
	names.push(repeated.short_name());
	names.join(" -> ")
}

/// Removes its token from the resolution stack on drop, keeping the stack
/// correct on both success and error paths.
pub(crate) struct ResolutionGuard {
	token: Token,
}

impl Drop for ResolutionGuard {
	fn drop(&mut self) {
		let _ = RESOLUTION_STATE.try_with(|state| {
			let mut state = state.borrow_mut();
			state.active.remove(&self.token);
			if let Some(position) = state.path.iter().rposition(|t| t == &self.token) {
				state.path.remove(position);
			}
		});
	}
}
