use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::DiResult;
use crate::metadata::ResolvedDeps;
use crate::scope::Scope;
use crate::token::{Instance, Token};

/// One dependency edge: which token to resolve and how strictly.
#[derive(Clone, Debug)]
pub struct DependencyRequest {
	pub token: Token,
	/// Optional dependencies resolve to `None` instead of failing when the
	/// token is missing.
	pub optional: bool,
	/// Qualifier selecting a named implementation of an abstract token.
	pub name: Option<String>,
}

impl DependencyRequest {
	pub fn required(token: Token) -> Self {
		Self { token, optional: false, name: None }
	}

	pub fn optional(token: Token) -> Self {
		Self { token, optional: true, name: None }
	}

	pub fn named(token: Token, name: impl Into<String>) -> Self {
		Self { token, optional: false, name: Some(name.into()) }
	}

	pub fn or_absent(mut self) -> Self {
		self.optional = true;
		self
	}
}

/// Async factory invoked with its declared dependencies already resolved.
pub type FactoryFn =
	Arc<dyn Fn(ResolvedDeps) -> BoxFuture<'static, DiResult<Instance>> + Send + Sync>;

/// How a provider produces its instance.
#[derive(Clone)]
pub enum ProviderKind {
	/// A precomputed instance. Scope is irrelevant: the same instance is
	/// returned on every resolution.
	Value(Instance),
	/// A factory function with its dependency list.
	Factory {
		deps: Vec<DependencyRequest>,
		factory: FactoryFn,
	},
	/// Redirects resolution to another token.
	Alias(Token),
}

impl fmt::Debug for ProviderKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Value(_) => f.write_str("Value"),
			Self::Factory { deps, .. } => f.debug_struct("Factory").field("deps", deps).finish_non_exhaustive(),
			Self::Alias(target) => f.debug_tuple("Alias").field(target).finish(),
		}
	}
}

/// A provider entry as stored in the registry.
#[derive(Clone, Debug)]
pub struct ProviderRegistration {
	pub token: Token,
	pub kind: ProviderKind,
	pub scope: Scope,
	/// Eager-initialization order: higher priorities are warmed up first
	/// by [`Container::initialize`](crate::Container::initialize).
	pub priority: i32,
}

impl ProviderRegistration {
	pub fn value(token: Token, instance: Instance) -> Self {
		Self {
			token,
			kind: ProviderKind::Value(instance),
			scope: Scope::Singleton,
			priority: 0,
		}
	}

	pub fn factory<F, Fut>(token: Token, scope: Scope, deps: Vec<DependencyRequest>, factory: F) -> Self
	where
		F: Fn(ResolvedDeps) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = DiResult<Instance>> + Send + 'static,
	{
		Self {
			token,
			kind: ProviderKind::Factory {
				deps,
				factory: Arc::new(move |deps| Box::pin(factory(deps))),
			},
			scope,
			priority: 0,
		}
	}

	pub fn alias(token: Token, target: Token) -> Self {
		Self {
			token,
			kind: ProviderKind::Alias(target),
			scope: Scope::Singleton,
			priority: 0,
		}
	}

	pub fn with_priority(mut self, priority: i32) -> Self {
		self.priority = priority;
		self
	}
}
