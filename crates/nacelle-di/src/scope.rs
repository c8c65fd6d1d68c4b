use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::token::{Instance, Token};

/// Lifetime of instances produced for a registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scope {
	/// One instance per container, cached on first resolution.
	#[default]
	Singleton,
	/// A fresh instance on every resolution, never cached.
	Transient,
	/// One instance per request scope, cached in the [`RequestScope`]
	/// passed to the resolution.
	Request,
}

/// Container-wide cache for singleton instances, keyed by token.
#[derive(Default)]
pub struct SingletonScope {
	cache: RwLock<HashMap<Token, Instance>>,
}

impl SingletonScope {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, token: &Token) -> Option<Instance> {
		let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
		cache.get(token).cloned()
	}

	pub fn insert(&self, token: Token, instance: Instance) {
		let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
		cache.insert(token, instance);
	}

	pub fn contains(&self, token: &Token) -> bool {
		let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
		cache.contains_key(token)
	}

	/// Drops every cached singleton. Registrations are untouched, so the
	/// next resolution rebuilds from scratch.
	pub fn clear(&self) {
		let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
		cache.clear();
	}
}

/// Per-request instance cache.
///
/// Cloning is cheap and shares the underlying storage, so the same scope
/// can be handed to every resolution performed while serving one request.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use nacelle_di::{RequestScope, Token};
///
/// struct Session(u64);
///
/// let scope = RequestScope::new();
/// scope.insert(Token::of::<Session>(), Arc::new(Session(7)));
///
/// let shared = scope.clone();
/// assert!(shared.get(&Token::of::<Session>()).is_some());
/// ```
#[derive(Clone, Default)]
pub struct RequestScope {
	cache: Arc<RwLock<HashMap<Token, Instance>>>,
}

impl RequestScope {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, token: &Token) -> Option<Instance> {
		let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
		cache.get(token).cloned()
	}

	/// Downcasts a cached instance to `T`, returning `None` when the token
	/// is absent or holds a different type.
	pub fn get_as<T: Send + Sync + 'static>(&self, token: &Token) -> Option<Arc<T>> {
		self.get(token).and_then(|instance| instance.downcast::<T>().ok())
	}

	pub fn insert(&self, token: Token, instance: Instance) {
		let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
		cache.insert(token, instance);
	}

	pub fn contains(&self, token: &Token) -> bool {
		let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
		cache.contains_key(token)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Counter(u32);

	#[test]
	fn singleton_scope_returns_the_stored_instance() {
		let scope = SingletonScope::new();
		let token = Token::of::<Counter>();

		assert!(scope.get(&token).is_none());
		scope.insert(token.clone(), Arc::new(Counter(1)));

		let hit = scope.get(&token).unwrap();
		assert_eq!(hit.downcast::<Counter>().unwrap().0, 1);
	}

	#[test]
	fn clear_empties_the_singleton_cache() {
		let scope = SingletonScope::new();
		let token = Token::of::<Counter>();
		scope.insert(token.clone(), Arc::new(Counter(1)));

		scope.clear();
		assert!(!scope.contains(&token));
	}

	#[test]
	fn request_scope_clones_share_storage() {
		let scope = RequestScope::new();
		let token = Token::of::<Counter>();

		let clone = scope.clone();
		clone.insert(token.clone(), Arc::new(Counter(2)));

		let hit = scope.get_as::<Counter>(&token).unwrap();
		assert_eq!(hit.0, 2);
	}

	#[test]
	fn separate_request_scopes_are_isolated() {
		let first = RequestScope::new();
		let second = RequestScope::new();
		let token = Token::of::<Counter>();

		first.insert(token.clone(), Arc::new(Counter(3)));
		assert!(second.get(&token).is_none());
	}
}
