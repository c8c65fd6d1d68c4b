use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::bindings::{BindingSet, ImplementationRecord};
use crate::error::{DiError, DiResult};
use crate::metadata::{ClassDescriptor, MetadataKey, MetadataStore};
use crate::provider::ProviderRegistration;
use crate::scope::Scope;
use crate::token::Token;

/// Registration catalog backing a container: providers, class descriptors,
/// and abstract bindings, all keyed by token.
///
/// Class descriptors live in the [`MetadataStore`] so that per-member
/// metadata recorded by higher layers shares the same table.
#[derive(Default)]
pub struct Registry {
	providers: RwLock<HashMap<Token, ProviderRegistration>>,
	bindings: RwLock<HashMap<Token, BindingSet>>,
	metadata: MetadataStore,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a provider, replacing any previous registration for the
	/// same token.
	pub fn register_provider(&self, registration: ProviderRegistration) {
		debug!(token = %registration.token, scope = ?registration.scope, "registering provider");
		let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
		providers.insert(registration.token.clone(), registration);
	}

	/// Registers a provider, failing when the token is already taken.
	pub fn register_provider_unique(&self, registration: ProviderRegistration) -> DiResult<()> {
		let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
		if providers.contains_key(&registration.token) {
			return Err(DiError::DuplicateRegistration {
				token: registration.token.name().to_string(),
			});
		}
		debug!(token = %registration.token, scope = ?registration.scope, "registering provider");
		providers.insert(registration.token.clone(), registration);
		Ok(())
	}

	pub fn provider(&self, token: &Token) -> Option<ProviderRegistration> {
		let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
		providers.get(token).cloned()
	}

	pub fn register_class(&self, descriptor: ClassDescriptor) {
		debug!(token = %descriptor.token(), scope = ?descriptor.scope(), "registering class");
		let key = MetadataKey::target(descriptor.token().clone());
		self.metadata.insert(key, descriptor);
	}

	pub fn class(&self, token: &Token) -> Option<Arc<ClassDescriptor>> {
		self.metadata.get::<ClassDescriptor>(&MetadataKey::target(token.clone()))
	}

	/// Binds a concrete implementation to an abstract token.
	pub fn add_implementation(&self, abstract_token: Token, record: ImplementationRecord) {
		debug!(token = %abstract_token, class = %record.class, primary = record.is_primary, "binding implementation");
		let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
		bindings.entry(abstract_token).or_default().add(record);
	}

	pub fn set_primary(&self, abstract_token: &Token, class: &Token) {
		let mut bindings = self.bindings.write().unwrap_or_else(PoisonError::into_inner);
		if let Some(set) = bindings.get_mut(abstract_token) {
			set.set_primary(class);
		}
	}

	pub fn bindings_for(&self, token: &Token) -> Option<BindingSet> {
		let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
		bindings.get(token).filter(|set| !set.is_empty()).cloned()
	}

	/// Whether the token can be resolved through any registration kind.
	pub fn has(&self, token: &Token) -> bool {
		{
			let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
			if providers.contains_key(token) {
				return true;
			}
		}
		if self.bindings_for(token).is_some() {
			return true;
		}
		self.class(token).is_some()
	}

	/// The declared scope of a token, from its provider or class
	/// descriptor. `None` when the token is unknown.
	pub fn scope_of(&self, token: &Token) -> Option<Scope> {
		{
			let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
			if let Some(registration) = providers.get(token) {
				return Some(registration.scope);
			}
		}
		self.class(token).map(|descriptor| descriptor.scope())
	}

	/// All providers ordered by descending priority, for eager
	/// initialization.
	pub fn providers_by_priority(&self) -> Vec<ProviderRegistration> {
		let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
		let mut ordered: Vec<_> = providers.values().cloned().collect();
		ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
		ordered
	}

	pub fn metadata(&self) -> &MetadataStore {
		&self.metadata
	}
}
