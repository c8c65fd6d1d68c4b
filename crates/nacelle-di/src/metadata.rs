//! Side-table metadata describing injectable classes.
//!
//! Construction recipes live next to the container rather than on the types
//! themselves: a [`ClassDescriptor`] records the constructor dependency list,
//! a construction closure, and any post-construction field injections for one
//! concrete type. Descriptors and arbitrary auxiliary metadata are stored in
//! a [`MetadataStore`] keyed by token and optional member name.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{DiError, DiResult};
use crate::provider::DependencyRequest;
use crate::scope::Scope;
use crate::token::{Instance, Token};

/// Resolved constructor or factory arguments, positionally matching the
/// declared dependency list. Optional dependencies that could not be
/// resolved appear as `None`.
pub struct ResolvedDeps {
	values: Vec<Option<Instance>>,
}

impl ResolvedDeps {
	pub fn new(values: Vec<Option<Instance>>) -> Self {
		Self { values }
	}

	/// Takes the required dependency at `index` as `Arc<T>`.
	pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
		let slot = self
			.values
			.get(index)
			.ok_or_else(|| DiError::Construction(format!("constructor argument {index} missing")))?;
		let instance = slot
			.as_ref()
			.ok_or_else(|| DiError::Construction(format!("required dependency at index {index} was not resolved")))?;
		instance.clone().downcast::<T>().map_err(|_| DiError::TypeMismatch {
			token: format!("constructor argument {index}"),
			expected: std::any::type_name::<T>(),
		})
	}

	/// Takes the optional dependency at `index`, `None` when absent or of
	/// an unexpected type.
	pub fn get_optional<T: Send + Sync + 'static>(&self, index: usize) -> Option<Arc<T>> {
		self.values
			.get(index)?
			.as_ref()
			.and_then(|instance| instance.clone().downcast::<T>().ok())
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

type ConstructFn = Arc<dyn Fn(ResolvedDeps) -> DiResult<Box<dyn Any + Send + Sync>> + Send + Sync>;
type FieldApplyFn = Arc<dyn Fn(&mut dyn Any, Option<Instance>) -> DiResult<()> + Send + Sync>;

/// A field set after construction, outside the constructor argument list.
pub struct FieldInjection {
	request: DependencyRequest,
	apply: FieldApplyFn,
}

impl FieldInjection {
	pub fn request(&self) -> &DependencyRequest {
		&self.request
	}

	pub fn apply(&self, target: &mut dyn Any, dep: Option<Instance>) -> DiResult<()> {
		(self.apply)(target, dep)
	}
}

/// Construction recipe for one concrete class.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use nacelle_di::{ClassDescriptor, DependencyRequest, Scope, Token};
///
/// struct Config { url: String }
/// struct Database { config: Arc<Config> }
///
/// let descriptor = ClassDescriptor::new::<Database, _>(
/// 	Scope::Singleton,
/// 	vec![DependencyRequest::required(Token::of::<Config>())],
/// 	|deps| Ok(Database { config: deps.get::<Config>(0)? }),
/// );
/// assert_eq!(descriptor.token(), &Token::of::<Database>());
/// ```
pub struct ClassDescriptor {
	token: Token,
	type_name: &'static str,
	scope: Scope,
	ctor: Vec<DependencyRequest>,
	construct: ConstructFn,
	fields: Vec<FieldInjection>,
}

impl ClassDescriptor {
	pub fn new<T, F>(scope: Scope, ctor: Vec<DependencyRequest>, construct: F) -> Self
	where
		T: Send + Sync + 'static,
		F: Fn(ResolvedDeps) -> DiResult<T> + Send + Sync + 'static,
	{
		Self {
			token: Token::of::<T>(),
			type_name: std::any::type_name::<T>(),
			scope,
			ctor,
			construct: Arc::new(move |deps| Ok(Box::new(construct(deps)?) as Box<dyn Any + Send + Sync>)),
			fields: Vec::new(),
		}
	}

	/// Declares a field injection applied after the constructor runs.
	///
	/// The setter receives `None` when the dependency is optional and
	/// unresolvable.
	pub fn with_field<T, D>(
		mut self,
		request: DependencyRequest,
		set: impl Fn(&mut T, Option<Arc<D>>) + Send + Sync + 'static,
	) -> Self
	where
		T: Send + Sync + 'static,
		D: Send + Sync + 'static,
	{
		let apply: FieldApplyFn = Arc::new(move |target, dep| {
			let target = target.downcast_mut::<T>().ok_or(DiError::TypeMismatch {
				token: std::any::type_name::<T>().to_string(),
				expected: std::any::type_name::<T>(),
			})?;
			let dep = match dep {
				None => None,
				Some(instance) => Some(instance.downcast::<D>().map_err(|_| DiError::TypeMismatch {
					token: std::any::type_name::<T>().to_string(),
					expected: std::any::type_name::<D>(),
				})?),
			};
			set(target, dep);
			Ok(())
		});
		self.fields.push(FieldInjection { request, apply });
		self
	}

	pub fn token(&self) -> &Token {
		&self.token
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	pub fn scope(&self) -> Scope {
		self.scope
	}

	pub fn ctor(&self) -> &[DependencyRequest] {
		&self.ctor
	}

	pub fn fields(&self) -> &[FieldInjection] {
		&self.fields
	}

	pub fn construct(&self, deps: ResolvedDeps) -> DiResult<Box<dyn Any + Send + Sync>> {
		(self.construct)(deps)
	}
}

/// Addresses a metadata entry: a token plus an optional member name for
/// per-member annotations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MetadataKey {
	pub target: Token,
	pub member: Option<Cow<'static, str>>,
}

impl MetadataKey {
	pub fn target(token: Token) -> Self {
		Self { target: token, member: None }
	}

	pub fn member(token: Token, member: impl Into<Cow<'static, str>>) -> Self {
		Self { target: token, member: Some(member.into()) }
	}
}

/// Type-erased associative metadata store.
#[derive(Default)]
pub struct MetadataStore {
	entries: RwLock<HashMap<MetadataKey, Instance>>,
}

impl MetadataStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert<T: Send + Sync + 'static>(&self, key: MetadataKey, value: T) {
		let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
		entries.insert(key, Arc::new(value));
	}

	pub fn get<T: Send + Sync + 'static>(&self, key: &MetadataKey) -> Option<Arc<T>> {
		let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
		entries.get(key).cloned()?.downcast::<T>().ok()
	}

	pub fn contains(&self, key: &MetadataKey) -> bool {
		let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
		entries.contains_key(key)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Config;
	struct Logger;
	struct Service {
		config: Arc<Config>,
		logger: Option<Arc<Logger>>,
	}

	#[test]
	fn descriptor_constructs_from_resolved_deps() {
		let descriptor = ClassDescriptor::new::<Service, _>(
			Scope::Transient,
			vec![DependencyRequest::required(Token::of::<Config>())],
			|deps| {
				Ok(Service {
					config: deps.get::<Config>(0)?,
					logger: None,
				})
			},
		);

		let built = descriptor
			.construct(ResolvedDeps::new(vec![Some(Arc::new(Config))]))
			.unwrap();
		let service = built.downcast::<Service>().unwrap();
		assert!(service.logger.is_none());
		let _ = service.config;
	}

	#[test]
	fn missing_required_dep_fails_construction() {
		let descriptor = ClassDescriptor::new::<Service, _>(
			Scope::Transient,
			vec![DependencyRequest::required(Token::of::<Config>())],
			|deps| {
				Ok(Service {
					config: deps.get::<Config>(0)?,
					logger: None,
				})
			},
		);

		let result = descriptor.construct(ResolvedDeps::new(vec![None]));
		assert!(matches!(result, Err(DiError::Construction(_))));
	}

	#[test]
	fn field_injection_sets_the_field_after_construction() {
		let descriptor = ClassDescriptor::new::<Service, _>(
			Scope::Transient,
			vec![DependencyRequest::required(Token::of::<Config>())],
			|deps| {
				Ok(Service {
					config: deps.get::<Config>(0)?,
					logger: None,
				})
			},
		)
		.with_field::<Service, Logger>(
			DependencyRequest::optional(Token::of::<Logger>()),
			|service, logger| service.logger = logger,
		);

		let mut built = descriptor
			.construct(ResolvedDeps::new(vec![Some(Arc::new(Config))]))
			.unwrap();
		let field = &descriptor.fields()[0];
		field.apply(built.as_mut(), Some(Arc::new(Logger))).unwrap();

		let service = built.downcast::<Service>().unwrap();
		assert!(service.logger.is_some());
	}

	#[test]
	fn metadata_store_round_trips_typed_entries() {
		let store = MetadataStore::new();
		let key = MetadataKey::member(Token::of::<Service>(), "handler");

		store.insert(key.clone(), 42_u32);
		assert_eq!(store.get::<u32>(&key).as_deref(), Some(&42));
		assert!(store.get::<String>(&key).is_none());
		assert!(!store.contains(&MetadataKey::target(Token::of::<Service>())));
	}
}
