use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, trace};

use crate::bindings::ImplementationRecord;
use crate::cycle;
use crate::error::{DiError, DiResult};
use crate::metadata::{ClassDescriptor, ResolvedDeps};
use crate::provider::{DependencyRequest, FactoryFn, ProviderKind, ProviderRegistration};
use crate::registry::Registry;
use crate::scope::{RequestScope, Scope, SingletonScope};
use crate::token::{Instance, Token};

/// The dependency injection container.
///
/// A container pairs a [`Registry`] of registrations with a singleton
/// cache. Resolution walks the dependency graph recursively, constructing
/// instances according to their declared scope and detecting cycles along
/// the way.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use nacelle_di::{ClassDescriptor, Container, DependencyRequest, Scope, Token};
///
/// struct Config { url: String }
/// struct Database { config: Arc<Config> }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), nacelle_di::DiError> {
/// let container = Container::new();
/// container.register_value(Config { url: "postgres://localhost".into() });
/// container.register_class(ClassDescriptor::new::<Database, _>(
/// 	Scope::Singleton,
/// 	vec![DependencyRequest::required(Token::of::<Config>())],
/// 	|deps| Ok(Database { config: deps.get::<Config>(0)? }),
/// ));
///
/// let db = container.resolve::<Database>().await?;
/// assert_eq!(db.config.url, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
pub struct Container {
	registry: Arc<Registry>,
	singletons: SingletonScope,
}

impl Default for Container {
	fn default() -> Self {
		Self::new()
	}
}

impl Container {
	pub fn new() -> Self {
		Self::with_registry(Arc::new(Registry::new()))
	}

	/// Builds a container over an existing registry, e.g. one shared with
	/// other containers or populated ahead of time.
	pub fn with_registry(registry: Arc<Registry>) -> Self {
		Self {
			registry,
			singletons: SingletonScope::new(),
		}
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	// --- registration ---

	/// Registers `value` as a singleton value provider under its own type
	/// token.
	pub fn register_value<T: Send + Sync + 'static>(&self, value: T) {
		self.register_instance(Arc::new(value));
	}

	/// Like [`register_value`](Self::register_value) for an already shared
	/// instance.
	pub fn register_instance<T: Send + Sync + 'static>(&self, instance: Arc<T>) {
		self.registry
			.register_provider(ProviderRegistration::value(Token::of::<T>(), instance));
	}

	/// Registers a precomputed instance under an explicit token, typically
	/// a [`Token::key`].
	pub fn register_value_token(&self, token: Token, instance: Instance) {
		self.registry.register_provider(ProviderRegistration::value(token, instance));
	}

	/// Registers a provider, failing on an already-taken token.
	pub fn register_unique(&self, registration: ProviderRegistration) -> DiResult<()> {
		self.registry.register_provider_unique(registration)
	}

	pub fn register_provider(&self, registration: ProviderRegistration) {
		self.registry.register_provider(registration);
	}

	/// Registers an async factory with its dependency list.
	pub fn register_factory<F, Fut>(&self, token: Token, scope: Scope, deps: Vec<DependencyRequest>, factory: F)
	where
		F: Fn(ResolvedDeps) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = DiResult<Instance>> + Send + 'static,
	{
		self.registry
			.register_provider(ProviderRegistration::factory(token, scope, deps, factory));
	}

	/// Registers `token` as an alias resolving to `target`.
	pub fn register_alias(&self, token: Token, target: Token) {
		self.registry.register_provider(ProviderRegistration::alias(token, target));
	}

	pub fn register_class(&self, descriptor: ClassDescriptor) {
		self.registry.register_class(descriptor);
	}

	/// Binds an implementation to an abstract token, usually a
	/// `Token::of::<dyn Trait>()`.
	pub fn bind(&self, abstract_token: Token, record: ImplementationRecord) {
		self.registry.add_implementation(abstract_token, record);
	}

	pub fn set_primary(&self, abstract_token: &Token, class: &Token) {
		self.registry.set_primary(abstract_token, class);
	}

	// --- introspection ---

	/// Whether the token is resolvable: registered or already cached.
	pub fn has(&self, token: &Token) -> bool {
		self.singletons.contains(token) || self.registry.has(token)
	}

	pub fn scope_of(&self, token: &Token) -> Option<Scope> {
		self.registry.scope_of(token)
	}

	/// Drops all cached singletons, forcing fresh construction on the next
	/// resolution. Intended for tests.
	pub fn clear_singletons(&self) {
		self.singletons.clear();
	}

	// --- resolution ---

	pub async fn resolve<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
		let token = Token::of::<T>();
		let instance = self.resolve_token(&token).await?;
		downcast::<T>(&token, instance)
	}

	/// Resolves `T` with a request scope available for request-scoped
	/// registrations along the dependency graph.
	pub async fn resolve_in<T: Send + Sync + 'static>(&self, scope: &RequestScope) -> DiResult<Arc<T>> {
		let token = Token::of::<T>();
		let instance = self.resolve_token_in(&token, scope).await?;
		downcast::<T>(&token, instance)
	}

	pub async fn resolve_token(&self, token: &Token) -> DiResult<Instance> {
		cycle::with_resolution_scope(self.resolve_inner(token, None, None)).await
	}

	pub async fn resolve_token_in(&self, token: &Token, scope: &RequestScope) -> DiResult<Instance> {
		cycle::with_resolution_scope(self.resolve_inner(token, Some(scope), None)).await
	}

	/// Resolves `T`, mapping every resolution failure to `None`.
	pub async fn resolve_optional<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
		self.resolve::<T>().await.ok()
	}

	pub async fn resolve_optional_token(&self, token: &Token) -> Option<Instance> {
		self.resolve_token(token).await.ok()
	}

	/// Eagerly resolves every singleton provider in descending priority
	/// order. Failures abort the warm-up and propagate.
	pub async fn initialize(&self) -> DiResult<()> {
		for registration in self.registry.providers_by_priority() {
			if registration.scope == Scope::Singleton {
				debug!(token = %registration.token, priority = registration.priority, "eagerly initializing");
				self.resolve_token(&registration.token).await?;
			}
		}
		Ok(())
	}

	/// Recursive resolution step. Boxed because async recursion needs an
	/// indirection, matching the iterative walk over the dependency graph.
	fn resolve_inner<'a>(
		&'a self,
		token: &'a Token,
		request: Option<&'a RequestScope>,
		qualifier: Option<&'a str>,
	) -> BoxFuture<'a, DiResult<Instance>> {
		Box::pin(async move {
			if let Some(hit) = self.singletons.get(token) {
				trace!(token = %token, "singleton cache hit");
				return Ok(hit);
			}

			if let Some(registration) = self.registry.provider(token) {
				return match registration.kind {
					ProviderKind::Value(instance) => Ok(instance),
					ProviderKind::Alias(target) => {
						let _guard = cycle::begin_resolution(token)?;
						self.resolve_inner(&target, request, qualifier).await
					}
					ProviderKind::Factory { deps, factory } => {
						let _guard = cycle::begin_resolution(token)?;
						self.resolve_factory(token, registration.scope, &deps, &factory, request).await
					}
				};
			}

			if let Some(bindings) = self.registry.bindings_for(token) {
				let record = bindings.select(token, qualifier)?.clone();
				// The instance is cached under the abstract token with the
				// implementation's scope; the implementation's own token is
				// left untouched.
				if let Some(descriptor) = self.registry.class(&record.class) {
					return self.resolve_class(token, &descriptor, request).await;
				}
				// The implementation may also be an ordinary provider.
				return self.resolve_bound_provider(token, &record.class, request).await;
			}

			if let Some(descriptor) = self.registry.class(token) {
				return self.resolve_class(token, &descriptor, request).await;
			}

			Err(DiError::UnresolvedToken {
				token: token.name().to_string(),
			})
		})
	}

	/// Resolves a bound implementation through its own provider, caching
	/// the result under the abstract token with the provider's scope.
	async fn resolve_bound_provider(
		&self,
		cache_token: &Token,
		class: &Token,
		request: Option<&RequestScope>,
	) -> DiResult<Instance> {
		let scope = self.registry.scope_of(class).ok_or_else(|| DiError::UnresolvedToken {
			token: class.name().to_string(),
		})?;
		match scope {
			Scope::Singleton => {
				if let Some(hit) = self.singletons.get(cache_token) {
					return Ok(hit);
				}
				let instance = self.resolve_inner(class, request, None).await?;
				self.singletons.insert(cache_token.clone(), instance.clone());
				Ok(instance)
			}
			Scope::Request => {
				let scope = request.ok_or_else(|| DiError::RequestScopeViolation {
					token: cache_token.name().to_string(),
				})?;
				if let Some(hit) = scope.get(cache_token) {
					return Ok(hit);
				}
				let instance = self.resolve_inner(class, request, None).await?;
				scope.insert(cache_token.clone(), instance.clone());
				Ok(instance)
			}
			Scope::Transient => self.resolve_inner(class, request, None).await,
		}
	}

	/// Applies scope caching around class construction. `cache_token` is
	/// the token the caller resolved, which for abstract bindings differs
	/// from the descriptor's own token.
	async fn resolve_class(
		&self,
		cache_token: &Token,
		descriptor: &ClassDescriptor,
		request: Option<&RequestScope>,
	) -> DiResult<Instance> {
		match descriptor.scope() {
			Scope::Singleton => {
				if let Some(hit) = self.singletons.get(cache_token) {
					return Ok(hit);
				}
				let instance = self.construct_class(cache_token, descriptor, request).await?;
				self.singletons.insert(cache_token.clone(), instance.clone());
				Ok(instance)
			}
			Scope::Request => {
				let scope = request.ok_or_else(|| DiError::RequestScopeViolation {
					token: cache_token.name().to_string(),
				})?;
				if let Some(hit) = scope.get(cache_token) {
					return Ok(hit);
				}
				let instance = self.construct_class(cache_token, descriptor, request).await?;
				scope.insert(cache_token.clone(), instance.clone());
				Ok(instance)
			}
			Scope::Transient => self.construct_class(cache_token, descriptor, request).await,
		}
	}

	async fn construct_class(
		&self,
		guard_token: &Token,
		descriptor: &ClassDescriptor,
		request: Option<&RequestScope>,
	) -> DiResult<Instance> {
		let _guard = cycle::begin_resolution(guard_token)?;
		trace!(token = %guard_token, class = descriptor.type_name(), "constructing");

		let mut args = Vec::with_capacity(descriptor.ctor().len());
		for dep in descriptor.ctor() {
			args.push(self.resolve_dependency(dep, request).await?);
		}
		let mut instance = descriptor.construct(ResolvedDeps::new(args))?;

		for field in descriptor.fields() {
			let dep = self.resolve_dependency(field.request(), request).await?;
			field.apply(instance.as_mut(), dep)?;
		}

		Ok(Arc::from(instance))
	}

	async fn resolve_factory(
		&self,
		token: &Token,
		scope: Scope,
		deps: &[DependencyRequest],
		factory: &FactoryFn,
		request: Option<&RequestScope>,
	) -> DiResult<Instance> {
		match scope {
			Scope::Singleton => {
				if let Some(hit) = self.singletons.get(token) {
					return Ok(hit);
				}
				let instance = self.run_factory(token, deps, factory, request).await?;
				self.singletons.insert(token.clone(), instance.clone());
				Ok(instance)
			}
			Scope::Request => {
				let scope = request.ok_or_else(|| DiError::RequestScopeViolation {
					token: token.name().to_string(),
				})?;
				if let Some(hit) = scope.get(token) {
					return Ok(hit);
				}
				let instance = self.run_factory(token, deps, factory, request).await?;
				scope.insert(token.clone(), instance.clone());
				Ok(instance)
			}
			Scope::Transient => self.run_factory(token, deps, factory, request).await,
		}
	}

	async fn run_factory(
		&self,
		token: &Token,
		deps: &[DependencyRequest],
		factory: &FactoryFn,
		request: Option<&RequestScope>,
	) -> DiResult<Instance> {
		trace!(token = %token, "running factory");
		let mut args = Vec::with_capacity(deps.len());
		for dep in deps {
			args.push(self.resolve_dependency(dep, request).await?);
		}
		factory(ResolvedDeps::new(args)).await
	}

	async fn resolve_dependency(
		&self,
		dep: &DependencyRequest,
		request: Option<&RequestScope>,
	) -> DiResult<Option<Instance>> {
		match self.resolve_inner(&dep.token, request, dep.name.as_deref()).await {
			Ok(instance) => Ok(Some(instance)),
			Err(err) if dep.optional => {
				trace!(token = %dep.token, error = %err, "optional dependency unresolved");
				Ok(None)
			}
			Err(err) => Err(err),
		}
	}
}

fn downcast<T: Send + Sync + 'static>(token: &Token, instance: Instance) -> DiResult<Arc<T>> {
	instance.downcast::<T>().map_err(|_| DiError::TypeMismatch {
		token: token.name().to_string(),
		expected: std::any::type_name::<T>(),
	})
}
