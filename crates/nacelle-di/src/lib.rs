//! Dependency injection container with scoped lifetimes.
//!
//! Registrations are keyed by [`Token`], which is either a Rust type
//! (including trait object types) or an opaque string key. Providers come
//! in four kinds: precomputed values, async factories, aliases, and class
//! descriptors carrying a constructor recipe plus field injections.
//! Abstract tokens can be bound to several implementations, disambiguated
//! by a primary marker or a name qualifier.
//!
//! Instances live according to their [`Scope`]: singletons are cached on
//! the container, request-scoped instances in a [`RequestScope`] passed to
//! the resolution, and transients are rebuilt every time. Circular
//! dependencies are detected per task and reported with the full cycle
//! path.

mod bindings;
mod container;
mod cycle;
mod error;
mod metadata;
mod provider;
mod registry;
mod scope;
mod token;

pub use bindings::{BindingSet, ImplementationRecord};
pub use container::Container;
pub use error::{DiError, DiResult};
pub use metadata::{ClassDescriptor, FieldInjection, MetadataKey, MetadataStore, ResolvedDeps};
pub use provider::{DependencyRequest, FactoryFn, ProviderKind, ProviderRegistration};
pub use registry::Registry;
pub use scope::{RequestScope, Scope, SingletonScope};
pub use token::{Instance, Token};
