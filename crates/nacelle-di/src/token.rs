use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A type-erased instance stored in and handed out by the container.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Identity of a registration in the container.
///
/// A token is either derived from a Rust type (including `dyn Trait` object
/// types) or an opaque string key for values that have no type of their own,
/// such as configuration entries.
///
/// Equality and hashing look only at the `TypeId` or the key string; the
/// human-readable type name rides along for error messages and logging.
///
/// # Examples
///
/// ```
/// use nacelle_di::Token;
///
/// struct UserService;
/// trait Repository {}
///
/// let by_type = Token::of::<UserService>();
/// let by_trait = Token::of::<dyn Repository>();
/// let by_key = Token::key("database.url");
///
/// assert_eq!(by_type, Token::of::<UserService>());
/// assert_ne!(by_type, by_trait);
/// assert_eq!(by_key, Token::key("database.url"));
/// ```
#[derive(Clone, Debug)]
pub enum Token {
	/// Identity derived from a Rust type.
	Type {
		id: TypeId,
		name: &'static str,
	},
	/// Opaque string identity.
	Key(Cow<'static, str>),
}

impl Token {
	/// Creates a token for the type `T`.
	///
	/// `T` may be unsized, so trait object tokens like
	/// `Token::of::<dyn Repository>()` work as well.
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self::Type {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
		}
	}

	/// Creates a token from an opaque string key.
	pub fn key(key: impl Into<Cow<'static, str>>) -> Self {
		Self::Key(key.into())
	}

	/// The full name of this token: the type path or the key string.
	pub fn name(&self) -> &str {
		match self {
			Self::Type { name, .. } => name,
			Self::Key(key) => key,
		}
	}

	/// The last path segment of the name, e.g. `UserService` for
	/// `my_app::services::UserService`. Key tokens return the key as-is.
	pub fn short_name(&self) -> &str {
		match self {
			Self::Type { name, .. } => name.rsplit("::").next().unwrap_or(name),
			Self::Key(key) => key,
		}
	}
}

impl PartialEq for Token {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Type { id: a, .. }, Self::Type { id: b, .. }) => a == b,
			(Self::Key(a), Self::Key(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for Token {}

impl Hash for Token {
	fn hash<H: Hasher>(&self, state: &mut H) {
		match self {
			Self::Type { id, .. } => {
				state.write_u8(0);
				id.hash(state);
			}
			Self::Key(key) => {
				state.write_u8(1);
				key.hash(state);
			}
		}
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.short_name())
	}
}
