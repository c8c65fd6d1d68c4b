use crate::error::{DiError, DiResult};
use crate::token::Token;

/// One concrete implementation bound to an abstract token.
#[derive(Clone, Debug)]
pub struct ImplementationRecord {
	/// Token of the concrete class providing the implementation.
	pub class: Token,
	/// Qualifier for named lookups.
	pub name: Option<String>,
	/// Marks the implementation the container picks when several are bound.
	pub is_primary: bool,
}

impl ImplementationRecord {
	pub fn new(class: Token) -> Self {
		Self { class, name: None, is_primary: false }
	}

	pub fn named(class: Token, name: impl Into<String>) -> Self {
		Self { class, name: Some(name.into()), is_primary: false }
	}

	pub fn primary(class: Token) -> Self {
		Self { class, name: None, is_primary: true }
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}
}

/// All implementations bound to one abstract token, with the selection
/// rule used at resolution time.
#[derive(Clone, Debug, Default)]
pub struct BindingSet {
	records: Vec<ImplementationRecord>,
}

impl BindingSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces the record for the implementation class. At most
	/// one record per set is primary: marking a new one demotes the rest.
	pub fn add(&mut self, record: ImplementationRecord) {
		if record.is_primary {
			for existing in &mut self.records {
				existing.is_primary = false;
			}
		}
		if let Some(existing) = self.records.iter_mut().find(|r| r.class == record.class) {
			*existing = record;
		} else {
			self.records.push(record);
		}
	}

	/// Promotes the record for `class`, demoting any other primary.
	pub fn set_primary(&mut self, class: &Token) {
		for record in &mut self.records {
			record.is_primary = &record.class == class;
		}
	}

	pub fn records(&self) -> &[ImplementationRecord] {
		&self.records
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Picks the implementation for a resolution of `token`.
	///
	/// A qualifier matches by name only. Without one, a sole record wins
	/// outright, otherwise exactly one primary must exist.
	pub fn select(&self, token: &Token, name: Option<&str>) -> DiResult<&ImplementationRecord> {
		if let Some(name) = name {
			return self
				.records
				.iter()
				.find(|r| r.name.as_deref() == Some(name))
				.ok_or_else(|| DiError::NamedImplementationNotFound {
					token: token.name().to_string(),
					name: name.to_string(),
					available: self.names(),
				});
		}
		if self.records.len() == 1 {
			return Ok(&self.records[0]);
		}
		let mut primaries = self.records.iter().filter(|r| r.is_primary);
		match (primaries.next(), primaries.next()) {
			(Some(record), None) => Ok(record),
			_ => Err(DiError::AmbiguousBinding {
				token: token.name().to_string(),
				candidates: self.records.iter().map(|r| r.class.short_name().to_string()).collect(),
			}),
		}
	}

	fn names(&self) -> Vec<String> {
		self.records.iter().filter_map(|r| r.name.clone()).collect()
	}
}
