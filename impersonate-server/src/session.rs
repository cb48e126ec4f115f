use std::collections::BTreeMap;

/// A known chat user (or corpus subject).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
	pub id: String,
	pub name: String,
}

/// Impersonation state of the chat layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum State {
	#[default]
	Idle,
	Impersonating(String),
}

/// Mutable chat state: impersonation target, last message, known users.
///
/// Lives outside the engine, which only ever receives an identity and a text.
#[derive(Debug, Default)]
pub struct Session {
	state: State,
	last_message: Option<String>,
	/// id -> display name
	users: BTreeMap<String, String>,
}

impl Session {
	/// Registers (or renames) a user.
	pub fn register(&mut self, id: &str, name: &str) {
		self.users.insert(id.to_owned(), name.to_owned());
	}

	/// Registers `id` under its own name unless it is already known.
	pub fn ensure_registered(&mut self, id: &str) {
		self.users.entry(id.to_owned()).or_insert_with(|| id.to_owned());
	}

	pub fn user_name(&self, id: &str) -> Option<&str> {
		self.users.get(id).map(String::as_str)
	}

	/// Resolves a human-readable name to users.
	///
	/// Case-insensitive; exact name or id matches win over name prefixes,
	/// which win over substrings. Users are returned in id order.
	pub fn users_for_fuzzy_name(&self, name: &str) -> Vec<User> {
		let needle = name.trim().to_lowercase();
		if needle.is_empty() {
			return Vec::new();
		}

		let matching = |accept: &dyn Fn(&str, &str) -> bool| -> Vec<User> {
			self.users
				.iter()
				.filter(|(id, name)| accept(&id.to_lowercase(), &name.to_lowercase()))
				.map(|(id, name)| User { id: id.clone(), name: name.clone() })
				.collect()
		};

		let exact = matching(&|id, name| id == needle || name == needle);
		if !exact.is_empty() {
			return exact;
		}
		let prefix = matching(&|_, name| name.starts_with(&needle));
		if !prefix.is_empty() {
			return prefix;
		}
		matching(&|_, name| name.contains(&needle))
	}

	pub fn state(&self) -> &State {
		&self.state
	}

	/// Identity currently impersonated, if any.
	pub fn impersonating(&self) -> Option<&str> {
		match &self.state {
			State::Idle => None,
			State::Impersonating(id) => Some(id),
		}
	}

	pub fn impersonate(&mut self, id: &str) {
		self.state = State::Impersonating(id.to_owned());
	}

	/// Returns to idle, yielding the identity that was impersonated.
	pub fn stop(&mut self) -> Option<String> {
		match std::mem::take(&mut self.state) {
			State::Idle => None,
			State::Impersonating(id) => Some(id),
		}
	}

	pub fn record_message(&mut self, text: &str) {
		self.last_message = Some(text.to_owned());
	}

	pub fn last_message(&self) -> Option<&str> {
		self.last_message.as_deref()
	}
}
