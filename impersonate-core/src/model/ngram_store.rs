use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::StorageResult;
use crate::storage::{Storage, key};

/// Direction of a transition relative to a gram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	/// Tokens observed right after the gram.
	Next,
	/// Tokens observed right before the gram.
	Prev,
}

impl Direction {
	fn field(self) -> &'static str {
		match self {
			Direction::Next => "next",
			Direction::Prev => "prev",
		}
	}
}

/// One training window: a gram and its neighbouring tokens.
///
/// `prev` and `next` are the empty sentinel at sequence boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Window {
	pub gram: String,
	pub prev: String,
	pub next: String,
}

/// Where the count of a candidate member is read from.
#[derive(Clone)]
enum CountSource {
	/// `count[member]` of the identity (members are grams).
	Gram(String),
	/// A field of the given transition hash (members are tokens).
	Field(String),
}

/// Persistent per-identity n-gram statistics.
///
/// For each identity the store keeps, through the storage backend:
/// - `grams`: set of known grams
/// - `count[gram]`: occurrences of the gram
/// - `nextCounts[gram]` / `nextSet[gram]`: following tokens and their counts
/// - `prevCounts[gram]` / `prevSet[gram]`: preceding tokens and their counts
///
/// A global `identities` set lists every identity holding a model.
///
/// # Invariants
/// - `count[gram] >= 1` for every gram in `grams`
/// - `sum(nextCounts[gram]) == count[gram]`, and likewise for `prevCounts`
///
/// Both hold because [`NGramStore::record`] is the only writer and updates the
/// three counters of a window together.
#[derive(Debug)]
pub struct NGramStore<S> {
	backend: Arc<S>,
}

impl<S> Clone for NGramStore<S> {
	fn clone(&self) -> Self {
		Self { backend: Arc::clone(&self.backend) }
	}
}

impl<S: Storage + 'static> NGramStore<S> {
	pub fn new(backend: Arc<S>) -> Self {
		Self { backend }
	}

	/// Returns the underlying backend.
	pub fn backend(&self) -> &Arc<S> {
		&self.backend
	}

	fn identities_key() -> String {
		key(&["identities"])
	}

	fn grams_key(identity: &str) -> String {
		key(&[identity, "grams"])
	}

	fn count_key(identity: &str, gram: &str) -> String {
		key(&[identity, "gram", gram, "count"])
	}

	fn set_key(identity: &str, gram: &str, direction: Direction) -> String {
		key(&[identity, "gram", gram, direction.field()])
	}

	fn counts_key(identity: &str, gram: &str, direction: Direction) -> String {
		key(&[identity, "gram", gram, direction.field(), "counts"])
	}

	/// Every identity that recorded at least one window, sorted.
	pub async fn identities(&self) -> StorageResult<Vec<String>> {
		let mut identities = self.backend.smembers(&Self::identities_key()).await?;
		identities.sort();
		Ok(identities)
	}

	/// Number of distinct grams known for `identity`.
	pub async fn size(&self, identity: &str) -> StorageResult<usize> {
		self.backend.scard(&Self::grams_key(identity)).await
	}

	/// Returns `true` if `gram` is known for `identity`.
	pub async fn contains(&self, identity: &str, gram: &str) -> StorageResult<bool> {
		self.backend.sismember(&Self::grams_key(identity), gram).await
	}

	/// Occurrence count of `gram` (0 if unknown).
	pub async fn count(&self, identity: &str, gram: &str) -> StorageResult<i64> {
		Ok(self.backend.get(&Self::count_key(identity, gram)).await?.unwrap_or(0))
	}

	/// Records a batch of windows for `identity`.
	///
	/// The identity joins the set of known identities first. Each window is
	/// then applied as six independent updates (gram set, count, next hash
	/// and set, prev hash and set). Windows are dispatched
	/// concurrently and the call completes once every update is acknowledged.
	///
	/// # Errors
	/// Returns the first storage error; updates already applied are kept.
	pub async fn record(&self, identity: &str, windows: Vec<Window>) -> StorageResult<()> {
		if windows.is_empty() {
			return Ok(());
		}
		self.backend.sadd(&Self::identities_key(), identity).await?;

		let mut tasks = JoinSet::new();

		for window in windows {
			let backend = Arc::clone(&self.backend);
			let grams = Self::grams_key(identity);
			let count = Self::count_key(identity, &window.gram);
			let next_counts = Self::counts_key(identity, &window.gram, Direction::Next);
			let next_set = Self::set_key(identity, &window.gram, Direction::Next);
			let prev_counts = Self::counts_key(identity, &window.gram, Direction::Prev);
			let prev_set = Self::set_key(identity, &window.gram, Direction::Prev);

			tasks.spawn(async move {
				tokio::try_join!(
					backend.sadd(&grams, &window.gram),
					backend.incrby(&count, 1),
					backend.hincrby(&next_counts, &window.next, 1),
					backend.sadd(&next_set, &window.next),
					backend.hincrby(&prev_counts, &window.prev, 1),
					backend.sadd(&prev_set, &window.prev),
				)
				.map(|_| ())
			});
		}

		while let Some(result) = tasks.join_next().await {
			result??;
		}
		Ok(())
	}

	/// All grams of `identity` with their occurrence counts.
	pub async fn grams(&self, identity: &str) -> StorageResult<Vec<(String, i64)>> {
		self.with_counts(Self::grams_key(identity), CountSource::Gram(identity.to_owned()))
			.await
	}

	/// Tokens observed after (`Next`) or before (`Prev`) `gram`, with counts.
	///
	/// The empty sentinel is included when the gram was seen at a boundary.
	pub async fn transitions(
		&self,
		identity: &str,
		gram: &str,
		direction: Direction,
	) -> StorageResult<Vec<(String, i64)>> {
		self.with_counts(
			Self::set_key(identity, gram, direction),
			CountSource::Field(Self::counts_key(identity, gram, direction)),
		)
		.await
	}

	/// Reads the members of a set and fetches each member's count concurrently.
	///
	/// The result order is unspecified.
	async fn with_counts(&self, set_key: String, source: CountSource) -> StorageResult<Vec<(String, i64)>> {
		let members = self.backend.smembers(&set_key).await?;
		let mut tasks = JoinSet::new();

		for member in members {
			let backend = Arc::clone(&self.backend);
			let source = source.clone();
			tasks.spawn(async move {
				let count = match &source {
					CountSource::Gram(identity) => backend.get(&Self::count_key(identity, &member)).await?,
					CountSource::Field(hash_key) => backend.hget(hash_key, &member).await?,
				};
				StorageResult::Ok((member, count.unwrap_or(0)))
			});
		}

		let mut candidates = Vec::with_capacity(tasks.len());
		while let Some(result) = tasks.join_next().await {
			candidates.push(result??);
		}
		Ok(candidates)
	}
}
