//! Abstract key-value storage consumed by the n-gram store.
//!
//! The interface mirrors a small subset of a Redis-like service: sets,
//! integer counters and hashes of integer fields. Every operation is a
//! suspension point and returns a `Send` future so that batches of
//! independent updates can be dispatched concurrently.

use std::future::Future;

use crate::error::StorageResult;

/// In-process backend with snapshot persistence.
pub mod memory;

/// Key-value service backing the per-identity statistics.
///
/// # Invariants
/// - A key holds a single value type (set, integer or hash); using a key with
///   another type fails with `StorageError::WrongType`.
/// - Missing keys behave as empty sets, zero counters and empty hashes.
pub trait Storage: Send + Sync {
	/// Adds `member` to the set at `key`. Returns `true` if it was not present.
	fn sadd(&self, key: &str, member: &str) -> impl Future<Output = StorageResult<bool>> + Send;

	/// Returns all members of the set at `key`, in no particular order.
	fn smembers(&self, key: &str) -> impl Future<Output = StorageResult<Vec<String>>> + Send;

	/// Returns the cardinality of the set at `key`.
	fn scard(&self, key: &str) -> impl Future<Output = StorageResult<usize>> + Send;

	/// Returns `true` if `member` belongs to the set at `key`.
	fn sismember(&self, key: &str, member: &str) -> impl Future<Output = StorageResult<bool>> + Send;

	/// Returns the integer at `key`, if any.
	fn get(&self, key: &str) -> impl Future<Output = StorageResult<Option<i64>>> + Send;

	/// Increments the integer at `key` by `by` and returns the new value.
	fn incrby(&self, key: &str, by: i64) -> impl Future<Output = StorageResult<i64>> + Send;

	/// Returns the integer stored in `field` of the hash at `key`, if any.
	fn hget(&self, key: &str, field: &str) -> impl Future<Output = StorageResult<Option<i64>>> + Send;

	/// Increments `field` of the hash at `key` by `by` and returns the new value.
	fn hincrby(&self, key: &str, field: &str, by: i64) -> impl Future<Output = StorageResult<i64>> + Send;
}

/// Builds a storage key from its parts.
///
/// Parts are escaped (`\` → `\\`, `:` → `\:`) and joined with `:`, so two
/// different part lists never produce the same key.
///
/// # Examples
///
/// ```
/// use impersonate_core::storage::key;
///
/// assert_eq!(key(&["u1", "grams"]), "u1:grams");
/// assert_eq!(key(&["a:b", "c"]), "a\\:b:c");
/// ```
pub fn key(parts: &[&str]) -> String {
	parts
		.iter()
		.map(|part| escape(part))
		.collect::<Vec<_>>()
		.join(":")
}

fn escape(part: &str) -> String {
	let mut escaped = String::with_capacity(part.len());
	for c in part.chars() {
		if c == '\\' || c == ':' {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_are_colon_joined() {
		assert_eq!(key(&["u1", "gram", "cat", "count"]), "u1:gram:cat:count");
	}

	#[test]
	fn separators_inside_parts_do_not_collide() {
		assert_ne!(key(&["a:b", "c"]), key(&["a", "b:c"]));
		assert_ne!(key(&["a\\", ":b"]), key(&["a\\:", "b"]));
		assert_ne!(key(&["u", "gram", "x:next", "counts"]), key(&["u", "gram", "x", "next:counts"]));
	}
}
