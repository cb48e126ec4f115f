use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;

use log::info;
use serde::{Deserialize, Serialize};

use super::Storage;
use crate::error::{StorageError, StorageResult};

/// A value held under a single key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
enum Value {
	Set(HashSet<String>),
	Int(i64),
	Hash(HashMap<String, i64>),
}

/// In-process implementation of [`Storage`].
///
/// The key space lives in a `RwLock`ed map; the lock is taken for the
/// duration of one operation only, so futures returned by this backend are
/// immediately ready and never hold the lock across a suspension point.
///
/// The whole key space can be saved to and restored from a binary snapshot
/// (postcard encoding).
#[derive(Debug, Default)]
pub struct MemoryStorage {
	entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStorage {
	/// Creates an empty storage.
	pub fn new() -> Self {
		Self::default()
	}

	/// Restores a storage from a snapshot written by [`MemoryStorage::save`].
	///
	/// # Errors
	/// Returns an error if the file cannot be read or decoded.
	pub fn load<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
		let bytes = std::fs::read(&path)?;
		let entries: HashMap<String, Value> = postcard::from_bytes(&bytes)?;
		info!("Loaded {} keys from {}", entries.len(), path.as_ref().display());
		Ok(Self { entries: RwLock::new(entries) })
	}

	/// Restores a storage from `path` if it exists, otherwise starts empty.
	pub fn load_or_default<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
		if path.as_ref().exists() {
			Self::load(path)
		} else {
			Ok(Self::new())
		}
	}

	/// Writes the whole key space to `path`.
	///
	/// # Errors
	/// Returns an error if the lock is poisoned, encoding fails or the file
	/// cannot be written.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> StorageResult<()> {
		let bytes = {
			let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
			postcard::to_stdvec(&*entries)?
		};
		std::fs::write(&path, bytes)?;
		info!("Saved snapshot to {}", path.as_ref().display());
		Ok(())
	}

	/// Number of keys currently stored.
	///
	/// # Errors
	/// Returns an error if the lock is poisoned.
	pub fn len(&self) -> StorageResult<usize> {
		let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
		Ok(entries.len())
	}

	/// Returns `true` if no key is stored.
	///
	/// # Errors
	/// Returns an error if the lock is poisoned.
	pub fn is_empty(&self) -> StorageResult<bool> {
		Ok(self.len()? == 0)
	}

	fn read<R>(&self, key: &str, f: impl FnOnce(Option<&Value>) -> StorageResult<R>) -> StorageResult<R> {
		let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
		f(entries.get(key))
	}

	fn write<R>(&self, key: &str, empty: Value, f: impl FnOnce(&mut Value) -> StorageResult<R>) -> StorageResult<R> {
		let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
		f(entries.entry(key.to_owned()).or_insert(empty))
	}
}

fn wrong_type<R>(key: &str) -> StorageResult<R> {
	Err(StorageError::WrongType(key.to_owned()))
}

impl Storage for MemoryStorage {
	async fn sadd(&self, key: &str, member: &str) -> StorageResult<bool> {
		self.write(key, Value::Set(HashSet::new()), |value| match value {
			Value::Set(set) => Ok(set.insert(member.to_owned())),
			_ => wrong_type(key),
		})
	}

	async fn smembers(&self, key: &str) -> StorageResult<Vec<String>> {
		self.read(key, |value| match value {
			None => Ok(Vec::new()),
			Some(Value::Set(set)) => Ok(set.iter().cloned().collect()),
			Some(_) => wrong_type(key),
		})
	}

	async fn scard(&self, key: &str) -> StorageResult<usize> {
		self.read(key, |value| match value {
			None => Ok(0),
			Some(Value::Set(set)) => Ok(set.len()),
			Some(_) => wrong_type(key),
		})
	}

	async fn sismember(&self, key: &str, member: &str) -> StorageResult<bool> {
		self.read(key, |value| match value {
			None => Ok(false),
			Some(Value::Set(set)) => Ok(set.contains(member)),
			Some(_) => wrong_type(key),
		})
	}

	async fn get(&self, key: &str) -> StorageResult<Option<i64>> {
		self.read(key, |value| match value {
			None => Ok(None),
			Some(Value::Int(n)) => Ok(Some(*n)),
			Some(_) => wrong_type(key),
		})
	}

	async fn incrby(&self, key: &str, by: i64) -> StorageResult<i64> {
		self.write(key, Value::Int(0), |value| match value {
			Value::Int(n) => {
				*n += by;
				Ok(*n)
			}
			_ => wrong_type(key),
		})
	}

	async fn hget(&self, key: &str, field: &str) -> StorageResult<Option<i64>> {
		self.read(key, |value| match value {
			None => Ok(None),
			Some(Value::Hash(hash)) => Ok(hash.get(field).copied()),
			Some(_) => wrong_type(key),
		})
	}

	async fn hincrby(&self, key: &str, field: &str, by: i64) -> StorageResult<i64> {
		self.write(key, Value::Hash(HashMap::new()), |value| match value {
			Value::Hash(hash) => {
				let n = hash.entry(field.to_owned()).or_insert(0);
				*n += by;
				Ok(*n)
			}
			_ => wrong_type(key),
		})
	}
}
