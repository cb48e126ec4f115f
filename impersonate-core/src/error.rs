//! Error types shared across the engine.
//!
//! Every failure is scoped to a single `train` / `respond` call; nothing here
//! is fatal to the process.

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Storage lock poisoned")]
	Poisoned,

	#[error("Wrong value type for key {0}")]
	WrongType(String),

	#[error("Storage task failed: {0}")]
	Task(#[from] tokio::task::JoinError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Serialization(#[from] postcard::Error),
}

/// Errors raised while building or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Invalid value for {name}: {value}")]
	InvalidValue { name: String, value: String },

	#[error("Invalid configuration: {0}")]
	Invalid(String),
}

/// Errors raised by a part-of-speech tagger.
#[derive(Debug, Error)]
pub enum TagError {
	#[error("Tagging failed: {0}")]
	Failed(String),
}

/// Top-level error of the Markov engine.
#[derive(Debug, Error)]
pub enum MarkovError {
	#[error(transparent)]
	Storage(#[from] StorageError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, MarkovError>;
