//! Markov-chain impersonation engine.
//!
//! This crate learns the writing style of an identity (a chat user or an
//! arbitrary subject) from observed text and generates new text from it:
//! - Tokenization and optional part-of-speech driven importance extraction
//! - Per-identity n-gram statistics behind an abstract key-value storage
//! - Noisy-argmax weighted sampling with a favor boost
//! - Bidirectional chain walk around a seed gram, followed by sanitization
//!
//! The engine holds no state beyond what the storage backend persists: every
//! call is scoped to the identity and text passed in.

/// Engine configuration (tokenization, capacity, order, sampling policy).
pub mod config;

/// Error types.
pub mod error;

/// File and path helpers (corpus loading, snapshot paths, data folders).
pub mod io;

/// Statistics store, trainer, sampler and generator.
pub mod model;

/// Abstract key-value storage and the in-memory backend.
pub mod storage;

/// Tokenizer, importance extraction and output sanitization.
pub mod text;

pub use config::{MarkovConfig, Weighting};
pub use error::{ConfigError, MarkovError, StorageError, TagError};
pub use model::markov::Markov;
pub use storage::Storage;
pub use storage::memory::MemoryStorage;
pub use text::importance::{HeuristicTagger, PosTagger};
