//! Top-level module for the Markov engine.
//!
//! - Per-identity n-gram statistics (`NGramStore`)
//! - Capacity-bounded training (`Trainer`)
//! - Noisy-argmax weighted sampling (`Sampler`)
//! - Bidirectional chain walk (`Generator`)
//! - The facade tying them together (`Markov`)

/// Persistent per-identity n-gram statistics over a storage backend.
///
/// Handles key namespacing, concurrent batch updates and candidate lookups.
pub mod ngram_store;

/// Tokenization, capacity check and window recording.
pub mod trainer;

/// Weighted pseudo-random selection of grams and transitions.
pub mod sampler;

/// Seed selection, backward/forward chain walk and sanitization.
pub mod generator;

/// High-level engine exposing `train` and `respond`.
pub mod markov;
