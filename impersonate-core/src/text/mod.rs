//! Text processing around the Markov walk.
//!
//! - `Tokenizer`: normalizes raw text into tokens
//! - `ImportanceExtractor`: selects the noun/verb grams used to bias sampling
//! - `sanitize`: repairs the narrow punctuation defects of generated output

/// Whitespace tokenizer with case folding and punctuation stripping.
pub mod tokenizer;

/// Part-of-speech tagging and important gram extraction.
pub mod importance;

/// Output sanitization (unmatched quote, trailing comma).
pub mod sanitizer;
