use std::collections::VecDeque;

use log::debug;

use super::ngram_store::NGramStore;
use super::sampler::Sampler;
use crate::error::StorageResult;
use crate::storage::Storage;
use crate::text::importance::{ImportanceExtractor, PosTagger};
use crate::text::sanitizer::sanitize;
use crate::text::tokenizer::{Tokenizer, gram_tokens, has_content};

/// Builds responses by walking the transition graph around a seed gram.
///
/// # Responsibilities
/// - Pick a seed gram, favoring the important grams of the input
/// - Extend the seed backward through predecessors, then forward through
///   successors, up to a word limit
/// - Sanitize the joined words
///
/// The generator only reads the store.
#[derive(Debug, Clone)]
pub struct Generator<T> {
	tokenizer: Tokenizer,
	importance: ImportanceExtractor<T>,
	sampler: Sampler,
	order: usize,
	limit: usize,
}

impl<T: PosTagger> Generator<T> {
	pub fn new(
		tokenizer: Tokenizer,
		importance: ImportanceExtractor<T>,
		sampler: Sampler,
		order: usize,
		limit: usize,
	) -> Self {
		Self { tokenizer, importance, sampler, order: order.max(1), limit: limit.max(1) }
	}

	/// Generates a response to `text` in the style of `identity`.
	///
	/// # Parameters
	/// - `max_length`: maximum number of words; `0` uses the configured limit.
	///
	/// # Returns
	/// - `Ok("")` when nothing was learned for `identity` (no seed gram).
	/// - `Ok(response)` otherwise.
	///
	/// # Errors
	/// Propagates storage failures.
	pub async fn respond<S: Storage + 'static>(
		&self,
		store: &NGramStore<S>,
		text: &str,
		identity: &str,
		max_length: usize,
	) -> StorageResult<String> {
		let max_length = if max_length == 0 { self.limit } else { max_length };

		let tokens = self.tokenizer.tokenize(text);
		let important = if has_content(&tokens) {
			self.importance.important_grams(&tokens)
		} else {
			Vec::new()
		};

		let Some(seed) = self.sampler.pick_gram(store, &important, identity).await? else {
			debug!("No seed gram for {identity}");
			return Ok(String::new());
		};

		let words = self.fill(store, &seed, max_length, identity).await?;
		Ok(sanitize(&words.join(" ")))
	}

	/// Builds a sequence of at most `max_length` words around `seed`.
	///
	/// # Behavior
	/// - A seed whose first token is empty yields an empty sequence.
	/// - Backward phase: the leading `order` tokens probe for a predecessor,
	///   which is prepended; stops on the start sentinel, an unknown probe or
	///   the length bound.
	/// - Forward phase: the trailing `order` tokens probe for a successor,
	///   which is appended; same stop conditions.
	pub async fn fill<S: Storage + 'static>(
		&self,
		store: &NGramStore<S>,
		seed: &str,
		max_length: usize,
		identity: &str,
	) -> StorageResult<Vec<String>> {
		let mut response: VecDeque<String> = gram_tokens(seed).map(str::to_owned).collect();

		if response.front().is_none_or(String::is_empty) {
			return Ok(Vec::new());
		}

		while response.len() < max_length {
			let probe = self.leading_gram(&response);
			match self.sampler.pick_prev(store, &probe, identity).await? {
				Some(word) if !word.is_empty() => response.push_front(word),
				_ => break,
			}
		}

		while response.len() < max_length {
			let probe = self.trailing_gram(&response);
			match self.sampler.pick_next(store, &probe, identity).await? {
				Some(word) if !word.is_empty() => response.push_back(word),
				_ => break,
			}
		}

		Ok(response.into())
	}

	fn leading_gram(&self, words: &VecDeque<String>) -> String {
		words
			.iter()
			.take(self.order)
			.map(String::as_str)
			.collect::<Vec<_>>()
			.join(" ")
	}

	fn trailing_gram(&self, words: &VecDeque<String>) -> String {
		words
			.iter()
			.skip(words.len().saturating_sub(self.order))
			.map(String::as_str)
			.collect::<Vec<_>>()
			.join(" ")
	}
}
