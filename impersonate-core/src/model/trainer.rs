use log::debug;

use super::ngram_store::{NGramStore, Window};
use crate::error::StorageResult;
use crate::storage::Storage;
use crate::text::tokenizer::Tokenizer;

/// Updates the n-gram statistics of an identity from observed text.
///
/// # Capacity
/// Before recording, the trainer reads the number of grams already known for
/// the identity and refuses the whole call when
/// `size >= capacity - number_of_tokens`. The check is not atomic with the
/// writes: concurrent trainings of the same identity may overshoot the
/// capacity slightly.
#[derive(Clone, Copy, Debug)]
pub struct Trainer {
	tokenizer: Tokenizer,
	order: usize,
	capacity: usize,
}

impl Trainer {
	pub fn new(tokenizer: Tokenizer, order: usize, capacity: usize) -> Self {
		Self { tokenizer, order: order.max(1), capacity }
	}

	/// Trains `identity` on `text`.
	///
	/// Returns `true` if the text was recorded, `false` if it carried no token
	/// or the identity is at capacity. Neither case is an error.
	///
	/// # Errors
	/// Propagates storage failures.
	pub async fn train<S: Storage + 'static>(
		&self,
		store: &NGramStore<S>,
		text: &str,
		identity: &str,
	) -> StorageResult<bool> {
		let tokens: Vec<String> = self
			.tokenizer
			.tokenize(text)
			.into_iter()
			.filter(|t| !t.is_empty())
			.collect();
		if tokens.is_empty() {
			return Ok(false);
		}

		let size = store.size(identity).await?;
		if size >= self.capacity.saturating_sub(tokens.len()) {
			debug!(
				"Refusing {} tokens for {identity}: {size} grams known, capacity {}",
				tokens.len(),
				self.capacity
			);
			return Ok(false);
		}

		store.record(identity, windows(&tokens, self.order)).await?;
		Ok(true)
	}
}

/// Slides a window of `order` tokens over `tokens`.
///
/// Each window carries the token right before and right after it, or the
/// empty sentinel at the boundaries. A sequence shorter than `order` yields
/// one window holding all of its tokens.
pub fn windows(tokens: &[String], order: usize) -> Vec<Window> {
	let order = order.max(1);
	if tokens.is_empty() {
		return Vec::new();
	}
	if tokens.len() < order {
		return vec![Window { gram: tokens.join(" "), prev: String::new(), next: String::new() }];
	}

	(0..=tokens.len() - order)
		.map(|i| Window {
			gram: tokens[i..i + order].join(" "),
			prev: if i > 0 { tokens[i - 1].clone() } else { String::new() },
			next: tokens.get(i + order).cloned().unwrap_or_default(),
		})
		.collect()
}
