use std::path::Path;
use std::sync::Arc;

use log::info;

use super::generator::Generator;
use super::ngram_store::NGramStore;
use super::sampler::Sampler;
use super::trainer::Trainer;
use crate::config::MarkovConfig;
use crate::error::Result;
use crate::io::read_file;
use crate::storage::Storage;
use crate::text::importance::{HeuristicTagger, ImportanceExtractor, PosTagger};
use crate::text::tokenizer::Tokenizer;

/// High-level Markov engine.
///
/// Bundles a configuration, the n-gram store over a storage backend and a
/// POS tagger. Only [`Markov::train`] and [`Markov::respond`] (plus the bulk
/// helpers built on `train`) cross the boundary with the chat layer.
///
/// The engine itself is stateless: every call is scoped to the identity
/// passed in, and all statistics live in the backend. Calls for the same or
/// different identities may run concurrently.
#[derive(Debug)]
pub struct Markov<S, T = HeuristicTagger> {
	config: MarkovConfig,
	store: NGramStore<S>,
	trainer: Trainer,
	generator: Generator<T>,
}

impl<S: Storage + 'static> Markov<S, HeuristicTagger> {
	/// Creates an engine using the built-in heuristic tagger.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(config: MarkovConfig, backend: Arc<S>) -> Result<Self> {
		Self::with_tagger(config, backend, HeuristicTagger)
	}
}

impl<S: Storage + 'static, T: PosTagger> Markov<S, T> {
	/// Creates an engine with a custom POS tagger.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn with_tagger(config: MarkovConfig, backend: Arc<S>, tagger: T) -> Result<Self> {
		config.validate()?;

		let tokenizer = Tokenizer::new(config.case_sensitive, config.strip_punctuation);
		let trainer = Trainer::new(tokenizer, config.order, config.capacity);
		let generator = Generator::new(
			tokenizer,
			ImportanceExtractor::new(tagger, config.order, config.pos_tagging),
			Sampler::new(config.weighting, config.favor_boost),
			config.order,
			config.limit,
		);

		Ok(Self { store: NGramStore::new(backend), trainer, generator, config })
	}

	pub fn config(&self) -> &MarkovConfig {
		&self.config
	}

	/// Read access to the statistics of every identity.
	pub fn store(&self) -> &NGramStore<S> {
		&self.store
	}

	/// Updates the model of `identity` with `text`.
	///
	/// Returns `false` when the text was ignored (no token, or the identity
	/// reached its capacity).
	///
	/// # Errors
	/// Propagates storage failures.
	pub async fn train(&self, text: &str, identity: &str) -> Result<bool> {
		Ok(self.trainer.train(&self.store, text, identity).await?)
	}

	/// Trains `identity` on each line in turn and returns how many were recorded.
	///
	/// # Errors
	/// Stops at the first storage failure.
	pub async fn train_lines<I, L>(&self, lines: I, identity: &str) -> Result<usize>
	where
		I: IntoIterator<Item = L>,
		L: AsRef<str>,
	{
		let mut accepted = 0;
		for line in lines {
			if self.train(line.as_ref(), identity).await? {
				accepted += 1;
			}
		}
		Ok(accepted)
	}

	/// Trains `identity` on every line of a text file.
	///
	/// # Errors
	/// Returns an error if the file cannot be read or storage fails.
	pub async fn train_file<P: AsRef<Path>>(&self, path: P, identity: &str) -> Result<usize> {
		let lines = read_file(&path)?;
		let accepted = self.train_lines(&lines, identity).await?;
		info!(
			"Trained {identity} on {accepted}/{} lines of {}",
			lines.len(),
			path.as_ref().display()
		);
		Ok(accepted)
	}

	/// Generates a response to `text` in the style of `identity`, with at
	/// most `max_length` words (`0` uses the configured limit).
	///
	/// An empty string means nothing was learned for `identity`; the caller
	/// decides what to show instead (see [`MarkovConfig::default_response`]).
	///
	/// # Errors
	/// Propagates storage failures.
	pub async fn respond(&self, text: &str, identity: &str, max_length: usize) -> Result<String> {
		Ok(self.generator.respond(&self.store, text, identity, max_length).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::MarkovError;
	use crate::storage::memory::MemoryStorage;

	#[test]
	fn invalid_config_is_rejected() {
		let config = MarkovConfig { order: 0, ..MarkovConfig::default() };
		let result = Markov::new(config, Arc::new(MemoryStorage::new()));
		assert!(matches!(result, Err(MarkovError::Config(_))));
	}

	#[tokio::test]
	async fn train_lines_counts_accepted_lines() {
		let markov = Markov::new(MarkovConfig::default(), Arc::new(MemoryStorage::new())).unwrap();
		let accepted = markov.train_lines(["first line", "", "second line"], "u").await.unwrap();
		assert_eq!(accepted, 2);
		assert_eq!(markov.store().count("u", "line").await.unwrap(), 2);
	}

	#[tokio::test]
	async fn train_file_reads_every_line() {
		let path = std::env::temp_dir().join(format!("impersonate-corpus-{}.dat", std::process::id()));
		std::fs::write(&path, "to be or not to be\nthat is the question\n").unwrap();

		let markov = Markov::new(MarkovConfig::default(), Arc::new(MemoryStorage::new())).unwrap();
		let accepted = markov.train_file(&path, "hamlet").await.unwrap();
		std::fs::remove_file(&path).unwrap();

		assert_eq!(accepted, 2);
		assert_eq!(markov.store().count("hamlet", "be").await.unwrap(), 2);
	}

	#[tokio::test]
	async fn missing_file_is_an_error() {
		let markov = Markov::new(MarkovConfig::default(), Arc::new(MemoryStorage::new())).unwrap();
		assert!(matches!(
			markov.train_file("/nonexistent/corpus.dat", "x").await,
			Err(MarkovError::Io(_))
		));
	}
}
