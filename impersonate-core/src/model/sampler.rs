use std::collections::HashSet;

use rand::Rng;

use super::ngram_store::{Direction, NGramStore};
use crate::config::Weighting;
use crate::error::StorageResult;
use crate::storage::Storage;

/// Weighted pseudo-random selection over counted candidates.
///
/// Selection is a "noisy argmax": every candidate draws
/// `uniform(0, 1] * weighting(count) * boost` and the largest draw wins,
/// starting from a zero threshold. High counts and favored candidates win
/// more often, but the distribution is not proportional to the counts.
///
/// # Notes
/// - O(n) over the candidates, a single pass.
/// - The draw excludes 0, so a single candidate with a positive count is
///   always returned.
/// - An empty or all-zero candidate set yields `None`.
#[derive(Clone, Copy, Debug)]
pub struct Sampler {
	weighting: Weighting,
	favor_boost: f64,
}

impl Sampler {
	pub fn new(weighting: Weighting, favor_boost: f64) -> Self {
		Self { weighting, favor_boost }
	}

	/// Picks a candidate, boosting those contained in `favor`.
	pub fn weighted_pick<R: Rng>(
		&self,
		candidates: &[(String, i64)],
		favor: &HashSet<&str>,
		rng: &mut R,
	) -> Option<String> {
		let mut max_sample = 0.0;
		let mut picked: Option<&str> = None;

		for (token, count) in candidates {
			let boost = if favor.contains(token.as_str()) { self.favor_boost } else { 1.0 };
			let weight = self.weighting.weight(*count) * boost;
			let sample = (1.0 - rng.random::<f64>()) * weight;

			if sample > max_sample {
				max_sample = sample;
				picked = Some(token.as_str());
			}
		}

		picked.map(str::to_owned)
	}

	/// Picks a seed gram among every gram known for `identity`, favoring the
	/// known grams listed in `favor_grams`.
	///
	/// Returns `None` when the identity has no gram.
	pub async fn pick_gram<S: Storage + 'static>(
		&self,
		store: &NGramStore<S>,
		favor_grams: &[String],
		identity: &str,
	) -> StorageResult<Option<String>> {
		let candidates = store.grams(identity).await?;
		let favor: HashSet<&str> = favor_grams.iter().map(String::as_str).collect();
		Ok(self.weighted_pick(&candidates, &favor, &mut rand::rng()))
	}

	/// Picks a token to follow `gram`. `Some("")` means end of sequence.
	pub async fn pick_next<S: Storage + 'static>(
		&self,
		store: &NGramStore<S>,
		gram: &str,
		identity: &str,
	) -> StorageResult<Option<String>> {
		self.pick_transition(store, gram, identity, Direction::Next).await
	}

	/// Picks a token to precede `gram`. `Some("")` means start of sequence.
	pub async fn pick_prev<S: Storage + 'static>(
		&self,
		store: &NGramStore<S>,
		gram: &str,
		identity: &str,
	) -> StorageResult<Option<String>> {
		self.pick_transition(store, gram, identity, Direction::Prev).await
	}

	async fn pick_transition<S: Storage + 'static>(
		&self,
		store: &NGramStore<S>,
		gram: &str,
		identity: &str,
		direction: Direction,
	) -> StorageResult<Option<String>> {
		let candidates = store.transitions(identity, gram, direction).await?;
		Ok(self.weighted_pick(&candidates, &HashSet::new(), &mut rand::rng()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn candidates(v: &[(&str, i64)]) -> Vec<(String, i64)> {
		v.iter().map(|(s, n)| (s.to_string(), *n)).collect()
	}

	fn sampler() -> Sampler {
		Sampler::new(Weighting::Log, 2.0)
	}

	#[test]
	fn empty_candidates_yield_none() {
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(sampler().weighted_pick(&[], &HashSet::new(), &mut rng), None);
	}

	#[test]
	fn zero_weights_yield_none() {
		let mut rng = StdRng::seed_from_u64(1);
		let c = candidates(&[("a", 0), ("b", 0)]);
		assert_eq!(sampler().weighted_pick(&c, &HashSet::new(), &mut rng), None);
	}

	#[test]
	fn single_candidate_is_always_picked() {
		let mut rng = StdRng::seed_from_u64(7);
		for weighting in [Weighting::Log, Weighting::Linear] {
			let sampler = Sampler::new(weighting, 2.0);
			for _ in 0..1000 {
				let c = candidates(&[("w", 1)]);
				assert_eq!(sampler.weighted_pick(&c, &HashSet::new(), &mut rng).as_deref(), Some("w"));
			}
		}
	}

	#[test]
	fn only_nonzero_candidate_is_picked() {
		let mut rng = StdRng::seed_from_u64(3);
		let c = candidates(&[("a", 0), ("b", 4), ("c", 0)]);
		for _ in 0..100 {
			assert_eq!(sampler().weighted_pick(&c, &HashSet::new(), &mut rng).as_deref(), Some("b"));
		}
	}

	#[test]
	fn higher_counts_win_more_often() {
		let mut rng = StdRng::seed_from_u64(11);
		let sampler = Sampler::new(Weighting::Linear, 2.0);
		let c = candidates(&[("rare", 1), ("common", 20)]);
		let common = (0..2000)
			.filter(|_| sampler.weighted_pick(&c, &HashSet::new(), &mut rng).as_deref() == Some("common"))
			.count();
		assert!(common > 1800, "common picked {common} times");
	}

	#[test]
	fn favor_boost_shifts_selection() {
		let mut rng = StdRng::seed_from_u64(5);
		let sampler = Sampler::new(Weighting::Linear, 10.0);
		let c = candidates(&[("a", 1), ("b", 1)]);
		let favor: HashSet<&str> = ["b"].into_iter().collect();
		let favored = (0..2000)
			.filter(|_| sampler.weighted_pick(&c, &favor, &mut rng).as_deref() == Some("b"))
			.count();
		assert!(favored > 1600, "favored picked {favored} times");
	}

	#[tokio::test]
	async fn pick_gram_favors_known_important_grams() {
		use crate::model::ngram_store::Window;
		use crate::storage::memory::MemoryStorage;
		use std::sync::Arc;

		let store = NGramStore::new(Arc::new(MemoryStorage::new()));
		let windows = ["a", "b", "c", "d"]
			.into_iter()
			.map(|gram| Window { gram: gram.to_owned(), prev: String::new(), next: String::new() })
			.collect();
		store.record("u", windows).await.unwrap();

		// "zzz" is unknown to the identity and can never be returned
		let favor = vec!["b".to_owned(), "zzz".to_owned()];
		let mut favored = 0;
		for _ in 0..4000 {
			match sampler().pick_gram(&store, &favor, "u").await.unwrap().as_deref() {
				Some("b") => favored += 1,
				Some("a" | "c" | "d") => {}
				other => panic!("unexpected seed {other:?}"),
			}
		}
		// 5/8 of the draws with a boost of 2 over three equal grams, 1/4 without
		assert!(favored > 2000, "favored picked {favored} times");
	}
}
