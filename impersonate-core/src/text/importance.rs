use log::warn;

use super::tokenizer::gram_at;
use crate::error::TagError;

/// Part-of-speech tagging capability.
///
/// Implementations return one tag per input token, using a tagset where noun
/// tags begin with `NN` and verb tags begin with `VB` (Penn Treebank style).
pub trait PosTagger: Send + Sync {
	/// Tags an ordered token sequence.
	///
	/// # Errors
	/// Returns an error if tagging is not possible.
	fn tag(&self, tokens: &[String]) -> Result<Vec<String>, TagError>;
}

/// Selects the grams of an input that should be favored during sampling.
///
/// With tagging enabled, a gram is emitted for every noun or verb position.
/// With tagging disabled, every position is important.
#[derive(Debug, Clone)]
pub struct ImportanceExtractor<T> {
	tagger: T,
	order: usize,
	tagging: bool,
}

impl<T: PosTagger> ImportanceExtractor<T> {
	pub fn new(tagger: T, order: usize, tagging: bool) -> Self {
		Self { tagger, order: order.max(1), tagging }
	}

	/// Returns the grams of `order` tokens starting at each important index,
	/// truncated at the end of the sequence.
	///
	/// Tagger failures, or a tag count that does not match the token count,
	/// degrade to no favored grams.
	pub fn important_grams(&self, tokens: &[String]) -> Vec<String> {
		if !self.tagging {
			return (0..tokens.len())
				.filter(|i| !tokens[*i].is_empty())
				.map(|i| gram_at(tokens, i, self.order))
				.collect();
		}

		let tags = match self.tagger.tag(tokens) {
			Ok(tags) => tags,
			Err(e) => {
				warn!("POS tagging failed, no favored grams: {e}");
				return Vec::new();
			}
		};

		if tags.len() != tokens.len() {
			warn!(
				"POS tagger returned {} tags for {} tokens, no favored grams",
				tags.len(),
				tokens.len()
			);
			return Vec::new();
		}

		tags.iter()
			.enumerate()
			.filter(|(_, tag)| is_important(tag))
			.map(|(i, _)| gram_at(tokens, i, self.order))
			.collect()
	}
}

/// Nouns and verbs drive topical continuations.
fn is_important(tag: &str) -> bool {
	tag.starts_with("NN") || tag.starts_with("VB")
}

const DETERMINERS: &[&str] = &[
	"a", "an", "the", "this", "that", "these", "those", "every", "each", "some", "any", "no",
	"another", "all", "both", "either", "neither",
];
const PRONOUNS: &[&str] = &[
	"i", "me", "you", "he", "him", "she", "her", "it", "we", "us", "they", "them", "myself",
	"yourself", "himself", "herself", "itself", "ourselves", "themselves", "one",
];
const POSSESSIVES: &[&str] = &["my", "your", "his", "its", "our", "their", "mine", "yours", "ours", "theirs"];
const PREPOSITIONS: &[&str] = &[
	"of", "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
	"during", "before", "after", "above", "below", "from", "up", "down", "over", "under", "since",
	"until", "while", "because", "if", "than", "as", "like", "near", "without", "within", "off",
	"out", "onto", "upon", "across", "behind",
];
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet", "so"];
const MODALS: &[&str] = &["can", "could", "may", "might", "must", "shall", "should", "will", "would"];
const WH_WORDS: &[&str] = &["what", "which", "who", "whom", "whose", "when", "where", "why", "how"];
const ADVERBS: &[&str] = &[
	"not", "very", "too", "also", "just", "now", "then", "there", "here", "never", "always",
	"often", "still", "already", "again", "soon", "once", "ever", "even", "only", "really",
	"quite", "almost", "well",
];
const INTERJECTIONS: &[&str] = &["oh", "ah", "hey", "hi", "hello", "yes", "no", "ok", "okay", "wow", "lol"];
const ADJECTIVES: &[&str] = &[
	"good", "bad", "new", "old", "big", "small", "great", "little", "long", "short", "high", "low",
	"other", "same", "different", "last", "first", "next", "few", "many", "much", "more", "most",
];

/// Verb forms that suffix rules would misclassify.
const VERBS: &[(&str, &str)] = &[
	("be", "VB"),
	("am", "VBP"),
	("are", "VBP"),
	("is", "VBZ"),
	("was", "VBD"),
	("were", "VBD"),
	("been", "VBN"),
	("being", "VBG"),
	("do", "VBP"),
	("does", "VBZ"),
	("did", "VBD"),
	("done", "VBN"),
	("have", "VBP"),
	("has", "VBZ"),
	("had", "VBD"),
	("go", "VBP"),
	("goes", "VBZ"),
	("went", "VBD"),
	("gone", "VBN"),
	("get", "VBP"),
	("got", "VBD"),
	("make", "VBP"),
	("made", "VBD"),
	("say", "VBP"),
	("said", "VBD"),
	("see", "VBP"),
	("saw", "VBD"),
	("know", "VBP"),
	("knew", "VBD"),
	("think", "VBP"),
	("thought", "VBD"),
	("take", "VBP"),
	("took", "VBD"),
	("come", "VBP"),
	("came", "VBD"),
	("want", "VBP"),
	("sat", "VBD"),
	("ran", "VBD"),
	("run", "VBP"),
];

/// Lexicon and suffix based tagger.
///
/// Closed word classes (determiners, pronouns, prepositions, ...) and common
/// irregular verbs are looked up in small built-in lists; open classes are
/// guessed from suffixes, defaulting to `NN`. Surrounding punctuation is
/// ignored for lookup and punctuation-only tokens are tagged `.`.
///
/// Never fails and always returns one tag per token.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTagger;

impl HeuristicTagger {
	fn tag_word(token: &str) -> &'static str {
		let word = token
			.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
			.to_lowercase();

		if word.is_empty() {
			return if token.is_empty() { "SYM" } else { "." };
		}
		if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
			return "CD";
		}
		if let Some((_, tag)) = VERBS.iter().find(|(w, _)| *w == word) {
			return *tag;
		}

		let word = word.as_str();
		let lookups: [(&[&str], &'static str); 10] = [
			(DETERMINERS, "DT"),
			(PRONOUNS, "PRP"),
			(POSSESSIVES, "PRP$"),
			(PREPOSITIONS, "IN"),
			(CONJUNCTIONS, "CC"),
			(MODALS, "MD"),
			(WH_WORDS, "WP"),
			(INTERJECTIONS, "UH"),
			(ADVERBS, "RB"),
			(ADJECTIVES, "JJ"),
		];
		for (words, tag) in lookups {
			if words.contains(&word) {
				return tag;
			}
		}
		if word == "to" {
			return "TO";
		}

		Self::tag_by_suffix(word)
	}

	fn tag_by_suffix(word: &str) -> &'static str {
		let len = word.chars().count();
		if len > 4 && word.ends_with("ing") {
			"VBG"
		} else if len > 3 && word.ends_with("ed") {
			"VBD"
		} else if len > 3 && word.ends_with("ly") {
			"RB"
		} else if len > 4
			&& ["ous", "ful", "ive", "able", "ible", "less", "ish", "ic"]
				.iter()
				.any(|s| word.ends_with(s))
		{
			"JJ"
		} else if len > 4 && ["ize", "ise", "ify", "ate"].iter().any(|s| word.ends_with(s)) {
			"VB"
		} else if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
			"NNS"
		} else {
			"NN"
		}
	}
}

impl PosTagger for HeuristicTagger {
	fn tag(&self, tokens: &[String]) -> Result<Vec<String>, TagError> {
		Ok(tokens
			.iter()
			.map(|t| Self::tag_word(t).to_owned())
			.collect())
	}
}
