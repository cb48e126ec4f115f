/// Splits raw text into tokens.
///
/// Normalization happens in this order:
/// 1. Lower-casing, unless `case_sensitive`
/// 2. Removal of every character outside `[a-zA-Z0-9 ]`, if `strip_punctuation`
///    (tabs and newlines are removed too)
/// 3. Splitting on runs of whitespace
///
/// A text without any token yields a single empty token, which callers treat
/// as "no content" (see [`has_content`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tokenizer {
	case_sensitive: bool,
	strip_punctuation: bool,
}

impl Tokenizer {
	pub fn new(case_sensitive: bool, strip_punctuation: bool) -> Self {
		Self { case_sensitive, strip_punctuation }
	}

	/// Tokenizes `text`. Pure and deterministic for a fixed configuration.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut text = if self.case_sensitive {
			text.to_owned()
		} else {
			text.to_lowercase()
		};

		if self.strip_punctuation {
			text = clean(&text);
		}

		let tokens: Vec<String> = text.split_whitespace().map(str::to_owned).collect();
		if tokens.is_empty() {
			return vec![String::new()];
		}
		tokens
	}
}

/// Removes every character outside `[a-zA-Z0-9 ]`.
pub fn clean(text: &str) -> String {
	text.chars()
		.filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
		.collect()
}

/// Returns `true` if the token sequence carries at least one non-empty token.
pub fn has_content(tokens: &[String]) -> bool {
	tokens.iter().any(|t| !t.is_empty())
}

/// Builds the gram of at most `order` tokens starting at `start`.
///
/// The gram is truncated at the end of the sequence and is empty when `start`
/// is out of bounds.
pub fn gram_at(tokens: &[String], start: usize, order: usize) -> String {
	if start >= tokens.len() {
		return String::new();
	}
	let end = (start + order).min(tokens.len());
	tokens[start..end].join(" ")
}

/// Splits a gram back into its tokens.
pub fn gram_tokens(gram: &str) -> impl Iterator<Item = &str> {
	gram.split(' ')
}
