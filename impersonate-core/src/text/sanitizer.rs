/// Repairs the narrow punctuation defects a chain walk produces.
///
/// - Pairs double quotes left to right; a quote still open at the end of the
///   string is removed.
/// - Trailing commas are then stripped, all of them: `a,,` becomes `a`,
///   and a sanitized string is left unchanged by another pass.
///
/// Balanced punctuation in general is not validated.
///
/// # Examples
///
/// ```
/// use impersonate_core::text::sanitizer::sanitize;
///
/// assert_eq!(sanitize("he said \"hello there"), "he said hello there");
/// assert_eq!(sanitize("a, b, c,"), "a, b, c");
/// ```
pub fn sanitize(s: &str) -> String {
	let mut open: Option<usize> = None;
	for (idx, c) in s.char_indices() {
		if c == '"' {
			open = match open {
				Some(_) => None,
				None => Some(idx),
			};
		}
	}

	let mut out = s.to_owned();
	if let Some(idx) = open {
		out.remove(idx);
	}

	out.truncate(out.trim_end_matches(',').len());
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn removes_unmatched_quote() {
		assert_eq!(sanitize("he said \"hello there"), "he said hello there");
	}

	#[test]
	fn keeps_balanced_quotes() {
		assert_eq!(sanitize("\"a\" and \"b\""), "\"a\" and \"b\"");
	}

	#[test]
	fn removes_only_the_quote_left_open() {
		assert_eq!(sanitize("\"a\" \"b"), "\"a\" b");
		assert_eq!(sanitize("x\""), "x");
	}

	#[test]
	fn strips_trailing_comma() {
		assert_eq!(sanitize("a, b, c,"), "a, b, c");
		assert_eq!(sanitize("a, b"), "a, b");
	}

	#[test]
	fn strips_every_trailing_comma() {
		assert_eq!(sanitize("a,,"), "a");
		assert_eq!(sanitize(",,,"), "");
	}

	#[test]
	fn quote_then_comma() {
		assert_eq!(sanitize("so \"yes,"), "so yes");
	}

	#[test]
	fn empty_string() {
		assert_eq!(sanitize(""), "");
	}

	proptest! {
		#[test]
		fn prop_sanitize_is_idempotent(s in "[a-z \",.]{0,40}") {
			let once = sanitize(&s);
			prop_assert_eq!(sanitize(&once), once);
		}

		#[test]
		fn prop_sanitized_quotes_are_balanced(s in "[a-z \",]{0,40}") {
			let quotes = sanitize(&s).chars().filter(|c| *c == '"').count();
			prop_assert_eq!(quotes % 2, 0);
		}
	}
}
