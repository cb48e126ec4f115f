use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Weighting function applied to a raw occurrence count before sampling.
///
/// # Variants
/// - `Log`: `ln(count) + 1`, flattens the advantage of very frequent tokens.
/// - `Linear`: the raw count.
///
/// Non-positive counts always weigh `0.0`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
	#[default]
	Log,
	Linear,
}

impl Weighting {
	/// Computes the sampling weight of a count.
	pub fn weight(self, count: i64) -> f64 {
		if count <= 0 {
			return 0.0;
		}
		match self {
			Weighting::Log => (count as f64).ln() + 1.0,
			Weighting::Linear => count as f64,
		}
	}
}

impl FromStr for Weighting {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"log" => Ok(Weighting::Log),
			"linear" => Ok(Weighting::Linear),
			other => Err(ConfigError::InvalidValue {
				name: "weighting".to_owned(),
				value: other.to_owned(),
			}),
		}
	}
}

impl fmt::Display for Weighting {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Weighting::Log => f.write_str("log"),
			Weighting::Linear => f.write_str("linear"),
		}
	}
}

/// Configuration of the Markov engine.
///
/// Shared by every identity of a deployment. Missing fields fall back to
/// [`MarkovConfig::default`] when deserialized.
///
/// # Invariants (checked by [`MarkovConfig::validate`])
/// - `order >= 1`
/// - `limit >= 1`
/// - `favor_boost > 1.0`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MarkovConfig {
	/// Keep the original case of words.
	pub case_sensitive: bool,

	/// Remove every character outside `[a-zA-Z0-9 ]` before splitting.
	pub strip_punctuation: bool,

	/// Maximum number of distinct grams learned per identity.
	pub capacity: usize,

	/// Number of tokens per gram.
	pub order: usize,

	/// Default maximum number of words in a generated response.
	pub limit: usize,

	/// Weight multiplier for candidates matching the input's important grams.
	pub favor_boost: f64,

	/// Count weighting policy used by the sampler.
	pub weighting: Weighting,

	/// Favor only noun/verb grams of the input. When disabled every input
	/// gram is favored.
	pub pos_tagging: bool,

	/// Text surfaced by the chat layer when nothing could be generated.
	pub default_response: String,
}

impl Default for MarkovConfig {
	fn default() -> Self {
		Self {
			case_sensitive: false,
			strip_punctuation: false,
			capacity: 10_000,
			order: 1,
			limit: 25,
			favor_boost: 2.0,
			weighting: Weighting::Log,
			pos_tagging: true,
			default_response: "...".to_owned(),
		}
	}
}

impl MarkovConfig {
	/// Environment variable prefix.
	pub const ENV_PREFIX: &'static str = "IMPERSONATE_";

	/// Builds a configuration from `IMPERSONATE_*` environment variables.
	///
	/// Unset variables keep their default value.
	///
	/// # Errors
	/// Returns an error if a variable cannot be parsed or the result is invalid.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds a configuration from an arbitrary variable lookup.
	///
	/// `lookup` receives full variable names (e.g. `IMPERSONATE_ORDER`).
	///
	/// Boolean variables follow the rule: unset keeps the default, `false`
	/// disables, anything else enables.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(&format!("{}{}", Self::ENV_PREFIX, name));
		let mut config = Self::default();

		if let Some(v) = var("CASE_SENSITIVE") {
			config.case_sensitive = parse_flag(&v);
		}
		if let Some(v) = var("STRIP_PUNCTUATION") {
			config.strip_punctuation = parse_flag(&v);
		}
		if let Some(v) = var("POS_TAGGING") {
			config.pos_tagging = parse_flag(&v);
		}
		if let Some(v) = var("CAPACITY") {
			config.capacity = parse_value("CAPACITY", &v)?;
		}
		if let Some(v) = var("ORDER") {
			config.order = parse_value("ORDER", &v)?;
		}
		if let Some(v) = var("LIMIT") {
			config.limit = parse_value("LIMIT", &v)?;
		}
		if let Some(v) = var("FAVOR_BOOST") {
			config.favor_boost = parse_value("FAVOR_BOOST", &v)?;
		}
		if let Some(v) = var("WEIGHTING") {
			config.weighting = v.parse()?;
		}
		if let Some(v) = var("DEFAULT_RESPONSE") {
			config.default_response = v;
		}

		config.validate()?;
		Ok(config)
	}

	/// Checks the configuration invariants.
	///
	/// # Errors
	/// Returns an error describing the first violated invariant.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.order == 0 {
			return Err(ConfigError::Invalid("order must be >= 1".to_owned()));
		}
		if self.limit == 0 {
			return Err(ConfigError::Invalid("limit must be >= 1".to_owned()));
		}
		if !(self.favor_boost > 1.0) {
			return Err(ConfigError::Invalid(format!(
				"favor_boost must be > 1.0, got {}",
				self.favor_boost
			)));
		}
		Ok(())
	}
}

/// Parses a boolean flag: only `false` (any case) disables.
pub fn parse_flag(value: &str) -> bool {
	!value.trim().eq_ignore_ascii_case("false")
}

/// Parses a typed variable value, naming the variable on failure.
pub fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
	value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
		name: name.to_owned(),
		value: value.to_owned(),
	})
}
