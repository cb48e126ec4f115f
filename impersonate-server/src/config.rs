use std::path::PathBuf;
use std::str::FromStr;

use impersonate_core::ConfigError;
use impersonate_core::config::parse_value;
use log::warn;

/// Which of training and responding the chat layer performs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
	/// Learn from messages, never impersonate.
	#[default]
	Train,
	/// Learn from messages and impersonate on demand.
	TrainRespond,
	/// Impersonate on demand with the existing models only.
	Respond,
}

impl Mode {
	pub fn trains(self) -> bool {
		matches!(self, Mode::Train | Mode::TrainRespond)
	}

	pub fn responds(self) -> bool {
		matches!(self, Mode::Respond | Mode::TrainRespond)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Mode::Train => "train",
			Mode::TrainRespond => "train_respond",
			Mode::Respond => "respond",
		}
	}
}

impl FromStr for Mode {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"train" => Ok(Mode::Train),
			"train_respond" => Ok(Mode::TrainRespond),
			"respond" => Ok(Mode::Respond),
			other => Err(ConfigError::InvalidValue { name: "MODE".to_owned(), value: other.to_owned() }),
		}
	}
}

/// Chat layer settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
	pub mode: Mode,
	/// Messages with fewer words are not used for training.
	pub min_words: usize,
	pub bind: String,
	/// Folder holding `<subject>.dat` corpora and the snapshot.
	pub data_dir: PathBuf,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			mode: Mode::Train,
			min_words: 1,
			bind: "127.0.0.1:5000".to_owned(),
			data_dir: PathBuf::from("./data"),
		}
	}
}

impl ServerConfig {
	/// Reads `IMPERSONATE_MODE`, `IMPERSONATE_MIN_WORDS`, `IMPERSONATE_BIND`
	/// and `IMPERSONATE_DATA`.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds the settings from an arbitrary variable lookup.
	///
	/// An unknown mode falls back to `train`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		if let Some(v) = lookup("IMPERSONATE_MODE") {
			config.mode = v.parse().unwrap_or_else(|e| {
				warn!("{e}, using mode train");
				Mode::Train
			});
		}
		if let Some(v) = lookup("IMPERSONATE_MIN_WORDS") {
			config.min_words = parse_value("MIN_WORDS", &v)?;
		}
		if let Some(v) = lookup("IMPERSONATE_BIND") {
			config.bind = v;
		}
		if let Some(v) = lookup("IMPERSONATE_DATA") {
			config.data_dir = impersonate_core::io::normalize_folder(&v);
		}

		Ok(config)
	}

	pub fn snapshot_path(&self) -> PathBuf {
		impersonate_core::io::snapshot_path(&self.data_dir)
	}
}
