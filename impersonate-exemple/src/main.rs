use std::path::Path;
use std::sync::Arc;

use impersonate_core::io::{get_filename, list_files};
use impersonate_core::{Markov, MarkovConfig, MemoryStorage};

/// Snapshot of this demo, kept apart from the server one since the gram
/// order differs.
const SNAPSHOT: &str = "exemple.bin";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();

	// Every subject in the "data" directory (.dat files) becomes an identity
	// Load automatically the snapshot if existing
	let data = Path::new("./data");
	let snapshot = data.join(SNAPSHOT);
	let backend = Arc::new(MemoryStorage::load_or_default(&snapshot)?);

	// Configuration is read from IMPERSONATE_* variables, then tweaked here
	let mut config = MarkovConfig::from_env()?;

	// Two tokens per gram gives more fluent, less surprising responses
	config.order = 2;

	// Maximum number of words of a response
	config.limit = 20;

	let markov = Markov::new(config, backend)?;

	// Subjects without any gram yet (new corpus files) are trained
	let mut subjects = Vec::new();
	let mut trained = false;
	for file in list_files(data, "dat").unwrap_or_default() {
		let subject = get_filename(&file)?;
		if markov.store().size(&subject).await? == 0 {
			markov.train_file(data.join(&file), &subject).await?;
			trained = true;
		}
		subjects.push(subject);
	}

	// Identities can also be trained line by line
	if markov.store().size("demo").await? == 0 {
		markov
			.train_lines(
				[
					"I think the weather is nice today",
					"The weather is terrible in the winter",
					"I think rust is nice",
				],
				"demo",
			)
			.await?;
		trained = true;
	}
	subjects.push("demo".to_owned());

	if trained && data.is_dir() {
		markov.store().backend().save(&snapshot)?;
	}

	// An identity with nothing learned answers with an empty string
	let unknown = markov.respond("hello", "unknown", 0).await?;
	println!("unknown: {:?} (shown as {:?})", unknown, markov.config().default_response);

	for subject in &subjects {
		println!("{subject} knows {} grams", markov.store().size(subject).await?);
		for prompt in ["What do you think about the weather?", "", "nice"] {
			println!("  {prompt:?} -> {}", markov.respond(prompt, subject, 0).await?);
		}
	}

	Ok(())
}
