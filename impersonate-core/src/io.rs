use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a corpus file and returns its non-blank lines.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
/// - Lines made only of whitespace are dropped (they carry no token)
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(str::to_owned)
		.collect())
}

/// File name of the storage snapshot inside a data folder.
pub const SNAPSHOT_FILE: &str = "impersonate.bin";

/// Path of the storage snapshot kept in `data_dir`.
///
/// Example:
/// `data` → `data/impersonate.bin`
pub fn snapshot_path<P: AsRef<Path>>(data_dir: P) -> PathBuf {
	data_dir.as_ref().join(SNAPSHOT_FILE)
}

/// Extracts the base filename without extension, used as subject identity.
///
/// Examples:
/// - `"./data/einstein.dat"` → `"einstein"`
/// - `"einstein.dat"` → `"einstein"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> io::Result<String> {
	let stem = input_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory, sorted by name.
///
/// Returns file names only (no paths).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn snapshot_sits_in_the_data_folder() {
		assert_eq!(snapshot_path("data"), PathBuf::from("data/impersonate.bin"));
		assert_eq!(snapshot_path("/tmp/x"), PathBuf::from("/tmp/x/impersonate.bin"));
	}

	#[test]
	fn filename_is_the_stem() {
		assert_eq!(get_filename("./data/einstein.dat").unwrap(), "einstein");
		assert!(get_filename("/").is_err());
	}

	#[test]
	fn lists_and_reads_corpus_files() {
		let dir = env::temp_dir().join(format!("impersonate-io-{}", std::process::id()));
		fs::create_dir_all(&dir).unwrap();
		fs::write(dir.join("b.dat"), "one\n\n  \ntwo\r\n").unwrap();
		fs::write(dir.join("a.dat"), "x").unwrap();
		fs::write(dir.join("a.bin"), "x").unwrap();

		let files = list_files(&dir, "dat").unwrap();
		let lines = read_file(dir.join("b.dat")).unwrap();
		fs::remove_dir_all(&dir).unwrap();

		assert_eq!(files, vec!["a.dat", "b.dat"]);
		assert_eq!(lines, vec!["one", "two"]);
	}
}
