//! Roster fixture files.
//!
//! A fixture describes the session state, the contacts cached locally when
//! the session starts, and the contacts a fetch would deliver.

use std::path::{Path, PathBuf};

use roster_model::{ContactKey, ContactRecord};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a fixture.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading the fixture file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not a valid fixture.
	#[error("invalid fixture {path}: {error}")]
	Parse {
		/// Path to the offending file.
		path: PathBuf,
		/// The underlying TOML error.
		error: toml::de::Error,
	},

	/// A contact list names the same key twice.
	#[error("duplicate contact key {key} in [[{section}]]")]
	DuplicateKey {
		/// The repeated key.
		key: ContactKey,
		/// Table array the key was found in.
		section: &'static str,
	},
}

/// `[session]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
	/// Whether the session is logged in before the model binds.
	#[serde(default)]
	pub authenticated: bool,
	/// Log in after the first queue pump.
	#[serde(default)]
	pub login_after_start: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
	#[serde(default)]
	pub session: SessionConfig,
	/// Contacts known locally, in source iteration order.
	#[serde(default)]
	pub contacts: Vec<ContactRecord>,
	/// Contacts a completed fetch delivers. Absent means fetches are lost.
	#[serde(default)]
	pub remote: Option<Vec<ContactRecord>>,
}

impl Fixture {
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::parse(&text, path)
	}

	/// Parses fixture text. `origin` is only used for error messages.
	pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
		let fixture: Self = toml::from_str(text).map_err(|error| ConfigError::Parse {
			path: origin.to_path_buf(),
			error,
		})?;
		fixture.validate()?;
		Ok(fixture)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		check_unique(&self.contacts, "contacts")?;
		if let Some(remote) = &self.remote {
			check_unique(remote, "remote")?;
		}
		Ok(())
	}
}

fn check_unique(records: &[ContactRecord], section: &'static str) -> Result<(), ConfigError> {
	let mut seen = FxHashSet::default();
	match records.iter().find(|record| !seen.insert(record.key)) {
		Some(record) => Err(ConfigError::DuplicateKey { key: record.key, section }),
		None => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;
	use std::path::Path;

	use pretty_assertions::assert_eq;
	use roster_model::{ContactKey, ContactRecord};

	use super::{ConfigError, Fixture, SessionConfig};

	#[test]
	fn parses_sample_fixture() {
		let fixture = Fixture::parse(include_str!("../fixtures/sample.toml"), Path::new("sample.toml")).expect("sample parses");

		assert_eq!(
			fixture.session,
			SessionConfig {
				authenticated: false,
				login_after_start: true,
			}
		);
		assert_eq!(fixture.contacts, [ContactRecord::new(7, "Bob", "Z"), ContactRecord::new(3, "Ann", "A")]);
		let remote = fixture.remote.expect("remote roster");
		assert_eq!(remote.len(), 4);
		assert_eq!(remote[0].username.as_deref(), Some("ann"));
		assert_eq!(remote[2].phone.as_deref(), Some("+15550100"));
	}

	#[test]
	fn empty_fixture_uses_defaults() {
		let fixture = Fixture::parse("", Path::new("empty.toml")).expect("empty parses");
		assert_eq!(fixture, Fixture::default());
		assert!(fixture.remote.is_none());
	}

	#[test]
	fn rejects_duplicate_keys() {
		let text = "[[remote]]\nkey = 4\nfirst_name = \"A\"\nlast_name = \"B\"\n\n[[remote]]\nkey = 4\nfirst_name = \"C\"\nlast_name = \"D\"\n";
		let err = Fixture::parse(text, Path::new("dup.toml")).expect_err("duplicate key");
		assert!(matches!(err, ConfigError::DuplicateKey { key: ContactKey(4), section: "remote" }));
	}

	#[test]
	fn rejects_unknown_session_fields() {
		let err = Fixture::parse("[session]\nloged_in = true\n", Path::new("typo.toml")).expect_err("unknown field");
		assert!(matches!(err, ConfigError::Parse { .. }));
		assert!(err.to_string().starts_with("invalid fixture typo.toml"));
	}

	#[test]
	fn load_reads_from_disk() {
		let mut file = tempfile::NamedTempFile::new().expect("temp file");
		writeln!(file, "[session]\nauthenticated = true\n\n[[contacts]]\nkey = 1\nfirst_name = \"Ann\"\nlast_name = \"A\"").expect("write fixture");

		let fixture = Fixture::load(file.path()).expect("fixture loads");

		assert!(fixture.session.authenticated);
		assert_eq!(fixture.contacts, [ContactRecord::new(1, "Ann", "A")]);
	}

	#[test]
	fn load_reports_missing_file() {
		let dir = tempfile::tempdir().expect("temp dir");
		let err = Fixture::load(&dir.path().join("missing.toml")).expect_err("missing file");
		assert!(matches!(err, ConfigError::Io { .. }));
	}
}
