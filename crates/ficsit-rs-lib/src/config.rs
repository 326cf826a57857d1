//! User configuration.
//!
//! Stored as JSON in the platform config directory, see [`Config::config_path()`].

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

const APP_DIR: &str = "ficsit-rs";

/// The default location of the registry index.
pub const DEFAULT_REGISTRY_URL: &str = "https://api.ficsit.app/v1/index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Where `profiles.json` and `installations.json` are kept.
	data_dir: PathBuf,
	/// Content addressed cache of downloaded mod archives.
	cache_dir: PathBuf,
	/// File path or URL of the registry index.
	registry_url: String,
	https_only: bool,
	do_checksums: bool,
	/// Skip writing anything to disk.
	dry_run: bool,
}

/// Resolves a base directory from `var` falling back to `$HOME/<home_fallback>`.
fn base_dir(var: &str, home_fallback: &str) -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		let _ = (var, home_fallback);
		std::env::var("APPDATA").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
	}

	#[cfg(not(target_os = "windows"))]
	{
		if let Ok(e) = std::env::var(var) {
			PathBuf::from(e)
		} else if let Ok(home) = std::env::var("HOME") {
			PathBuf::from(home).join(home_fallback)
		} else {
			PathBuf::from(".")
		}
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			data_dir: base_dir("XDG_DATA_HOME", ".local/share").join(APP_DIR),
			cache_dir: base_dir("XDG_CACHE_HOME", ".cache").join(APP_DIR).join("downloads"),
			registry_url: DEFAULT_REGISTRY_URL.to_string(),
			https_only: true,
			do_checksums: true,
			dry_run: false,
		}
	}
}

impl Config {
	/// Creates a config rooted in a single directory, mostly useful for tests and portable setups.
	pub fn portable(root: impl AsRef<Path>) -> Self {
		let root = root.as_ref();
		Self {
			data_dir: root.join("data"),
			cache_dir: root.join("cache"),
			..Default::default()
		}
	}

	/// Location of the config file.
	pub fn config_path() -> PathBuf {
		base_dir("XDG_CONFIG_HOME", ".config").join(APP_DIR).join("config.json")
	}

	/// Loads the config from [`Config::config_path()`].
	///
	/// A missing file is not an error, the default config is returned instead.
	///
	/// # Errors
	/// - [`IO`](crate::Error::IO) when the file exists but can't be read.
	/// - [`SerdeJSON`](crate::Error::SerdeJSON) when the file is not a valid config.
	pub fn load_from_disk() -> crate::Result<Self> {
		Self::load_from_file(Self::config_path())
	}

	pub fn load_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		match std::fs::read(path) {
			Ok(data) => Ok(serde_json::from_slice(&data)?),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				log::debug!("No config file at {}, using defaults.", path.display());
				Ok(Self::default())
			},
			Err(e) => Err(e.into()),
		}
	}

	/// Creates the data and cache directories if they are missing.
	pub fn ensure_dirs(&self) -> crate::Result<()> {
		std::fs::create_dir_all(&self.data_dir)?;
		std::fs::create_dir_all(&self.cache_dir)?;
		Ok(())
	}

	pub fn data_dir(&self) -> &Path {
		&self.data_dir
	}

	pub fn cache_dir(&self) -> &Path {
		&self.cache_dir
	}

	pub fn registry_url(&self) -> &str {
		&self.registry_url
	}
	pub fn set_registry_url(&mut self, registry_url: impl Into<String>) {
		self.registry_url = registry_url.into();
	}

	pub fn https_only(&self) -> bool {
		self.https_only
	}

	pub fn do_checksums(&self) -> bool {
		self.do_checksums
	}

	pub fn dry_run(&self) -> bool {
		self.dry_run
	}
	pub fn set_dry_run(&mut self, dry_run: bool) {
		self.dry_run = dry_run;
	}

	pub fn profiles_path(&self) -> PathBuf {
		self.data_dir.join("profiles.json")
	}

	pub fn installations_path(&self) -> PathBuf {
		self.data_dir.join("installations.json")
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test] fn config_portable_is_rooted() { assert!(Config::portable("/tmp/x").cache_dir().starts_with("/tmp/x")) }
	#[test] fn config_missing_file_is_default() { assert_eq!(Config::load_from_file("/definitely/not/here.json").unwrap().registry_url(), DEFAULT_REGISTRY_URL) }

	#[test]
	fn config_partial_file_uses_defaults() {
		let config: Config = serde_json::from_str(r#"{ "dry_run": true }"#).unwrap();
		assert!(config.dry_run());
		assert!(config.https_only());
	}
}
