//! Various helper functions for testing
//!
//! Fixture builders panic on bad input, everything touching the filesystem returns a result.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ficsit_rs::registry::{GameVersion, Registry, RegistryDependency, RegistryError, RegistryVersion};
use semver::Version;

#[derive(Debug, thiserror::Error)]
pub enum TestUtilsError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("copy error: {0}")]
	Copy(#[from] fs_extra::error::Error),
}

/// Game version reported by [`temp_game_installation()`].
pub const FIXTURE_GAME_VERSION: GameVersion = 211839;

/// Copies the fixture game installation into a temporary directory.
///
/// The copy is a Windows client install with `FactoryGame.exe` and a version file for [`FIXTURE_GAME_VERSION`].
pub fn temp_game_installation() -> Result<tempfile::TempDir, TestUtilsError> {
	let dir = tempfile::tempdir()?;
	let mut options = fs_extra::dir::CopyOptions::new();
	options.content_only = true;
	fs_extra::dir::copy(fixture_dir(), dir.path(), &options)?;
	Ok(dir)
}

pub fn fixture_dir() -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data").join("game")
}

#[derive(Debug, Clone)]
struct MockVersion {
	listed: RegistryVersion,
	dependencies: Vec<RegistryDependency>,
}

/// An in-memory [`Registry`].
///
/// Versions are reported compatible or not regardless of the game version asked for.
/// Every query is counted so tests can check how often the registry was hit.
#[derive(Debug, Default)]
pub struct MockRegistry {
	mods: BTreeMap<String, Vec<MockVersion>>,
	unavailable: HashSet<String>,
	version_calls: Mutex<HashMap<String, usize>>,
	dependency_calls: AtomicUsize,
}

fn parse_version(version: &str) -> Version {
	Version::parse(version).unwrap_or_else(|e| panic!("bad fixture version {}: {}", version, e))
}

impl MockRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a compatible version with a generated hash and link.
	pub fn with_version(self, reference: &str, version: &str) -> Self {
		self.with_listing(reference, version, true)
	}

	/// Adds a version flagged as incompatible with the game.
	pub fn with_incompatible_version(self, reference: &str, version: &str) -> Self {
		self.with_listing(reference, version, false)
	}

	fn with_listing(mut self, reference: &str, version: &str, compatible: bool) -> Self {
		let listed = RegistryVersion {
			version: parse_version(version),
			hash: format!("{}-{}", reference, version),
			link: format!("https://example.com/{}-{}.zip", reference, version),
			compatible,
		};
		self.mods.entry(reference.to_string()).or_default().push(MockVersion { listed, dependencies: Vec::new() });
		self
	}

	/// Overrides the hash and link of a version added earlier.
	///
	/// # Panics
	/// When the version hasn't been added.
	pub fn with_artifact(mut self, reference: &str, version: &str, hash: &str, link: &str) -> Self {
		let entry = self.version_mut(reference, version);
		entry.listed.hash = hash.to_string();
		entry.listed.link = link.to_string();
		self
	}

	/// Declares a dependency of `reference@version` on `dependency`.
	///
	/// # Panics
	/// When `reference@version` hasn't been added.
	pub fn with_dependency(mut self, reference: &str, version: &str, dependency: &str, constraint: &str) -> Self {
		self.version_mut(reference, version).dependencies.push(RegistryDependency {
			reference: dependency.to_string(),
			constraint: constraint.to_string(),
		});
		self
	}

	/// Every query about `reference` fails with [`RegistryError::Unavailable`].
	pub fn with_unavailable(mut self, reference: &str) -> Self {
		self.unavailable.insert(reference.to_string());
		self
	}

	fn version_mut(&mut self, reference: &str, version: &str) -> &mut MockVersion {
		let version = parse_version(version);
		self.mods.get_mut(reference)
			.and_then(|versions| versions.iter_mut().find(|v| v.listed.version == version))
			.unwrap_or_else(|| panic!("{}@{} is not in the mock registry", reference, version))
	}

	/// How many times the versions of `reference` were listed.
	pub fn list_versions_calls(&self, reference: &str) -> usize {
		self.version_calls.lock().map(|calls| calls.get(reference).copied().unwrap_or(0)).unwrap_or(0)
	}

	/// Total number of dependency queries.
	pub fn list_dependencies_calls(&self) -> usize {
		self.dependency_calls.load(Ordering::SeqCst)
	}

	fn check_available(&self, reference: &str) -> Result<(), RegistryError> {
		if self.unavailable.contains(reference) {
			Err(RegistryError::Unavailable(format!("{} timed out", reference)))
		} else {
			Ok(())
		}
	}
}

impl Registry for MockRegistry {
	async fn list_versions(&self, reference: &str, _game_version: GameVersion) -> Result<Vec<RegistryVersion>, RegistryError> {
		if let Ok(mut calls) = self.version_calls.lock() {
			*calls.entry(reference.to_string()).or_default() += 1;
		}
		self.check_available(reference)?;
		Ok(self.mods.get(reference)
			.map(|versions| versions.iter().map(|v| v.listed.clone()).collect())
			.unwrap_or_default())
	}

	async fn list_dependencies(&self, reference: &str, version: &Version) -> Result<Vec<RegistryDependency>, RegistryError> {
		self.dependency_calls.fetch_add(1, Ordering::SeqCst);
		self.check_available(reference)?;
		self.mods.get(reference)
			.and_then(|versions| versions.iter().find(|v| &v.listed.version == version))
			.map(|v| v.dependencies.clone())
			.ok_or_else(|| RegistryError::Malformed(format!("{}@{} is not listed", reference, version)))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn fixture_is_copied() {
		let dir = temp_game_installation().unwrap();
		assert!(dir.path().join("FactoryGame.exe").exists());
	}
}
