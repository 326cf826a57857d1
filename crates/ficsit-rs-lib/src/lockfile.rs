//! The resolved set of mods for an installation.
//!
//! A lockfile is never edited in place. Each successful resolve produces a complete
//! replacement which is written next to the old one and then renamed over it.

use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;
use serde::{Serialize, Deserialize};

use crate::ModReference;

/// A mod pinned to one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedMod {
	pub version: Version,
	#[serde(default)]
	pub hash: String,
	/// Empty when the mod is managed by the user and must not be downloaded.
	#[serde(default)]
	pub link: String,
}

impl LockedMod {
	/// Local mods are assumed to be installed already.
	pub fn is_local(&self) -> bool {
		self.link.is_empty()
	}
}

/// Mapping of every mod in a resolve to its pinned version.
///
/// Backed by a `BTreeMap` so serializing the same resolve always produces the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockFile {
	mods: BTreeMap<ModReference, LockedMod>,
}

/// What changed between two lockfiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockFileDiff {
	pub added: Vec<(ModReference, Version)>,
	pub removed: Vec<(ModReference, Version)>,
	/// `(reference, old, new)`
	pub changed: Vec<(ModReference, Version, Version)>,
}

impl LockFileDiff {
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
	}
}

impl LockFile {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, reference: &str) -> Option<&LockedMod> {
		self.mods.get(reference)
	}

	pub fn len(&self) -> usize {
		self.mods.len()
	}

	pub fn is_empty(&self) -> bool {
		self.mods.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&ModReference, &LockedMod)> {
		self.mods.iter()
	}

	/// Compares `self` (the old lockfile) against `new`.
	pub fn diff(&self, new: &LockFile) -> LockFileDiff {
		let mut diff = LockFileDiff::default();
		for (reference, locked) in &new.mods {
			match self.mods.get(reference) {
				None => diff.added.push((reference.clone(), locked.version.clone())),
				Some(old) if old.version != locked.version => {
					diff.changed.push((reference.clone(), old.version.clone(), locked.version.clone()))
				},
				Some(_) => {},
			}
		}
		for (reference, locked) in &self.mods {
			if !new.mods.contains_key(reference) {
				diff.removed.push((reference.clone(), locked.version.clone()));
			}
		}
		diff
	}

	/// Reads a lockfile, a missing file is an empty lockfile.
	///
	/// # Errors
	/// - [`IO`](crate::Error::IO) when the file exists but can't be read.
	/// - [`SerdeJSON`](crate::Error::SerdeJSON) when the file isn't a lockfile.
	pub fn load_from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		match std::fs::read(path) {
			Ok(data) => Ok(serde_json::from_slice(&data)?),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				log::debug!("No lockfile at {}, starting fresh.", path.display());
				Ok(Self::default())
			},
			Err(e) => Err(e.into()),
		}
	}

	/// Writes the lockfile to `path`.
	///
	/// The data is written to a temporary sibling first and renamed into place so a reader
	/// sees either the old lockfile or the new one.
	pub fn save_to_file(&self, path: impl AsRef<Path>, dry_run: bool) -> crate::Result<()> {
		let path = path.as_ref();
		if dry_run {
			log::info!("dry-run: skipping lockfile write to {}", path.display());
			return Ok(());
		}

		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		let tmp = path.with_extension("json.tmp");
		std::fs::write(&tmp, self.to_json()?)?;
		std::fs::rename(&tmp, path)?;
		log::info!("Saved lockfile with {} mods to {}", self.len(), path.display());
		Ok(())
	}

	pub fn to_json(&self) -> crate::Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}

impl FromIterator<(ModReference, LockedMod)> for LockFile {
	fn from_iter<T: IntoIterator<Item = (ModReference, LockedMod)>>(iter: T) -> Self {
		Self { mods: iter.into_iter().collect() }
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn locked(v: &str, link: &str) -> LockedMod {
		LockedMod { version: Version::parse(v).unwrap(), hash: "h".into(), link: link.into() }
	}

	#[test]
	fn lockfile_json_shape() {
		let lock: LockFile = [("SML".to_string(), locked("3.4.0", "https://x"))].into_iter().collect();
		let json: serde_json::Value = serde_json::from_str(&lock.to_json().unwrap()).unwrap();
		assert_eq!(json["SML"]["version"], "3.4.0");
		assert_eq!(json["SML"]["link"], "https://x");
	}

	#[test]
	fn lockfile_serialization_is_ordered() {
		let a: LockFile = [("b".to_string(), locked("1.0.0", "")), ("a".to_string(), locked("1.0.0", ""))].into_iter().collect();
		let b: LockFile = [("a".to_string(), locked("1.0.0", "")), ("b".to_string(), locked("1.0.0", ""))].into_iter().collect();
		assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
	}

	#[test]
	fn lockfile_missing_file_is_empty() {
		let dir = tempfile::tempdir().unwrap();
		assert!(LockFile::load_from_file(dir.path().join("lock.json")).unwrap().is_empty());
	}

	#[test]
	fn lockfile_save_replaces_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("lock.json");
		let lock: LockFile = [("SML".to_string(), locked("3.4.0", ""))].into_iter().collect();
		lock.save_to_file(&path, false).unwrap();
		assert_eq!(LockFile::load_from_file(&path).unwrap(), lock);
		assert!(!path.with_extension("json.tmp").exists());
	}

	#[test]
	fn lockfile_dry_run_writes_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("lock.json");
		LockFile::new().save_to_file(&path, true).unwrap();
		assert!(!path.exists());
	}

	#[test]
	fn lockfile_diff() {
		let old: LockFile = [("a".to_string(), locked("1.0.0", "")), ("b".to_string(), locked("1.0.0", ""))].into_iter().collect();
		let new: LockFile = [("b".to_string(), locked("2.0.0", "")), ("c".to_string(), locked("1.0.0", ""))].into_iter().collect();
		let diff = old.diff(&new);
		assert_eq!(diff.added, vec![("c".to_string(), Version::new(1, 0, 0))]);
		assert_eq!(diff.removed, vec![("a".to_string(), Version::new(1, 0, 0))]);
		assert_eq!(diff.changed, vec![("b".to_string(), Version::new(1, 0, 0), Version::new(2, 0, 0))]);
	}
}
