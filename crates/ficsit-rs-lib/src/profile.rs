//! Named sets of mods a user wants installed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::ModReference;
use crate::lockfile::LockFile;
use crate::registry::{GameVersion, Registry};
use crate::relationship_resolver::{ResolveError, ResolverBuilder};
use crate::version_constraint::VersionConstraint;

pub const DEFAULT_PROFILE_NAME: &str = "Default";
const PROFILES_FILE_VERSION: u32 = 0;

/// A mod declared by a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMod {
	/// Constraint text, kept as written by the user.
	pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
	name: String,
	#[serde(default)]
	mods: BTreeMap<ModReference, ProfileMod>,
}

impl Profile {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), mods: BTreeMap::new() }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Adds or replaces a mod.
	///
	/// # Errors
	/// - [`Constraint`](crate::Error::Constraint) when `constraint` doesn't parse.
	/// - [`Validation`](crate::Error::Validation) when `reference` isn't a plain mod name like `SML`.
	///
	/// The profile is unchanged on error.
	pub fn add_mod(&mut self, reference: impl Into<ModReference>, constraint: &str) -> crate::Result<()> {
		VersionConstraint::parse(constraint)?;
		let reference = reference.into();
		if !crate::is_valid_reference(&reference) {
			return Err(crate::Error::Validation(format!("invalid mod reference `{}`", reference)));
		}
		log::debug!("Profile {}: requiring {} {}", self.name, reference, constraint.trim());
		self.mods.insert(reference, ProfileMod { version: constraint.trim().to_string() });
		Ok(())
	}

	pub fn remove_mod(&mut self, reference: &str) -> Option<ProfileMod> {
		self.mods.remove(reference)
	}

	/// The root requirements of the profile in a stable order.
	pub fn requirements(&self) -> impl Iterator<Item = (&ModReference, &str)> {
		self.mods.iter().map(|(r, m)| (r, m.version.as_str()))
	}

	/// Resolves the profile for `game_version`, preferring the versions held by `prior`.
	pub async fn resolve<R: Registry>(&self, registry: &R, prior: &LockFile, game_version: GameVersion) -> Result<LockFile, ResolveError> {
		ResolverBuilder::new(game_version)
			.profile(self)
			.prior_lockfile(prior)
			.build()
			.resolve(registry)
			.await
	}
}

/// Every profile known to the manager, persisted as `profiles.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profiles {
	version: u32,
	profiles: BTreeMap<String, Profile>,
	selected_profile: String,
	#[serde(skip)]
	path: PathBuf,
}

impl Profiles {
	/// Reads the profiles file, creating a `Default` profile when there isn't one.
	///
	/// # Errors
	/// - [`UnknownFileVersion`](crate::Error::UnknownFileVersion) for files written by a newer version.
	/// - [`IO`](crate::Error::IO) and [`SerdeJSON`](crate::Error::SerdeJSON) for unreadable files.
	pub fn init(path: impl AsRef<Path>) -> crate::Result<Self> {
		let path = path.as_ref();
		match std::fs::read(path) {
			Ok(data) => {
				let mut profiles: Profiles = serde_json::from_slice(&data)?;
				if profiles.version > PROFILES_FILE_VERSION {
					return Err(crate::Error::UnknownFileVersion("profiles", profiles.version));
				}
				profiles.path = path.to_path_buf();
				Ok(profiles)
			},
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				log::info!("No profiles at {}, creating {} profile", path.display(), DEFAULT_PROFILE_NAME);
				let mut profiles = BTreeMap::new();
				profiles.insert(DEFAULT_PROFILE_NAME.to_string(), Profile::new(DEFAULT_PROFILE_NAME));
				Ok(Self {
					version: PROFILES_FILE_VERSION,
					profiles,
					selected_profile: DEFAULT_PROFILE_NAME.to_string(),
					path: path.to_path_buf(),
				})
			},
			Err(e) => Err(e.into()),
		}
	}

	pub fn save(&self, dry_run: bool) -> crate::Result<()> {
		if dry_run {
			log::info!("dry-run: skipping profiles write to {}", self.path.display());
			return Ok(());
		}
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&self.path, serde_json::to_string_pretty(self)?)?;
		log::info!("Saved {} profiles to {}", self.profiles.len(), self.path.display());
		Ok(())
	}

	pub fn get_profile(&self, name: &str) -> Option<&Profile> {
		self.profiles.get(name)
	}

	pub fn get_profile_mut(&mut self, name: &str) -> Option<&mut Profile> {
		self.profiles.get_mut(name)
	}

	pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
		self.profiles.values()
	}

	pub fn selected_profile(&self) -> &str {
		&self.selected_profile
	}

	pub fn set_selected_profile(&mut self, name: &str) -> crate::Result<()> {
		if !self.profiles.contains_key(name) {
			return Err(crate::Error::NotFound(format!("profile {}", name)));
		}
		self.selected_profile = name.to_string();
		Ok(())
	}

	pub fn add_profile(&mut self, name: &str) -> crate::Result<&mut Profile> {
		if self.profiles.contains_key(name) {
			return Err(crate::Error::AlreadyExists);
		}
		Ok(self.profiles.entry(name.to_string()).or_insert_with(|| Profile::new(name)))
	}

	pub fn delete_profile(&mut self, name: &str) -> crate::Result<Profile> {
		let removed = self.profiles.remove(name).ok_or_else(|| crate::Error::NotFound(format!("profile {}", name)))?;
		if self.selected_profile == name {
			self.selected_profile = self.profiles.keys().next().cloned().unwrap_or_default();
		}
		Ok(removed)
	}

	pub fn rename_profile(&mut self, old: &str, new: &str) -> crate::Result<()> {
		if self.profiles.contains_key(new) {
			return Err(crate::Error::AlreadyExists);
		}
		let mut profile = self.profiles.remove(old).ok_or_else(|| crate::Error::NotFound(format!("profile {}", old)))?;
		profile.name = new.to_string();
		self.profiles.insert(new.to_string(), profile);
		if self.selected_profile == old {
			self.selected_profile = new.to_string();
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn init() -> (tempfile::TempDir, Profiles) {
		let dir = tempfile::tempdir().unwrap();
		let profiles = Profiles::init(dir.path().join("profiles.json")).unwrap();
		(dir, profiles)
	}

	#[test] fn profile_rejects_malformed_constraint() { assert!(Profile::new("p").add_mod("A", "~1.0").is_err()) }

	#[test]
	fn profile_rejects_path_like_reference() {
		let mut p = Profile::new("p");
		assert!(matches!(p.add_mod("../..", "^1.0.0"), Err(crate::Error::Validation(_))));
		assert_eq!(p.requirements().count(), 0);
	}

	#[test]
	fn profile_requirements_are_sorted() {
		let mut p = Profile::new("p");
		p.add_mod("B", "^1.0.0").unwrap();
		p.add_mod("A", " =2.0.0 ").unwrap();
		assert_eq!(p.requirements().collect::<Vec<_>>(), vec![(&"A".to_string(), "=2.0.0"), (&"B".to_string(), "^1.0.0")]);
	}

	#[test]
	fn profiles_init_creates_default() {
		let (_dir, profiles) = init();
		assert!(profiles.get_profile(DEFAULT_PROFILE_NAME).is_some());
		assert_eq!(profiles.selected_profile(), DEFAULT_PROFILE_NAME);
	}

	#[test]
	fn profiles_save_and_reload() {
		let (dir, mut profiles) = init();
		profiles.add_profile("Modded").unwrap().add_mod("SML", "^3.4.0").unwrap();
		profiles.save(false).unwrap();
		let loaded = Profiles::init(dir.path().join("profiles.json")).unwrap();
		assert_eq!(loaded, profiles);
	}

	#[test]
	fn profiles_dry_run_does_not_write() {
		let (dir, profiles) = init();
		profiles.save(true).unwrap();
		assert!(!dir.path().join("profiles.json").exists());
	}

	#[test]
	fn profiles_reject_newer_file_version() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("profiles.json");
		std::fs::write(&path, r#"{"version":99,"profiles":{},"selected_profile":""}"#).unwrap();
		assert!(matches!(Profiles::init(&path), Err(crate::Error::UnknownFileVersion("profiles", 99))));
	}

	#[test]
	fn profiles_duplicate_name() {
		let (_dir, mut profiles) = init();
		assert!(matches!(profiles.add_profile(DEFAULT_PROFILE_NAME), Err(crate::Error::AlreadyExists)));
	}

	#[test]
	fn profiles_rename_moves_selection() {
		let (_dir, mut profiles) = init();
		profiles.rename_profile(DEFAULT_PROFILE_NAME, "Main").unwrap();
		assert_eq!(profiles.selected_profile(), "Main");
		assert_eq!(profiles.get_profile("Main").unwrap().name(), "Main");
	}

	#[test]
	fn profiles_select() {
		let (_dir, mut profiles) = init();
		profiles.add_profile("Modded").unwrap();
		profiles.set_selected_profile("Modded").unwrap();
		assert_eq!(profiles.selected_profile(), "Modded");
		assert!(matches!(profiles.set_selected_profile("Nope"), Err(crate::Error::NotFound(_))));
		assert_eq!(profiles.selected_profile(), "Modded");
	}

	#[test]
	fn profiles_delete_missing() {
		let (_dir, mut profiles) = init();
		assert!(matches!(profiles.delete_profile("Nope"), Err(crate::Error::NotFound(_))));
	}
}
