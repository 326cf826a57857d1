//! Game installations managed by the crate, persisted as `installations.json`.

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::lockfile::LockFile;
use crate::profile::Profiles;
use crate::registry::{GameVersion, Registry};

pub mod platform;
pub use platform::Platform;

const INSTALLATIONS_FILE_VERSION: u32 = 0;

/// Any of these in the game root marks a game installation.
const GAME_EXECUTABLES: [&str; 3] = ["FactoryGame.exe", "FactoryServer.sh", "FactoryServer.exe"];

/// A single install of the game and the profile applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
	path: PathBuf,
	profile: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GameVersionFile {
	changelist: GameVersion,
}

impl Installation {
	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn profile(&self) -> &str {
		&self.profile
	}

	/// Changes the profile, which must exist in `profiles`.
	pub fn set_profile(&mut self, profiles: &Profiles, profile: &str) -> crate::Result<()> {
		if profiles.get_profile(profile).is_none() {
			return Err(crate::Error::NotFound(format!("profile {}", profile)));
		}
		self.profile = profile.to_string();
		Ok(())
	}

	/// Checks the profile exists and the path holds a game executable.
	///
	/// # Errors
	/// - [`NotFound`](crate::Error::NotFound) for an unknown profile.
	/// - [`Validation`](crate::Error::Validation) when no executable is found.
	pub fn validate(&self, profiles: &Profiles) -> crate::Result<()> {
		if profiles.get_profile(&self.profile).is_none() {
			return Err(crate::Error::NotFound(format!("profile {}", self.profile)));
		}

		for executable in GAME_EXECUTABLES {
			match std::fs::metadata(self.path.join(executable)) {
				Ok(_) => return Ok(()),
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
				Err(e) => return Err(e.into()),
			}
		}
		Err(crate::Error::Validation(format!("did not find game executable in {}", self.path.display())))
	}

	pub fn platform(&self) -> crate::Result<&'static Platform> {
		platform::detect(&self.path)
	}

	pub fn lockfile_path(&self) -> crate::Result<PathBuf> {
		Ok(self.path.join(self.platform()?.lockfile_path))
	}

	pub fn mods_dir(&self) -> PathBuf {
		self.path.join("FactoryGame").join("Mods")
	}

	/// Reads the `Changelist` of the installed build.
	pub fn game_version(&self) -> crate::Result<GameVersion> {
		let version_file = self.path.join(self.platform()?.version_path);
		let data = std::fs::read(&version_file)?;
		let parsed: GameVersionFile = serde_json::from_slice(&data)?;
		Ok(parsed.changelist)
	}

	/// Resolves the installation's profile, returning the current and the new lockfile.
	///
	/// Nothing is written.
	pub async fn resolve<R: Registry>(&self, profiles: &Profiles, registry: &R) -> crate::Result<(LockFile, LockFile)> {
		self.validate(profiles)?;
		let profile = profiles.get_profile(&self.profile)
			.ok_or_else(|| crate::Error::NotFound(format!("profile {}", self.profile)))?;

		let prior = LockFile::load_from_file(self.lockfile_path()?)?;
		let game_version = self.game_version()?;
		log::debug!("Resolving profile {} for {} (game version {})", profile.name(), self.path.display(), game_version);

		let lockfile = profile.resolve(registry, &prior, game_version).await?;
		Ok((prior, lockfile))
	}

	/// Resolves the profile, installs every mod and writes the new lockfile.
	///
	/// The lockfile is only written once every mod is in place, on failure the old one is kept.
	pub async fn install<R: Registry>(&self, config: &crate::Config, profiles: &Profiles, registry: &R) -> crate::Result<LockFile> {
		let (prior, lockfile) = self.resolve(profiles, registry).await?;
		let diff = prior.diff(&lockfile);
		for (reference, version) in &diff.removed {
			log::info!("{} {} is no longer required", reference, version);
		}

		let mods_dir = self.mods_dir();
		if !config.dry_run() {
			std::fs::create_dir_all(&mods_dir)?;
		}
		crate::installation::apply_lockfile(config, &mods_dir, &lockfile).await?;

		lockfile.save_to_file(self.lockfile_path()?, config.dry_run())?;
		Ok(lockfile)
	}
}

/// Every installation known to the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installations {
	version: u32,
	#[serde(default)]
	installations: Vec<Installation>,
	#[serde(default)]
	selected_installation: String,
	#[serde(skip)]
	file: PathBuf,
}

fn absolute(path: &Path) -> crate::Result<PathBuf> {
	if path.is_absolute() {
		Ok(path.to_path_buf())
	} else {
		Ok(std::env::current_dir()?.join(path))
	}
}

impl Installations {
	/// Reads the installations file, a missing file is an empty list.
	///
	/// # Errors
	/// [`UnknownFileVersion`](crate::Error::UnknownFileVersion) for files written by a newer version.
	pub fn init(file: impl AsRef<Path>) -> crate::Result<Self> {
		let file = file.as_ref();
		match std::fs::read(file) {
			Ok(data) => {
				let mut installations: Installations = serde_json::from_slice(&data)?;
				if installations.version > INSTALLATIONS_FILE_VERSION {
					return Err(crate::Error::UnknownFileVersion("installations", installations.version));
				}
				installations.file = file.to_path_buf();
				Ok(installations)
			},
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self {
				version: INSTALLATIONS_FILE_VERSION,
				installations: Vec::new(),
				selected_installation: String::new(),
				file: file.to_path_buf(),
			}),
			Err(e) => Err(e.into()),
		}
	}

	pub fn save(&self, dry_run: bool) -> crate::Result<()> {
		if dry_run {
			log::info!("dry-run: skipping installation saving");
			return Ok(());
		}
		if let Some(parent) = self.file.parent() {
			std::fs::create_dir_all(parent)?;
		}
		log::info!("Saving installations to {}", self.file.display());
		std::fs::write(&self.file, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}

	pub fn iter(&self) -> impl Iterator<Item = &Installation> {
		self.installations.iter()
	}

	/// Path of the installation commands act on when none is named, the first one added.
	pub fn selected_installation(&self) -> Option<&Path> {
		if self.selected_installation.is_empty() {
			None
		} else {
			Some(Path::new(&self.selected_installation))
		}
	}

	/// Registers the game at `path` with `profile`.
	///
	/// # Errors
	/// - Anything [`Installation::validate()`] reports.
	/// - [`AlreadyExists`](crate::Error::AlreadyExists) when the same directory is already registered.
	pub fn add_installation(&mut self, path: impl AsRef<Path>, profile: &str, profiles: &Profiles) -> crate::Result<&Installation> {
		let installation = Installation { path: absolute(path.as_ref())?, profile: profile.to_string() };
		installation.validate(profiles)?;

		let canonical = std::fs::canonicalize(&installation.path)?;
		let present = self.installations.iter()
			.filter_map(|i| std::fs::canonicalize(&i.path).ok())
			.any(|p| p == canonical);
		if present {
			return Err(crate::Error::AlreadyExists);
		}

		log::info!("Adding installation at {}", installation.path.display());
		if self.selected_installation.is_empty() {
			self.selected_installation = installation.path.display().to_string();
		}
		self.installations.push(installation);
		Ok(&self.installations[self.installations.len() - 1])
	}

	pub fn get_installation(&self, path: impl AsRef<Path>) -> Option<&Installation> {
		let path = absolute(path.as_ref()).ok()?;
		self.installations.iter().find(|i| i.path == path)
	}

	pub fn get_installation_mut(&mut self, path: impl AsRef<Path>) -> Option<&mut Installation> {
		let path = absolute(path.as_ref()).ok()?;
		self.installations.iter_mut().find(|i| i.path == path)
	}

	pub fn delete_installation(&mut self, path: impl AsRef<Path>) -> crate::Result<Installation> {
		let path = absolute(path.as_ref())?;
		let index = self.installations.iter()
			.position(|i| i.path == path)
			.ok_or_else(|| crate::Error::NotFound(format!("installation {}", path.display())))?;
		let removed = self.installations.remove(index);
		if self.selected_installation == removed.path.display().to_string() {
			self.selected_installation.clear();
		}
		Ok(removed)
	}
}
