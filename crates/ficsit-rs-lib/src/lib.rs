//! Mod management for Satisfactory installations.
//! 
//! The interesting part of this crate is [`relationship_resolver`] which turns a [`Profile`]
//! into a [`LockFile`] for a given game build. The remaining modules are the collaborators
//! around it: persistence of profiles and installations, the registry interface and the
//! download and extraction of mod archives.

pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::Config;

pub mod version_constraint;
pub use version_constraint::VersionConstraint;
pub use version_constraint::ConstraintSet;

pub mod registry;
pub use registry::Registry;
pub use registry::GameVersion;

pub mod lockfile;
pub use lockfile::LockFile;
pub use lockfile::LockedMod;

pub mod profile;
pub use profile::Profile;
pub use profile::Profiles;

pub mod relationship_resolver;
pub mod installation;
pub mod game_instance;

/// Opaque unique identifier of a mod, such as `"SML"` or `"RefinedPower"`.
pub type ModReference = String;

/// Whether `reference` can be used as the name of a mod's directory.
///
/// A reference must be a single plain path component, `SML` is fine but `..`, `a/b` and `a\\b` aren't.
pub fn is_valid_reference(reference: &str) -> bool {
	use std::path::{Component, Path};

	if reference.contains(['/', '\\']) {
		return false;
	}
	let mut components = Path::new(reference).components();
	matches!(
		(components.next(), components.next()),
		(Some(Component::Normal(name)), None) if name == reference
	)
}
