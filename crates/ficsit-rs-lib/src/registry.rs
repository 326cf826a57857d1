//! The interface to the mod registry.
//!
//! The resolver only ever talks to a [`Registry`], what sits behind it is up to the caller.
//! [`IndexRegistry`] is the implementation used by the terminal front-end, it reads a single
//! JSON index document from disk or over HTTP.

use std::future::Future;

use semver::Version;
use serde::{Serialize, Deserialize};

mod version_bounds;
pub use version_bounds::GameVersionBounds;

mod index;
pub use index::IndexRegistry;
pub use index::RegistryIndex;
pub use index::IndexedMod;
pub use index::IndexedVersion;
pub use index::IndexedGameVersion;

/// A game build number, the `Changelist` of an installation.
pub type GameVersion = u64;

/// One published version of a mod as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryVersion {
	pub version: Version,
	/// SHA-256 of the distributable archive.
	pub hash: String,
	/// Where the archive can be downloaded from.
	pub link: String,
	/// Whether this version supports the game version it was listed for.
	pub compatible: bool,
}

/// A dependency declared by a mod version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDependency {
	pub reference: crate::ModReference,
	/// Unparsed constraint text, parsing is left to the resolver so errors can name the owning mod.
	pub constraint: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	/// The registry could not be reached or refused the request.
	#[error("registry unavailable: {0}")]
	Unavailable(String),
	/// The registry answered with something we couldn't understand.
	#[error("malformed registry response: {0}")]
	Malformed(String),
	#[error("reqwest error: {0}")]
	Reqwest(#[from] reqwest::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
}

/// Queries the resolver needs answered.
///
/// Implementations must be safe to call concurrently for distinct mods. Retrying failed
/// requests, if desired, is the implementation's business; the resolver never retries.
pub trait Registry: Sync {
	/// Lists every version of `reference`, flagging those compatible with `game_version`.
	///
	/// An unknown mod is reported as an empty list.
	fn list_versions(&self, reference: &str, game_version: GameVersion)
		-> impl Future<Output = Result<Vec<RegistryVersion>, RegistryError>> + Send;

	/// Lists the dependencies declared by `reference` at `version`.
	fn list_dependencies(&self, reference: &str, version: &Version)
		-> impl Future<Output = Result<Vec<RegistryDependency>, RegistryError>> + Send;
}
