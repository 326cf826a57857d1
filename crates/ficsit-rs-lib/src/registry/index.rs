//! A registry backed by a single JSON index document.
//!
//! # Format
//! ```json
//! {
//!   "mods": {
//!     "RefinedPower": {
//!       "versions": [
//!         {
//!           "version": "3.2.1",
//!           "hash": "<sha256 of the archive>",
//!           "link": "https://example.com/RefinedPower-3.2.1.zip",
//!           "game_version": { "min": 211839 },
//!           "dependencies": { "SML": "^3.4.0" }
//!         }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use semver::Version;
use serde::{Serialize, Deserialize};

use super::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryIndex {
	#[serde(default)]
	pub mods: BTreeMap<crate::ModReference, IndexedMod>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexedMod {
	#[serde(default)]
	pub versions: Vec<IndexedVersion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedVersion {
	pub version: Version,
	pub hash: String,
	#[serde(default)]
	pub link: String,
	#[serde(default)]
	pub game_version: IndexedGameVersion,
	#[serde(default)]
	pub dependencies: BTreeMap<crate::ModReference, String>,
}

/// Serialized form of [`GameVersionBounds`], every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedGameVersion {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub explicit: Option<GameVersion>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min: Option<GameVersion>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max: Option<GameVersion>,
}

impl IndexedGameVersion {
	pub fn bounds(&self) -> crate::Result<GameVersionBounds> {
		GameVersionBounds::new(self.explicit, self.min, self.max)
	}
}

#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
	index: RegistryIndex,
}

impl IndexRegistry {
	pub fn from_index(index: RegistryIndex) -> Self {
		Self { index }
	}

	/// Reads the index from a local file.
	///
	/// # Errors
	/// - [`IO`](RegistryError::IO) when the file can't be read.
	/// - [`SerdeJSON`](RegistryError::SerdeJSON) when it isn't a valid index.
	pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
		let data = std::fs::read(path.as_ref())?;
		Ok(Self::from_index(serde_json::from_slice(&data)?))
	}

	/// Loads the index from [`Config::registry_url()`](crate::Config::registry_url()).
	///
	/// URLs are fetched over HTTP, anything else is treated as a path.
	pub async fn load(config: &crate::Config) -> Result<Self, RegistryError> {
		let location = config.registry_url();
		if location.starts_with("http://") || location.starts_with("https://") {
			let client = reqwest::Client::builder()
				.https_only(config.https_only())
				.build()?;
			Self::fetch(&client, location).await
		} else {
			log::debug!("Reading registry index from {}", location);
			Self::load_from_file(location)
		}
	}

	pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self, RegistryError> {
		log::info!("Fetching registry index from {}", url);
		let response = client
			.get(url)
			.send()
			.await
			.map_err(|e| RegistryError::Unavailable(e.to_string()))?;

		if !response.status().is_success() {
			return Err(RegistryError::Unavailable(format!("{} returned {}", url, response.status())));
		}

		let body = response.bytes().await?;
		Ok(Self::from_index(serde_json::from_slice(&body)?))
	}

	fn find_version(&self, reference: &str, version: &Version) -> Option<&IndexedVersion> {
		self.index.mods.get(reference)?
			.versions
			.iter()
			.find(|v| crate::version_constraint::precedence(&v.version, version).is_eq())
	}
}

impl Registry for IndexRegistry {
	async fn list_versions(&self, reference: &str, game_version: GameVersion) -> Result<Vec<RegistryVersion>, RegistryError> {
		let Some(indexed) = self.index.mods.get(reference) else {
			return Ok(Vec::new());
		};

		indexed.versions.iter().map(|v| -> Result<RegistryVersion, RegistryError> {
			let bounds = v.game_version.bounds()
				.map_err(|e| RegistryError::Malformed(format!("{}@{}: {}", reference, v.version, e)))?;
			Ok(RegistryVersion {
				version: v.version.clone(),
				hash: v.hash.clone(),
				link: v.link.clone(),
				compatible: bounds.contains(game_version),
			})
		}).collect()
	}

	async fn list_dependencies(&self, reference: &str, version: &Version) -> Result<Vec<RegistryDependency>, RegistryError> {
		let indexed = self.find_version(reference, version)
			.ok_or_else(|| RegistryError::Malformed(format!("{}@{} is not in the index", reference, version)))?;

		Ok(indexed.dependencies.iter()
			.map(|(reference, constraint)| RegistryDependency { reference: reference.clone(), constraint: constraint.clone() })
			.collect())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	const INDEX: &str = r#"{
		"mods": {
			"SML": { "versions": [
				{ "version": "3.4.0", "hash": "aa", "link": "https://example.com/sml-3.4.0.zip", "game_version": { "min": 200000 } },
				{ "version": "3.5.0", "hash": "bb", "link": "https://example.com/sml-3.5.0.zip", "game_version": { "min": 250000 } }
			]},
			"RefinedPower": { "versions": [
				{ "version": "3.2.1", "hash": "cc", "link": "https://example.com/rp.zip", "dependencies": { "SML": "^3.4.0" } }
			]}
		}
	}"#;

	fn registry() -> IndexRegistry {
		IndexRegistry::from_index(serde_json::from_str(INDEX).unwrap())
	}

	#[tokio::test]
	async fn index_flags_compatibility() {
		let versions = registry().list_versions("SML", 211839).await.unwrap();
		assert_eq!(versions.len(), 2);
		assert!(versions[0].compatible);
		assert!(!versions[1].compatible);
	}

	#[tokio::test]
	async fn index_unknown_mod_is_empty() {
		assert!(registry().list_versions("Nope", 1).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn index_lists_dependencies() {
		let deps = registry().list_dependencies("RefinedPower", &Version::new(3, 2, 1)).await.unwrap();
		assert_eq!(deps, vec![RegistryDependency { reference: "SML".into(), constraint: "^3.4.0".into() }]);
	}

	#[tokio::test]
	async fn index_unknown_version_is_malformed() {
		let res = registry().list_dependencies("RefinedPower", &Version::new(9, 9, 9)).await;
		assert!(matches!(res, Err(RegistryError::Malformed(_))));
	}
}
