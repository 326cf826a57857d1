use std::collections::HashMap;

use crate::ModReference;
use crate::registry::{GameVersion, Registry, RegistryError, RegistryVersion};
use crate::version_constraint::precedence;
use super::ResolveError;

/// Narrows registry listings to the versions usable with one game version.
///
/// Each mod is queried at most once per resolve, later lookups are served from the cache.
/// A failed query is held until the mod is asked for so the error reported doesn't depend on
/// which query finished first.
pub struct CompatibilityFilter<'r, R: Registry> {
	registry: &'r R,
	game_version: GameVersion,
	listings: HashMap<ModReference, Vec<RegistryVersion>>,
	failures: HashMap<ModReference, RegistryError>,
}

impl<'r, R: Registry> CompatibilityFilter<'r, R> {
	pub fn new(registry: &'r R, game_version: GameVersion) -> Self {
		Self { registry, game_version, listings: HashMap::new(), failures: HashMap::new() }
	}

	fn is_fetched(&self, reference: &str) -> bool {
		self.listings.contains_key(reference) || self.failures.contains_key(reference)
	}

	/// Fetches the listings of every uncached mod in `references` concurrently.
	///
	/// Failures are kept and reported by [`Self::candidates()`].
	pub async fn prefetch(&mut self, references: impl IntoIterator<Item = ModReference>) {
		let mut missing: Vec<ModReference> = references.into_iter()
			.filter(|r| !self.is_fetched(r))
			.collect();
		missing.sort();
		missing.dedup();
		if missing.is_empty() {
			return;
		}

		log::trace!("Fetching listings for {:?}", missing);
		let registry = self.registry;
		let game_version = self.game_version;
		let fetched = futures::future::join_all(missing.into_iter().map(move |reference| async move {
			let listing = registry.list_versions(&reference, game_version).await;
			(reference, listing)
		})).await;

		for (reference, listing) in fetched {
			match listing {
				Ok(versions) => { self.listings.insert(reference, Self::narrow(versions)); },
				Err(source) => {
					log::debug!("Listing {} failed: {}", reference, source);
					self.failures.insert(reference, source);
				},
			}
		}
	}

	/// Compatible versions of `reference`, newest first.
	///
	/// # Errors
	/// - [`ResolveError::NoCompatibleVersion`] when nothing usable is listed.
	/// - [`ResolveError::RegistryUnavailable`] when the listing couldn't be fetched.
	pub async fn candidates(&mut self, reference: &str) -> Result<&[RegistryVersion], ResolveError> {
		if !self.is_fetched(reference) {
			self.prefetch([reference.to_string()]).await;
		}
		if let Some(source) = self.failures.remove(reference) {
			return Err(ResolveError::RegistryUnavailable { reference: reference.to_string(), source });
		}

		let candidates = self.listings.get(reference).map(Vec::as_slice).unwrap_or(&[]);
		if candidates.is_empty() {
			return Err(ResolveError::NoCompatibleVersion {
				reference: reference.to_string(),
				game_version: self.game_version,
			});
		}
		Ok(candidates)
	}

	fn narrow(versions: Vec<RegistryVersion>) -> Vec<RegistryVersion> {
		let mut versions: Vec<_> = versions.into_iter().filter(|v| v.compatible).collect();
		versions.sort_by(|a, b| precedence(&b.version, &a.version));
		versions.dedup_by(|a, b| precedence(&a.version, &b.version).is_eq());
		versions
	}
}

#[cfg(test)]
mod test {
	use semver::Version;

	use super::*;

	fn rv(v: &str, compatible: bool) -> RegistryVersion {
		RegistryVersion { version: Version::parse(v).unwrap(), hash: String::new(), link: String::new(), compatible }
	}

	#[test]
	fn narrow_drops_incompatible_and_sorts() {
		let narrowed = CompatibilityFilter::<crate::registry::IndexRegistry>::narrow(vec![
			rv("1.0.0", true),
			rv("2.0.0", false),
			rv("1.2.0", true),
			rv("1.2.0-beta.1", true),
		]);
		let versions: Vec<_> = narrowed.iter().map(|v| v.version.to_string()).collect();
		assert_eq!(versions, vec!["1.2.0", "1.2.0-beta.1", "1.0.0"]);
	}
}
