use std::collections::BTreeMap;

use crate::ModReference;
use crate::lockfile::{LockFile, LockedMod};
use crate::registry::RegistryVersion;
use crate::version_constraint::precedence;

/// Builds the lockfile for a finished resolve.
///
/// Entries come from the registry data of each pin, except where `prior` locked the same
/// version with an empty link. Those are local mods and are carried over as they were.
/// Mods only found in `prior` are dropped.
pub fn reconcile(pins: &BTreeMap<ModReference, RegistryVersion>, prior: &LockFile) -> LockFile {
	pins.iter()
		.map(|(reference, pin)| {
			let locked = match prior.get(reference) {
				Some(previous) if previous.is_local() && precedence(&previous.version, &pin.version).is_eq() => previous.clone(),
				_ => LockedMod {
					version: pin.version.clone(),
					hash: pin.hash.clone(),
					link: pin.link.clone(),
				},
			};
			(reference.clone(), locked)
		})
		.collect()
}
