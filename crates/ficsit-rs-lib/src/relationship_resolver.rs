//! Turns a profile's requirements into a concrete, mutually compatible set of mod versions.
//!
//! # Usage
//! 1. Create a [`ResolverBuilder`] for the game version being targeted.
//! 1. Use the builder to add the profile, any extra requirements and the previous lockfile.
//! 1. [`ResolverBuilder::build()`] to get a [`ResolverProcessor`]
//! 1. [`ResolverProcessor::resolve()`] against a [`Registry`](crate::Registry) to get the new [`LockFile`](crate::LockFile).
//!
//! # Process
//! Requirements are processed breadth first from a worklist seeded by the profile. Each mod is
//! pinned to the version held by the previous lockfile when that version is still acceptable,
//! otherwise to the newest compatible version satisfying every requirement placed on it so far.
//! Pinning a mod discovers its dependencies which are added to the worklist in turn.
//!
//! A requirement discovered later can invalidate an earlier pin, the mod is then re-pinned and the
//! requirements its old version placed on other mods are withdrawn. Mods which are no longer required
//! by anything are dropped.
//!
//! The first mod which can't be pinned stops the whole resolve, no partial result is produced.

use semver::Version;

use crate::ModReference;
use crate::registry::{GameVersion, RegistryError};
use crate::version_constraint::{ConstraintSet, VersionConstraint};

mod dependency_graph;
use dependency_graph::*;

mod compatibility_filter;
pub use compatibility_filter::CompatibilityFilter;

mod resolver_builder;
pub use resolver_builder::ResolverBuilder;
mod processing_resolver;
pub use processing_resolver::ResolverProcessor;
mod reconciler;
pub use reconciler::reconcile;

/// Where a requirement came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
	/// A root requirement declared by the named profile.
	Profile(String),
	/// A dependency declared by a mod at a specific version.
	Mod { reference: ModReference, version: Version },
}

impl std::fmt::Display for Origin {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Origin::Profile(name) => write!(f, "profile `{}`", name),
			Origin::Mod { reference, version } => write!(f, "{}@{}", reference, version),
		}
	}
}

/// A constraint on a mod and who placed it there.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRequirement {
	pub reference: ModReference,
	pub constraint: VersionConstraint,
	pub origin: Origin,
}

impl std::fmt::Display for DependencyRequirement {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {} (from {})", self.reference, self.constraint, self.origin)
	}
}

fn display_requirements(requirements: &[DependencyRequirement]) -> String {
	requirements.iter()
		.map(|r| format!("`{}` from {}", r.constraint, r.origin))
		.collect::<Vec<_>>()
		.join(", ")
}

/// These errors abort the resolve.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
	/// A mod reference which can't name a mod directory, such as `..` or `a/b`.
	#[error("invalid mod reference `{reference}` from {origin}")]
	InvalidReference {
		reference: ModReference,
		origin: Origin,
	},
	/// A constraint string could not be parsed.
	#[error("malformed version constraint `{text}` on {reference} from {origin}")]
	MalformedConstraint {
		reference: ModReference,
		text: String,
		origin: Origin,
	},
	/// The registry lists no version of the mod compatible with the game version.
	#[error("no version of {reference} is compatible with game version {game_version}")]
	NoCompatibleVersion {
		reference: ModReference,
		game_version: GameVersion,
	},
	/// No compatible version satisfies every requirement on the mod.
	#[error("no version of {reference} satisfies {constraint}, required by {}", display_requirements(.requirements))]
	VersionConflict {
		reference: ModReference,
		constraint: ConstraintSet,
		requirements: Vec<DependencyRequirement>,
	},
	/// A registry query failed.
	#[error("registry unavailable while querying {reference}: {source}")]
	RegistryUnavailable {
		reference: ModReference,
		source: RegistryError,
	},
	/// A mod kept being re-pinned, reported instead of looping.
	#[error("{reference} was re-pinned {attempts} times with only {candidates} candidate versions")]
	CycleExceeded {
		reference: ModReference,
		attempts: usize,
		candidates: usize,
	},
}

impl ResolveError {
	/// The mod the error is about.
	pub fn reference(&self) -> &str {
		match self {
			ResolveError::InvalidReference { reference, .. }
			| ResolveError::MalformedConstraint { reference, .. }
			| ResolveError::NoCompatibleVersion { reference, .. }
			| ResolveError::VersionConflict { reference, .. }
			| ResolveError::RegistryUnavailable { reference, .. }
			| ResolveError::CycleExceeded { reference, .. } => reference,
		}
	}
}

/// Builds the requirement `origin` places on `reference` from its unparsed constraint.
fn parse_requirement(reference: &str, text: &str, origin: &Origin) -> Result<DependencyRequirement, ResolveError> {
	if !crate::is_valid_reference(reference) {
		return Err(ResolveError::InvalidReference { reference: reference.to_string(), origin: origin.clone() });
	}
	let constraint = VersionConstraint::parse(text).map_err(|e| ResolveError::MalformedConstraint {
		reference: reference.to_string(),
		text: e.text,
		origin: origin.clone(),
	})?;
	Ok(DependencyRequirement { reference: reference.to_string(), constraint, origin: origin.clone() })
}
