//! Version constraints placed on mods by profiles and by other mods.
//!
//! # Syntax
//!
//! `[OP]MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]` where `OP` is one of
//! `=`, `<`, `<=`, `>`, `>=` or `^`. A missing operator means an exact match.
//!
//! `^` is "compatible with": the version must be at least the base version and share
//! its major version, or its minor version when the major version is `0`.
//!
//! # Pre-releases
//!
//! A pre-release candidate only satisfies a constraint whose base version is itself a
//! pre-release of the same `MAJOR.MINOR.PATCH`. `^1.0.0` does not match `1.1.0-beta.1`
//! but `>=1.1.0-beta.0` does. A [`ConstraintSet`] can lift this restriction.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use try_map::FallibleMapExt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed version constraint `{text}`")]
pub struct ConstraintParseError {
	pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
	Exact,
	Less,
	LessEq,
	Greater,
	GreaterEq,
	Compatible,
}

impl Operator {
	fn as_str(&self) -> &'static str {
		match self {
			Operator::Exact => "=",
			Operator::Less => "<",
			Operator::LessEq => "<=",
			Operator::Greater => ">",
			Operator::GreaterEq => ">=",
			Operator::Compatible => "^",
		}
	}
}

/// Compares versions by semantic version precedence.
///
/// Unlike the `Ord` implementation of [`Version`] build metadata is ignored.
pub fn precedence(lhs: &Version, rhs: &Version) -> Ordering {
	lhs.major.cmp(&rhs.major)
		.then(lhs.minor.cmp(&rhs.minor))
		.then(lhs.patch.cmp(&rhs.patch))
		.then_with(|| lhs.pre.cmp(&rhs.pre))
}

/// A predicate over versions, an operator applied to a base version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionConstraint {
	operator: Operator,
	base: Version,
	/// The operator was written out, only matters for display.
	explicit_operator: bool,
}

fn constraint_regex() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| {
		Regex::new(r"^(<=|<|>=|>|=|\^)?\s*(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$")
			.expect("constraint regex should compile")
	})
}

impl VersionConstraint {
	/// Parses a constraint such as `^1.2.0` or `>=2.0.0-beta.1`.
	///
	/// # Errors
	/// [`ConstraintParseError`] holding the offending text when it isn't a valid constraint.
	pub fn parse(text: &str) -> Result<Self, ConstraintParseError> {
		let err = || ConstraintParseError { text: text.to_string() };

		let captures = constraint_regex().captures(text.trim()).ok_or_else(err)?;

		let (operator, explicit_operator) = match captures.get(1).map(|m| m.as_str()) {
			None => (Operator::Exact, false),
			Some("=") => (Operator::Exact, true),
			Some("<") => (Operator::Less, true),
			Some("<=") => (Operator::LessEq, true),
			Some(">") => (Operator::Greater, true),
			Some(">=") => (Operator::GreaterEq, true),
			Some("^") => (Operator::Compatible, true),
			Some(_) => return Err(err()),
		};

		let component = |i: usize| -> Result<u64, ConstraintParseError> {
			captures.get(i).ok_or_else(err)?.as_str().parse::<u64>().map_err(|_| err())
		};

		let base = Version {
			major: component(2)?,
			minor: component(3)?,
			patch: component(4)?,
			pre: captures.get(5).try_map(|m| Prerelease::new(m.as_str()).map_err(|_| err()))?.unwrap_or(Prerelease::EMPTY),
			build: captures.get(6).try_map(|m| BuildMetadata::new(m.as_str()).map_err(|_| err()))?.unwrap_or(BuildMetadata::EMPTY),
		};

		Ok(Self { operator, base, explicit_operator })
	}

	pub fn operator(&self) -> Operator {
		self.operator
	}

	/// Checks `version` against the constraint, applying the pre-release rule.
	pub fn satisfies(&self, version: &Version) -> bool {
		self.admits_prerelease(version) && self.matches_range(version)
	}

	/// Checks `version` against the operator only, ignoring the pre-release rule.
	pub fn matches_range(&self, version: &Version) -> bool {
		let ord = precedence(version, &self.base);
		match self.operator {
			Operator::Exact => ord == Ordering::Equal,
			Operator::Less => ord == Ordering::Less,
			Operator::LessEq => ord != Ordering::Greater,
			Operator::Greater => ord == Ordering::Greater,
			Operator::GreaterEq => ord != Ordering::Less,
			Operator::Compatible => {
				if ord == Ordering::Less || version.major != self.base.major {
					false
				} else if self.base.major == 0 {
					version.minor == self.base.minor
				} else {
					true
				}
			},
		}
	}

	fn admits_prerelease(&self, version: &Version) -> bool {
		version.pre.is_empty() || (
			!self.base.pre.is_empty()
			&& version.major == self.base.major
			&& version.minor == self.base.minor
			&& version.patch == self.base.patch
		)
	}
}

impl std::str::FromStr for VersionConstraint {
	type Err = ConstraintParseError;
	fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl std::fmt::Display for VersionConstraint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.explicit_operator {
			write!(f, "{}{}", self.operator.as_str(), self.base)
		} else {
			write!(f, "{}", self.base)
		}
	}
}

impl serde::Serialize for VersionConstraint {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> serde::Deserialize<'de> for VersionConstraint {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		Self::parse(&s).map_err(serde::de::Error::custom)
	}
}

/// The conjunction of every constraint placed on a mod.
///
/// No normalized range is computed, candidates are checked against each constraint in turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
	constraints: Vec<VersionConstraint>,
	allow_prerelease: bool,
}

impl ConstraintSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn allowing_prerelease(mut self, allow: bool) -> Self {
		self.allow_prerelease = allow;
		self
	}

	pub fn add(&mut self, constraint: VersionConstraint) {
		if !self.constraints.contains(&constraint) {
			self.constraints.push(constraint);
		}
	}

	/// An empty set is satisfied by every version.
	pub fn satisfies(&self, version: &Version) -> bool {
		self.constraints.iter().all(|c| {
			if self.allow_prerelease {
				c.matches_range(version)
			} else {
				c.satisfies(version)
			}
		})
	}
}

impl FromIterator<VersionConstraint> for ConstraintSet {
	fn from_iter<T: IntoIterator<Item = VersionConstraint>>(iter: T) -> Self {
		let mut set = ConstraintSet::new();
		for c in iter {
			set.add(c);
		}
		set
	}
}

impl std::fmt::Display for ConstraintSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.constraints.is_empty() {
			return write!(f, "*");
		}
		let parts: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
		write!(f, "{}", parts.join(", "))
	}
}
