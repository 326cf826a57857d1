use super::GameVersion;

/// The game builds a mod version declares support for, both ends inclusive.
///
/// A missing end is open, so the default accepts every build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GameVersionBounds {
	min: Option<GameVersion>,
	max: Option<GameVersion>,
}

impl GameVersionBounds {
	/// Builds bounds from the index fields, an `explicit` build is shorthand for `min == max`.
	///
	/// # Errors
	/// [`Parse`](crate::Error::Parse) when `explicit` is combined with `min` or `max`, or `min` is above `max`.
	pub fn new(explicit: Option<GameVersion>, min: Option<GameVersion>, max: Option<GameVersion>) -> crate::Result<Self> {
		match (explicit, min, max) {
			(Some(build), None, None) => Ok(Self { min: Some(build), max: Some(build) }),
			(Some(_), _, _) => Err(crate::Error::Parse("an explicit game version can't have a minimum or maximum".to_string())),
			(None, Some(min), Some(max)) if min > max => {
				Err(crate::Error::Parse(format!("minimum game version {} is above the maximum {}", min, max)))
			},
			(None, min, max) => Ok(Self { min, max }),
		}
	}

	pub fn contains(&self, build: GameVersion) -> bool {
		self.min.map_or(true, |min| min <= build) && self.max.map_or(true, |max| build <= max)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn bounds(explicit: Option<u64>, min: Option<u64>, max: Option<u64>) -> GameVersionBounds {
		GameVersionBounds::new(explicit, min, max).unwrap()
	}

	#[test] fn bounds_default_contains_all() { assert!(GameVersionBounds::default().contains(0)) }
	#[test] fn bounds_explicit() { assert!(bounds(Some(5), None, None).contains(5) && !bounds(Some(5), None, None).contains(6)) }
	#[test] fn bounds_min_is_inclusive() { assert!(bounds(None, Some(5), None).contains(5) && !bounds(None, Some(5), None).contains(4)) }
	#[test] fn bounds_max_is_inclusive() { assert!(bounds(None, None, Some(5)).contains(5) && !bounds(None, None, Some(5)).contains(6)) }
	#[test] fn bounds_min_max() { assert!(bounds(None, Some(2), Some(4)).contains(3) && !bounds(None, Some(2), Some(4)).contains(5)) }
	#[test] fn bounds_new_none_is_default() { assert_eq!(bounds(None, None, None), GameVersionBounds::default()) }
	#[test] fn bounds_new_rejects_explicit_and_min() { assert!(GameVersionBounds::new(Some(1), Some(1), None).is_err()) }
	#[test] fn bounds_new_rejects_inverted() { assert!(GameVersionBounds::new(None, Some(9), Some(1)).is_err()) }
}
