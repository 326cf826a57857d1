use super::ResolverProcessor;
use crate::ModReference;
use crate::lockfile::LockFile;
use crate::profile::Profile;
use crate::registry::GameVersion;

pub struct ResolverBuilder<'a> {
	game_version: GameVersion,
	profile_name: String,
	requirements: Vec<(ModReference, String)>,
	prior: Option<&'a LockFile>,
	allow_prerelease: bool,
}

impl<'a> ResolverBuilder<'a> {
	pub fn new(game_version: GameVersion) -> Self {
		Self {
			game_version,
			profile_name: String::new(),
			requirements: Default::default(),
			prior: None,
			allow_prerelease: false,
		}
	}

	/// Uses every mod of `profile` as a root requirement.
	pub fn profile(mut self, profile: &Profile) -> Self {
		self.profile_name = profile.name().to_string();
		self.requirements.extend(profile.requirements().map(|(r, c)| (r.clone(), c.to_string())));
		self
	}

	/// Adds a root requirement, the constraint text is parsed when resolving.
	pub fn add_requirement(mut self, reference: impl Into<ModReference>, constraint: impl Into<String>) -> Self {
		self.requirements.push((reference.into(), constraint.into()));
		self
	}

	/// Versions held by `prior` are preferred where still acceptable.
	pub fn prior_lockfile(mut self, prior: &'a LockFile) -> Self {
		self.prior = Some(prior);
		self
	}

	/// Lets pre-release versions satisfy any constraint whose range they fall in.
	pub fn allow_prerelease(mut self, allow: bool) -> Self {
		self.allow_prerelease = allow;
		self
	}

	pub fn build(self) -> ResolverProcessor<'a> {
		ResolverProcessor::new(
			self.profile_name,
			self.requirements,
			self.prior,
			self.game_version,
			self.allow_prerelease,
		)
	}
}
