use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::prelude::NodeIndex;
use semver::Version;

use super::*;
use crate::lockfile::LockFile;
use crate::registry::{Registry, RegistryDependency, RegistryVersion};
use crate::version_constraint::precedence;

/// Mods waiting to be (re)evaluated, in the order they were first queued.
#[derive(Debug, Default)]
struct Worklist {
	queue: VecDeque<NodeIndex>,
	queued: HashSet<NodeIndex>,
}

impl Worklist {
	fn push(&mut self, node: NodeIndex) {
		if self.queued.insert(node) {
			self.queue.push_back(node);
		}
	}

	fn pop(&mut self) -> Option<NodeIndex> {
		let node = self.queue.pop_front()?;
		self.queued.remove(&node);
		Some(node)
	}

	/// Forgets a node that was removed from the graph, its index may be reused.
	fn remove(&mut self, node: NodeIndex) {
		if self.queued.remove(&node) {
			self.queue.retain(|&n| n != node);
		}
	}
}

/// A single configured resolve, see the [module documentation](super) for the process.
///
/// Created by [`ResolverBuilder`].
#[derive(Debug)]
pub struct ResolverProcessor<'a> {
	profile_name: String,
	requirements: Vec<(ModReference, String)>,
	prior: Option<&'a LockFile>,
	game_version: GameVersion,
	allow_prerelease: bool,
}

impl<'a> ResolverProcessor<'a> {
	pub(super) fn new(
		profile_name: String,
		requirements: Vec<(ModReference, String)>,
		prior: Option<&'a LockFile>,
		game_version: GameVersion,
		allow_prerelease: bool,
	) -> Self {
		Self { profile_name, requirements, prior, game_version, allow_prerelease }
	}

	/// Resolves every requirement and its dependencies into a new lockfile.
	///
	/// # Errors
	/// The first [`ResolveError`] met, nothing is returned for the mods resolved before it.
	pub async fn resolve<R: Registry>(self, registry: &R) -> Result<LockFile, ResolveError> {
		let mut graph = DependencyGraph::new();
		let mut filter = CompatibilityFilter::new(registry, self.game_version);
		let mut dependency_cache: HashMap<(ModReference, Version), Vec<RegistryDependency>> = HashMap::new();
		let mut worklist = Worklist::default();

		let origin = Origin::Profile(self.profile_name.clone());
		for (reference, text) in &self.requirements {
			let requirement = parse_requirement(reference, text, &origin)?;
			let (node, _) = graph.get_or_add_node_index(reference);
			graph.add_requirement(graph.root, node, requirement);
			worklist.push(node);
		}
		filter.prefetch(self.requirements.iter().map(|(r, _)| r.clone())).await;

		while let Some(node) = worklist.pop() {
			let Some(data) = graph.mod_data(node) else { continue };
			let reference = data.reference.clone();

			let constraints = graph.constraint_set(node, self.allow_prerelease);
			let candidates = filter.candidates(&reference).await?.to_vec();

			if let Some(pin) = graph.pin(node) {
				if constraints.satisfies(&pin.version) {
					continue;
				}
			}

			let Some(chosen) = self.select(&reference, &constraints, &candidates).cloned() else {
				return Err(ResolveError::VersionConflict {
					requirements: graph.requirements_on(node),
					constraint: constraints,
					reference,
				});
			};

			if let Some(previous) = graph.pin(node) {
				log::debug!("Re-pinning {} from {} to {}", reference, previous.version, chosen.version);
				graph.clear_nodes_requirements(node);
				for removed in graph.clear_loose_nodes() {
					worklist.remove(removed);
				}
			} else {
				log::debug!("Pinning {} to {}", reference, chosen.version);
			}

			let attempts = graph.set_pin(node, chosen.clone());
			if attempts > candidates.len() {
				return Err(ResolveError::CycleExceeded { reference, attempts, candidates: candidates.len() });
			}

			let key = (reference.clone(), chosen.version.clone());
			if !dependency_cache.contains_key(&key) {
				let dependencies = registry.list_dependencies(&reference, &chosen.version).await
					.map_err(|source| ResolveError::RegistryUnavailable { reference: reference.clone(), source })?;
				dependency_cache.insert(key.clone(), dependencies);
			}
			let dependencies = dependency_cache.get(&key).map(Vec::as_slice).unwrap_or(&[]);

			let origin = Origin::Mod { reference: reference.clone(), version: chosen.version.clone() };
			let mut discovered = Vec::new();
			for dependency in dependencies {
				let requirement = parse_requirement(&dependency.reference, &dependency.constraint, &origin)?;
				let (target, added) = graph.get_or_add_node_index(&dependency.reference);
				if !graph.add_requirement(node, target, requirement) {
					continue;
				}
				if added {
					discovered.push(dependency.reference.clone());
				}

				let settled = graph.pin(target)
					.is_some_and(|pin| graph.constraint_set(target, self.allow_prerelease).satisfies(&pin.version));
				if !settled {
					log::trace!("Queueing {} required by {}", dependency.reference, origin);
					worklist.push(target);
				}
			}
			filter.prefetch(discovered).await;
		}

		let empty = LockFile::default();
		Ok(reconcile(&graph.pins(), self.prior.unwrap_or(&empty)))
	}

	/// Prefers the locked version, otherwise the newest satisfying candidate.
	///
	/// `candidates` are sorted newest first.
	fn select<'c>(&self, reference: &str, constraints: &ConstraintSet, candidates: &'c [RegistryVersion]) -> Option<&'c RegistryVersion> {
		if let Some(locked) = self.prior.and_then(|p| p.get(reference)) {
			let held = candidates.iter()
				.find(|c| precedence(&c.version, &locked.version).is_eq())
				.filter(|c| constraints.satisfies(&c.version));
			if held.is_some() {
				log::trace!("Keeping locked {}@{}", reference, locked.version);
				return held;
			}
		}
		candidates.iter().find(|c| constraints.satisfies(&c.version))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn worklist_is_fifo_and_unique() {
		let mut w = Worklist::default();
		w.push(NodeIndex::new(2));
		w.push(NodeIndex::new(1));
		w.push(NodeIndex::new(2));
		assert_eq!(w.pop(), Some(NodeIndex::new(2)));
		assert_eq!(w.pop(), Some(NodeIndex::new(1)));
		assert_eq!(w.pop(), None);
	}

	#[test]
	fn worklist_remove() {
		let mut w = Worklist::default();
		w.push(NodeIndex::new(1));
		w.push(NodeIndex::new(2));
		w.remove(NodeIndex::new(1));
		assert_eq!(w.pop(), Some(NodeIndex::new(2)));
		assert_eq!(w.pop(), None);
	}
}
