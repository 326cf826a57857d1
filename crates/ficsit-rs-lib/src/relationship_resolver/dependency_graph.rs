//! Module for only DependencyGraph functions not related to the overall resolving process.

use std::collections::{BTreeMap, HashMap};

use petgraph::prelude::*;

use crate::ModReference;
use crate::registry::RegistryVersion;
use crate::version_constraint::ConstraintSet;
use super::DependencyRequirement;

#[derive(Debug, Clone)]
pub(super) struct DependencyGraph {
	pub graph: StableDiGraph<NodeData, EdgeData>,
	/// Control node for giving the profile's requests a presence in the graph.
	pub root: NodeIndex,
	indices: HashMap<ModReference, NodeIndex>,
}

#[derive(Debug, Clone)]
pub(super) struct ModData {
	pub reference: ModReference,
	pub pin: Option<RegistryVersion>,
	/// Number of times the pin has been replaced.
	pub repins: usize,
}

#[derive(Debug, Clone)]
pub(super) enum NodeData {
	Root,
	Mod(ModData),
}

/// A requirement from the source node for the target to satisfy a constraint.
pub(super) type EdgeData = DependencyRequirement;

impl DependencyGraph {
	pub fn new() -> Self {
		let mut graph = StableDiGraph::<NodeData, EdgeData>::default();
		let root = graph.add_node(NodeData::Root);
		Self { graph, root, indices: HashMap::new() }
	}

	/// Returns the index of the existing node or a new unpinned one, and whether it was added.
	pub fn get_or_add_node_index(&mut self, reference: &str) -> (NodeIndex, bool) {
		if let Some(&i) = self.indices.get(reference) {
			return (i, false);
		}
		let i = self.graph.add_node(NodeData::Mod(ModData { reference: reference.to_string(), pin: None, repins: 0 }));
		self.indices.insert(reference.to_string(), i);
		(i, true)
	}

	pub fn mod_data(&self, node: NodeIndex) -> Option<&ModData> {
		match self.graph.node_weight(node)? {
			NodeData::Mod(data) => Some(data),
			NodeData::Root => None,
		}
	}

	pub fn pin(&self, node: NodeIndex) -> Option<&RegistryVersion> {
		self.mod_data(node)?.pin.as_ref()
	}

	/// Sets the pin of `node` returning how many times it has been re-pinned.
	pub fn set_pin(&mut self, node: NodeIndex, version: RegistryVersion) -> usize {
		match self.graph.node_weight_mut(node) {
			Some(NodeData::Mod(data)) => {
				if data.pin.is_some() {
					data.repins += 1;
				}
				data.pin = Some(version);
				data.repins
			},
			_ => 0,
		}
	}

	/// Adds a requirement edge unless an identical one already exists.
	///
	/// Returns `false` when nothing was added.
	pub fn add_requirement(&mut self, src: NodeIndex, target: NodeIndex, requirement: DependencyRequirement) -> bool {
		let exists = self.graph.edges_directed(src, Outgoing)
			.any(|e| e.target() == target && *e.weight() == requirement);
		if !exists {
			self.graph.add_edge(src, target, requirement);
		}
		!exists
	}

	/// Every requirement placed on `node`.
	///
	/// Ordered by edge index which is deterministic but not insertion order, freed indices are reused.
	pub fn requirements_on(&self, node: NodeIndex) -> Vec<DependencyRequirement> {
		let mut edges: Vec<_> = self.graph.edges_directed(node, Incoming).collect();
		edges.sort_by_key(|e| e.id().index());
		edges.into_iter().map(|e| e.weight().clone()).collect()
	}

	/// The conjunction of the incoming requirements of `node`.
	pub fn constraint_set(&self, node: NodeIndex, allow_prerelease: bool) -> ConstraintSet {
		self.requirements_on(node)
			.into_iter()
			.map(|r| r.constraint)
			.collect::<ConstraintSet>()
			.allowing_prerelease(allow_prerelease)
	}

	/// Removes all outgoing requirements of `src`.
	pub fn clear_nodes_requirements(&mut self, src: NodeIndex) {
		for id in self.graph.edges_directed(src, Outgoing).map(|e| e.id()).collect::<Vec<_>>() {
			self.graph.remove_edge(id);
		}
	}

	/// Removes every node no longer reachable from the root and returns their indices.
	pub fn clear_loose_nodes(&mut self) -> Vec<NodeIndex> {
		use petgraph::visit::IntoNodeReferences;

		let mut buf: Vec<NodeIndex> = Default::default();
		for (i, _) in self.graph.node_references() {
			if !petgraph::algo::has_path_connecting(&self.graph, self.root, i, None) {
				buf.push(i)
			}
		}
		for &i in &buf {
			if let Some(NodeData::Mod(data)) = self.graph.remove_node(i) {
				log::trace!("Dropping {} which is no longer required", data.reference);
				self.indices.remove(&data.reference);
			}
		}
		buf
	}

	/// Every pinned mod still in the graph.
	pub fn pins(&self) -> BTreeMap<ModReference, RegistryVersion> {
		self.graph.node_weights()
			.filter_map(|n| match n {
				NodeData::Mod(ModData { reference, pin: Some(pin), .. }) => Some((reference.clone(), pin.clone())),
				_ => None,
			})
			.collect()
	}
}

impl Default for DependencyGraph {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod test {
	use semver::Version;

	use super::*;
	use crate::relationship_resolver::Origin;
	use crate::version_constraint::VersionConstraint;

	fn req(reference: &str, constraint: &str) -> DependencyRequirement {
		DependencyRequirement {
			reference: reference.to_string(),
			constraint: VersionConstraint::parse(constraint).unwrap(),
			origin: Origin::Profile("Default".into()),
		}
	}

	fn rv(v: &str) -> RegistryVersion {
		RegistryVersion { version: Version::parse(v).unwrap(), hash: String::new(), link: String::new(), compatible: true }
	}

	#[test]
	fn graph_get_or_add_reuses_nodes() {
		let mut g = DependencyGraph::new();
		let (a, added) = g.get_or_add_node_index("A");
		assert!(added);
		assert_eq!(g.get_or_add_node_index("A"), (a, false));
	}

	#[test]
	fn graph_duplicate_requirement_ignored() {
		let mut g = DependencyGraph::new();
		let (a, _) = g.get_or_add_node_index("A");
		assert!(g.add_requirement(g.root, a, req("A", "^1.0.0")));
		assert!(!g.add_requirement(g.root, a, req("A", "^1.0.0")));
		assert_eq!(g.requirements_on(a).len(), 1);
	}

	#[test]
	fn graph_set_pin_counts_repins() {
		let mut g = DependencyGraph::new();
		let (a, _) = g.get_or_add_node_index("A");
		assert_eq!(g.set_pin(a, rv("1.0.0")), 0);
		assert_eq!(g.set_pin(a, rv("1.1.0")), 1);
		assert_eq!(g.pin(a).unwrap().version, Version::new(1, 1, 0));
	}

	#[test]
	fn graph_clear_loose_nodes() {
		let mut g = DependencyGraph::new();
		let (a, _) = g.get_or_add_node_index("A");
		let (b, _) = g.get_or_add_node_index("B");
		g.add_requirement(g.root, a, req("A", "^1.0.0"));
		g.add_requirement(a, b, req("B", "^1.0.0"));
		g.clear_nodes_requirements(a);
		assert_eq!(g.clear_loose_nodes(), vec![b]);
		assert!(g.mod_data(a).is_some());
		assert!(g.mod_data(b).is_none());
		assert!(g.get_or_add_node_index("B").1);
	}

	#[test]
	fn graph_constraint_set_is_conjunction() {
		let mut g = DependencyGraph::new();
		let (a, _) = g.get_or_add_node_index("A");
		g.add_requirement(g.root, a, req("A", ">=1.0.0"));
		g.add_requirement(g.root, a, req("A", "<2.0.0"));
		let set = g.constraint_set(a, false);
		assert!(set.satisfies(&Version::new(1, 5, 0)));
		assert!(!set.satisfies(&Version::new(2, 0, 0)));
	}
}
