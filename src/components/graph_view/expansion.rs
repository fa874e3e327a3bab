//! Expand/collapse bookkeeping.
//!
//! Expanding a node pulls a child batch from a [`SubgraphSource`] and records
//! the children it introduced; collapsing tears that subtree down depth-first
//! and restores the positions captured just before the expansion.
//!
//! Ownership is kept in two flat maps (anchor -> children, child -> anchor)
//! which are updated together, so the expanded set is always a forest.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{GraphError, Result};
use super::store::{EdgeAttrs, GraphStore, NodeAttrs, Point};
use super::theme::{Color, Theme};
use super::types::{EdgeRecord, NodeKind, NodeRecord};

/// Nodes and edges produced for one expansion.
#[derive(Clone, Debug, Default)]
pub struct SubgraphBatch {
	/// New children, in placement order.
	pub nodes: Vec<NodeRecord>,
	/// Edges to the children and back into the graph.
	pub edges: Vec<EdgeRecord>,
}

/// Produces the neighborhood revealed when a node is expanded.
pub trait SubgraphSource {
	/// Batch to add under `anchor`, given the current graph.
	fn fetch(&mut self, anchor: &str, graph: &GraphStore) -> Result<SubgraphBatch>;
}

/// Stand-in source that synthesizes children with a seeded RNG.
///
/// The child count is drawn once per anchor and reused on later expansions.
pub struct SyntheticSource {
	rng: StdRng,
	counts: HashMap<String, usize>,
	min_children: usize,
	max_children: usize,
	serial: u64,
}

impl SyntheticSource {
	/// Upper bound on links from new children back into the graph.
	pub const MAX_EXTRA_EDGES: usize = 2;

	/// Source drawing two to six children per anchor.
	pub fn new(seed: u64) -> Self {
		Self::with_range(seed, 2, 6)
	}

	/// Source drawing `min_children..=max_children` children per anchor.
	pub fn with_range(seed: u64, min_children: usize, max_children: usize) -> Self {
		Self {
			rng: StdRng::seed_from_u64(seed),
			counts: HashMap::new(),
			min_children,
			max_children: max_children.max(min_children),
			serial: 0,
		}
	}

	/// Memoized child count for `anchor`.
	pub fn child_count(&mut self, anchor: &str) -> usize {
		if let Some(&count) = self.counts.get(anchor) {
			return count;
		}
		let count = self.rng.gen_range(self.min_children..=self.max_children);
		self.counts.insert(anchor.to_string(), count);
		count
	}

	fn next_id(&mut self, prefix: &str, graph: &GraphStore) -> String {
		loop {
			self.serial += 1;
			let id = format!("{}~{}", prefix, self.serial);
			if !graph.contains_node(&id) && !graph.contains_edge(&id) {
				return id;
			}
		}
	}
}

const CHILD_KINDS: [NodeKind; 4] = [
	NodeKind::Person,
	NodeKind::Address,
	NodeKind::Vehicle,
	NodeKind::Event,
];

impl SubgraphSource for SyntheticSource {
	fn fetch(&mut self, anchor: &str, graph: &GraphStore) -> Result<SubgraphBatch> {
		let anchor_label = graph
			.node(anchor)
			.map(|n| n.label.clone())
			.ok_or_else(|| GraphError::UnknownNode(anchor.to_string()))?;
		let count = self.child_count(anchor);

		let mut batch = SubgraphBatch::default();
		for i in 0..count {
			let id = self.next_id(anchor, graph);
			let kind = CHILD_KINDS[self.rng.gen_range(0..CHILD_KINDS.len())];
			batch.nodes.push(
				NodeRecord::new(id.clone(), kind).with_name(format!("{} {} {}", anchor_label, kind.as_str(), i + 1)),
			);
			let edge_id = self.next_id(&format!("{anchor}-gen"), graph);
			let mut edge = EdgeRecord::new(edge_id, anchor, id);
			edge.properties
				.insert("relationType".into(), serde_json::Value::String("generated".into()));
			batch.edges.push(edge);
		}

		// A few links from the new children back into the existing graph.
		let existing: Vec<&String> = graph.node_ids().iter().filter(|id| *id != anchor).collect();
		let extra = self.rng.gen_range(0..=Self::MAX_EXTRA_EDGES);
		let mut linked = HashSet::new();
		for _ in 0..extra {
			if existing.is_empty() || batch.nodes.is_empty() {
				break;
			}
			let child = batch.nodes[self.rng.gen_range(0..batch.nodes.len())].id.clone();
			let other = existing[self.rng.gen_range(0..existing.len())].clone();
			if !linked.insert((child.clone(), other.clone())) {
				continue;
			}
			let edge_id = self.next_id(&format!("{anchor}-link"), graph);
			let edge = if self.rng.gen_bool(0.5) {
				EdgeRecord::new(edge_id, child, other)
			} else {
				EdgeRecord::new(edge_id, other, child)
			};
			batch.edges.push(edge);
		}
		Ok(batch)
	}
}

/// Handle for an expansion whose batch has not been applied yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandTicket {
	/// Node being expanded.
	pub anchor: String,
	serial: u64,
}

/// How `delete_node` treats the node's expansion subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteMode {
	/// Delete the node and everything it transitively expanded.
	Cascade,
	/// Delete only the node; its children stay, detached from any record.
	KeepChildren,
}

/// Builds store attributes for a dataset node.
///
/// A CSS `color` property overrides the kind palette.
pub fn node_attrs(record: &NodeRecord, theme: &Theme) -> NodeAttrs {
	let size = record.size_hint().unwrap_or(theme.node.base_size);
	let color = record
		.properties
		.get("color")
		.and_then(serde_json::Value::as_str)
		.and_then(Color::parse)
		.unwrap_or_else(|| theme.palette.get(record.kind));
	let mut attrs = NodeAttrs::new(record.display_label(), record.kind, color, size);
	attrs.image = record.image_ref.clone();
	attrs
}

/// Builds store attributes for a dataset edge.
pub fn edge_attrs(record: &EdgeRecord, theme: &Theme) -> EdgeAttrs {
	EdgeAttrs::new(record.display_label(), theme.edge.color, theme.edge.size)
}

/// Tracks which nodes were introduced by which expansion.
pub struct ExpansionController {
	source: Box<dyn SubgraphSource>,
	/// anchor -> children it introduced, in insertion order.
	children: HashMap<String, Vec<String>>,
	/// child -> anchor that introduced it.
	owner: HashMap<String, String>,
	/// anchor -> every node's position just before the expansion.
	snapshots: HashMap<String, HashMap<String, Point>>,
	/// anchor -> serial of its outstanding ticket.
	pending: HashMap<String, u64>,
	next_serial: u64,
}

impl ExpansionController {
	/// Controller with no expansions, fetching from `source`.
	pub fn new(source: Box<dyn SubgraphSource>) -> Self {
		Self {
			source,
			children: HashMap::new(),
			owner: HashMap::new(),
			snapshots: HashMap::new(),
			pending: HashMap::new(),
			next_serial: 0,
		}
	}

	/// Whether `node` has a live expansion record.
	pub fn is_expanded(&self, node: &str) -> bool {
		self.children.contains_key(node)
	}

	/// Whether `node` holds an unfinished ticket.
	pub fn is_pending(&self, node: &str) -> bool {
		self.pending.contains_key(node)
	}

	/// Children introduced by expanding `node`.
	pub fn children_of(&self, node: &str) -> &[String] {
		self.children.get(node).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Anchor whose expansion introduced `node`.
	pub fn owner_of(&self, node: &str) -> Option<&str> {
		self.owner.get(node).map(String::as_str)
	}

	#[allow(missing_docs)]
	pub fn has_snapshot(&self, node: &str) -> bool {
		self.snapshots.contains_key(node)
	}

	/// Whether any record or snapshot still mentions `node`.
	pub fn references(&self, node: &str) -> bool {
		self.children.contains_key(node)
			|| self.owner.contains_key(node)
			|| self.pending.contains_key(node)
			|| self.children.values().any(|c| c.iter().any(|n| n == node))
			|| self.owner.values().any(|a| a == node)
			|| self.snapshots.contains_key(node)
			|| self.snapshots.values().any(|s| s.contains_key(node))
	}

	/// Forgets every record, snapshot and pending ticket.
	pub fn reset(&mut self) {
		self.children.clear();
		self.owner.clear();
		self.snapshots.clear();
		self.pending.clear();
		self.next_serial += 1;
	}

	/// Starts an expansion. Returns `None` when the node is missing, already
	/// expanded, or already waiting for a batch.
	pub fn begin_expand(&mut self, store: &GraphStore, node: &str) -> Option<ExpandTicket> {
		if !store.contains_node(node) || self.is_expanded(node) || self.is_pending(node) {
			return None;
		}
		self.next_serial += 1;
		self.pending.insert(node.to_string(), self.next_serial);
		Some(ExpandTicket {
			anchor: node.to_string(),
			serial: self.next_serial,
		})
	}

	/// Asks the source for the batch belonging to `ticket`.
	pub fn fetch(&mut self, store: &GraphStore, ticket: &ExpandTicket) -> Result<SubgraphBatch> {
		self.source.fetch(&ticket.anchor, store)
	}

	/// Drops a pending expansion; a batch arriving for it later is discarded.
	pub fn cancel(&mut self, node: &str) -> bool {
		self.pending.remove(node).is_some()
	}

	/// Applies a fetched batch. Stale tickets are ignored and yield no children.
	///
	/// Rejected edges (duplicate pair, unknown endpoint) are skipped.
	pub fn finish_expand(
		&mut self,
		store: &mut GraphStore,
		theme: &Theme,
		ticket: ExpandTicket,
		batch: SubgraphBatch,
	) -> Vec<String> {
		if self.pending.get(&ticket.anchor) != Some(&ticket.serial) {
			debug!("expansion: discarding stale batch for {}", ticket.anchor);
			return Vec::new();
		}
		self.pending.remove(&ticket.anchor);
		if !store.contains_node(&ticket.anchor) {
			return Vec::new();
		}

		self.snapshots
			.insert(ticket.anchor.clone(), store.positions());

		let anchor_pos = store.position(&ticket.anchor).unwrap_or_default();
		let mut added = Vec::with_capacity(batch.nodes.len());
		for record in &batch.nodes {
			let attrs = node_attrs(record, theme).at(anchor_pos);
			match store.add_node(record.id.clone(), attrs) {
				Ok(()) => added.push(record.id.clone()),
				Err(e) => warn!("expansion: skipping child of {}: {}", ticket.anchor, e),
			}
		}
		for record in &batch.edges {
			if let Err(e) = store.add_edge(
				record.id.clone(),
				&record.start_id,
				&record.end_id,
				edge_attrs(record, theme),
			) {
				debug!("expansion: skipping edge {}: {}", record.id, e);
			}
		}

		for child in &added {
			self.owner.insert(child.clone(), ticket.anchor.clone());
		}
		debug!("expansion: {} introduced {} children", ticket.anchor, added.len());
		self.children.insert(ticket.anchor, added.clone());
		added
	}

	/// Expands `node` with a synchronous fetch. A no-op while already expanded.
	pub fn expand(&mut self, store: &mut GraphStore, theme: &Theme, node: &str) -> Result<Vec<String>> {
		let Some(ticket) = self.begin_expand(store, node) else {
			return Ok(Vec::new());
		};
		match self.fetch(store, &ticket) {
			Ok(batch) => Ok(self.finish_expand(store, theme, ticket, batch)),
			Err(e) => {
				self.cancel(node);
				Err(e)
			}
		}
	}

	/// Collapses `node`: removes its whole expansion subtree depth-first and
	/// restores the positions captured at expansion time for surviving nodes.
	///
	/// Returns the removed node ids. A no-op for a collapsed node.
	pub fn collapse(&mut self, store: &mut GraphStore, node: &str) -> Vec<String> {
		self.cancel(node);
		if !self.is_expanded(node) {
			return Vec::new();
		}
		let removed = self.teardown(store, node);
		if let Some(snapshot) = self.snapshots.remove(node) {
			for (id, pos) in snapshot {
				store.set_position(&id, pos);
			}
		}
		self.scrub_snapshots(&removed);
		removed
	}

	/// Deletes `node` from the graph and from every record that mentions it.
	pub fn delete_node(&mut self, store: &mut GraphStore, node: &str, mode: DeleteMode) -> Vec<String> {
		if !store.contains_node(node) {
			return Vec::new();
		}
		self.cancel(node);
		let mut removed = match mode {
			DeleteMode::Cascade => self.teardown(store, node),
			DeleteMode::KeepChildren => {
				for child in self.children.remove(node).unwrap_or_default() {
					self.owner.remove(&child);
				}
				Vec::new()
			}
		};
		self.snapshots.remove(node);
		self.detach(node);
		store.remove_node(node);
		removed.push(node.to_string());
		self.scrub_snapshots(&removed);
		removed
	}

	/// Removes every descendant of `anchor` (deepest first) and its record.
	fn teardown(&mut self, store: &mut GraphStore, anchor: &str) -> Vec<String> {
		let mut removed = Vec::new();
		for child in self.children.remove(anchor).unwrap_or_default() {
			if self.is_expanded(&child) {
				removed.extend(self.teardown(store, &child));
				self.snapshots.remove(&child);
			}
			self.cancel(&child);
			self.owner.remove(&child);
			if store.remove_node(&child).is_some() {
				removed.push(child);
			}
		}
		removed
	}

	/// Removes `node` from its owner's child list.
	fn detach(&mut self, node: &str) {
		if let Some(anchor) = self.owner.remove(node) {
			if let Some(list) = self.children.get_mut(&anchor) {
				list.retain(|c| c != node);
			}
		}
	}

	fn scrub_snapshots(&mut self, removed: &[String]) {
		for snapshot in self.snapshots.values_mut() {
			for id in removed {
				snapshot.remove(id);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Source returning a fixed number of children and no extra links.
	struct Fixed(usize);

	impl SubgraphSource for Fixed {
		fn fetch(&mut self, anchor: &str, _: &GraphStore) -> Result<SubgraphBatch> {
			let mut batch = SubgraphBatch::default();
			for i in 0..self.0 {
				let id = format!("{anchor}.{i}");
				batch.edges.push(EdgeRecord::new(format!("{anchor}->{id}"), anchor, id.clone()));
				batch.nodes.push(NodeRecord::new(id, NodeKind::Other));
			}
			Ok(batch)
		}
	}

	fn graph(ids: &[&str]) -> GraphStore {
		let theme = Theme::default();
		let mut store = GraphStore::new();
		for (i, id) in ids.iter().enumerate() {
			let attrs = node_attrs(&NodeRecord::new(*id, NodeKind::Person), &theme)
				.at(Point::new(i as f64 * 100.0, 0.0));
			store.add_node(*id, attrs).unwrap();
		}
		store
	}

	#[test]
	fn expand_is_idempotent_while_expanded() {
		let theme = Theme::default();
		let mut store = graph(&["a"]);
		let mut ctl = ExpansionController::new(Box::new(Fixed(3)));
		let first = ctl.expand(&mut store, &theme, "a").unwrap();
		assert_eq!(first.len(), 3);
		assert!(ctl.expand(&mut store, &theme, "a").unwrap().is_empty());
		assert_eq!(ctl.children_of("a"), first.as_slice());
		assert_eq!(store.node_count(), 4);
	}

	#[test]
	fn overlapping_expand_requests_collapse_into_one() {
		let theme = Theme::default();
		let mut store = graph(&["a"]);
		let mut ctl = ExpansionController::new(Box::new(Fixed(2)));
		let ticket = ctl.begin_expand(&store, "a").unwrap();
		assert!(ctl.begin_expand(&store, "a").is_none());
		let batch = ctl.fetch(&store, &ticket).unwrap();
		assert_eq!(ctl.finish_expand(&mut store, &theme, ticket, batch).len(), 2);
	}

	#[test]
	fn cancelled_ticket_is_discarded() {
		let theme = Theme::default();
		let mut store = graph(&["a"]);
		let mut ctl = ExpansionController::new(Box::new(Fixed(2)));
		let ticket = ctl.begin_expand(&store, "a").unwrap();
		let batch = ctl.fetch(&store, &ticket).unwrap();
		ctl.collapse(&mut store, "a");
		assert!(ctl.finish_expand(&mut store, &theme, ticket, batch).is_empty());
		assert_eq!(store.node_count(), 1);
		assert!(!ctl.is_expanded("a"));
	}

	#[test]
	fn collapse_drops_removed_ids_from_sibling_snapshots() {
		let theme = Theme::default();
		let mut store = graph(&["a", "b"]);
		let mut ctl = ExpansionController::new(Box::new(Fixed(2)));
		let first = ctl.expand(&mut store, &theme, "a").unwrap();
		ctl.expand(&mut store, &theme, "b").unwrap();
		ctl.collapse(&mut store, "a");
		for id in &first {
			assert!(!ctl.snapshots["b"].contains_key(id), "{id} left in b's snapshot");
		}

		// The source reuses ids, so re-expanding yields the same children.
		let again = ctl.expand(&mut store, &theme, "a").unwrap();
		assert_eq!(again, first);
		store.set_position(&again[0], Point::new(900.0, 900.0));
		ctl.collapse(&mut store, "b");
		assert_eq!(store.position(&again[0]), Some(Point::new(900.0, 900.0)));
	}

	#[test]
	fn color_property_overrides_kind_palette() {
		let theme = Theme::default();
		let mut record = NodeRecord::new("n", NodeKind::Person);
		record.properties.insert("color".into(), serde_json::Value::String("#102030".into()));
		assert_eq!(node_attrs(&record, &theme).base_color, Color::rgb(0x10, 0x20, 0x30));
		record.properties.insert("color".into(), serde_json::Value::String("chartreuse".into()));
		assert_eq!(node_attrs(&record, &theme).color, theme.palette.person);
	}

	#[test]
	fn collapse_tears_down_nested_expansions_and_restores_positions() {
		let theme = Theme::default();
		let mut store = graph(&["a", "b"]);
		let before = store.positions();
		let mut ctl = ExpansionController::new(Box::new(Fixed(2)));

		let children = ctl.expand(&mut store, &theme, "a").unwrap();
		let grandchildren = ctl.expand(&mut store, &theme, &children[0]).unwrap();
		assert_eq!(store.node_count(), 6);
		store.set_position("b", Point::new(-500.0, 42.0));

		let removed = ctl.collapse(&mut store, "a");
		assert_eq!(removed.len(), 4);
		assert_eq!(removed[0], grandchildren[0]);
		assert_eq!(store.positions(), before);
		assert_eq!(store.edge_count(), 0);
		assert!(!ctl.references(&children[0]));
		assert!(!ctl.has_snapshot("a"));
	}

	#[test]
	fn cascade_delete_removes_descendants() {
		let theme = Theme::default();
		let mut store = graph(&["root", "a"]);
		let mut ctl = ExpansionController::new(Box::new(Fixed(2)));
		ctl.expand(&mut store, &theme, "root").unwrap();
		let children = ctl.expand(&mut store, &theme, "a").unwrap();
		ctl.expand(&mut store, &theme, &children[1]).unwrap();

		let removed = ctl.delete_node(&mut store, "a", DeleteMode::Cascade);
		assert_eq!(removed.len(), 5);
		assert_eq!(store.node_count(), 3);
		assert!(!ctl.references("a"));
		for id in &removed {
			assert!(!ctl.references(id), "{id} still referenced");
		}
		// The unrelated expansion of root survives.
		assert_eq!(ctl.children_of("root").len(), 2);
	}

	#[test]
	fn keep_children_delete_detaches_descendants() {
		let theme = Theme::default();
		let mut store = graph(&["root"]);
		let mut ctl = ExpansionController::new(Box::new(Fixed(2)));
		let children = ctl.expand(&mut store, &theme, "root").unwrap();
		let mid = children[0].clone();
		let grandchildren = ctl.expand(&mut store, &theme, &mid).unwrap();

		let removed = ctl.delete_node(&mut store, &mid, DeleteMode::KeepChildren);
		assert_eq!(removed, vec![mid.clone()]);
		assert!(!ctl.references(&mid));
		assert_eq!(ctl.children_of("root"), &children[1..]);
		for g in &grandchildren {
			assert!(store.contains_node(g));
			assert_eq!(ctl.owner_of(g), None);
		}
		// Collapsing root no longer reaches the detached grandchildren.
		ctl.collapse(&mut store, "root");
		assert_eq!(store.node_count(), 1 + grandchildren.len());
	}

	struct Offline;

	impl SubgraphSource for Offline {
		fn fetch(&mut self, anchor: &str, _: &GraphStore) -> Result<SubgraphBatch> {
			Err(GraphError::SourceUnavailable {
				anchor: anchor.to_string(),
				reason: "offline".into(),
			})
		}
	}

	#[test]
	fn failed_fetch_releases_the_pending_ticket() {
		let theme = Theme::default();
		let mut store = graph(&["a"]);
		let mut ctl = ExpansionController::new(Box::new(Offline));
		assert!(matches!(
			ctl.expand(&mut store, &theme, "a"),
			Err(GraphError::SourceUnavailable { .. })
		));
		assert!(!ctl.is_pending("a"));
		assert!(!ctl.is_expanded("a"));
		assert_eq!(store.node_count(), 1);
	}

	#[test]
	fn synthetic_source_memoizes_child_count() {
		let mut store = graph(&["a", "b", "c"]);
		let theme = Theme::default();
		let mut ctl = ExpansionController::new(Box::new(SyntheticSource::new(7)));
		let first = ctl.expand(&mut store, &theme, "a").unwrap();
		ctl.collapse(&mut store, "a");
		let second = ctl.expand(&mut store, &theme, "a").unwrap();
		assert_eq!(first.len(), second.len());
		assert!((2..=6).contains(&first.len()));
		// One generated edge per child plus at most two extra links.
		let incident = store.incident_edges("a").len();
		assert!(incident >= second.len());
		assert!(store.edge_count() <= second.len() + SyntheticSource::MAX_EXTRA_EDGES);
	}
}
