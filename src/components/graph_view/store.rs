//! In-memory graph store.
//!
//! Owns node and edge records together with their visual attributes. Every
//! mutation keeps two invariants: each edge's endpoints exist, and at most one
//! edge joins any unordered pair of nodes.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::error::{GraphError, Result};
use super::theme::Color;
use super::types::NodeKind;

/// A position in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate, growing downwards.
	pub y: f64,
}

impl Point {
	/// Creates a point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
	}
}

/// Mutable attributes attached to a node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeAttrs {
	/// Display label drawn next to the node.
	pub label: String,
	/// Node category; picks the palette color and fallback column.
	pub kind: NodeKind,
	/// Optional image URL carried from the dataset.
	pub image: Option<String>,
	/// Center in graph space.
	pub position: Point,
	/// Current visual color; changed by highlighting.
	pub color: Color,
	/// Current footprint radius in graph units; changed by highlighting.
	pub size: f64,
	/// Drawn on top with a full-strength label.
	pub highlighted: bool,
	/// Dataset-derived color restored when highlighting ends.
	pub base_color: Color,
	/// Dataset-derived size restored when highlighting ends.
	pub base_size: f64,
}

impl NodeAttrs {
	/// Attributes at the origin whose base visuals equal the current ones.
	pub fn new(label: impl Into<String>, kind: NodeKind, color: Color, size: f64) -> Self {
		Self {
			label: label.into(),
			kind,
			image: None,
			position: Point::default(),
			color,
			size,
			highlighted: false,
			base_color: color,
			base_size: size,
		}
	}

	/// Moves the node to `position`.
	pub fn at(mut self, position: Point) -> Self {
		self.position = position;
		self
	}

	/// Reverts color, size and highlight flag to the dataset-derived values.
	pub fn reset_visuals(&mut self) {
		self.color = self.base_color;
		self.size = self.base_size;
		self.highlighted = false;
	}
}

/// Mutable attributes attached to an edge.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeAttrs {
	/// Source node id, filled in by [`GraphStore::add_edge`].
	pub source: String,
	/// Target node id, filled in by [`GraphStore::add_edge`].
	pub target: String,
	/// Relation label.
	pub label: String,
	/// Current stroke color; changed by the pulse.
	pub color: Color,
	/// Current stroke width; changed by highlighting.
	pub size: f64,
	/// Color restored when highlighting ends.
	pub base_color: Color,
	/// Width restored when highlighting ends.
	pub base_size: f64,
}

impl EdgeAttrs {
	/// Unattached edge attributes; endpoints are set on insertion.
	pub fn new(label: impl Into<String>, color: Color, size: f64) -> Self {
		Self {
			source: String::new(),
			target: String::new(),
			label: label.into(),
			color,
			size,
			base_color: color,
			base_size: size,
		}
	}

	/// Reverts color and width.
	pub fn reset_visuals(&mut self) {
		self.color = self.base_color;
		self.size = self.base_size;
	}

	/// Whether `node` is either endpoint.
	pub fn touches(&self, node: &str) -> bool {
		self.source == node || self.target == node
	}

	/// The endpoint on the other side of `node`.
	pub fn opposite(&self, node: &str) -> Option<&str> {
		if self.source == node {
			Some(&self.target)
		} else if self.target == node {
			Some(&self.source)
		} else {
			None
		}
	}
}

fn pair_key(a: &str, b: &str) -> (String, String) {
	if a <= b {
		(a.to_string(), b.to_string())
	} else {
		(b.to_string(), a.to_string())
	}
}

/// Node and edge storage with insertion-ordered enumeration.
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
	nodes: HashMap<String, NodeAttrs>,
	node_order: Vec<String>,
	edges: HashMap<String, EdgeAttrs>,
	edge_order: Vec<String>,
	/// Edge ids incident to each node.
	incidence: HashMap<String, HashSet<String>>,
	/// Unordered endpoint pair -> edge id.
	pairs: HashMap<(String, String), String>,
}

impl GraphStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of nodes.
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	/// Number of edges.
	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Whether the store holds no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	#[allow(missing_docs)]
	pub fn contains_node(&self, id: &str) -> bool {
		self.nodes.contains_key(id)
	}

	#[allow(missing_docs)]
	pub fn contains_edge(&self, id: &str) -> bool {
		self.edges.contains_key(id)
	}

	/// Adds a node; fails with [`GraphError::DuplicateNode`] if the id is taken.
	pub fn add_node(&mut self, id: impl Into<String>, attrs: NodeAttrs) -> Result<()> {
		let id = id.into();
		if self.nodes.contains_key(&id) {
			return Err(GraphError::DuplicateNode(id));
		}
		self.node_order.push(id.clone());
		self.incidence.insert(id.clone(), HashSet::new());
		self.nodes.insert(id, attrs);
		Ok(())
	}

	/// Removes a node after removing every incident edge.
	///
	/// Returns the node's attributes and the ids of the edges removed with it.
	pub fn remove_node(&mut self, id: &str) -> Option<(NodeAttrs, Vec<String>)> {
		if !self.nodes.contains_key(id) {
			return None;
		}
		let mut incident: Vec<String> = self
			.incidence
			.get(id)
			.map(|set| set.iter().cloned().collect())
			.unwrap_or_default();
		incident.sort();
		for edge in &incident {
			self.remove_edge(edge);
		}
		self.incidence.remove(id);
		self.node_order.retain(|n| n != id);
		let attrs = self.nodes.remove(id)?;
		debug!("store: removed node {} with {} edges", id, incident.len());
		Some((attrs, incident))
	}

	/// Adds an edge between two existing nodes.
	///
	/// Rejects the edge without mutating anything if either endpoint is missing
	/// or if any edge already joins the pair, in either direction.
	pub fn add_edge(
		&mut self,
		id: impl Into<String>,
		source: &str,
		target: &str,
		mut attrs: EdgeAttrs,
	) -> Result<()> {
		let id = id.into();
		for endpoint in [source, target] {
			if !self.nodes.contains_key(endpoint) {
				return Err(GraphError::UnknownEndpoint {
					edge: id,
					node: endpoint.to_string(),
				});
			}
		}
		if self.edges.contains_key(&id) {
			return Err(GraphError::DuplicateEdgeId(id));
		}
		let key = pair_key(source, target);
		if self.pairs.contains_key(&key) {
			return Err(GraphError::DuplicateEdge {
				from: source.to_string(),
				to: target.to_string(),
			});
		}

		attrs.source = source.to_string();
		attrs.target = target.to_string();
		self.pairs.insert(key, id.clone());
		for endpoint in [source, target] {
			self.incidence
				.entry(endpoint.to_string())
				.or_default()
				.insert(id.clone());
		}
		self.edge_order.push(id.clone());
		self.edges.insert(id, attrs);
		Ok(())
	}

	/// Removes an edge, returning its attributes.
	pub fn remove_edge(&mut self, id: &str) -> Option<EdgeAttrs> {
		let attrs = self.edges.remove(id)?;
		self.edge_order.retain(|e| e != id);
		self.pairs.remove(&pair_key(&attrs.source, &attrs.target));
		for endpoint in [&attrs.source, &attrs.target] {
			if let Some(set) = self.incidence.get_mut(endpoint.as_str()) {
				set.remove(id);
			}
		}
		Some(attrs)
	}

	/// Attributes of node `id`.
	pub fn node(&self, id: &str) -> Option<&NodeAttrs> {
		self.nodes.get(id)
	}

	/// Mutable attributes of node `id`.
	pub fn node_mut(&mut self, id: &str) -> Option<&mut NodeAttrs> {
		self.nodes.get_mut(id)
	}

	/// Attributes of edge `id`.
	pub fn edge(&self, id: &str) -> Option<&EdgeAttrs> {
		self.edges.get(id)
	}

	/// Mutable attributes of edge `id`.
	pub fn edge_mut(&mut self, id: &str) -> Option<&mut EdgeAttrs> {
		self.edges.get_mut(id)
	}

	/// Position of node `id`.
	pub fn position(&self, id: &str) -> Option<Point> {
		self.nodes.get(id).map(|n| n.position)
	}

	/// Moves node `id`. Returns `false` if it does not exist.
	pub fn set_position(&mut self, id: &str, position: Point) -> bool {
		match self.nodes.get_mut(id) {
			Some(node) => {
				node.position = position;
				true
			}
			None => false,
		}
	}

	/// Id of the edge joining `a` and `b` in either direction.
	pub fn edge_between(&self, a: &str, b: &str) -> Option<&str> {
		self.pairs.get(&pair_key(a, b)).map(String::as_str)
	}

	/// Incident edge ids in insertion order.
	pub fn incident_edges(&self, id: &str) -> Vec<String> {
		let Some(set) = self.incidence.get(id) else {
			return Vec::new();
		};
		self.edge_order
			.iter()
			.filter(|e| set.contains(*e))
			.cloned()
			.collect()
	}

	/// Nodes one incident edge away from `id`, in edge insertion order.
	pub fn neighbors(&self, id: &str) -> Vec<String> {
		let mut seen = HashSet::new();
		self.incident_edges(id)
			.iter()
			.filter_map(|e| self.edges.get(e))
			.filter_map(|e| e.opposite(id))
			.filter(|n| *n != id && seen.insert(n.to_string()))
			.map(str::to_string)
			.collect()
	}

	/// Node ids in insertion order.
	pub fn node_ids(&self) -> &[String] {
		&self.node_order
	}

	/// Edge ids in insertion order.
	pub fn edge_ids(&self) -> &[String] {
		&self.edge_order
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeAttrs)> {
		self.node_order
			.iter()
			.filter_map(|id| self.nodes.get(id).map(|n| (id.as_str(), n)))
	}

	/// Edges in insertion order.
	pub fn edges(&self) -> impl Iterator<Item = (&str, &EdgeAttrs)> {
		self.edge_order
			.iter()
			.filter_map(|id| self.edges.get(id).map(|e| (id.as_str(), e)))
	}

	/// Mutable node attributes, in no particular order.
	pub fn nodes_mut(&mut self) -> impl Iterator<Item = (&String, &mut NodeAttrs)> {
		self.nodes.iter_mut()
	}

	/// Mutable edge attributes, in no particular order.
	pub fn edges_mut(&mut self) -> impl Iterator<Item = (&String, &mut EdgeAttrs)> {
		self.edges.iter_mut()
	}

	/// Positions of every node, keyed by id.
	pub fn positions(&self) -> HashMap<String, Point> {
		self.nodes
			.iter()
			.map(|(id, n)| (id.clone(), n.position))
			.collect()
	}

	/// Removes every node and edge.
	pub fn clear(&mut self) {
		*self = Self::default();
	}
}
