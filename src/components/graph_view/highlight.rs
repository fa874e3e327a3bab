//! Hover highlighting.
//!
//! In cluster mode, entering a node highlights it together with its direct
//! neighbors, dims everything else, and starts a pulse on its incident edges.
//! The pulse is a [`PulseTask`] polled once per frame; it stops itself as soon
//! as the node it was started for is no longer hovered.

use std::collections::HashSet;

use log::debug;

use super::store::GraphStore;
use super::theme::Theme;

/// How hovering a node is visualised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoverMode {
	/// Neighborhood highlight with dimming and an edge pulse.
	#[default]
	Cluster,
	/// Only the hovered node grows; no neighborhood, no animation.
	Simple,
}

/// Per-frame edge pulse for one hovered node.
#[derive(Clone, Debug, PartialEq)]
pub struct PulseTask {
	target: String,
	started_ms: f64,
	cancelled: bool,
}

impl PulseTask {
	/// Starts a pulse for `target` at `now_ms`.
	pub fn start(target: impl Into<String>, now_ms: f64) -> Self {
		Self {
			target: target.into(),
			started_ms: now_ms,
			cancelled: false,
		}
	}

	/// Node the pulse belongs to.
	pub fn target(&self) -> &str {
		&self.target
	}

	/// Stops the pulse for good.
	pub fn cancel(&mut self) {
		self.cancelled = true;
	}

	#[allow(missing_docs)]
	pub fn is_cancelled(&self) -> bool {
		self.cancelled
	}

	/// Elapsed pulse time, or `None` once the task is dead. A task whose target
	/// is no longer `hovered` cancels itself.
	pub fn poll(&mut self, hovered: Option<&str>, now_ms: f64) -> Option<f64> {
		if self.cancelled {
			return None;
		}
		if hovered != Some(self.target.as_str()) {
			self.cancelled = true;
			return None;
		}
		Some((now_ms - self.started_ms).max(0.0))
	}
}

/// Applies and reverts hover highlighting on the store.
#[derive(Clone, Debug, Default)]
pub struct HighlightEngine {
	mode: HoverMode,
	hovered: Option<String>,
	/// Incident edges of the hovered node, animated by the pulse.
	incident: Vec<String>,
	pulse: Option<PulseTask>,
}

impl HighlightEngine {
	/// Engine with nothing hovered.
	pub fn new(mode: HoverMode) -> Self {
		Self {
			mode,
			..Self::default()
		}
	}

	/// Current hover mode.
	pub fn mode(&self) -> HoverMode {
		self.mode
	}

	/// Currently hovered node.
	pub fn hovered(&self) -> Option<&str> {
		self.hovered.as_deref()
	}

	/// Live pulse, if any.
	pub fn pulse(&self) -> Option<&PulseTask> {
		self.pulse.as_ref()
	}

	/// Whether the frame loop needs to keep ticking for the pulse.
	pub fn is_animating(&self) -> bool {
		self.pulse.as_ref().is_some_and(|p| !p.is_cancelled())
	}

	/// Switches the hover mode, reverting any current highlight.
	pub fn set_mode(&mut self, store: &mut GraphStore, mode: HoverMode) {
		self.reset(store);
		self.mode = mode;
	}

	/// Hovers `node`, replacing any previous highlight.
	pub fn enter_node(&mut self, store: &mut GraphStore, theme: &Theme, node: &str, now_ms: f64) {
		if self.hovered.as_deref() == Some(node) || !store.contains_node(node) {
			return;
		}
		self.reset(store);
		self.hovered = Some(node.to_string());
		match self.mode {
			HoverMode::Cluster => {
				self.apply_cluster(store, theme);
				self.pulse = Some(PulseTask::start(node, now_ms));
			}
			HoverMode::Simple => {
				if let Some(n) = store.node_mut(node) {
					n.highlighted = true;
					n.size = n.base_size * theme.node.toggle_scale;
				}
			}
		}
	}

	/// Ends hovering of `node`; ignored if another node is hovered.
	pub fn leave_node(&mut self, store: &mut GraphStore, node: &str) {
		if self.hovered.as_deref() == Some(node) {
			self.reset(store);
		}
	}

	/// Reverts every node and edge to its base look and stops the pulse.
	pub fn reset(&mut self, store: &mut GraphStore) {
		if let Some(pulse) = self.pulse.as_mut() {
			pulse.cancel();
		}
		self.pulse = None;
		self.hovered = None;
		self.incident.clear();
		for (_, node) in store.nodes_mut() {
			node.reset_visuals();
		}
		for (_, edge) in store.edges_mut() {
			edge.reset_visuals();
		}
	}

	/// Re-applies the highlight after a structural change, or drops it if the
	/// hovered node is gone.
	pub fn refresh(&mut self, store: &mut GraphStore, theme: &Theme, now_ms: f64) {
		let Some(node) = self.hovered.clone() else {
			return;
		};
		self.reset(store);
		if store.contains_node(&node) {
			debug!("highlight: refreshing cluster of {}", node);
			self.enter_node(store, theme, &node, now_ms);
		}
	}

	/// Advances the pulse. Returns `true` if another frame is needed.
	pub fn tick(&mut self, store: &mut GraphStore, theme: &Theme, now_ms: f64) -> bool {
		let hovered = self.hovered.as_deref();
		let Some(pulse) = self.pulse.as_mut() else {
			return false;
		};
		let Some(elapsed) = pulse.poll(hovered, now_ms) else {
			self.pulse = None;
			return false;
		};
		let color = theme.pulse.sample(elapsed);
		for id in &self.incident {
			if let Some(edge) = store.edge_mut(id) {
				edge.color = color;
			}
		}
		true
	}

	fn apply_cluster(&mut self, store: &mut GraphStore, theme: &Theme) {
		let Some(center) = self.hovered.clone() else {
			return;
		};
		let neighbors: HashSet<String> = store.neighbors(&center).into_iter().collect();
		self.incident = store.incident_edges(&center);
		let incident: HashSet<&str> = self.incident.iter().map(String::as_str).collect();

		for (id, node) in store.nodes_mut() {
			if *id == center {
				node.highlighted = true;
				node.size = theme.node.center_size;
			} else if neighbors.contains(id) {
				node.highlighted = true;
				node.size = theme.node.neighbor_size;
			} else {
				node.highlighted = false;
				node.size = theme.node.dimmed_size;
				node.color = theme.node.dimmed_color;
			}
		}
		for (id, edge) in store.edges_mut() {
			if incident.contains(id.as_str()) {
				edge.color = theme.edge.emphasized_color;
				edge.size = theme.edge.emphasized_size;
			} else {
				edge.color = theme.edge.dimmed_color;
				edge.size = theme.edge.dimmed_size;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::store::{EdgeAttrs, NodeAttrs};
	use crate::components::graph_view::types::NodeKind;

	fn star() -> (GraphStore, Theme) {
		let theme = Theme::default();
		let mut store = GraphStore::new();
		for id in ["a", "b", "c", "d"] {
			let attrs = NodeAttrs::new(id, NodeKind::Person, theme.palette.person, theme.node.base_size);
			store.add_node(id, attrs).unwrap();
		}
		let edge = || EdgeAttrs::new("knows", theme.edge.color, theme.edge.size);
		store.add_edge("ab", "a", "b", edge()).unwrap();
		store.add_edge("ca", "c", "a", edge()).unwrap();
		store.add_edge("cd", "c", "d", edge()).unwrap();
		(store, theme)
	}

	#[test]
	fn cluster_hover_sizes_and_restores_exactly() {
		let (mut store, theme) = star();
		let before = store.clone();
		let mut engine = HighlightEngine::new(HoverMode::Cluster);

		engine.enter_node(&mut store, &theme, "a", 0.0);
		assert_eq!(store.node("a").unwrap().size, theme.node.center_size);
		assert_eq!(store.node("b").unwrap().size, theme.node.neighbor_size);
		assert_eq!(store.node("c").unwrap().size, theme.node.neighbor_size);
		assert_eq!(store.node("d").unwrap().size, theme.node.dimmed_size);
		assert_eq!(store.node("d").unwrap().color, theme.node.dimmed_color);
		assert_eq!(store.edge("ab").unwrap().size, theme.edge.emphasized_size);
		assert_eq!(store.edge("cd").unwrap().color, theme.edge.dimmed_color);
		assert!(engine.is_animating());

		engine.leave_node(&mut store, "a");
		assert!(!engine.is_animating());
		for (id, node) in store.nodes() {
			assert_eq!(node, before.node(id).unwrap());
		}
		for (id, edge) in store.edges() {
			assert_eq!(edge, before.edge(id).unwrap());
		}
	}

	#[test]
	fn pulse_animates_incident_edges_until_hover_changes() {
		let (mut store, theme) = star();
		let mut engine = HighlightEngine::new(HoverMode::Cluster);
		engine.enter_node(&mut store, &theme, "a", 1000.0);

		assert!(engine.tick(&mut store, &theme, 1000.0 + theme.pulse.period_ms / 4.0));
		assert_eq!(store.edge("ab").unwrap().color, theme.pulse.to);
		assert_eq!(store.edge("ca").unwrap().color, theme.pulse.to);
		assert_eq!(store.edge("cd").unwrap().color, theme.edge.dimmed_color);

		engine.enter_node(&mut store, &theme, "d", 2000.0);
		assert_eq!(engine.pulse().map(PulseTask::target), Some("d"));
		engine.leave_node(&mut store, "d");
		assert!(!engine.tick(&mut store, &theme, 2100.0));
		assert!(engine.pulse().is_none());
	}

	#[test]
	fn stale_pulse_task_cancels_itself() {
		let mut task = PulseTask::start("a", 0.0);
		assert_eq!(task.poll(Some("a"), 40.0), Some(40.0));
		assert_eq!(task.poll(Some("b"), 50.0), None);
		assert!(task.is_cancelled());
		assert_eq!(task.poll(Some("a"), 60.0), None);
	}

	#[test]
	fn simple_mode_only_toggles_the_hovered_node() {
		let (mut store, theme) = star();
		let mut engine = HighlightEngine::new(HoverMode::Simple);
		engine.enter_node(&mut store, &theme, "a", 0.0);
		let a = store.node("a").unwrap();
		assert!(a.highlighted);
		assert_eq!(a.size, theme.node.base_size * theme.node.toggle_scale);
		assert_eq!(store.node("b").unwrap().size, theme.node.base_size);
		assert_eq!(store.edge("ab").unwrap().color, theme.edge.color);
		assert!(!engine.is_animating());
		assert!(!engine.tick(&mut store, &theme, 16.0));

		engine.leave_node(&mut store, "a");
		assert!(!store.node("a").unwrap().highlighted);
	}

	#[test]
	fn refresh_drops_highlight_of_removed_node() {
		let (mut store, theme) = star();
		let mut engine = HighlightEngine::new(HoverMode::Cluster);
		engine.enter_node(&mut store, &theme, "c", 0.0);
		store.remove_node("c");
		engine.refresh(&mut store, &theme, 10.0);
		assert_eq!(engine.hovered(), None);
		assert!(!engine.is_animating());
		assert_eq!(store.node("a").unwrap().size, theme.node.base_size);
	}
}
