//! The graph view model.
//!
//! [`GraphView`] owns the store and every controller that mutates it. The
//! canvas component translates DOM events into calls on this type and paints
//! whatever the store holds afterwards; nothing else keeps a copy of the graph.
//!
//! Time is passed in explicitly as `now_ms` (the frame clock) so the camera,
//! the pulse and the layered-layout deadline all advance from the same source.

use log::{debug, info, warn};

use super::camera::Camera;
use super::error::{GraphError, Result};
use super::expansion::{DeleteMode, ExpansionController, SubgraphSource, edge_attrs, node_attrs};
use super::highlight::{HighlightEngine, HoverMode};
use super::layout::{LayeredLayout, LayoutConfig, LayoutOutcome, LayoutPipeline, LayoutRequest, LayoutResponse, fit_target};
use super::relation::{MenuAction, PendingRelation, RelationEditor};
use super::scale::{ScaleConfig, ScaledValues};
use super::store::{GraphStore, Point};
use super::theme::Theme;
use super::types::GraphData;

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	/// Node being dragged.
	pub node: Option<String>,
	/// Screen position of the press.
	pub start_x: f64,
	#[allow(missing_docs)]
	pub start_y: f64,
	/// Node position at the press.
	pub node_start: Point,
}

impl DragState {
	#[allow(missing_docs)]
	pub fn active(&self) -> bool {
		self.node.is_some()
	}
}

/// Counts from the last dataset load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
	/// Nodes in the store after loading.
	pub nodes: usize,
	/// Edges in the store after loading.
	pub edges: usize,
	/// Records rejected by the store (duplicates, unknown endpoints).
	pub rejected: usize,
}

/// What the caller should do after a context-menu action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MenuOutcome {
	/// Nothing further to do.
	Done,
	/// Ask the user for a label for this relation.
	PromptLabel(PendingRelation),
}

/// Everything the canvas shows, and every controller that changes it.
pub struct GraphView {
	/// Nodes, edges and their visual attributes.
	pub store: GraphStore,
	/// Colors and highlight sizes.
	pub theme: Theme,
	/// Positioning stages and the layered-layout ticket.
	pub layout: LayoutPipeline,
	/// Viewport transform.
	pub camera: Camera,
	/// Hover state and pulse.
	pub highlight: HighlightEngine,
	/// Context menu and relation draft.
	pub relations: RelationEditor,
	/// Expansion records and snapshots.
	pub expansion: ExpansionController,
	#[allow(missing_docs)]
	pub drag: DragState,
	/// Viewport width in screen pixels.
	pub width: f64,
	/// Viewport height in screen pixels.
	pub height: f64,
	/// Layered-layout request not yet handed to an engine.
	pending_layout: Option<LayoutRequest>,
}

impl GraphView {
	/// Empty view of `width × height` pixels expanding nodes through `source`.
	pub fn new(source: Box<dyn SubgraphSource>, width: f64, height: f64, theme: Theme) -> Self {
		Self {
			store: GraphStore::new(),
			theme,
			layout: LayoutPipeline::new(LayoutConfig::default()),
			camera: Camera::centered(width, height),
			highlight: HighlightEngine::new(HoverMode::Cluster),
			relations: RelationEditor::default(),
			expansion: ExpansionController::new(source),
			drag: DragState::default(),
			width,
			height,
			pending_layout: None,
		}
	}

	/// Replaces the whole graph with `data`.
	///
	/// Every transient state is dropped, any layered layout still in flight
	/// becomes stale, and a fresh layered layout is requested for the new graph.
	pub fn load_dataset(&mut self, data: &GraphData, now_ms: f64) -> LoadReport {
		self.highlight.reset(&mut self.store);
		self.relations.reset();
		self.expansion.reset();
		self.end_drag();
		self.camera.end_pan();
		self.layout.invalidate();
		self.pending_layout = None;
		self.store.clear();

		let mut report = LoadReport::default();
		let mut added = Vec::with_capacity(data.nodes.len());
		for record in &data.nodes {
			match self.store.add_node(record.id.clone(), node_attrs(record, &self.theme)) {
				Ok(()) => added.push(record.id.clone()),
				Err(e) => {
					warn!("dataset: {}", e);
					report.rejected += 1;
				}
			}
		}
		for record in &data.edges {
			let attrs = edge_attrs(record, &self.theme);
			if let Err(e) = self.store.add_edge(record.id.clone(), &record.start_id, &record.end_id, attrs) {
				warn!("dataset: {}", e);
				report.rejected += 1;
			}
		}
		report.nodes = self.store.node_count();
		report.edges = self.store.edge_count();

		self.layout.seed(&mut self.store, &added, true);
		self.fit_view(now_ms);
		if !self.store.is_empty() {
			self.request_layout(now_ms);
		}
		info!(
			"dataset: loaded {} nodes, {} edges ({} rejected)",
			report.nodes, report.edges, report.rejected
		);
		report
	}

	/// Queues a layered layout of the current graph, superseding older ones.
	pub fn request_layout(&mut self, now_ms: f64) {
		self.pending_layout = Some(self.layout.request(&self.store, now_ms));
	}

	/// Hands out the queued layered-layout request, if any.
	pub fn take_layout_request(&mut self) -> Option<LayoutRequest> {
		self.pending_layout.take()
	}

	/// Delivers a layered-layout result and fits the view unless it was stale.
	pub fn complete_layout(&mut self, generation: u64, result: Result<LayoutResponse>, now_ms: f64) -> LayoutOutcome {
		let outcome = self.layout.complete(&mut self.store, generation, result);
		if outcome != LayoutOutcome::Stale {
			self.fit_view(now_ms);
		}
		outcome
	}

	/// Runs the queued request through `engine`, if one is queued.
	pub fn run_layout<L: LayeredLayout + ?Sized>(&mut self, engine: &L, now_ms: f64) -> Option<LayoutOutcome> {
		let request = self.take_layout_request()?;
		let result = engine.layout(&request);
		Some(self.complete_layout(request.generation, result, now_ms))
	}

	/// Animates the camera so every node is visible. Skipped for an empty graph.
	pub fn fit_view(&mut self, now_ms: f64) {
		let config = &self.layout.config;
		match fit_target(&self.store, self.width, self.height, config.fit_margin) {
			Ok(target) => self.camera.animate_to(target, now_ms, config.fit_duration_ms),
			Err(GraphError::EmptyGraph) => debug!("fit: empty graph, skipped"),
			Err(e) => warn!("fit: {}", e),
		}
	}

	/// Expands `node` and places its children around it.
	///
	/// A no-op while the node is expanded or an expansion is pending.
	pub fn expand(&mut self, node: &str, now_ms: f64) -> Result<Vec<String>> {
		let children = self.expansion.expand(&mut self.store, &self.theme, node)?;
		if children.is_empty() {
			return Ok(children);
		}
		self.layout.invalidate();
		self.pending_layout = None;
		self.layout.place_incremental(&mut self.store, node, &children);
		self.relations.close_menu();
		self.highlight.refresh(&mut self.store, &self.theme, now_ms);
		self.fit_view(now_ms);
		Ok(children)
	}

	/// Collapses `node`, removing what it introduced and restoring positions.
	pub fn collapse(&mut self, node: &str, now_ms: f64) -> Vec<String> {
		if !self.expansion.is_expanded(node) {
			self.expansion.cancel(node);
			return Vec::new();
		}
		let removed = self.expansion.collapse(&mut self.store, node);
		self.layout.invalidate();
		self.pending_layout = None;
		self.forget_nodes(&removed, now_ms);
		self.fit_view(now_ms);
		removed
	}

	/// Expands a collapsed node, collapses an expanded one.
	pub fn toggle_expansion(&mut self, node: &str, now_ms: f64) -> Result<()> {
		if self.expansion.is_expanded(node) {
			self.collapse(node, now_ms);
		} else {
			self.expand(node, now_ms)?;
		}
		Ok(())
	}

	/// Deletes `node` under `mode` and clears state that referred to it.
	/// Returns every removed node id.
	pub fn delete_node(&mut self, node: &str, mode: DeleteMode, now_ms: f64) -> Vec<String> {
		let removed = self.expansion.delete_node(&mut self.store, node, mode);
		if !removed.is_empty() {
			self.layout.invalidate();
			self.pending_layout = None;
			self.forget_nodes(&removed, now_ms);
		}
		removed
	}

	/// Clears transient state that refers to removed nodes.
	fn forget_nodes(&mut self, removed: &[String], now_ms: f64) {
		if self
			.drag
			.node
			.as_ref()
			.is_some_and(|n| removed.contains(n))
		{
			self.end_drag();
		}
		for id in removed {
			self.relations.forget_node(&self.store, id);
		}
		self.highlight.refresh(&mut self.store, &self.theme, now_ms);
	}

	/// Switches the hover mode, reverting any current highlight.
	pub fn set_hover_mode(&mut self, mode: HoverMode) {
		self.highlight.set_mode(&mut self.store, mode);
	}

	/// Topmost node under the screen point `(sx, sy)`.
	pub fn node_at_position(&self, sx: f64, sy: f64, config: &ScaleConfig) -> Option<String> {
		let (gx, gy) = self.camera.screen_to_graph(sx, sy);
		let scale = ScaledValues::new(config, self.camera.transform.k);
		let cursor = Point::new(gx, gy);
		self.store
			.nodes()
			.filter(|(_, node)| node.position.distance(cursor) < scale.hit_radius(node.size))
			.last()
			.map(|(id, _)| id.to_string())
	}

	/// Starts dragging `target`, or panning when the press hit the background.
	/// Ignored while another drag is in progress.
	pub fn pointer_down(&mut self, target: Option<&str>, sx: f64, sy: f64) {
		if self.drag.active() {
			return;
		}
		match target.and_then(|id| self.store.position(id).map(|p| (id, p))) {
			Some((id, position)) => {
				self.drag = DragState {
					node: Some(id.to_string()),
					start_x: sx,
					start_y: sy,
					node_start: position,
				};
				self.camera.set_panning(false);
			}
			None => {
				self.camera.begin_pan(sx, sy);
			}
		}
	}

	/// Moves the dragged node, pans, or updates hover, in that order of priority.
	pub fn pointer_move(&mut self, target: Option<&str>, sx: f64, sy: f64, now_ms: f64) {
		if let Some(node) = self.drag.node.clone() {
			let k = self.camera.transform.k;
			let position = Point::new(
				self.drag.node_start.x + (sx - self.drag.start_x) / k,
				self.drag.node_start.y + (sy - self.drag.start_y) / k,
			);
			if !self.store.set_position(&node, position) {
				self.end_drag();
			}
			return;
		}
		if self.camera.pan.active {
			self.camera.pan_to(sx, sy);
			return;
		}
		self.hover(target, now_ms);
	}

	/// Ends any drag or pan.
	pub fn pointer_up(&mut self) {
		self.end_drag();
		self.camera.end_pan();
	}

	/// Pointer left the canvas: ends drag, pan and hover.
	pub fn pointer_leave(&mut self) {
		self.pointer_up();
		if let Some(node) = self.highlight.hovered().map(str::to_string) {
			self.highlight.leave_node(&mut self.store, &node);
		}
	}

	/// Moves the hover to `target`, leaving the previous node first.
	pub fn hover(&mut self, target: Option<&str>, now_ms: f64) {
		let current = self.highlight.hovered().map(str::to_string);
		if current.as_deref() == target {
			return;
		}
		if let Some(old) = current {
			self.highlight.leave_node(&mut self.store, &old);
		}
		if let Some(node) = target {
			self.highlight.enter_node(&mut self.store, &self.theme, node, now_ms);
		}
	}

	fn end_drag(&mut self) {
		self.drag = DragState::default();
		self.camera.set_panning(true);
	}

	/// Opens the context menu on `target`, or closes it on the background.
	pub fn secondary_click(&mut self, target: Option<&str>, sx: f64, sy: f64) {
		match target {
			Some(node) => {
				let expanded = self.expansion.is_expanded(node);
				self.relations.open_menu(&self.store, node, sx, sy, expanded);
			}
			None => self.relations.close_menu(),
		}
	}

	/// Applies a context-menu choice for the menu's node.
	pub fn menu_action(&mut self, action: MenuAction, now_ms: f64) -> Result<MenuOutcome> {
		let Some(anchor) = self.relations.menu().map(|m| m.anchor.clone()) else {
			return Ok(MenuOutcome::Done);
		};
		self.relations.close_menu();
		match action {
			MenuAction::DeleteRelation(edge) => {
				if self.relations.delete_relation(&mut self.store, &edge) {
					debug!("relation: deleted {}", edge);
					self.highlight.refresh(&mut self.store, &self.theme, now_ms);
				}
			}
			MenuAction::StartRelation => self.relations.start_relation(&anchor),
			MenuAction::CompleteRelation => {
				if let Some(pending) = self.relations.confirm_target(&anchor) {
					return Ok(MenuOutcome::PromptLabel(pending.clone()));
				}
			}
			MenuAction::CancelRelation => self.relations.cancel(),
			MenuAction::Expand => {
				self.expand(&anchor, now_ms)?;
			}
			MenuAction::Collapse => {
				self.collapse(&anchor, now_ms);
			}
			MenuAction::DeleteNode(mode) => {
				self.delete_node(&anchor, mode, now_ms);
			}
		}
		Ok(MenuOutcome::Done)
	}

	/// Creates the pending relation and requests a layered re-layout.
	///
	/// Returns the new edge id, or `None` for an empty label.
	pub fn submit_relation_label(&mut self, label: &str, now_ms: f64) -> Result<Option<String>> {
		let created = self.relations.submit_label(&mut self.store, &self.theme, label)?;
		if created.is_some() {
			self.highlight.refresh(&mut self.store, &self.theme, now_ms);
			self.request_layout(now_ms);
		}
		Ok(created)
	}

	/// Abandons the relation draft.
	pub fn cancel_relation(&mut self) {
		self.relations.cancel();
	}

	/// Advances the camera, the pulse and the layered-layout deadline.
	/// Returns `true` while something is still animating.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		if self.layout.poll_timeout(&mut self.store, now_ms).is_some() {
			self.pending_layout = None;
			self.fit_view(now_ms);
		}
		let camera = self.camera.tick(now_ms);
		let pulse = self.highlight.tick(&mut self.store, &self.theme, now_ms);
		camera || pulse || self.layout.is_pending()
	}

	/// Updates the viewport size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Stops everything driven by the frame clock: the pulse and highlight,
	/// camera transitions and the layered layout in flight. Transient
	/// interaction state is dropped too. The graph itself is kept.
	pub fn shutdown(&mut self) {
		self.highlight.reset(&mut self.store);
		self.relations.reset();
		self.end_drag();
		self.camera.end_pan();
		self.camera.stop();
		self.layout.invalidate();
		self.pending_layout = None;
		debug!("view: shut down with {} nodes", self.store.node_count());
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::expansion::{SubgraphBatch, SyntheticSource};
	use crate::components::graph_view::layered::SimpleLayered;
	use crate::components::graph_view::types::{EdgeRecord, NodeKind, NodeRecord};

	struct Fixed(usize);

	impl SubgraphSource for Fixed {
		fn fetch(&mut self, anchor: &str, _: &GraphStore) -> Result<SubgraphBatch> {
			let mut batch = SubgraphBatch::default();
			for i in 0..self.0 {
				let id = format!("{anchor}/{i}");
				batch.edges.push(EdgeRecord::new(format!("{anchor}=>{id}"), anchor, id.clone()));
				batch.nodes.push(NodeRecord::new(id, NodeKind::Event));
			}
			Ok(batch)
		}
	}

	fn data() -> GraphData {
		GraphData {
			nodes: vec![
				NodeRecord::new("a", NodeKind::Person).with_name("Alice"),
				NodeRecord::new("b", NodeKind::Person).with_name("Bob"),
				NodeRecord::new("c", NodeKind::Vehicle),
				NodeRecord::new("a", NodeKind::Other),
			],
			edges: vec![
				EdgeRecord::new("ab", "a", "b"),
				EdgeRecord::new("ba", "b", "a"),
				EdgeRecord::new("cz", "c", "zz"),
			],
		}
	}

	fn view() -> GraphView {
		let mut view = GraphView::new(Box::new(Fixed(3)), 800.0, 600.0, Theme::default());
		view.load_dataset(&data(), 0.0);
		view
	}

	#[test]
	fn load_rejects_bad_records_and_requests_layout() {
		let mut view = GraphView::new(Box::new(Fixed(1)), 800.0, 600.0, Theme::default());
		let report = view.load_dataset(&data(), 0.0);
		assert_eq!(report, LoadReport { nodes: 3, edges: 1, rejected: 3 });
		assert_eq!(view.store.node("a").unwrap().label, "Alice");
		assert!(view.layout.is_pending());
		assert_eq!(view.run_layout(&SimpleLayered, 5.0), Some(LayoutOutcome::Layered));
		assert_eq!(view.run_layout(&SimpleLayered, 5.0), None);
	}

	#[test]
	fn dataset_switch_discards_in_flight_layout() {
		let mut view = view();
		let request = view.take_layout_request().unwrap();
		view.load_dataset(&data(), 10.0);
		let late = SimpleLayered.layout(&request);
		assert_eq!(view.complete_layout(request.generation, late, 20.0), LayoutOutcome::Stale);
		// The new dataset's own request is still honoured.
		assert_eq!(view.run_layout(&SimpleLayered, 30.0), Some(LayoutOutcome::Layered));
	}

	#[test]
	fn hung_layout_times_out_to_fallback() {
		let mut view = view();
		let request = view.take_layout_request().unwrap();
		let deadline = view.layout.config.layered_timeout_ms;
		assert!(view.tick(deadline - 1.0));
		view.tick(deadline);
		assert!(!view.layout.is_pending());
		let late = SimpleLayered.layout(&request);
		assert_eq!(view.complete_layout(request.generation, late, deadline + 5.0), LayoutOutcome::Stale);
	}

	#[test]
	fn expand_supersedes_pending_layout() {
		let mut view = view();
		let request = view.take_layout_request().unwrap();
		let children = view.expand("c", 0.0).unwrap();
		assert_eq!(children.len(), 3);
		assert!(!view.layout.is_pending());
		let late = SimpleLayered.layout(&request);
		assert_eq!(view.complete_layout(request.generation, late, 1.0), LayoutOutcome::Stale);
	}

	#[test]
	fn shutdown_stops_pulse_and_pending_work() {
		let mut view = view();
		view.hover(Some("a"), 0.0);
		assert!(view.highlight.pulse().is_some());
		assert!(view.tick(10.0));
		view.pointer_down(Some("b"), 0.0, 0.0);

		view.shutdown();
		assert!(view.highlight.pulse().is_none());
		assert_eq!(view.highlight.hovered(), None);
		assert!(view.store.nodes().all(|(_, n)| !n.highlighted && n.size == n.base_size));
		assert!(view.store.edges().all(|(_, e)| e.color == e.base_color));
		assert!(!view.drag.active());
		assert!(view.take_layout_request().is_none());
		assert!(!view.tick(20.0));
		assert_eq!(view.store.node_count(), 3);
	}

	#[test]
	fn drag_moves_node_and_blocks_panning() {
		let mut view = view();
		let start = view.store.position("a").unwrap();
		let k = view.camera.transform.k;

		view.pointer_down(Some("a"), 100.0, 100.0);
		assert!(!view.camera.panning_enabled());
		// A second press mid-drag is ignored.
		view.pointer_down(Some("b"), 0.0, 0.0);
		assert_eq!(view.drag.node.as_deref(), Some("a"));

		view.pointer_move(None, 150.0, 80.0, 0.0);
		let moved = view.store.position("a").unwrap();
		assert!((moved.x - (start.x + 50.0 / k)).abs() < 1e-9);
		assert!((moved.y - (start.y - 20.0 / k)).abs() < 1e-9);

		view.pointer_up();
		assert!(!view.drag.active());
		assert!(view.camera.panning_enabled());
	}

	#[test]
	fn background_press_pans_the_camera() {
		let mut view = view();
		view.camera.tick(f64::MAX);
		let before = view.camera.transform;
		view.pointer_down(None, 10.0, 10.0);
		view.pointer_move(None, 40.0, 30.0, 0.0);
		view.pointer_leave();
		assert_eq!(view.camera.transform.x, before.x + 30.0);
		assert_eq!(view.camera.transform.y, before.y + 20.0);
		assert!(!view.camera.pan.active);
	}

	#[test]
	fn deleting_dragged_node_ends_drag() {
		let mut view = view();
		view.pointer_down(Some("b"), 0.0, 0.0);
		view.delete_node("b", DeleteMode::Cascade, 0.0);
		assert!(!view.drag.active());
		assert!(view.camera.panning_enabled());
		view.pointer_move(None, 5.0, 5.0, 0.0);
		assert!(!view.store.contains_node("b"));
	}

	#[test]
	fn hit_testing_finds_topmost_node() {
		let mut view = view();
		view.camera.tick(f64::MAX);
		let config = ScaleConfig::default();
		let p = view.store.position("b").unwrap();
		let (sx, sy) = view.camera.graph_to_screen(p.x, p.y);
		assert_eq!(view.node_at_position(sx, sy, &config).as_deref(), Some("b"));
		assert_eq!(view.node_at_position(-5000.0, -5000.0, &config), None);
	}

	#[test]
	fn menu_drives_relation_draft() {
		let mut view = view();
		view.secondary_click(Some("a"), 5.0, 5.0);
		view.menu_action(MenuAction::StartRelation, 0.0).unwrap();
		assert_eq!(view.relations.draft_source(), Some("a"));

		view.secondary_click(Some("c"), 5.0, 5.0);
		let outcome = view.menu_action(MenuAction::CompleteRelation, 0.0).unwrap();
		assert_eq!(
			outcome,
			MenuOutcome::PromptLabel(PendingRelation { source: "a".into(), target: "c".into() })
		);
		view.take_layout_request();
		let id = view.submit_relation_label("owns", 0.0).unwrap().unwrap();
		assert_eq!(view.store.edge_between("c", "a"), Some(id.as_str()));
		assert!(view.take_layout_request().is_some());

		view.secondary_click(Some("a"), 5.0, 5.0);
		view.menu_action(MenuAction::DeleteRelation(id.clone()), 0.0).unwrap();
		assert!(!view.store.contains_edge(&id));
		assert!(view.take_layout_request().is_none());
	}

	#[test]
	fn menu_actions_expand_and_collapse() {
		let mut view = view();
		let before = view.store.node_count();
		view.secondary_click(Some("b"), 0.0, 0.0);
		view.menu_action(MenuAction::Expand, 0.0).unwrap();
		assert_eq!(view.store.node_count(), before + 3);
		view.secondary_click(Some("b"), 0.0, 0.0);
		assert!(view.relations.menu().unwrap().items.iter().any(|i| i.action == MenuAction::Collapse));
		view.menu_action(MenuAction::Collapse, 0.0).unwrap();
		assert_eq!(view.store.node_count(), before);
	}

	#[test]
	fn synthetic_expansion_stays_overlap_free() {
		let mut view = GraphView::new(Box::new(SyntheticSource::new(11)), 800.0, 600.0, Theme::default());
		view.load_dataset(&data(), 0.0);
		view.run_layout(&SimpleLayered, 0.0);
		let children = view.expand("a", 0.0).unwrap();
		view.expand(&children[0], 0.0).unwrap();
		let nodes: Vec<_> = view.store.nodes().map(|(_, n)| (n.position, n.size)).collect();
		for (i, (a, ra)) in nodes.iter().enumerate() {
			for (b, rb) in &nodes[i + 1..] {
				assert!(a.distance(*b) >= ra + rb);
			}
		}
	}
}
