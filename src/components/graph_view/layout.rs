//! Node positioning pipeline.
//!
//! Stages run in order after every structural change:
//! 1. circular seed for a freshly populated store,
//! 2. layered auto-layout through an external [`LayeredLayout`] (best effort),
//! 3. column fallback grouped by node kind when stage 2 yields nothing,
//! 4. bounded overlap resolution,
//! 5. viewport fit (see [`fit_target`]).
//!
//! Stage 2 is asynchronous from the pipeline's point of view: [`LayoutPipeline::request`]
//! hands out a generation-stamped [`LayoutRequest`] and the result comes back
//! through [`LayoutPipeline::complete`]. Results for an older generation, or
//! arriving after [`LayoutPipeline::invalidate`], are discarded.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::TAU;

use log::{debug, info, warn};

use super::camera::ViewTransform;
use super::error::{GraphError, Result};
use super::store::{GraphStore, Point};
use super::types::NodeKind;

/// Angular increment between successive children, `π(3 − √5)`.
pub const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Tunables for every pipeline stage.
#[derive(Clone, Debug)]
pub struct LayoutConfig {
	/// Radius of the initial circular seed.
	pub seed_radius: f64,
	/// Vertical gap between layers of the layered layout.
	pub layer_spacing: f64,
	/// Horizontal gap between nodes inside a layer.
	pub node_spacing: f64,
	/// Fallback: distance between kind columns.
	pub column_spacing: f64,
	/// Fallback: distance between nodes inside a column.
	pub row_spacing: f64,
	/// Estimated label width per character.
	pub char_width: f64,
	/// Lower bound on a node's layout box width.
	pub min_node_width: f64,
	/// Height of a node's layout box.
	pub node_height: f64,
	/// Extra clearance kept between node footprints.
	pub overlap_margin: f64,
	/// Pass budget for overlap resolution.
	pub overlap_iterations: usize,
	/// Fraction of the viewport left empty around the fitted graph.
	pub fit_margin: f64,
	/// Duration of the animated camera fit.
	pub fit_duration_ms: f64,
	/// How long a layered layout may stay in flight before falling back.
	pub layered_timeout_ms: f64,
	/// Child placement radius: `child_radius + child_radius_growth * sqrt(node_count)`.
	pub child_radius: f64,
	#[allow(missing_docs)]
	pub child_radius_growth: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			seed_radius: 200.0,
			layer_spacing: 90.0,
			node_spacing: 40.0,
			column_spacing: 220.0,
			row_spacing: 70.0,
			char_width: 7.0,
			min_node_width: 40.0,
			node_height: 30.0,
			overlap_margin: 4.0,
			overlap_iterations: 200,
			fit_margin: 0.1,
			fit_duration_ms: 600.0,
			layered_timeout_ms: 2000.0,
			child_radius: 70.0,
			child_radius_growth: 6.0,
		}
	}
}

/// Layer direction of the layered layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutDirection {
	/// Sources on top, edges pointing down.
	TopDown,
}

/// Coordinate assignment inside a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementStrategy {
	/// Rows centered on the widest layer.
	Simple,
}

/// How cycles are broken before layering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleBreaking {
	/// Eades-style source/sink ordering.
	Greedy,
}

/// Named options passed to the layered layout.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct LayeredOptions {
	pub direction: LayoutDirection,
	pub placement: PlacementStrategy,
	pub cycle_breaking: CycleBreaking,
	pub layer_spacing: f64,
	pub node_spacing: f64,
}

/// Node box handed to the layered layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutNode {
	/// Store id.
	pub id: String,
	/// Estimated from the label length.
	pub width: f64,
	#[allow(missing_docs)]
	pub height: f64,
}

/// Input of the layered layout, stamped with the pipeline generation.
#[derive(Clone, Debug)]
pub struct LayoutRequest {
	/// Pipeline generation this request belongs to.
	pub generation: u64,
	/// Nodes in store insertion order.
	pub nodes: Vec<LayoutNode>,
	/// Directed `(source, target)` pairs. May contain cycles.
	pub edges: Vec<(String, String)>,
	#[allow(missing_docs)]
	pub options: LayeredOptions,
}

/// Absolute top-left position and size of a laid-out node.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct PlacedNode {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

/// Output of the layered layout.
#[derive(Clone, Debug, Default)]
pub struct LayoutResponse {
	/// Placed boxes; nodes left out keep their position.
	pub nodes: Vec<PlacedNode>,
}

/// External layered-layout algorithm, treated as a pure function.
pub trait LayeredLayout {
	/// Lays out `request`, or explains why it cannot.
	fn layout(&self, request: &LayoutRequest) -> Result<LayoutResponse>;
}

/// What happened to a layered-layout result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutOutcome {
	/// Layered positions were applied.
	Layered,
	/// The layered stage failed or timed out; column fallback applied.
	Fallback,
	/// The result belonged to a superseded generation and was dropped.
	Stale,
}

/// Axis-aligned bounds of node footprints.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct Bounds {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

#[allow(missing_docs)]
impl Bounds {
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	pub fn center(&self) -> Point {
		Point::new(
			(self.min_x + self.max_x) / 2.0,
			(self.min_y + self.max_y) / 2.0,
		)
	}
}

/// Bounding box of every node footprint (`position ± size`), `None` when empty.
pub fn bounds(store: &GraphStore) -> Option<Bounds> {
	store.nodes().fold(None, |acc, (_, node)| {
		let (p, r) = (node.position, node.size);
		let b = Bounds {
			min_x: p.x - r,
			min_y: p.y - r,
			max_x: p.x + r,
			max_y: p.y + r,
		};
		Some(match acc {
			None => b,
			Some(a) => Bounds {
				min_x: a.min_x.min(b.min_x),
				min_y: a.min_y.min(b.min_y),
				max_x: a.max_x.max(b.max_x),
				max_y: a.max_y.max(b.max_y),
			},
		})
	})
}

/// View transform fitting the graph into a `width × height` viewport.
///
/// The camera ratio is the larger of the two `bounds / available` axis
/// ratios, so the scale stays uniform and the whole box is visible.
pub fn fit_target(store: &GraphStore, width: f64, height: f64, margin: f64) -> Result<ViewTransform> {
	let b = bounds(store).ok_or(GraphError::EmptyGraph)?;
	let avail_w = (width * (1.0 - 2.0 * margin)).max(1.0);
	let avail_h = (height * (1.0 - 2.0 * margin)).max(1.0);
	let ratio = (b.width() / avail_w).max(b.height() / avail_h);
	let k = if ratio > f64::EPSILON {
		(1.0 / ratio).clamp(ViewTransform::MIN_ZOOM, ViewTransform::MAX_ZOOM)
	} else {
		1.0
	};
	let c = b.center();
	Ok(ViewTransform {
		x: width / 2.0 - c.x * k,
		y: height / 2.0 - c.y * k,
		k,
	})
}

/// Places `ids` evenly on a circle, in index order.
pub fn seed_circle(store: &mut GraphStore, ids: &[String], radius: f64) {
	let n = ids.len().max(1) as f64;
	for (i, id) in ids.iter().enumerate() {
		let angle = i as f64 * TAU / n;
		store.set_position(id, Point::new(radius * angle.cos(), radius * angle.sin()));
	}
}

/// Deterministic fallback: one column per kind, ids sorted inside a column,
/// the whole grid centered on the origin.
pub fn column_layout(store: &GraphStore, config: &LayoutConfig) -> HashMap<String, Point> {
	let mut columns: BTreeMap<NodeKind, Vec<&str>> = BTreeMap::new();
	for (id, node) in store.nodes() {
		columns.entry(node.kind).or_default().push(id);
	}

	let column_count = columns.len() as f64;
	let mut positions = HashMap::with_capacity(store.node_count());
	for (col, ids) in columns.values_mut().enumerate() {
		ids.sort_unstable();
		let x = (col as f64 - (column_count - 1.0) / 2.0) * config.column_spacing;
		let rows = ids.len() as f64;
		for (row, id) in ids.iter().enumerate() {
			let y = (row as f64 - (rows - 1.0) / 2.0) * config.row_spacing;
			positions.insert(id.to_string(), Point::new(x, y));
		}
	}
	positions
}

/// Places new children around `anchor` with golden-angle spacing.
///
/// The radius grows with the square root of the graph size so a crowded graph
/// pushes children further out.
pub fn place_children(store: &mut GraphStore, anchor: &str, children: &[String], config: &LayoutConfig) {
	let Some(center) = store.position(anchor) else {
		return;
	};
	let radius = config.child_radius + config.child_radius_growth * (store.node_count() as f64).sqrt();
	// Start opposite the existing neighbors' mean direction where possible.
	let offset = existing_direction(store, anchor, center, children)
		.map(|a| a + std::f64::consts::PI)
		.unwrap_or(0.0);
	for (i, child) in children.iter().enumerate() {
		let angle = offset + i as f64 * GOLDEN_ANGLE;
		let r = radius * (1.0 + 0.15 * (i as f64).sqrt());
		store.set_position(
			child,
			Point::new(center.x + r * angle.cos(), center.y + r * angle.sin()),
		);
	}
}

fn existing_direction(store: &GraphStore, anchor: &str, center: Point, skip: &[String]) -> Option<f64> {
	let (mut dx, mut dy) = (0.0_f64, 0.0_f64);
	for n in store.neighbors(anchor) {
		if skip.contains(&n) {
			continue;
		}
		if let Some(p) = store.position(&n) {
			dx += p.x - center.x;
			dy += p.y - center.y;
		}
	}
	(dx.abs() + dy.abs() > f64::EPSILON).then(|| dy.atan2(dx))
}

/// Pushes overlapping circular footprints apart.
///
/// Runs at most `config.overlap_iterations` passes and stops early once a pass
/// moves nothing. Returns the number of passes run.
pub fn resolve_overlaps(store: &mut GraphStore, config: &LayoutConfig) -> usize {
	let ids: Vec<String> = store.node_ids().to_vec();
	let mut pts: Vec<(Point, f64)> = ids
		.iter()
		.filter_map(|id| store.node(id).map(|n| (n.position, n.size)))
		.collect();
	if pts.len() < 2 {
		return 0;
	}

	let mut passes = 0;
	while passes < config.overlap_iterations {
		passes += 1;
		let mut moved = false;
		for i in 0..pts.len() {
			for j in (i + 1)..pts.len() {
				let ((a, ra), (b, rb)) = (pts[i], pts[j]);
				let required = ra + rb + config.overlap_margin;
				let (dx, dy) = (b.x - a.x, b.y - a.y);
				let dist = (dx * dx + dy * dy).sqrt();
				if dist >= required - 1e-6 {
					continue;
				}
				let (ux, uy) = if dist < 1e-6 {
					// Coincident: split along a deterministic per-pair direction.
					let angle = (i + j) as f64 * GOLDEN_ANGLE;
					(angle.cos(), angle.sin())
				} else {
					(dx / dist, dy / dist)
				};
				let push = (required - dist) / 2.0 + 1e-3;
				pts[i].0 = Point::new(a.x - ux * push, a.y - uy * push);
				pts[j].0 = Point::new(b.x + ux * push, b.y + uy * push);
				moved = true;
			}
		}
		if !moved {
			break;
		}
	}

	for (id, (p, _)) in ids.iter().zip(&pts) {
		store.set_position(id, *p);
	}
	debug!("layout: overlap resolution finished after {} passes", passes);
	passes
}

/// Layered-layout request currently awaiting a result.
#[derive(Clone, Copy, Debug)]
struct InFlight {
	generation: u64,
	deadline_ms: f64,
}

/// Drives the layout stages and guards the asynchronous layered stage.
#[derive(Clone, Debug, Default)]
pub struct LayoutPipeline {
	/// Stage tunables.
	pub config: LayoutConfig,
	generation: u64,
	in_flight: Option<InFlight>,
}

impl LayoutPipeline {
	/// Creates a pipeline at generation zero with nothing in flight.
	pub fn new(config: LayoutConfig) -> Self {
		Self {
			config,
			generation: 0,
			in_flight: None,
		}
	}

	/// Whether a layered-layout request is awaiting its result.
	pub fn is_pending(&self) -> bool {
		self.in_flight.is_some()
	}

	/// Drops any in-flight request; its result will be treated as stale.
	pub fn invalidate(&mut self) {
		self.generation += 1;
		self.in_flight = None;
	}

	/// Seeds a circle when `ids` are the first nodes of an empty store.
	pub fn seed(&self, store: &mut GraphStore, ids: &[String], was_empty: bool) {
		if was_empty && !ids.is_empty() {
			seed_circle(store, ids, self.config.seed_radius);
		}
	}

	/// Builds a layered-layout request for the current graph, superseding any
	/// earlier one still in flight.
	pub fn request(&mut self, store: &GraphStore, now_ms: f64) -> LayoutRequest {
		self.generation += 1;
		self.in_flight = Some(InFlight {
			generation: self.generation,
			deadline_ms: now_ms + self.config.layered_timeout_ms,
		});

		let nodes = store
			.nodes()
			.map(|(id, node)| LayoutNode {
				id: id.to_string(),
				width: (node.label.chars().count() as f64 * self.config.char_width)
					.max(self.config.min_node_width)
					.max(node.size * 2.0),
				height: self.config.node_height.max(node.size * 2.0),
			})
			.collect();
		let edges = store
			.edges()
			.map(|(_, e)| (e.source.clone(), e.target.clone()))
			.collect();

		LayoutRequest {
			generation: self.generation,
			nodes,
			edges,
			options: LayeredOptions {
				direction: LayoutDirection::TopDown,
				placement: PlacementStrategy::Simple,
				cycle_breaking: CycleBreaking::Greedy,
				layer_spacing: self.config.layer_spacing,
				node_spacing: self.config.node_spacing,
			},
		}
	}

	/// Applies a layered-layout result, or the column fallback if it failed.
	pub fn complete(
		&mut self,
		store: &mut GraphStore,
		generation: u64,
		result: Result<LayoutResponse>,
	) -> LayoutOutcome {
		match self.in_flight {
			Some(f) if f.generation == generation => self.in_flight = None,
			_ => {
				debug!("layout: dropping stale result for generation {}", generation);
				return LayoutOutcome::Stale;
			}
		}

		let outcome = match result {
			Ok(response) => {
				if apply_layered(store, &response) {
					info!("layout: applied layered layout for {} nodes", response.nodes.len());
					LayoutOutcome::Layered
				} else {
					warn!("layout: layered layout returned no nodes, using column fallback");
					self.apply_fallback(store);
					LayoutOutcome::Fallback
				}
			}
			Err(e) => {
				warn!("layout: {}, using column fallback", e);
				self.apply_fallback(store);
				LayoutOutcome::Fallback
			}
		};
		resolve_overlaps(store, &self.config);
		outcome
	}

	/// Falls back if the in-flight request has passed its deadline.
	pub fn poll_timeout(&mut self, store: &mut GraphStore, now_ms: f64) -> Option<LayoutOutcome> {
		let f = self.in_flight?;
		if now_ms < f.deadline_ms {
			return None;
		}
		let waited = self.config.layered_timeout_ms;
		Some(self.complete(store, f.generation, Err(GraphError::LayoutTimedOut(waited))))
	}

	/// Runs the layered stage synchronously with `engine`.
	pub fn run<L: LayeredLayout + ?Sized>(&mut self, store: &mut GraphStore, engine: &L, now_ms: f64) -> LayoutOutcome {
		let request = self.request(store, now_ms);
		let result = engine.layout(&request);
		self.complete(store, request.generation, result)
	}

	/// Moves every node to its kind column.
	pub fn apply_fallback(&self, store: &mut GraphStore) {
		for (id, p) in column_layout(store, &self.config) {
			store.set_position(&id, p);
		}
	}

	/// Places freshly expanded children, then resolves overlaps.
	pub fn place_incremental(&self, store: &mut GraphStore, anchor: &str, children: &[String]) {
		place_children(store, anchor, children, &self.config);
		resolve_overlaps(store, &self.config);
	}
}

/// Converts top-left boxes to centers and recenters the result on the origin.
/// Nodes missing from the response keep their position.
fn apply_layered(store: &mut GraphStore, response: &LayoutResponse) -> bool {
	let placed: Vec<(&str, Point)> = response
		.nodes
		.iter()
		.filter(|n| store.contains_node(&n.id) && n.x.is_finite() && n.y.is_finite())
		.map(|n| (n.id.as_str(), Point::new(n.x + n.width / 2.0, n.y + n.height / 2.0)))
		.collect();
	if placed.is_empty() {
		return false;
	}

	let (min_x, max_x, min_y, max_y) = placed.iter().fold(
		(f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
		|(a, b, c, d), (_, p)| (a.min(p.x), b.max(p.x), c.min(p.y), d.max(p.y)),
	);
	let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
	for (id, p) in placed {
		store.set_position(id, Point::new(p.x - cx, p.y - cy));
	}
	true
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::store::NodeAttrs;
	use crate::components::graph_view::theme::Color;
	use proptest::prelude::*;

	fn add(store: &mut GraphStore, id: &str, kind: NodeKind) {
		store
			.add_node(id, NodeAttrs::new(id, kind, Color::rgb(1, 2, 3), 10.0))
			.unwrap();
	}

	fn assert_no_overlap(store: &GraphStore) {
		let nodes: Vec<_> = store.nodes().collect();
		for (i, (a, na)) in nodes.iter().enumerate() {
			for (b, nb) in &nodes[i + 1..] {
				let d = na.position.distance(nb.position);
				assert!(d >= na.size + nb.size, "{a} and {b} overlap at distance {d}");
			}
		}
	}

	struct Failing;

	impl LayeredLayout for Failing {
		fn layout(&self, _: &LayoutRequest) -> Result<LayoutResponse> {
			Err(GraphError::LayoutUnavailable("engine not loaded".into()))
		}
	}

	struct Fixed(Vec<PlacedNode>);

	impl LayeredLayout for Fixed {
		fn layout(&self, _: &LayoutRequest) -> Result<LayoutResponse> {
			Ok(LayoutResponse { nodes: self.0.clone() })
		}
	}

	#[test]
	fn circle_seed_is_index_ordered() {
		let mut store = GraphStore::new();
		let ids: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
		for id in &ids {
			add(&mut store, id, NodeKind::Other);
		}
		seed_circle(&mut store, &ids, 100.0);
		let a = store.position("a").unwrap();
		let b = store.position("b").unwrap();
		assert!((a.x - 100.0).abs() < 1e-9 && a.y.abs() < 1e-9);
		assert!(b.x.abs() < 1e-9 && (b.y - 100.0).abs() < 1e-9);
	}

	#[test]
	fn fallback_groups_kinds_into_sorted_columns() {
		let mut store = GraphStore::new();
		add(&mut store, "p2", NodeKind::Person);
		add(&mut store, "v1", NodeKind::Vehicle);
		add(&mut store, "p1", NodeKind::Person);
		let config = LayoutConfig::default();
		let pos = column_layout(&store, &config);

		assert_eq!(pos["p1"].x, pos["p2"].x);
		assert!(pos["p1"].y < pos["p2"].y);
		assert_eq!(pos["p1"].x, -config.column_spacing / 2.0);
		assert_eq!(pos["v1"], Point::new(config.column_spacing / 2.0, 0.0));
	}

	#[test]
	fn failed_layered_stage_falls_back_silently() {
		let mut store = GraphStore::new();
		add(&mut store, "a", NodeKind::Person);
		add(&mut store, "b", NodeKind::Event);
		let mut pipeline = LayoutPipeline::default();
		let outcome = pipeline.run(&mut store, &Failing, 0.0);
		assert_eq!(outcome, LayoutOutcome::Fallback);
		assert!(!pipeline.is_pending());
		assert_eq!(store.position("a").unwrap().y, 0.0);
		assert!(store.position("a").unwrap().x < store.position("b").unwrap().x);
	}

	#[test]
	fn empty_response_counts_as_failure() {
		let mut store = GraphStore::new();
		add(&mut store, "a", NodeKind::Person);
		let mut pipeline = LayoutPipeline::default();
		assert_eq!(pipeline.run(&mut store, &Fixed(vec![]), 0.0), LayoutOutcome::Fallback);
	}

	#[test]
	fn layered_result_is_centered_on_origin() {
		let mut store = GraphStore::new();
		add(&mut store, "a", NodeKind::Person);
		add(&mut store, "b", NodeKind::Person);
		let engine = Fixed(vec![
			PlacedNode { id: "a".into(), x: 0.0, y: 0.0, width: 40.0, height: 20.0 },
			PlacedNode { id: "b".into(), x: 0.0, y: 200.0, width: 40.0, height: 20.0 },
			PlacedNode { id: "ghost".into(), x: 9.0, y: 9.0, width: 1.0, height: 1.0 },
		]);
		let mut pipeline = LayoutPipeline::default();
		assert_eq!(pipeline.run(&mut store, &engine, 0.0), LayoutOutcome::Layered);
		assert_eq!(store.position("a"), Some(Point::new(0.0, -100.0)));
		assert_eq!(store.position("b"), Some(Point::new(0.0, 100.0)));
	}

	#[test]
	fn superseded_and_invalidated_results_are_stale() {
		let mut store = GraphStore::new();
		add(&mut store, "a", NodeKind::Person);
		let mut pipeline = LayoutPipeline::default();

		let first = pipeline.request(&store, 0.0);
		let second = pipeline.request(&store, 0.0);
		let ok = || Ok(LayoutResponse { nodes: vec![PlacedNode { id: "a".into(), x: 50.0, y: 50.0, width: 10.0, height: 10.0 }] });
		assert_eq!(pipeline.complete(&mut store, first.generation, ok()), LayoutOutcome::Stale);

		pipeline.invalidate();
		assert_eq!(pipeline.complete(&mut store, second.generation, ok()), LayoutOutcome::Stale);
		assert_eq!(store.position("a"), Some(Point::default()));
	}

	#[test]
	fn deadline_triggers_fallback() {
		let mut store = GraphStore::new();
		add(&mut store, "a", NodeKind::Person);
		let mut pipeline = LayoutPipeline::default();
		let request = pipeline.request(&store, 1000.0);
		assert_eq!(pipeline.poll_timeout(&mut store, 1500.0), None);
		let deadline = 1000.0 + pipeline.config.layered_timeout_ms;
		assert_eq!(pipeline.poll_timeout(&mut store, deadline), Some(LayoutOutcome::Fallback));
		// The late answer is ignored.
		assert_eq!(
			pipeline.complete(&mut store, request.generation, Ok(LayoutResponse::default())),
			LayoutOutcome::Stale
		);
	}

	#[test]
	fn overlap_resolution_separates_coincident_nodes() {
		let mut store = GraphStore::new();
		for i in 0..12 {
			add(&mut store, &format!("n{i}"), NodeKind::Other);
		}
		let passes = resolve_overlaps(&mut store, &LayoutConfig::default());
		assert!(passes < LayoutConfig::default().overlap_iterations);
		assert_no_overlap(&store);
	}

	#[test]
	fn golden_angle_children_do_not_overlap_after_resolution() {
		let mut store = GraphStore::new();
		add(&mut store, "anchor", NodeKind::Person);
		let children: Vec<String> = (0..8).map(|i| format!("c{i}")).collect();
		for c in &children {
			add(&mut store, c, NodeKind::Other);
		}
		let pipeline = LayoutPipeline::default();
		pipeline.place_incremental(&mut store, "anchor", &children);
		assert_no_overlap(&store);
	}

	#[test]
	fn fit_uses_uniform_scale_of_the_tighter_axis() {
		let mut store = GraphStore::new();
		add(&mut store, "l", NodeKind::Other);
		add(&mut store, "r", NodeKind::Other);
		store.set_position("l", Point::new(-390.0, 0.0));
		store.set_position("r", Point::new(390.0, 0.0));
		// Bounds: 800 x 20. Viewport 1000 x 500 with no margin -> k = 1000/800.
		let t = fit_target(&store, 1000.0, 500.0, 0.0).unwrap();
		assert!((t.k - 1.25).abs() < 1e-9);
		assert!((t.x - 500.0).abs() < 1e-9 && (t.y - 250.0).abs() < 1e-9);

		assert_eq!(fit_target(&GraphStore::new(), 10.0, 10.0, 0.1), Err(GraphError::EmptyGraph));
	}

	proptest! {
		#[test]
		fn prop_overlap_resolution_respects_budget(
			points in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0, 2.0f64..20.0), 0..25),
			budget in 0usize..30,
		) {
			let mut store = GraphStore::new();
			for (i, (x, y, r)) in points.iter().enumerate() {
				let id = format!("n{i}");
				store.add_node(id.clone(), NodeAttrs::new("n", NodeKind::Other, Color::rgb(0, 0, 0), *r)).unwrap();
				store.set_position(&id, Point::new(*x, *y));
			}
			let config = LayoutConfig { overlap_iterations: budget, ..LayoutConfig::default() };
			let passes = resolve_overlaps(&mut store, &config);
			prop_assert!(passes <= budget);
			for (_, n) in store.nodes() {
				prop_assert!(n.position.x.is_finite() && n.position.y.is_finite());
			}
		}
	}
}
