//! Built-in layered layout used when no other engine is plugged in.
//!
//! Phases: greedy cycle breaking (source/sink peeling), longest-path layering,
//! one barycenter ordering sweep, then simple left-to-right placement with
//! each layer centered. Only top-down direction is produced.

use std::collections::{HashMap, HashSet};

use super::error::{GraphError, Result};
use super::layout::{LayeredLayout, LayoutRequest, LayoutResponse, PlacedNode};

/// Stateless layered engine run inside the frame loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleLayered;

impl LayeredLayout for SimpleLayered {
	fn layout(&self, request: &LayoutRequest) -> Result<LayoutResponse> {
		let n = request.nodes.len();
		if n == 0 {
			return Err(GraphError::LayoutUnavailable("no nodes to lay out".into()));
		}

		let index: HashMap<&str, usize> = request
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| (node.id.as_str(), i))
			.collect();
		let mut seen = HashSet::new();
		let mut adj = vec![Vec::new(); n];
		let mut radj = vec![Vec::new(); n];
		for (s, t) in &request.edges {
			let (Some(&u), Some(&v)) = (index.get(s.as_str()), index.get(t.as_str())) else {
				continue;
			};
			if u != v && seen.insert((u, v)) {
				adj[u].push(v);
				radj[v].push(u);
			}
		}

		let order = greedy_order(&adj, &radj);
		let mut rank = vec![0usize; n];
		for (i, &v) in order.iter().enumerate() {
			rank[v] = i;
		}

		// Orient every edge forward in `order`, which makes the graph acyclic.
		let mut preds = vec![Vec::new(); n];
		for (u, targets) in adj.iter().enumerate() {
			for &v in targets {
				let (a, b) = if rank[u] < rank[v] { (u, v) } else { (v, u) };
				preds[b].push(a);
			}
		}

		let mut layer = vec![0usize; n];
		for &v in &order {
			layer[v] = preds[v].iter().map(|&p| layer[p] + 1).max().unwrap_or(0);
		}

		let depth = layer.iter().copied().max().unwrap_or(0) + 1;
		let mut layers: Vec<Vec<usize>> = vec![Vec::new(); depth];
		for v in 0..n {
			layers[layer[v]].push(v);
		}
		order_by_barycenter(&mut layers, &preds);

		let opts = &request.options;
		let mut placed = Vec::with_capacity(n);
		let mut y = 0.0;
		for row in &layers {
			let total: f64 = row.iter().map(|&v| request.nodes[v].width).sum::<f64>()
				+ opts.node_spacing * row.len().saturating_sub(1) as f64;
			let mut x = -total / 2.0;
			let mut row_height: f64 = 0.0;
			for &v in row {
				let node = &request.nodes[v];
				placed.push(PlacedNode {
					id: node.id.clone(),
					x,
					y,
					width: node.width,
					height: node.height,
				});
				x += node.width + opts.node_spacing;
				row_height = row_height.max(node.height);
			}
			y += row_height + opts.layer_spacing;
		}

		Ok(LayoutResponse { nodes: placed })
	}
}

/// Total order from greedy source/sink peeling; edges pointing backwards in
/// this order are the ones reversed to break cycles.
fn greedy_order(adj: &[Vec<usize>], radj: &[Vec<usize>]) -> Vec<usize> {
	let n = adj.len();
	let mut out_deg: Vec<usize> = adj.iter().map(Vec::len).collect();
	let mut in_deg: Vec<usize> = radj.iter().map(Vec::len).collect();
	let mut removed = vec![false; n];
	let (mut left, mut right) = (Vec::with_capacity(n), Vec::new());

	let take = |v: usize, removed: &mut [bool], out_deg: &mut [usize], in_deg: &mut [usize]| {
		removed[v] = true;
		for &w in &adj[v] {
			in_deg[w] = in_deg[w].saturating_sub(1);
		}
		for &u in &radj[v] {
			out_deg[u] = out_deg[u].saturating_sub(1);
		}
	};

	let mut remaining = n;
	while remaining > 0 {
		let mut progress = false;
		for v in 0..n {
			if !removed[v] && out_deg[v] == 0 {
				take(v, &mut removed, &mut out_deg, &mut in_deg);
				right.push(v);
				remaining -= 1;
				progress = true;
			}
		}
		for v in 0..n {
			if !removed[v] && in_deg[v] == 0 {
				take(v, &mut removed, &mut out_deg, &mut in_deg);
				left.push(v);
				remaining -= 1;
				progress = true;
			}
		}
		if !progress {
			// Only cycles remain: peel the node with the largest out/in surplus.
			let best = (0..n).filter(|&v| !removed[v]).max_by(|&a, &b| {
				let da = out_deg[a] as isize - in_deg[a] as isize;
				let db = out_deg[b] as isize - in_deg[b] as isize;
				da.cmp(&db).then_with(|| b.cmp(&a))
			});
			if let Some(v) = best {
				take(v, &mut removed, &mut out_deg, &mut in_deg);
				left.push(v);
				remaining -= 1;
			}
		}
	}

	right.reverse();
	left.extend(right);
	left
}

/// Single downward sweep ordering each layer by the mean position of its
/// predecessors. Nodes without predecessors keep their relative order.
fn order_by_barycenter(layers: &mut [Vec<usize>], preds: &[Vec<usize>]) {
	for i in 1..layers.len() {
		let position: HashMap<usize, usize> = layers[i - 1]
			.iter()
			.enumerate()
			.map(|(p, &v)| (v, p))
			.collect();
		let keys: HashMap<usize, f64> = layers[i]
			.iter()
			.enumerate()
			.map(|(slot, &v)| {
				let ps: Vec<f64> = preds[v]
					.iter()
					.filter_map(|p| position.get(p))
					.map(|&p| p as f64)
					.collect();
				let key = if ps.is_empty() {
					slot as f64
				} else {
					ps.iter().sum::<f64>() / ps.len() as f64
				};
				(v, key)
			})
			.collect();
		layers[i].sort_by(|a, b| keys[a].total_cmp(&keys[b]).then(a.cmp(b)));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::layout::{
		CycleBreaking, LayeredOptions, LayoutDirection, LayoutNode, PlacementStrategy,
	};

	fn request(ids: &[&str], edges: &[(&str, &str)]) -> LayoutRequest {
		LayoutRequest {
			generation: 1,
			nodes: ids
				.iter()
				.map(|id| LayoutNode { id: id.to_string(), width: 40.0, height: 20.0 })
				.collect(),
			edges: edges
				.iter()
				.map(|(s, t)| (s.to_string(), t.to_string()))
				.collect(),
			options: LayeredOptions {
				direction: LayoutDirection::TopDown,
				placement: PlacementStrategy::Simple,
				cycle_breaking: CycleBreaking::Greedy,
				layer_spacing: 50.0,
				node_spacing: 10.0,
			},
		}
	}

	fn y_of(response: &LayoutResponse, id: &str) -> f64 {
		response.nodes.iter().find(|n| n.id == id).map(|n| n.y).unwrap()
	}

	#[test]
	fn chain_is_layered_top_down() {
		let response = SimpleLayered
			.layout(&request(&["a", "b", "c"], &[("a", "b"), ("b", "c")]))
			.unwrap();
		assert_eq!(y_of(&response, "a"), 0.0);
		assert_eq!(y_of(&response, "b"), 70.0);
		assert_eq!(y_of(&response, "c"), 140.0);
	}

	#[test]
	fn cycles_are_broken_not_rejected() {
		let response = SimpleLayered
			.layout(&request(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]))
			.unwrap();
		assert_eq!(response.nodes.len(), 3);
		let mut ys: Vec<f64> = response.nodes.iter().map(|n| n.y).collect();
		ys.sort_by(f64::total_cmp);
		ys.dedup();
		assert_eq!(ys.len(), 3);
	}

	#[test]
	fn siblings_share_a_centered_layer() {
		let response = SimpleLayered
			.layout(&request(&["root", "x", "y"], &[("root", "x"), ("root", "y")]))
			.unwrap();
		let x = response.nodes.iter().find(|n| n.id == "x").unwrap();
		let y = response.nodes.iter().find(|n| n.id == "y").unwrap();
		assert_eq!(x.y, y.y);
		assert_eq!(x.x, -45.0);
		assert_eq!(y.x, 5.0);
	}

	#[test]
	fn empty_request_is_unavailable() {
		assert!(matches!(
			SimpleLayered.layout(&request(&[], &[])),
			Err(GraphError::LayoutUnavailable(_))
		));
	}
}
