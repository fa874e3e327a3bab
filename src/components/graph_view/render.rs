//! Canvas rendering for the graph view.
//!
//! Everything drawn comes straight from the store's node and edge attributes,
//! so highlight and pulse changes show up without any renderer state.
//! Passes, back to front:
//! 1. background (screen space)
//! 2. edges with arrowheads and labels (graph space)
//! 3. nodes, highlighted nodes last, then the hover ring
//! 4. context menu and draft hint (screen space)

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::relation::ContextMenu;
use super::scale::{MenuScaleConfig, ScaleConfig, ScaledValues};
use super::state::GraphView;
use super::store::{EdgeAttrs, GraphStore, NodeAttrs};
use super::theme::Theme;

/// Renders the complete view to the canvas.
pub fn render(view: &GraphView, ctx: &CanvasRenderingContext2d, config: &ScaleConfig) {
	let transform = view.camera.transform;
	let scale = ScaledValues::new(config, transform.k);

	draw_background(view, ctx, &view.theme);

	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	draw_edges(&view.store, ctx, &scale, &view.theme);
	draw_nodes(view, ctx, &scale, &view.theme);

	ctx.restore();

	if let Some(source) = view.relations.draft_source() {
		let label = view.store.node(source).map(|n| n.label.as_str()).unwrap_or(source);
		ctx.set_fill_style_str(&view.theme.menu.accent.to_css());
		ctx.set_font(&format!("{}px sans-serif", config.menu.font_size));
		let _ = ctx.fill_text(
			&format!("Relating from {label}: right-click a target"),
			12.0,
			view.height - 12.0,
		);
	}
	if let Some(menu) = view.relations.menu() {
		draw_menu(menu, ctx, &config.menu, &view.theme);
	}
}

fn draw_background(view: &GraphView, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let (w, h) = (view.width, view.height);
	let gradient = theme
		.background
		.use_gradient
		.then(|| ctx.create_radial_gradient(w / 2.0, h / 2.0, 0.0, w / 2.0, h / 2.0, w.max(h) * 0.8).ok())
		.flatten();

	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background.color_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.color.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&theme.background.color.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, w, h);
}

fn draw_edges(store: &GraphStore, ctx: &CanvasRenderingContext2d, scale: &ScaledValues, theme: &Theme) {
	for (_, edge) in store.edges() {
		let (Some(source), Some(target)) = (store.node(&edge.source), store.node(&edge.target)) else {
			continue;
		};
		draw_edge(ctx, scale, edge, source, target);
	}

	if scale.edge_label_alpha > 0.01 {
		ctx.set_font(&scale.edge_label_font);
		ctx.set_text_align("center");
		for (_, edge) in store.edges() {
			let (Some(a), Some(b)) = (store.position(&edge.source), store.position(&edge.target)) else {
				continue;
			};
			ctx.set_fill_style_str(
				&theme
					.node
					.label_color
					.with_alpha(theme.node.label_color.a * 0.7 * scale.edge_label_alpha)
					.to_css(),
			);
			let _ = ctx.fill_text(&edge.label, (a.x + b.x) / 2.0, (a.y + b.y) / 2.0 - 3.0 / scale.k);
		}
		ctx.set_text_align("start");
	}
}

fn draw_edge(
	ctx: &CanvasRenderingContext2d,
	scale: &ScaledValues,
	edge: &EdgeAttrs,
	source: &NodeAttrs,
	target: &NodeAttrs,
) {
	let (a, b) = (source.position, target.position);
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let r_start = scale.node_radius(source.size);
	let r_end = scale.node_radius(target.size);
	let arrow = if scale.cull_arrows { 0.0 } else { scale.arrow_size };

	ctx.set_stroke_style_str(&edge.color.to_css());
	ctx.set_line_width(scale.edge_width(edge.size));
	ctx.begin_path();
	ctx.move_to(a.x + ux * r_start, a.y + uy * r_start);
	ctx.line_to(b.x - ux * (r_end + arrow), b.y - uy * (r_end + arrow));
	ctx.stroke();

	if arrow > 0.0 {
		ctx.set_fill_style_str(&edge.color.with_alpha(edge.color.a * scale.arrow_alpha).to_css());
		let (tip_x, tip_y) = (b.x - ux * r_end, b.y - uy * r_end);
		let (back_x, back_y) = (tip_x - ux * arrow, tip_y - uy * arrow);
		let (px, py) = (-uy * arrow * 0.5, ux * arrow * 0.5);

		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_nodes(view: &GraphView, ctx: &CanvasRenderingContext2d, scale: &ScaledValues, theme: &Theme) {
	let store = &view.store;
	for (_, node) in store.nodes().filter(|(_, n)| !n.highlighted) {
		draw_node(ctx, scale, theme, node);
	}
	for (_, node) in store.nodes().filter(|(_, n)| n.highlighted) {
		draw_node(ctx, scale, theme, node);
	}

	if let Some(node) = view.highlight.hovered().and_then(|id| store.node(id)) {
		let p = node.position;
		let radius = scale.node_radius(node.size) + scale.ring_offset;
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
		ctx.set_line_width(scale.ring_width);
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
		ctx.stroke();
	}
}

fn draw_node(ctx: &CanvasRenderingContext2d, scale: &ScaledValues, theme: &Theme, node: &NodeAttrs) {
	let p = node.position;
	let radius = scale.node_radius(node.size);

	let gradient = theme
		.node
		.use_gradient
		.then(|| ctx.create_radial_gradient(p.x - radius * 0.3, p.y - radius * 0.3, 0.0, p.x, p.y, radius).ok())
		.flatten();
	match gradient {
		Some(gradient) => {
			let _ = gradient.add_color_stop(0.0, &node.color.lighten(0.4).to_css());
			let _ = gradient.add_color_stop(0.7, &node.color.to_css());
			let _ = gradient.add_color_stop(1.0, &node.color.darken(0.2).to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		None => ctx.set_fill_style_str(&node.color.to_css()),
	}
	ctx.begin_path();
	let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
	ctx.fill();

	let alpha = if node.highlighted { 1.0 } else { scale.label_alpha };
	if alpha > 0.01 {
		let color = theme.node.label_color;
		ctx.set_fill_style_str(&color.with_alpha(color.a * alpha).to_css());
		ctx.set_font(&scale.label_font);
		let _ = ctx.fill_text(&node.label, p.x + radius + 4.0 / scale.k, p.y + 3.0 / scale.k);
	}
}

/// Height of the menu including padding.
fn menu_height(menu: &ContextMenu, config: &MenuScaleConfig) -> f64 {
	menu.items.len() as f64 * config.row_height + 2.0 * config.padding
}

/// Index of the menu row under the screen point `(x, y)`.
pub fn menu_item_at(menu: &ContextMenu, config: &MenuScaleConfig, x: f64, y: f64) -> Option<usize> {
	let inside_x = x >= menu.x && x <= menu.x + config.width;
	let inside_y = y >= menu.y + config.padding && y < menu.y + menu_height(menu, config) - config.padding;
	if !inside_x || !inside_y {
		return None;
	}
	let row = ((y - menu.y - config.padding) / config.row_height).floor() as usize;
	(row < menu.items.len()).then_some(row)
}

/// Whether the screen point lies anywhere on the menu panel.
pub fn menu_contains(menu: &ContextMenu, config: &MenuScaleConfig, x: f64, y: f64) -> bool {
	x >= menu.x && x <= menu.x + config.width && y >= menu.y && y <= menu.y + menu_height(menu, config)
}

fn draw_menu(menu: &ContextMenu, ctx: &CanvasRenderingContext2d, config: &MenuScaleConfig, theme: &Theme) {
	ctx.set_fill_style_str(&theme.menu.background.to_css());
	ctx.fill_rect(menu.x, menu.y, config.width, menu_height(menu, config));
	ctx.set_stroke_style_str(&theme.menu.accent.with_alpha(0.6).to_css());
	ctx.set_line_width(1.0);
	ctx.stroke_rect(menu.x, menu.y, config.width, menu_height(menu, config));

	ctx.set_font(&format!("{}px sans-serif", config.font_size));
	let relations = menu.relation_count();
	for (i, item) in menu.items.iter().enumerate() {
		let top = menu.y + config.padding + i as f64 * config.row_height;
		if i == relations && relations > 0 {
			ctx.set_stroke_style_str(&theme.menu.text.with_alpha(0.2).to_css());
			ctx.begin_path();
			ctx.move_to(menu.x + config.padding, top);
			ctx.line_to(menu.x + config.width - config.padding, top);
			ctx.stroke();
		}
		let color = if i < relations { theme.menu.text } else { theme.menu.accent };
		ctx.set_fill_style_str(&color.to_css());
		let _ = ctx.fill_text(
			&item.text,
			menu.x + config.padding * 2.0,
			top + config.row_height * 0.5 + config.font_size * 0.35,
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::graph_view::relation::{MenuAction, MenuItem};

	fn menu(rows: usize) -> ContextMenu {
		ContextMenu {
			anchor: "a".into(),
			x: 100.0,
			y: 50.0,
			items: (0..rows)
				.map(|i| MenuItem {
					text: format!("row {i}"),
					action: MenuAction::StartRelation,
				})
				.collect(),
		}
	}

	#[test]
	fn menu_rows_are_hit_tested_in_screen_space() {
		let config = ScaleConfig::default().menu;
		let m = menu(3);
		let row_y = |i: f64| m.y + config.padding + (i + 0.5) * config.row_height;
		assert_eq!(menu_item_at(&m, &config, 120.0, row_y(0.0)), Some(0));
		assert_eq!(menu_item_at(&m, &config, 120.0, row_y(2.0)), Some(2));
		assert_eq!(menu_item_at(&m, &config, 120.0, row_y(3.0)), None);
		assert_eq!(menu_item_at(&m, &config, 99.0, row_y(1.0)), None);
		assert!(menu_contains(&m, &config, 120.0, m.y + 1.0));
		assert!(!menu_contains(&m, &config, 120.0, m.y - 1.0));
	}
}
