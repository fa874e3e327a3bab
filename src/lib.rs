//! graph-explorer: incremental node-link graph exploration in the browser.
//!
//! This crate provides a WASM canvas component for exploring a graph: drag and
//! hover nodes, expand them to reveal generated neighborhoods, collapse them
//! back, and create or delete relations from a context menu.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::graph_view::{
	DeleteMode, EdgeRecord, GraphData, GraphError, GraphView, GraphViewCanvas, HoverMode, NodeKind,
	NodeRecord, SubgraphSource, SyntheticSource, Theme,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("graph-explorer: logging initialized");
}

/// Load the dataset from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], edges: [...] }
fn load_graph_data() -> Option<GraphData> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("graph-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<GraphData>(&json_text) {
		Ok(data) => {
			info!(
				"graph-explorer: read {} nodes, {} edges",
				data.nodes.len(),
				data.edges.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("graph-explorer: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads the dataset from the DOM and renders the explorer.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let graph_signal = Signal::derive(move || graph_data.clone());
	let hover_mode = RwSignal::new(HoverMode::Cluster);
	let toggle_mode = move |_| {
		hover_mode.update(|mode| {
			*mode = match *mode {
				HoverMode::Cluster => HoverMode::Simple,
				HoverMode::Simple => HoverMode::Cluster,
			}
		})
	};
	let mode_label = move || match hover_mode.get() {
		HoverMode::Cluster => "Highlight: neighborhood",
		HoverMode::Simple => "Highlight: node only",
	};

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Graph Explorer" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<GraphViewCanvas data=graph_signal hover_mode=hover_mode fullscreen=true />
			<div class="graph-overlay">
				<h1>"Graph Explorer"</h1>
				<p class="subtitle">
					"Double-click to expand or collapse. Right-click a node for relations. Scroll to zoom. Drag background to pan."
				</p>
				<button on:click=toggle_mode>{mode_label}</button>
			</div>
		</div>
	}
}
