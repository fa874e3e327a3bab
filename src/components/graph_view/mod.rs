//! Incremental graph explorer.
//!
//! A mutable graph store with a layout pipeline, expandable neighborhoods,
//! hover highlighting and a relation editor, painted on an HTML canvas:
//! - seeded circle, layered auto-layout with a kind-column fallback, overlap
//!   resolution and an animated viewport fit
//! - expand/collapse that restores the positions captured at expansion time
//! - cluster highlight with a per-frame edge pulse on hover
//! - context menu for deleting and drafting relations
//!
//! # Example
//!
//! ```ignore
//! use graph_explorer::{GraphData, GraphViewCanvas};
//!
//! let data: GraphData = serde_json::from_str(json)?;
//! view! { <GraphViewCanvas data=Signal::stored(data) fullscreen=true /> }
//! ```

pub mod camera;
mod component;
pub mod error;
pub mod expansion;
pub mod highlight;
pub mod layered;
pub mod layout;
pub mod relation;
mod render;
pub mod scale;
pub mod state;
pub mod store;
pub mod theme;
pub mod types;

pub use component::GraphViewCanvas;
pub use error::GraphError;
pub use expansion::{DeleteMode, SubgraphSource, SyntheticSource};
pub use highlight::HoverMode;
pub use state::GraphView;
pub use theme::Theme;
pub use types::{EdgeRecord, GraphData, NodeKind, NodeRecord};
