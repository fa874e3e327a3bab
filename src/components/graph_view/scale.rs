//! Zoom-dependent sizes for the canvas renderer.
//!
//! Node sizes live in graph units and scale with the camera, but a node never
//! shrinks below a readable on-screen radius. Line widths, the hover ring and
//! the context menu stay constant in screen pixels.

/// How a graph-space length reacts to the zoom factor `k`.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant on screen: divided by `k` before drawing under the camera transform.
	Screen,
	/// Scales with zoom, but its on-screen size stays within `min_screen..max_screen`.
	#[allow(missing_docs)]
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// Graph-space length to draw for `base` at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// Opacity as a function of zoom.
#[derive(Clone, Debug)]
pub enum AlphaBehavior {
	/// `k` itself, clamped to `[0, 1]`.
	ScaleWithZoom,
	/// Invisible at `zero_alpha_k`, opaque at `full_alpha_k`.
	#[allow(missing_docs)]
	Fade { zero_alpha_k: f64, full_alpha_k: f64 },
}

impl AlphaBehavior {
	/// Opacity at zoom `k`.
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::ScaleWithZoom => k.clamp(0.0, 1.0),
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return 1.0;
				}
				((k - zero_alpha_k) / (full_alpha_k - zero_alpha_k)).clamp(0.0, 1.0)
			}
		}
	}
}

/// Node radius, hit area and label settings.
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	/// How the footprint radius reacts to zoom.
	pub radius_behavior: ScaleBehavior,
	/// Hit testing never goes below this on-screen radius.
	pub min_hit_screen: f64,
	/// Label font size in screen pixels.
	pub label_size: f64,
	/// Below this zoom labels stop growing in graph space.
	pub label_min_k: f64,
	/// Label fade with zoom.
	pub label_alpha: AlphaBehavior,
}

/// Edge line and label settings.
#[derive(Clone, Debug)]
pub struct EdgeScaleConfig {
	/// How the line width reacts to zoom.
	pub width_behavior: ScaleBehavior,
	/// Edge label font size in screen pixels.
	pub label_size: f64,
	/// Edge label fade with zoom.
	pub label_alpha: AlphaBehavior,
}

/// Arrowhead settings.
#[derive(Clone, Debug)]
pub struct ArrowScaleConfig {
	/// Base arrowhead length.
	pub size: f64,
	/// How the length reacts to zoom.
	pub size_behavior: ScaleBehavior,
	/// Arrowhead fade with zoom.
	pub alpha_behavior: AlphaBehavior,
	/// Arrows fainter than this are skipped.
	pub cull_alpha: f64,
}

/// Context menu geometry, in screen pixels.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct MenuScaleConfig {
	pub width: f64,
	pub row_height: f64,
	pub padding: f64,
	pub font_size: f64,
}

/// Complete zoom-aware scaling configuration.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Node settings
	pub node: NodeScaleConfig,
	/// Edge settings
	pub edge: EdgeScaleConfig,
	/// Arrowhead settings
	pub arrow: ArrowScaleConfig,
	/// Hover ring width in screen pixels.
	pub ring_width: f64,
	/// Gap between the node edge and the hover ring, in screen pixels.
	pub ring_offset: f64,
	/// Context menu geometry
	pub menu: MenuScaleConfig,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				radius_behavior: ScaleBehavior::Clamped {
					min_screen: 3.0,
					max_screen: f64::INFINITY,
				},
				min_hit_screen: 6.0,
				label_size: 11.0,
				label_min_k: 0.5,
				label_alpha: AlphaBehavior::Fade {
					zero_alpha_k: 0.3,
					full_alpha_k: 0.6,
				},
			},
			edge: EdgeScaleConfig {
				width_behavior: ScaleBehavior::Screen,
				label_size: 9.0,
				label_alpha: AlphaBehavior::Fade {
					zero_alpha_k: 0.7,
					full_alpha_k: 1.1,
				},
			},
			arrow: ArrowScaleConfig {
				size: 6.0,
				size_behavior: ScaleBehavior::Clamped {
					min_screen: 0.0,
					max_screen: 18.0,
				},
				alpha_behavior: AlphaBehavior::ScaleWithZoom,
				cull_alpha: 0.05,
			},
			ring_width: 1.5,
			ring_offset: 3.0,
			menu: MenuScaleConfig {
				width: 260.0,
				row_height: 24.0,
				padding: 6.0,
				font_size: 12.0,
			},
		}
	}
}

/// Scale values for one frame at zoom `k`. Lengths are in graph space.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct ScaledValues {
	pub k: f64,
	radius_behavior: ScaleBehavior,
	width_behavior: ScaleBehavior,
	pub min_hit_radius: f64,
	pub label_font: String,
	pub label_alpha: f64,
	pub edge_label_font: String,
	pub edge_label_alpha: f64,
	pub arrow_size: f64,
	pub arrow_alpha: f64,
	pub cull_arrows: bool,
	pub ring_width: f64,
	pub ring_offset: f64,
}

impl ScaledValues {
	/// Resolves `config` at zoom `k`.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let arrow_alpha = config.arrow.alpha_behavior.apply(k);
		Self {
			k,
			radius_behavior: config.node.radius_behavior.clone(),
			width_behavior: config.edge.width_behavior.clone(),
			min_hit_radius: config.node.min_hit_screen / k,
			label_font: format!("{}px sans-serif", config.node.label_size / k.max(config.node.label_min_k)),
			label_alpha: config.node.label_alpha.apply(k),
			edge_label_font: format!("{}px sans-serif", config.edge.label_size / k),
			edge_label_alpha: config.edge.label_alpha.apply(k),
			arrow_size: config.arrow.size_behavior.apply(config.arrow.size, k),
			arrow_alpha,
			cull_arrows: arrow_alpha < config.arrow.cull_alpha,
			ring_width: config.ring_width / k,
			ring_offset: config.ring_offset / k,
		}
	}

	/// Drawn radius of a node whose footprint is `size` graph units.
	pub fn node_radius(&self, size: f64) -> f64 {
		self.radius_behavior.apply(size, self.k)
	}

	/// Pointer hit radius, never smaller than the configured screen minimum.
	pub fn hit_radius(&self, size: f64) -> f64 {
		self.node_radius(size).max(self.min_hit_radius)
	}

	/// Line width for an edge whose width is `size` screen pixels.
	pub fn edge_width(&self, size: f64) -> f64 {
		self.width_behavior.apply(size, self.k)
	}
}
