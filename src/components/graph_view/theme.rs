//! Visual theming for the graph view.
//!
//! Provides colors, the per-kind node palette, and the sizes and colors used by
//! the hover highlight and its edge pulse.

use super::types::NodeKind;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	/// Opacity in `0.0..=1.0`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with explicit opacity.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color at opacity `a`.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * (1.0 - t) + other.r as f64 * t).round() as u8,
			g: (self.g as f64 * (1.0 - t) + other.g as f64 * t).round() as u8,
			b: (self.b as f64 * (1.0 - t) + other.b as f64 * t).round() as u8,
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	/// CSS notation: `#rrggbb` when opaque, `rgba(..)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parses a CSS color string.
	/// Supports hex (`#RRGGBB`) and `rgb()`/`rgba()` functional notation.
	pub fn parse(color_str: &str) -> Option<Color> {
		let color_str = color_str.trim();
		if color_str.starts_with('#') && color_str.len() == 7 {
			let r = u8::from_str_radix(&color_str[1..3], 16).ok()?;
			let g = u8::from_str_radix(&color_str[3..5], 16).ok()?;
			let b = u8::from_str_radix(&color_str[5..7], 16).ok()?;
			Some(Color::rgb(r, g, b))
		} else if color_str.starts_with("rgb") {
			let nums: Vec<&str> = color_str
				.trim_start_matches("rgba(")
				.trim_start_matches("rgb(")
				.trim_end_matches(')')
				.split(',')
				.collect();
			let r = nums.first()?.trim().parse().ok()?;
			let g = nums.get(1)?.trim().parse().ok()?;
			let b = nums.get(2)?.trim().parse().ok()?;
			let a = nums
				.get(3)
				.and_then(|s| s.trim().parse().ok())
				.unwrap_or(1.0);
			Some(Color::rgba(r, g, b, a))
		} else {
			None
		}
	}
}

/// Base colors per node kind.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct KindPalette {
	pub person: Color,
	pub address: Color,
	pub vehicle: Color,
	pub event: Color,
	pub organization: Color,
	pub other: Color,
}

impl KindPalette {
	/// Muted slate blues and teals, one hue family per kind.
	pub fn slate() -> Self {
		Self {
			person: Color::rgb(94, 129, 172),       // Steel blue
			address: Color::rgb(100, 148, 160),     // Teal gray
			vehicle: Color::rgb(180, 136, 100),     // Tan
			event: Color::rgb(130, 120, 150),       // Wisteria
			organization: Color::rgb(100, 145, 135), // Eucalyptus
			other: Color::rgb(143, 163, 180),       // Cool gray
		}
	}

	/// Color for `kind`.
	pub fn get(&self, kind: NodeKind) -> Color {
		match kind {
			NodeKind::Person => self.person,
			NodeKind::Address => self.address,
			NodeKind::Vehicle => self.vehicle,
			NodeKind::Event => self.event,
			NodeKind::Organization => self.organization,
			NodeKind::Other => self.other,
		}
	}
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Primary background color
	pub color: Color,
	/// Secondary color for gradients
	pub color_secondary: Color,
	/// Whether to use radial gradient
	pub use_gradient: bool,
}

/// Node sizes (footprint radius in graph units) and colors per highlight state.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Dataset default when a record has no size hint.
	pub base_size: f64,
	/// Hovered node in cluster mode.
	pub center_size: f64,
	/// Neighbors of the hovered node in cluster mode.
	pub neighbor_size: f64,
	/// Every other node while a cluster is highlighted.
	pub dimmed_size: f64,
	/// Color of dimmed nodes.
	pub dimmed_color: Color,
	/// Size multiplier for the simple hover toggle.
	pub toggle_scale: f64,
	/// Whether nodes have inner gradients
	pub use_gradient: bool,
	/// Label color
	pub label_color: Color,
}

/// Edge colors and widths per highlight state.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	/// Base edge color
	pub color: Color,
	/// Base edge width
	pub size: f64,
	/// Edges incident to the hovered node.
	pub emphasized_color: Color,
	/// Width of incident edges.
	pub emphasized_size: f64,
	/// Every other edge while a cluster is highlighted.
	pub dimmed_color: Color,
	/// Width of dimmed edges.
	pub dimmed_size: f64,
	/// Edges created from the relation editor.
	pub relation_color: Color,
}

/// Pulse animation applied to incident edges of the hovered node.
#[derive(Clone, Debug)]
pub struct PulseStyle {
	/// Ramp endpoints; the pulse oscillates between them.
	pub from: Color,
	#[allow(missing_docs)]
	pub to: Color,
	/// Full oscillation period in milliseconds.
	pub period_ms: f64,
}

impl PulseStyle {
	/// Ramp color at `elapsed_ms` after the pulse started.
	pub fn sample(&self, elapsed_ms: f64) -> Color {
		let phase = elapsed_ms / self.period_ms.max(1.0) * std::f64::consts::TAU;
		let t = (phase.sin() + 1.0) * 0.5;
		self.from.lerp(self.to, t)
	}
}

/// Context menu colors.
#[derive(Clone, Debug)]
pub struct MenuStyle {
	/// Panel fill.
	pub background: Color,
	/// Relation rows.
	pub text: Color,
	/// Action rows, border and draft hint.
	pub accent: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Theme identifier.
	pub name: &'static str,
	/// Canvas background.
	pub background: BackgroundStyle,
	/// Node sizes and colors.
	pub node: NodeStyle,
	/// Edge widths and colors.
	pub edge: EdgeStyle,
	/// Hover pulse ramp.
	pub pulse: PulseStyle,
	/// Context menu colors.
	pub menu: MenuStyle,
	/// Per-kind base colors.
	pub palette: KindPalette,
}

impl Theme {
	/// Clean modern theme with subtle effects (default)
	pub fn default_theme() -> Self {
		Self {
			name: "default",
			background: BackgroundStyle {
				color: Color::rgb(22, 27, 34),
				color_secondary: Color::rgb(30, 35, 42),
				use_gradient: true,
			},
			node: NodeStyle {
				base_size: 10.0,
				center_size: 18.0,
				neighbor_size: 13.0,
				dimmed_size: 6.0,
				dimmed_color: Color::rgb(58, 64, 74),
				toggle_scale: 1.4,
				use_gradient: true,
				label_color: Color::rgba(255, 255, 255, 0.85),
			},
			edge: EdgeStyle {
				color: Color::rgba(140, 160, 180, 0.5),
				size: 1.5,
				emphasized_color: Color::rgb(236, 196, 112),
				emphasized_size: 3.0,
				dimmed_color: Color::rgba(90, 100, 115, 0.2),
				dimmed_size: 0.75,
				relation_color: Color::rgba(170, 200, 150, 0.7),
			},
			pulse: PulseStyle {
				from: Color::rgb(236, 196, 112),
				to: Color::rgb(232, 110, 84),
				period_ms: 1200.0,
			},
			menu: MenuStyle {
				background: Color::rgba(30, 35, 42, 0.95),
				text: Color::rgb(220, 226, 232),
				accent: Color::rgb(236, 196, 112),
			},
			palette: KindPalette::slate(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::default_theme()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_round_trips_css_forms() {
		assert_eq!(Color::parse("#1976d2"), Some(Color::rgb(0x19, 0x76, 0xd2)));
		assert_eq!(
			Color::parse("rgba(10, 20, 30, 0.5)"),
			Some(Color::rgba(10, 20, 30, 0.5))
		);
		assert_eq!(Color::parse("teal"), None);
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
	}

	#[test]
	fn pulse_stays_on_ramp() {
		let pulse = Theme::default().pulse;
		assert_eq!(pulse.sample(0.0), pulse.from.lerp(pulse.to, 0.5));
		assert_eq!(pulse.sample(pulse.period_ms / 4.0), pulse.to);
		assert_eq!(pulse.sample(pulse.period_ms * 3.0 / 4.0), pulse.from);
	}
}
