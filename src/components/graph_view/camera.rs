//! Viewport camera: pan/zoom transform, animated transitions and the
//! interactive-panning switch used while a node is dragged.

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to `MIN_ZOOM..MAX_ZOOM`).
	pub k: f64,
}

impl ViewTransform {
	/// Smallest allowed zoom factor.
	pub const MIN_ZOOM: f64 = 0.05;
	/// Largest allowed zoom factor.
	pub const MAX_ZOOM: f64 = 10.0;

	fn lerp(self, other: ViewTransform, t: f64) -> Self {
		Self {
			x: self.x + (other.x - self.x) * t,
			y: self.y + (other.y - self.y) * t,
			k: self.k + (other.k - self.k) * t,
		}
	}
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
#[allow(missing_docs)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Copy, Debug)]
struct CameraAnimation {
	from: ViewTransform,
	to: ViewTransform,
	start_ms: f64,
	duration_ms: f64,
}

/// Ease-in-out curve used by camera transitions.
fn smooth_step(t: f64) -> f64 {
	t * t * (3.0 - 2.0 * t)
}

/// Viewport transform plus pan and animation state.
#[derive(Clone, Debug)]
pub struct Camera {
	/// Transform applied when painting.
	pub transform: ViewTransform,
	/// Background drag in progress.
	pub pan: PanState,
	panning_enabled: bool,
	animation: Option<CameraAnimation>,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			transform: ViewTransform::default(),
			pan: PanState::default(),
			panning_enabled: true,
			animation: None,
		}
	}
}

impl Camera {
	/// Camera centered on the graph origin.
	pub fn centered(width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			..Self::default()
		}
	}

	/// Maps a canvas point into graph space.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Maps a graph point onto the canvas.
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.transform.k + self.transform.x,
			gy * self.transform.k + self.transform.y,
		)
	}

	#[allow(missing_docs)]
	pub fn panning_enabled(&self) -> bool {
		self.panning_enabled
	}

	/// Enables or disables interactive panning; disabling ends any pan in progress.
	pub fn set_panning(&mut self, enabled: bool) {
		self.panning_enabled = enabled;
		if !enabled {
			self.pan.active = false;
		}
	}

	/// Starts an eased transition to `target`. A zero duration jumps immediately.
	pub fn animate_to(&mut self, target: ViewTransform, now_ms: f64, duration_ms: f64) {
		if duration_ms <= 0.0 {
			self.transform = target;
			self.animation = None;
			return;
		}
		self.animation = Some(CameraAnimation {
			from: self.transform,
			to: target,
			start_ms: now_ms,
			duration_ms,
		});
	}

	/// Abandons a running transition where it stands.
	pub fn stop(&mut self) {
		self.animation = None;
	}

	/// Advances the running transition. Returns `true` while still animating.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		let Some(anim) = self.animation else {
			return false;
		};
		let t = ((now_ms - anim.start_ms) / anim.duration_ms).clamp(0.0, 1.0);
		self.transform = anim.from.lerp(anim.to, smooth_step(t));
		if t >= 1.0 {
			self.transform = anim.to;
			self.animation = None;
		}
		self.animation.is_some()
	}

	/// Starts a background pan. Refused while panning is disabled.
	pub fn begin_pan(&mut self, x: f64, y: f64) -> bool {
		if !self.panning_enabled {
			return false;
		}
		self.animation = None;
		self.pan = PanState {
			active: true,
			start_x: x,
			start_y: y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
		true
	}

	/// Follows the pointer during a pan.
	pub fn pan_to(&mut self, x: f64, y: f64) {
		if self.pan.active && self.panning_enabled {
			self.transform.x = self.pan.transform_start_x + (x - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (y - self.pan.start_y);
		}
	}

	#[allow(missing_docs)]
	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Zooms by `factor` keeping the screen point `(x, y)` fixed.
	pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
		self.animation = None;
		let new_k = (self.transform.k * factor).clamp(ViewTransform::MIN_ZOOM, ViewTransform::MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}
}
