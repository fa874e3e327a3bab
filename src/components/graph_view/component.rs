//! Leptos component hosting the graph view on a canvas.
//!
//! The component owns a [`GraphView`] behind `Rc<RefCell<..>>`, forwards mouse
//! events to it, and drives a `requestAnimationFrame` loop that ticks the view,
//! runs any queued layered layout and repaints. Unmounting the component
//! cancels the pending frame, removes the resize listener and shuts the view down.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::expansion::SyntheticSource;
use super::highlight::HoverMode;
use super::layered::SimpleLayered;
use super::relation::PendingRelation;
use super::render;
use super::scale::ScaleConfig;
use super::state::{GraphView, MenuOutcome};
use super::theme::Theme;
use super::types::GraphData;

/// Graph view plus renderer configuration, shared by every event handler.
struct GraphContext {
	view: GraphView,
	scale: ScaleConfig,
	engine: SimpleLayered,
}

fn now_ms() -> f64 {
	js_sys::Date::now()
}

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn event_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Asks for a relation label with the browser prompt and submits it.
/// Must be called without holding a borrow of the context.
fn prompt_label(context: &Rc<RefCell<Option<GraphContext>>>, pending: &PendingRelation) {
	let answer = web_sys::window().and_then(|w| {
		w.prompt_with_message_and_default(&format!("Relation from {} to {}", pending.source, pending.target), "")
			.ok()
			.flatten()
	});
	let Some(ref mut c) = *context.borrow_mut() else {
		return;
	};
	match answer {
		Some(label) => match c.view.submit_relation_label(&label, now_ms()) {
			Ok(Some(id)) => debug!("relation: created {}", id),
			Ok(None) => c.view.cancel_relation(),
			Err(e) => warn!("relation: {}", e),
		},
		None => c.view.cancel_relation(),
	}
}

/// Renders an interactive, expandable graph on a canvas element.
///
/// Changing `data` replaces the whole graph. `hover_mode` switches between the
/// neighborhood highlight with edge pulse and a plain size toggle.
#[component]
pub fn GraphViewCanvas(
	#[prop(into)] data: Signal<GraphData>,
	#[prop(into, default = Signal::stored(HoverMode::Cluster))] hover_mode: Signal<HoverMode>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<GraphContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	// Handle of the next scheduled animation frame.
	let frame: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let (context_init, animate_init, resize_cb_init, frame_init) =
		(context.clone(), animate.clone(), resize_cb.clone(), frame.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("graph view: 2d canvas context unavailable");
			return;
		};

		let source = SyntheticSource::new(now_ms() as u64);
		let mut view = GraphView::new(Box::new(source), w, h, Theme::default());
		view.set_hover_mode(hover_mode.get_untracked());
		view.load_dataset(&data.get_untracked(), now_ms());
		*context_init.borrow_mut() = Some(GraphContext {
			view,
			scale: ScaleConfig::default(),
			engine: SimpleLayered,
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.view.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner, frame_inner) = (context_init.clone(), animate_init.clone(), frame_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				let now = now_ms();
				// Layered layouts are delivered one frame after they are queued.
				c.view.run_layout(&c.engine, now);
				c.view.tick(now);
				render::render(&c.view, &ctx, &c.scale);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				frame_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			frame_init.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	let teardown = StoredValue::new_local((context.clone(), animate.clone(), resize_cb.clone(), frame.clone()));
	on_cleanup(move || {
		let _ = teardown.try_with_value(|(context, animate, resize_cb, frame)| {
			let window = web_sys::window();
			if let (Some(id), Some(win)) = (frame.take(), window.as_ref()) {
				let _ = win.cancel_animation_frame(id);
			}
			if let (Some(cb), Some(win)) = (resize_cb.borrow_mut().take(), window.as_ref()) {
				let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			// Dropping the closure breaks its self-reference.
			animate.borrow_mut().take();
			if let Some(mut c) = context.borrow_mut().take() {
				c.view.shutdown();
			}
			debug!("graph view: frame loop stopped");
		});
	});

	let context_data = context.clone();
	Effect::new(move |loaded: Option<()>| {
		let data = data.get();
		if loaded.is_some() {
			if let Some(ref mut c) = *context_data.borrow_mut() {
				c.view.load_dataset(&data, now_ms());
			}
		}
	});

	let context_mode = context.clone();
	Effect::new(move |_| {
		let mode = hover_mode.get();
		if let Some(ref mut c) = *context_mode.borrow_mut() {
			c.view.set_hover_mode(mode);
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some((x, y)) = event_position(canvas_ref, &ev) else {
			return;
		};
		let mut prompt = None;
		if let Some(ref mut c) = *context_md.borrow_mut() {
			// (chosen action, press landed on the panel)
			let menu_hit = c.view.relations.menu().map(|menu| {
				let action = render::menu_item_at(menu, &c.scale.menu, x, y)
					.and_then(|i| menu.items.get(i))
					.map(|item| item.action.clone());
				(action, render::menu_contains(menu, &c.scale.menu, x, y))
			});
			match menu_hit {
				Some((Some(action), _)) => match c.view.menu_action(action, now_ms()) {
					Ok(MenuOutcome::PromptLabel(pending)) => prompt = Some(pending),
					Ok(MenuOutcome::Done) => {}
					Err(e) => warn!("menu: {}", e),
				},
				Some((None, true)) => {}
				Some((None, false)) | None => {
					c.view.relations.close_menu();
					let target = c.view.node_at_position(x, y, &c.scale);
					c.view.pointer_down(target.as_deref(), x, y);
				}
			}
		}
		if let Some(pending) = prompt {
			prompt_label(&context_md, &pending);
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = event_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			let target = c.view.node_at_position(x, y, &c.scale);
			c.view.pointer_move(target.as_deref(), x, y, now_ms());
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			c.view.pointer_up();
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.view.pointer_leave();
		}
	};

	let context_dc = context.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = event_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_dc.borrow_mut() {
			if let Some(node) = c.view.node_at_position(x, y, &c.scale) {
				if let Err(e) = c.view.toggle_expansion(&node, now_ms()) {
					warn!("expansion: {}", e);
				}
			}
		}
	};

	let context_cm = context.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = event_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_cm.borrow_mut() {
			let target = c.view.node_at_position(x, y, &c.scale);
			c.view.secondary_click(target.as_deref(), x, y);
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = event_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			c.view.camera.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-view-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:contextmenu=on_contextmenu
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
