//! Browser glue: canvas setup, card wiring, timers and the frame loop.
//!
//! Everything here is thin plumbing around [`Scene`]. The scene and its canvas
//! live in a thread-local slot; every callback (card click, spawn interval,
//! animation frame, resize, visibility) borrows it for the duration of the call.
//! The frame loop re-arms itself only while [`Scene::is_active`] holds and is
//! restarted on resume.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, Window, window};

use crate::error::SetupError;
use crate::scene::config::SceneConfig;
use crate::scene::gate::Dismissal;
use crate::scene::random::FastRng;
use crate::scene::{FrameThrottle, Scene, Viewport};

pub const CANVAS_ID: &str = "fireworks";
pub const CARD_SELECTOR: &str = ".card, .card1, .card2, .card3, .card4, .card5";
const DISMISS_CLASS: &str = "roll-out-left";
const HIDE_DELAY_MS: i32 = 1000;

struct App {
    scene: Scene,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    throttle: FrameThrottle,
    spawn_timer: Option<i32>,
    looping: bool,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    static FRAME: RefCell<Option<Closure<dyn FnMut(f64)>>> = const { RefCell::new(None) };
}

fn with_app<T>(f: impl FnOnce(&mut App) -> T) -> Option<T> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

// --- Setup ---------------------------------------------------------------------

/// Create the canvas, discover the cards and wire every listener. Calling it a
/// second time is a no-op.
pub fn launch(config: SceneConfig) -> Result<(), SetupError> {
    let win = window().ok_or(SetupError::NoWindow)?;
    let doc = win.document().ok_or(SetupError::NoDocument)?;
    if APP.with(|cell| cell.borrow().is_some()) {
        log::warn!("scene already launched");
        return Ok(());
    }

    let config = config.validate();
    let canvas = acquire_canvas(&doc)?;
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or(SetupError::NoContext)?
        .dyn_into()
        .map_err(|_| SetupError::NoContext)?;
    let viewport = fit_canvas(&win, &canvas, &ctx, config.max_dpr)?;

    let cards = doc.query_selector_all(CARD_SELECTOR)?;
    let card_count = cards.length() as usize;
    log::info!(
        "{card_count} cards, viewport {}x{}",
        viewport.width,
        viewport.height
    );

    let throttle = FrameThrottle::new(config.target_fps);
    let scene = Scene::new(config, viewport, FastRng::from_entropy(), card_count);
    let app = App {
        scene,
        canvas,
        ctx,
        throttle,
        spawn_timer: None,
        looping: false,
    };
    APP.with(|cell| cell.replace(Some(app)));

    for i in 0..cards.length() {
        let Some(node) = cards.item(i) else { continue };
        match node.dyn_into::<HtmlElement>() {
            Ok(card) => wire_card(card, i as usize)?,
            Err(_) => log::warn!("card {i} is not an HtmlElement"),
        }
    }
    wire_resize(&win)?;
    wire_visibility(&doc)?;

    if card_count == 0 {
        // Nothing to dismiss: go straight to the finale.
        begin_finale();
    }
    Ok(())
}

fn acquire_canvas(doc: &Document) -> Result<HtmlCanvasElement, SetupError> {
    if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        return el
            .dyn_into()
            .map_err(|_| SetupError::Js(format!("#{CANVAS_ID} is not a canvas")));
    }
    let canvas: HtmlCanvasElement = doc
        .create_element("canvas")?
        .dyn_into()
        .map_err(|_| SetupError::Js("created element is not a canvas".into()))?;
    canvas.set_id(CANVAS_ID);
    canvas
        .set_attribute("style", "position:fixed; left:0; top:0; pointer-events:none; z-index:0;")
        .ok();
    doc.body().ok_or(SetupError::NoBody)?.append_child(&canvas)?;
    Ok(canvas)
}

/// Size the backing store to the viewport at a capped device pixel ratio and
/// scale the context so the scene draws in CSS pixels.
fn fit_canvas(
    win: &Window,
    canvas: &HtmlCanvasElement,
    ctx: &CanvasRenderingContext2d,
    max_dpr: f64,
) -> Result<Viewport, SetupError> {
    let width = win.inner_width()?.as_f64().unwrap_or(800.0);
    let height = win.inner_height()?.as_f64().unwrap_or(600.0);
    let dpr = win.device_pixel_ratio().clamp(1.0, max_dpr.max(1.0));
    canvas.set_width((width * dpr) as u32);
    canvas.set_height((height * dpr) as u32);
    let style = canvas.style();
    style.set_property("width", &format!("{width}px"))?;
    style.set_property("height", &format!("{height}px"))?;
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.scale(dpr, dpr)?;
    Ok(Viewport::new(width, height))
}

// --- Listeners -----------------------------------------------------------------

fn wire_card(card: HtmlElement, index: usize) -> Result<(), SetupError> {
    for event in ["click", "touchend"] {
        let target = card.clone();
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            on_card_dismissed(&target, index);
        }) as Box<dyn FnMut(_)>);
        card.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn on_card_dismissed(card: &HtmlElement, index: usize) {
    let outcome = with_app(|app| app.scene.dismiss(index, now_ms()));
    match outcome {
        None | Some(Dismissal::Ignored) => return,
        Some(_) => {}
    }
    card.class_list().add_1(DISMISS_CLASS).ok();
    hide_later(card.clone());
    if outcome == Some(Dismissal::Completed) {
        begin_finale();
    }
}

fn hide_later(card: HtmlElement) {
    let Some(win) = window() else { return };
    let hide = Closure::once_into_js(move || {
        card.style().set_property("display", "none").ok();
    });
    let scheduled = win
        .set_timeout_with_callback_and_timeout_and_arguments_0(hide.unchecked_ref(), HIDE_DELAY_MS);
    if let Err(e) = scheduled {
        log::warn!("could not schedule card hide: {e:?}");
    }
}

fn wire_resize(win: &Window) -> Result<(), SetupError> {
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
        let Some(win) = window() else { return };
        with_app(|app| {
            let max_dpr = app.scene.config().max_dpr;
            match fit_canvas(&win, &app.canvas, &app.ctx, max_dpr) {
                Ok(viewport) => app.scene.resize(viewport),
                Err(e) => log::warn!("resize failed: {e}"),
            }
        });
    }) as Box<dyn FnMut(_)>);
    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn wire_visibility(doc: &Document) -> Result<(), SetupError> {
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
        let hidden = window()
            .and_then(|w| w.document())
            .map(|d| d.hidden())
            .unwrap_or(false);
        on_visibility_change(hidden);
    }) as Box<dyn FnMut(_)>);
    doc.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Hidden pauses spawning so the loop can lapse; visible again resumes and
/// re-arms the loop if it lapsed meanwhile.
fn on_visibility_change(hidden: bool) {
    if hidden {
        with_app(|app| app.scene.pause());
    } else if with_app(|app| app.scene.resume()).unwrap_or(false) {
        ensure_frame_loop();
    }
}

// --- Finale --------------------------------------------------------------------

/// Start the scene (if the gate has not already), the spawn timer and the
/// frame loop. Safe to call repeatedly.
fn begin_finale() {
    let Some(win) = window() else { return };
    let interval = with_app(|app| {
        app.scene.start(now_ms());
        match app.spawn_timer {
            Some(_) => None,
            None => Some(app.scene.config().spawn_interval_ms),
        }
    })
    .flatten();

    if let Some(interval_ms) = interval {
        let interval_ms = i32::try_from(interval_ms).unwrap_or(i32::MAX);
        let tick = Closure::wrap(Box::new(move || {
            with_app(|app| app.scene.spawn_tick());
        }) as Box<dyn FnMut()>);
        match win.set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            interval_ms,
        ) {
            Ok(id) => {
                with_app(|app| app.spawn_timer = Some(id));
                tick.forget();
            }
            Err(e) => log::error!("spawn timer failed: {e:?}"),
        }
    }
    ensure_frame_loop();
}

fn ensure_frame_loop() {
    let arm = with_app(|app| {
        if app.looping {
            return false;
        }
        app.looping = true;
        app.throttle.reset();
        true
    })
    .unwrap_or(false);
    if arm {
        request_frame();
    }
}

fn request_frame() {
    FRAME.with(|slot| {
        let mut slot = slot.borrow_mut();
        let callback = slot
            .get_or_insert_with(|| Closure::wrap(Box::new(on_frame) as Box<dyn FnMut(f64)>));
        if let Some(w) = window() {
            if let Err(e) = w.request_animation_frame(callback.as_ref().unchecked_ref()) {
                log::error!("requestAnimationFrame failed: {e:?}");
            }
        }
    });
}

fn on_frame(ts: f64) {
    let again = with_app(|app| {
        if app.throttle.ready(ts) {
            app.scene.step(&mut app.ctx, ts);
        }
        let again = app.scene.is_active();
        if !again {
            app.looping = false;
            log::debug!("frame loop lapsed after {} frames", app.scene.frames());
        }
        again
    })
    .unwrap_or(false);
    if again {
        request_frame();
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn add_card(doc: &Document) -> HtmlElement {
        let card: HtmlElement = doc.create_element("div").unwrap().dyn_into().unwrap();
        card.set_class_name("card");
        doc.body().unwrap().append_child(&card).unwrap();
        card
    }

    #[wasm_bindgen_test]
    fn fit_canvas_caps_device_pixel_ratio() {
        let win = window().unwrap();
        let doc = win.document().unwrap();
        let canvas: HtmlCanvasElement = doc.create_element("canvas").unwrap().dyn_into().unwrap();
        let ctx: CanvasRenderingContext2d =
            canvas.get_context("2d").unwrap().unwrap().dyn_into().unwrap();
        let width = win.inner_width().unwrap().as_f64().unwrap();

        let viewport = fit_canvas(&win, &canvas, &ctx, 1.0).unwrap();
        assert_eq!(viewport.width, width.max(1.0));
        assert_eq!(canvas.width(), width as u32);

        // A ceiling below 1 still renders at least one backing pixel per CSS pixel.
        fit_canvas(&win, &canvas, &ctx, 0.25).unwrap();
        assert_eq!(canvas.width(), width as u32);

        let dpr = win.device_pixel_ratio().clamp(1.0, 2.0);
        fit_canvas(&win, &canvas, &ctx, 2.0).unwrap();
        assert_eq!(canvas.width(), (width * dpr) as u32);
    }

    #[wasm_bindgen_test]
    fn dismissing_every_card_starts_finale_once() {
        let doc = window().unwrap().document().unwrap();
        let cards = [add_card(&doc), add_card(&doc)];
        launch(SceneConfig::desktop()).unwrap();
        assert_eq!(with_app(|app| app.scene.gate().card_count()), Some(2));

        cards[0].click();
        assert!(cards[0].class_list().contains(DISMISS_CLASS));
        assert!(!cards[1].class_list().contains(DISMISS_CLASS));
        cards[0].click();
        assert_eq!(with_app(|app| app.scene.gate().dismissed_count()), Some(1));
        assert_eq!(with_app(|app| app.spawn_timer), Some(None));
        assert_eq!(with_app(|app| app.looping), Some(false));

        cards[1].click();
        assert!(cards[1].class_list().contains(DISMISS_CLASS));
        let timer = with_app(|app| app.spawn_timer).flatten();
        assert!(timer.is_some(), "spawn timer not started");
        assert_eq!(with_app(|app| app.looping), Some(true));

        // Further dismissals and finale calls reuse the running timer.
        cards[1].click();
        begin_finale();
        assert_eq!(with_app(|app| app.spawn_timer).flatten(), timer);
        assert_eq!(with_app(|app| app.scene.gate().dismissed_count()), Some(2));

        // Hidden page: the loop lapses. Visible again: it is re-armed.
        on_visibility_change(true);
        assert_eq!(with_app(|app| app.scene.is_started()), Some(false));
        with_app(|app| app.looping = false);
        on_visibility_change(false);
        assert_eq!(with_app(|app| app.scene.is_started()), Some(true));
        assert_eq!(with_app(|app| app.looping), Some(true));
    }
}
