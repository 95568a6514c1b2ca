pub mod engine;
pub mod game;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{WebGlRenderingContext, HtmlCanvasElement, HtmlElement, KeyboardEvent};
use std::cell::RefCell;
use std::rc::Rc;
use crate::engine::assets;
use crate::engine::logging;
use crate::engine::renderer::Renderer;
use crate::game::config::AppConfig;
use crate::game::input::Direction;
use crate::game::scheduler::{FrameOutcome, FrameScheduler};
use crate::game::vehicle::VehicleModel;
use crate::game::view::{PropModel, SceneView};
use crate::game::GameSession;

const CONFIG_URL: &str = "/assets/config.json";

struct App {
    session: GameSession,
    scheduler: FrameScheduler,
    view: SceneView,
}

impl App {
    fn frame(&mut self) -> FrameOutcome {
        let outcome = self.scheduler.tick(&mut self.session);
        if outcome == FrameOutcome::Advanced {
            self.view.render(&self.session);
        }
        if matches!(outcome, FrameOutcome::Advanced | FrameOutcome::GameOver) {
            update_hud(&self.session);
        }
        outcome
    }
}

thread_local! {
    static APP: RefCell<Option<App>> = RefCell::new(None);
}

fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|app| app.borrow_mut().as_mut().map(f))
}

#[wasm_bindgen]
pub async fn init_game() -> Result<(), JsValue> {
    logging::init(log::LevelFilter::Info);

    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let canvas = document.get_element_by_id("canvas")
        .ok_or("No canvas")?
        .dyn_into::<HtmlCanvasElement>()?;

    let gl = canvas
        .get_context("webgl")?
        .ok_or("No WebGL")?
        .dyn_into::<WebGlRenderingContext>()?;

    let renderer = Renderer::new(gl)?;
    let config = load_config().await;

    let (width, height) = viewport_size(&window);
    let aspect = width as f32 / height.max(1) as f32;
    let session = GameSession::new(config.tuning.clone(), aspect);
    let view = SceneView::new(renderer, &config);
    view.resize(width, height);

    APP.with(|app| {
        *app.borrow_mut() = Some(App {
            session,
            scheduler: FrameScheduler::new(),
            view,
        })
    });

    install_input_handlers(&window)?;
    install_resize_handler(&window)?;

    if let Some(button) = document.get_element_by_id("start-button") {
        let on_click = Closure::wrap(Box::new(move || {
            if let Err(e) = start_game() {
                log::error!("failed to start: {:?}", e);
            }
        }) as Box<dyn FnMut()>);
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
    }

    // Models arrive on their own; the frame loop idles until the car is in
    let car_config = config.car_model.clone();
    wasm_bindgen_futures::spawn_local(async move {
        match assets::load_model(&car_config.path).await {
            Ok(mesh) => match VehicleModel::new(mesh, &car_config) {
                Some(model) => {
                    log::info!("car model loaded from {}", car_config.path);
                    with_app(|app| app.session.attach_vehicle_model(model));
                }
                None => log::error!("car model {} has no vertices", car_config.path),
            },
            Err(e) => log::error!("car model failed to load: {}", e),
        }
    });

    let tree_config = config.tree_model.clone();
    wasm_bindgen_futures::spawn_local(async move {
        match assets::load_model(&tree_config.path).await {
            Ok(mesh) => {
                log::info!("tree model loaded from {}", tree_config.path);
                with_app(|app| {
                    app.view.set_tree_model(PropModel::new(mesh, &tree_config));
                    app.session.populate_trees();
                });
            }
            Err(e) => log::warn!("tree model failed to load, road stays bare: {}", e),
        }
    });

    Ok(())
}

async fn load_config() -> AppConfig {
    match assets::fetch_text(CONFIG_URL).await {
        Ok(text) => match AppConfig::from_json(&text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring {}: {}", CONFIG_URL, e);
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("no config ({}), using defaults", e);
            AppConfig::default()
        }
    }
}

/// Hide the start screen, show the counters and begin the frame loop.
/// Calling it again after the first time does nothing.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    let started = with_app(|app| app.scheduler.start()).unwrap_or(false);
    if !started {
        return Ok(());
    }

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("No document")?;
    set_display(&document, "start-screen", "none");
    set_display(&document, "lives-container", "block");
    set_display(&document, "distance-container", "block");
    if let Some(body) = document.body() {
        body.style().set_property("background-image", "none")?;
    }
    with_app(|app| update_hud(&app.session));

    run_frame_loop()
}

/// The callback keeps a handle to itself so it can re-request the next frame.
/// Once the scheduler stops it simply stops asking; the handle is never
/// dropped while a frame is running.
fn run_frame_loop() -> Result<(), JsValue> {
    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let outcome = with_app(|app| app.frame()).unwrap_or(FrameOutcome::Idle);

        if outcome == FrameOutcome::GameOver {
            end_session();
            return;
        }
        if outcome.wants_next_frame() {
            if let Some(callback) = f.borrow().as_ref() {
                if let Err(e) = request_animation_frame(callback) {
                    log::error!("could not schedule frame: {:?}", e);
                }
            }
        }
    }) as Box<dyn FnMut()>));

    let first = g.borrow();
    let callback = first.as_ref().ok_or("frame callback missing")?;
    request_animation_frame(callback)?;
    Ok(())
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) -> Result<i32, JsValue> {
    web_sys::window()
        .ok_or("No window")?
        .request_animation_frame(f.as_ref().unchecked_ref())
}

/// The loop has already stopped; tell the player and reload for a fresh game.
fn end_session() {
    if let Some(window) = web_sys::window() {
        window.alert_with_message("Game Over!").ok();
        window.location().reload().ok();
    }
}

fn install_input_handlers(window: &web_sys::Window) -> Result<(), JsValue> {
    for (event_name, pressed) in [("keydown", true), ("keyup", false)] {
        let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let handled = with_app(|app| app.session.handle_key(&event.key(), pressed)).unwrap_or(false);
            if handled {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(_)>);
        window.add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn install_resize_handler(window: &web_sys::Window) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move || {
        if let Some(window) = web_sys::window() {
            let (width, height) = viewport_size(&window);
            with_app(|app| {
                app.session.camera.set_viewport(width, height);
                app.view.resize(width, height);
            });
        }
    }) as Box<dyn FnMut()>);
    window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn viewport_size(window: &web_sys::Window) -> (u32, u32) {
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
    (width as u32, height as u32)
}

fn set_display(document: &web_sys::Document, id: &str, display: &str) {
    if let Some(el) = document.get_element_by_id(id).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
        el.style().set_property("display", display).ok();
    }
}

fn update_hud(session: &GameSession) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let Some(lives_el) = document.get_element_by_id("lives-count") {
                lives_el.set_inner_html(&session.state.lives.to_string());
            }
            if let Some(distance_el) = document.get_element_by_id("distance-count") {
                distance_el.set_inner_html(&session.state.distance_label());
            }
        }
    }
}

/// Current counters as a plain JS object, for pages that draw their own HUD.
#[wasm_bindgen]
pub fn hud_state() -> Result<JsValue, JsValue> {
    let snapshot = with_app(|app| app.session.state.hud(app.session.vehicle.speed))
        .ok_or("Game not initialized")?;
    Ok(serde_wasm_bindgen::to_value(&snapshot)?)
}

/// On-screen controls: `direction` is one of forward, back, left, right.
#[wasm_bindgen]
pub fn press_direction(direction: &str, pressed: bool) {
    if let Some(direction) = Direction::from_name(direction) {
        with_app(|app| app.session.input.set(direction, pressed));
    }
}
