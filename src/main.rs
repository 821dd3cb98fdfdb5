//! Neon Arena entry point
//!
//! On the web this wires the canvases, keyboard and name form to a
//! [`Session`] and drives it from `requestAnimationFrame`. Natively it runs a
//! short headless match over an in-process relay and logs what happens.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlElement, HtmlInputElement, KeyboardEvent};

    use neon_arena::net::{WebSocketTransport, relay_url};
    use neon_arena::renderer::{Overlay, RenderState};
    use neon_arena::session::validate_name;
    use neon_arena::sim::SessionId;
    use neon_arena::{BestScore, FrameOutcome, Session, Settings};

    /// Page-level state shared by the callbacks
    struct Game {
        session: Option<Session<WebSocketTransport>>,
        render_state: Option<RenderState>,
        overlay: Option<Overlay>,
        settings: Settings,
        /// Arena size in CSS pixels
        size: (f32, f32),
    }

    impl Game {
        fn render(&mut self, time: f64) -> bool {
            let Some(session) = self.session.as_mut() else {
                return false;
            };
            match session.frame(time) {
                FrameOutcome::Stopped => return false,
                FrameOutcome::Skipped => {}
                FrameOutcome::Rendered(frame) => {
                    if let Some(rs) = self.render_state.as_mut() {
                        match rs.render(&frame, &self.settings) {
                            Ok(()) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                let (w, h) = rs.size;
                                rs.resize(w, h);
                            }
                            Err(e) => log::warn!("Render error: {:?}", e),
                        }
                    }
                    if let Some(overlay) = self.overlay.as_ref() {
                        overlay.paint(&frame);
                    }
                }
            }
            true
        }
    }

    fn now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or(0.0)
    }

    fn canvas_by_id(document: &web_sys::Document, id: &str) -> Option<HtmlCanvasElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn set_visible(document: &web_sys::Document, id: &str, visible: bool) {
        if let Some(el) = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            let _ = el
                .style()
                .set_property("display", if visible { "" } else { "none" });
        }
    }

    /// `?relay=` from the page URL, if present
    fn relay_override(window: &web_sys::Window) -> Option<String> {
        let search = window.location().search().ok()?;
        search
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix("relay="))
            .and_then(|v| js_sys::decode_uri_component(v).ok())
            .map(String::from)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Neon Arena starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };
        let (Some(canvas), Some(overlay_canvas)) = (
            canvas_by_id(&document, "canvas"),
            canvas_by_id(&document, "overlay"),
        ) else {
            log::error!("Page is missing the #canvas or #overlay element");
            return;
        };

        let (css_w, css_h) = window_size(&window);
        let dpr = window.device_pixel_ratio();
        let width = (css_w as f64 * dpr) as u32;
        let height = (css_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let overlay = Overlay::new(overlay_canvas);
        if let Some(o) = overlay.as_ref() {
            o.resize(css_w as u32, css_h as u32);
        }

        let render_state = match init_gpu(&canvas, width, height).await {
            Ok(rs) => Some(rs),
            Err(e) => {
                log::error!("WebGPU unavailable: {}", e);
                None
            }
        };

        let mut settings = Settings::load();
        let search = window.location().search().unwrap_or_default();
        if settings.apply_query(&search) {
            settings.save();
        }

        let game = Rc::new(RefCell::new(Game {
            session: None,
            render_state,
            overlay,
            settings,
            size: (css_w, css_h),
        }));

        setup_name_form(&document, game.clone());
        setup_input_handlers(game.clone());
        setup_resize(&canvas, game.clone());
        setup_teardown(game);

        set_visible(&document, "loading", false);
        log::info!("Waiting for a name");
    }

    fn window_size(window: &web_sys::Window) -> (f32, f32) {
        let w = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(800.0);
        let h = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(600.0);
        (w as f32, h as f32)
    }

    async fn init_gpu(
        canvas: &HtmlCanvasElement,
        width: u32,
        height: u32,
    ) -> Result<RenderState, neon_arena::renderer::RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| neon_arena::renderer::RenderError::Adapter(e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        RenderState::new(surface, &adapter, width, height).await
    }

    fn setup_name_form(document: &web_sys::Document, game: Rc<RefCell<Game>>) {
        let Some(form) = document.get_element_by_id("name-form") else {
            log::error!("Page is missing the #name-form element");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            event.prevent_default();
            let Some(window) = web_sys::window() else {
                return;
            };
            let Some(document) = window.document() else {
                return;
            };
            let raw = document
                .get_element_by_id("name-input")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .unwrap_or_default();

            let name = match validate_name(&raw) {
                Ok(name) => name,
                Err(e) => {
                    if let Some(el) = document.get_element_by_id("name-error") {
                        el.set_text_content(Some(&e.to_string()));
                    }
                    return;
                }
            };

            let started = {
                let mut g = game.borrow_mut();
                if g.session.is_some() {
                    return;
                }
                let url = relay_url(
                    &window.location().protocol().unwrap_or_default(),
                    &window.location().hostname().unwrap_or_default(),
                    relay_override(&window).as_deref(),
                );
                let transport = WebSocketTransport::connect(&url).unwrap_or_else(|e| {
                    log::warn!("{}; playing offline", e);
                    WebSocketTransport::disconnected()
                });
                let seed = js_sys::Date::now() as u64;
                let mut session = Session::new(
                    SessionId::random(&mut rand::rng()),
                    transport,
                    Box::new(BestScore::load()),
                    g.settings.clone(),
                    seed,
                );
                let (w, h) = g.size;
                session.resize(w, h);
                let started = session.start(&name, now());
                g.session = Some(session);
                started
            };

            match started {
                Ok(()) => {
                    set_visible(&document, "name-screen", false);
                    request_animation_frame(game.clone());
                }
                Err(e) => log::error!("Could not start: {}", e),
            }
        });
        let _ = form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                if let Some(session) = g.session.as_mut() {
                    let key = event.key();
                    // Keep space and arrows from scrolling the page
                    if key == " " || key.starts_with("Arrow") {
                        event.prevent_default();
                    }
                    session.key_down(&key);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(session) = game.borrow_mut().session.as_mut() {
                    session.key_up(&event.key());
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur: keyup events are lost while unfocused
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Some(session) = game.borrow_mut().session.as_mut() {
                    session.clear_keys();
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (css_w, css_h) = window_size(&window);
            let dpr = window.device_pixel_ratio();
            let width = (css_w as f64 * dpr) as u32;
            let height = (css_h as f64 * dpr) as u32;
            canvas.set_width(width);
            canvas.set_height(height);

            let mut g = game.borrow_mut();
            g.size = (css_w, css_h);
            if let Some(rs) = g.render_state.as_mut() {
                rs.resize(width, height);
            }
            if let Some(overlay) = g.overlay.as_ref() {
                overlay.resize(css_w as u32, css_h as u32);
            }
            if let Some(session) = g.session.as_mut() {
                session.resize(css_w, css_h);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Close the relay connection when the page goes away
    fn setup_teardown(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            // A page restored from the back/forward cache starts over at the name form
            if let Some(mut session) = game.borrow_mut().session.take() {
                session.teardown();
            }
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                set_visible(&document, "name-screen", true);
            }
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let keep_going = game.borrow_mut().render(time);
        if keep_going {
            request_animation_frame(game);
        } else {
            log::info!("Frame loop stopped");
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless match: one player against bots, joined for a while by a visitor
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use neon_arena::consts::NOMINAL_FRAME_MS;
    use neon_arena::net::MemoryRelay;
    use neon_arena::sim::{FIRE_KEY, GameEvent, SessionId};
    use neon_arena::{FrameOutcome, MemoryScores, Session, Settings};

    /// 30 seconds at 60 Hz
    const DEMO_FRAMES: u32 = 1800;
    const VISITOR_JOINS: u32 = 600;
    const VISITOR_LEAVES: u32 = 1200;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(rand::random::<u64>);
    log::info!("Neon Arena (native) headless demo, seed {}", seed);

    let relay = MemoryRelay::new();
    let scores = MemoryScores::new();
    let mut player = Session::new(
        SessionId::new("demo"),
        relay.connect(),
        Box::new(scores.clone()),
        Settings::default(),
        seed,
    );
    player.resize(800.0, 600.0);
    if let Err(e) = player.start("Demo", 0.0) {
        log::error!("Could not start: {}", e);
        return;
    }

    let mut visitor = None;
    let mut frames_rendered = 0u32;
    for n in 0..DEMO_FRAMES {
        let now = n as f64 * NOMINAL_FRAME_MS as f64;

        // Strafe left and right, firing three times a second
        let (hold, free) = if (n / 120) % 2 == 0 { ("d", "q") } else { ("q", "d") };
        player.key_up(free);
        player.key_down(hold);
        if n % 20 == 0 {
            player.key_down(FIRE_KEY);
        } else {
            player.key_up(FIRE_KEY);
        }

        if n == VISITOR_JOINS {
            let mut v = Session::new(
                SessionId::new("visitor"),
                relay.connect(),
                Box::new(MemoryScores::new()),
                Settings::default(),
                seed.wrapping_add(1),
            );
            v.resize(800.0, 600.0);
            if v.start("Visitor", now).is_ok() {
                visitor = Some(v);
            }
        }
        if n == VISITOR_LEAVES {
            if let Some(mut v) = visitor.take() {
                v.teardown();
            }
        }
        if let Some(v) = visitor.as_mut() {
            v.frame(now);
        }

        match player.frame(now) {
            FrameOutcome::Rendered(_) => frames_rendered += 1,
            FrameOutcome::Skipped => {}
            FrameOutcome::Stopped => break,
        }
        for event in player.last_events() {
            match event {
                GameEvent::Fired { .. } => log::debug!("{:?}", event),
                _ => log::info!("{:?}", event),
            }
        }
        if player.hud().is_dead {
            player.respawn(now);
        }
    }

    let hud = player.hud();
    log::info!(
        "Demo finished after {} frames: score {}, best {}",
        frames_rendered,
        hud.score,
        hud.best_score
    );
    player.teardown();
}
