use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use particle_field::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_time::Instant;

mod canvas;

use canvas::CanvasSurface;

/// Class on `<html>` that marks the dark theme.
const DARK_CLASS: &str = "dark";

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;
type MutationClosure = Closure<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>;

/// Everything the running effect owns. Callbacks hold a `Weak` to it, so
/// dropping the handle is enough to stop them doing work.
struct Host {
    engine: RefCell<Background>,
    surface: RefCell<CanvasSurface>,
    clock: Instant,
    raf_id: Cell<Option<i32>>,
    frame: RefCell<Option<Closure<dyn FnMut()>>>,
    listeners: RefCell<Vec<(&'static str, EventClosure)>>,
    observer: RefCell<Option<(web_sys::MutationObserver, MutationClosure)>>,
}

impl Host {
    fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    fn teardown(&self) {
        self.engine.borrow_mut().teardown();

        let window = web_sys::window();
        if let (Some(window), Some(id)) = (window.as_ref(), self.raf_id.take()) {
            let _ = window.cancel_animation_frame(id);
        }
        for (event, cb) in self.listeners.borrow_mut().drain(..) {
            if let Some(window) = window.as_ref() {
                let _ = window.remove_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
            }
        }
        if let Some((observer, _cb)) = self.observer.borrow_mut().take() {
            observer.disconnect();
        }
        self.frame.borrow_mut().take();
    }
}

/// JS-owned handle to a running background. Calling `stop()` (or freeing the
/// handle) cancels the frame loop, removes listeners and disconnects the
/// theme observer.
#[wasm_bindgen]
pub struct BackgroundHandle {
    host: Option<Rc<Host>>,
}

#[wasm_bindgen]
impl BackgroundHandle {
    pub fn stop(&mut self) {
        if let Some(host) = self.host.take() {
            host.teardown();
        }
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.host
            .as_ref()
            .is_some_and(|h| h.engine.borrow().is_running())
    }

    /// For pages that track the theme themselves instead of via the
    /// `dark` class on `<html>`.
    pub fn set_dark(&self, dark: bool) {
        if let Some(host) = &self.host {
            host.engine.borrow_mut().set_theme(Theme::from_dark_flag(dark));
        }
    }

    #[wasm_bindgen(getter)]
    pub fn point_count(&self) -> usize {
        self.host
            .as_ref()
            .map_or(0, |h| h.engine.borrow().field().len())
    }
}

impl Drop for BackgroundHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the background on `canvas`. `config_json` is an optional
/// `FieldConfig` in JSON; missing fields take their defaults.
#[wasm_bindgen]
pub fn start(
    canvas: web_sys::HtmlCanvasElement,
    config_json: Option<String>,
) -> Result<BackgroundHandle, JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let mut config = match config_json {
        Some(text) => serde_json::from_str::<FieldConfig>(&text)
            .map_err(|e| JsValue::from_str(&format!("particle field config: {e}")))?,
        None => FieldConfig::default(),
    };
    // `SystemTime` is unavailable on wasm32; seed from the JS PRNG instead.
    config
        .seed
        .get_or_insert_with(|| (js_sys::Math::random() * u32::MAX as f64) as u64 + 1);
    let pointer_focus = config.focal == FocalPolicy::Pointer;

    let surface = CanvasSurface::new(canvas)
        .map_err(|e| JsValue::from_str(&FieldError::MissingSurface(e).to_string()))?;

    let (width, height) = viewport_size(&window);
    let env = Environment::new(width, height)
        .with_dpr(window.device_pixel_ratio())
        .with_theme(Theme::from_dark_flag(document_is_dark(&document)));
    let mut engine =
        Background::new(config, env).map_err(|e| JsValue::from_str(&e.to_string()))?;
    // Frame clock starts at zero below; colours follow `Date.now()`.
    engine.set_color_epoch(js_sys::Date::now());

    let host = Rc::new(Host {
        engine: RefCell::new(engine),
        surface: RefCell::new(surface),
        clock: Instant::now(),
        raf_id: Cell::new(None),
        frame: RefCell::new(None),
        listeners: RefCell::new(Vec::new()),
        observer: RefCell::new(None),
    });

    {
        let now = host.now_ms();
        host.engine
            .borrow_mut()
            .start(&mut *host.surface.borrow_mut(), now);
    }

    install_listeners(&host, &window, pointer_focus)?;
    observe_theme(&host, &document)?;
    schedule_frames(&host, &window)?;

    Ok(BackgroundHandle { host: Some(host) })
}

fn viewport_size(window: &web_sys::Window) -> (f64, f64) {
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    (w, h)
}

fn document_is_dark(document: &web_sys::Document) -> bool {
    document
        .document_element()
        .is_some_and(|el| el.class_list().contains(DARK_CLASS))
}

fn console_warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(msg));
}

fn schedule_frames(host: &Rc<Host>, window: &web_sys::Window) -> Result<(), JsValue> {
    let weak: Weak<Host> = Rc::downgrade(host);
    let cb = Closure::wrap(Box::new(move || {
        let Some(host) = weak.upgrade() else {
            return;
        };
        host.raf_id.set(None);

        let now = host.now_ms();
        host.engine
            .borrow_mut()
            .tick(&mut *host.surface.borrow_mut(), now);
        if !host.engine.borrow().is_running() {
            return;
        }

        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(f) = host.frame.borrow().as_ref() {
            match window.request_animation_frame(f.as_ref().unchecked_ref()) {
                Ok(id) => host.raf_id.set(Some(id)),
                Err(_) => console_warn("particle field: requestAnimationFrame failed"),
            }
        }
    }) as Box<dyn FnMut()>);

    let id = window.request_animation_frame(cb.as_ref().unchecked_ref())?;
    host.raf_id.set(Some(id));
    *host.frame.borrow_mut() = Some(cb);
    Ok(())
}

fn listen(
    host: &Rc<Host>,
    window: &web_sys::Window,
    event: &'static str,
    handler: impl Fn(&Host, &web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let weak = Rc::downgrade(host);
    let cb = Closure::wrap(Box::new(move |ev: web_sys::Event| {
        if let Some(host) = weak.upgrade() {
            handler(&host, &ev);
        }
    }) as Box<dyn FnMut(web_sys::Event)>);
    window.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    host.listeners.borrow_mut().push((event, cb));
    Ok(())
}

fn install_listeners(
    host: &Rc<Host>,
    window: &web_sys::Window,
    pointer_focus: bool,
) -> Result<(), JsValue> {
    listen(host, window, "resize", |host, _ev| {
        let Some(window) = web_sys::window() else {
            return;
        };
        let (w, h) = viewport_size(&window);
        let now = host.now_ms();
        host.engine.borrow_mut().resize(
            &mut *host.surface.borrow_mut(),
            w,
            h,
            window.device_pixel_ratio(),
            now,
        );
    })?;

    listen(host, window, "scroll", |host, _ev| {
        if let Some(window) = web_sys::window() {
            let y = window.scroll_y().unwrap_or(0.0);
            host.engine.borrow_mut().set_scroll(y);
        }
    })?;

    if pointer_focus {
        listen(host, window, "mousemove", |host, ev| {
            if let Some(m) = ev.dyn_ref::<web_sys::MouseEvent>() {
                host.engine
                    .borrow_mut()
                    .set_pointer(m.client_x() as f64, m.client_y() as f64);
            }
        })?;
        listen(host, window, "mouseout", |host, ev| {
            // Only when leaving the window, not when crossing elements.
            if let Some(m) = ev.dyn_ref::<web_sys::MouseEvent>() {
                if m.related_target().is_none() {
                    host.engine.borrow_mut().clear_pointer();
                }
            }
        })?;
    }
    Ok(())
}

fn observe_theme(host: &Rc<Host>, document: &web_sys::Document) -> Result<(), JsValue> {
    let Some(root) = document.document_element() else {
        return Ok(());
    };

    let weak = Rc::downgrade(host);
    let watched = root.clone();
    let cb = Closure::wrap(Box::new(
        move |_records: js_sys::Array, _observer: web_sys::MutationObserver| {
            if let Some(host) = weak.upgrade() {
                let dark = watched.class_list().contains(DARK_CLASS);
                host.engine.borrow_mut().set_theme(Theme::from_dark_flag(dark));
            }
        },
    ) as Box<dyn FnMut(js_sys::Array, web_sys::MutationObserver)>);

    let observer = web_sys::MutationObserver::new(cb.as_ref().unchecked_ref())?;
    let init = web_sys::MutationObserverInit::new();
    init.set_attributes(true);
    init.set_attribute_filter(&js_sys::Array::of1(&JsValue::from_str("class")));
    observer.observe_with_options(&root, &init)?;

    *host.observer.borrow_mut() = Some((observer, cb));
    Ok(())
}
