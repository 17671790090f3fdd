//! WebAssembly bindings for StyleKeeper
//!
//! One engine per page. `init` wires the controller to the live document,
//! the best storage the page offers, a `setTimeout` scheduler and a
//! `MutationObserver` on `<body>`, then applies the saved style.

mod dom;
mod logger;
mod storage;
mod timer;

use std::cell::RefCell;

use js_sys::{Array, Function, Object, Reflect};
use sk_core::controller::HistoryStep;
use sk_core::{
    ApplyOutcome, EngineConfig, MutationKinds, StyleController, StyleOverride, Theme,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, MutationObserver, MutationObserverInit};

pub use dom::{WebDocument, WebFrame, WebPage};
pub use storage::{LocalStorageBackend, PageStorage, UserscriptBackend};
pub use timer::{TimeoutHandle, WindowScheduler};

type Controller = StyleController<WebPage, PageStorage, WindowScheduler>;

struct BodyObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

impl Drop for BodyObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

struct Runtime {
    controller: Controller,
    _observer: Option<BodyObserver>,
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
}

// =============================================================================
// Plumbing
// =============================================================================

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn set(target: &Object, key: &str, value: impl Into<JsValue>) {
    let _ = Reflect::set(target, &JsValue::from_str(key), &value.into());
}

fn with_controller<R>(
    f: impl FnOnce(&mut Controller) -> Result<R, sk_core::StyleError>,
) -> Result<R, JsValue> {
    RUNTIME.with(|cell| {
        let mut guard = cell
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("Engine is busy"))?;
        let runtime = guard
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Not initialized. Call init() first."))?;
        f(&mut runtime.controller).map_err(to_js)
    })
}

fn on_reapply_timer(token: u64) {
    if let Err(e) = with_controller(|c| c.handle_reapply_timer(token)) {
        log::warn!("Reapply skipped: {:?}", e);
    }
}

fn observe_body(document: &Document, kinds: MutationKinds) -> Result<Option<BodyObserver>, JsValue> {
    let Some(body) = document.body() else {
        log::warn!("Page has no body; style will not be reapplied on DOM changes");
        return Ok(None);
    };

    let callback = Closure::wrap(Box::new(move |records: Array, _observer: MutationObserver| {
        if records.length() == 0 {
            return;
        }
        if let Err(e) = with_controller(|c| {
            c.handle_mutation();
            Ok(())
        }) {
            log::debug!("Mutation ignored: {:?}", e);
        }
    }) as Box<dyn FnMut(Array, MutationObserver)>);

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;

    let options = MutationObserverInit::new();
    options.set_child_list(kinds.contains(MutationKinds::CHILD_LIST));
    options.set_subtree(kinds.contains(MutationKinds::SUBTREE));
    options.set_attributes(kinds.contains(MutationKinds::ATTRIBUTES));
    options.set_character_data(kinds.contains(MutationKinds::CHARACTER_DATA));
    observer.observe_with_options(&body, &options)?;

    Ok(Some(BodyObserver {
        observer,
        _callback: callback,
    }))
}

// =============================================================================
// JS Conversions
// =============================================================================

fn outcome_to_js(outcome: &ApplyOutcome) -> JsValue {
    let result = Object::new();
    set(&result, "recorded", outcome.recorded);
    set(&result, "framesUpdated", outcome.frames.updated as u32);
    set(&result, "framesCrossOrigin", outcome.frames.cross_origin as u32);
    set(&result, "framesFailed", outcome.frames.failed as u32);
    result.into()
}

fn step_to_js(step: HistoryStep) -> JsValue {
    let (status, outcome) = match step {
        HistoryStep::Applied(outcome) => ("applied", Some(outcome)),
        HistoryStep::EarliestReached => ("earliest", None),
        HistoryStep::LatestReached => ("latest", None),
        HistoryStep::Empty => ("empty", None),
    };

    let result = Object::new();
    set(&result, "status", status);
    if let Some(outcome) = outcome {
        set(&result, "outcome", outcome_to_js(&outcome));
    }
    result.into()
}

fn style_to_js(style: &StyleOverride) -> Object {
    let result = Object::new();
    set(&result, "css", style.css.as_str());
    set(&result, "selector", style.selector.as_str());
    result
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Start the engine on the current page.
///
/// `config_json` overrides any subset of the engine defaults. When both
/// `get_value` and `set_value` are given they back the store (userscript
/// managers); otherwise `localStorage` is used.
#[wasm_bindgen]
pub fn init(
    config_json: Option<String>,
    get_value: Option<Function>,
    set_value: Option<Function>,
) -> Result<JsValue, JsValue> {
    if is_initialized() {
        return Err(JsValue::from_str("Already initialized. Reload the page to reinitialize."));
    }

    let config = match config_json.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => EngineConfig::from_json(text)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?,
        _ => EngineConfig::default(),
    };
    logger::init(config.level_filter());

    let page = WebPage::current().map_err(to_js)?;
    let storage = PageStorage::select(&page.window, get_value, set_value);
    let storage_kind = storage.kind();
    let scheduler = WindowScheduler::new(page.window.clone(), on_reapply_timer);
    let document = page.document.clone();

    let mut controller = StyleController::new(config, page, storage, scheduler);

    let result = Object::new();
    set(&result, "storage", storage_kind);
    match controller.boot() {
        Ok(Some(outcome)) => set(&result, "applied", outcome_to_js(&outcome)),
        Ok(None) => set(&result, "applied", JsValue::NULL),
        Err(e) => {
            log::error!("Failed to apply saved style: {e}");
            set(&result, "applied", JsValue::NULL);
            set(&result, "error", e.to_string());
        }
    }

    let observer = observe_body(&document, MutationKinds::BODY_WATCH)?;
    RUNTIME.with(|cell| {
        *cell.borrow_mut() = Some(Runtime {
            controller,
            _observer: observer,
        });
    });

    Ok(result.into())
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    RUNTIME.with(|cell| cell.try_borrow().map(|r| r.is_some()).unwrap_or(true))
}

// =============================================================================
// Editing
// =============================================================================

#[wasm_bindgen]
pub fn validate_css(css: &str) -> Result<(), JsValue> {
    with_controller(|c| c.validate(css))
}

#[wasm_bindgen]
pub fn preview(css: &str, selector: &str) -> Result<JsValue, JsValue> {
    with_controller(|c| c.preview_once(css, selector)).map(|o| outcome_to_js(&o))
}

#[wasm_bindgen]
pub fn save(css: &str, selector: &str) -> Result<JsValue, JsValue> {
    with_controller(|c| c.save_and_commit(css, selector)).map(|o| outcome_to_js(&o))
}

#[wasm_bindgen]
pub fn reset_all() -> Result<(), JsValue> {
    with_controller(|c| c.reset_all())
}

/// The active override as `{css, selector}`, or `null`.
#[wasm_bindgen]
pub fn current_style() -> Result<JsValue, JsValue> {
    with_controller(|c| {
        Ok(c
            .current()
            .map_or(JsValue::NULL, |style| style_to_js(style).into()))
    })
}

/// Apply the denylist without touching the page. Non-string input yields "".
#[wasm_bindgen]
pub fn sanitize_css(css: JsValue) -> String {
    css.as_string()
        .map(|css| sk_core::sanitize(&css))
        .unwrap_or_default()
}

// =============================================================================
// History
// =============================================================================

#[wasm_bindgen]
pub fn undo() -> Result<JsValue, JsValue> {
    with_controller(|c| c.undo()).map(step_to_js)
}

#[wasm_bindgen]
pub fn redo() -> Result<JsValue, JsValue> {
    with_controller(|c| c.redo()).map(step_to_js)
}

#[wasm_bindgen]
pub fn jump_to_history(index: u32) -> Result<JsValue, JsValue> {
    with_controller(|c| c.jump_to_history(index as usize))
        .map(|o| o.map_or(JsValue::NULL, |o| outcome_to_js(&o)))
}

#[wasm_bindgen]
pub fn clear_history() -> Result<(), JsValue> {
    with_controller(|c| c.clear_history())
}

/// `{cursor, entries: [{css, selector, timestamp}]}`, oldest entry first.
#[wasm_bindgen]
pub fn get_history() -> Result<JsValue, JsValue> {
    with_controller(|c| {
        let history = c.history();
        let entries = Array::new();
        for entry in history.entries() {
            let item = style_to_js(&entry.style);
            set(&item, "timestamp", entry.applied_at as f64);
            entries.push(&item);
        }

        let result = Object::new();
        set(
            &result,
            "cursor",
            history.cursor().map_or(JsValue::NULL, |i| JsValue::from(i as u32)),
        );
        set(&result, "entries", entries);
        Ok(result.into())
    })
}

// =============================================================================
// Presets
// =============================================================================

/// Preset name to CSS body.
#[wasm_bindgen]
pub fn get_presets() -> Result<JsValue, JsValue> {
    with_controller(|c| {
        let result = Object::new();
        for (name, css) in c.presets()? {
            set(&result, &name, css);
        }
        Ok(result.into())
    })
}

#[wasm_bindgen]
pub fn save_preset(name: &str, css: &str) -> Result<(), JsValue> {
    with_controller(|c| c.save_preset(name, css))
}

#[wasm_bindgen]
pub fn edit_preset(name: &str, css: &str) -> Result<(), JsValue> {
    with_controller(|c| c.edit_preset(name, css))
}

#[wasm_bindgen]
pub fn delete_preset(name: &str) -> Result<(), JsValue> {
    with_controller(|c| c.delete_preset(name))
}

#[wasm_bindgen]
pub fn apply_preset(name: &str, selector: &str) -> Result<JsValue, JsValue> {
    with_controller(|c| c.apply_preset(name, selector)).map(|o| outcome_to_js(&o))
}

// =============================================================================
// Site Bindings
// =============================================================================

/// Domain to `{css, selector}`.
#[wasm_bindgen]
pub fn get_site_bindings() -> Result<JsValue, JsValue> {
    with_controller(|c| {
        let result = Object::new();
        for (domain, style) in c.site_bindings() {
            set(&result, &domain, style_to_js(&style));
        }
        Ok(result.into())
    })
}

#[wasm_bindgen]
pub fn unbind_site(domain: &str) -> Result<bool, JsValue> {
    with_controller(|c| c.unbind_site(domain))
}

#[wasm_bindgen]
pub fn unbind_all_sites() -> Result<(), JsValue> {
    with_controller(|c| c.unbind_all_sites())
}

// =============================================================================
// Theme
// =============================================================================

#[wasm_bindgen]
pub fn get_theme() -> Result<String, JsValue> {
    with_controller(|c| Ok(c.theme().as_str().to_string()))
}

#[wasm_bindgen]
pub fn set_theme(theme: &str) -> Result<(), JsValue> {
    let theme = Theme::from_name(theme)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown theme: {}", theme)))?;
    with_controller(|c| c.set_theme(theme))
}

#[wasm_bindgen]
pub fn toggle_theme() -> Result<String, JsValue> {
    with_controller(|c| c.toggle_theme()).map(|t| t.as_str().to_string())
}

// =============================================================================
// Export / Import
// =============================================================================

#[wasm_bindgen]
pub fn export_config() -> Result<String, JsValue> {
    with_controller(|c| Ok(c.export_config()))
}

/// Returns the storage keys that were written.
#[wasm_bindgen]
pub fn import_config(text: &str) -> Result<JsValue, JsValue> {
    with_controller(|c| {
        let keys = Array::new();
        for key in c.import_config(text)? {
            keys.push(&JsValue::from_str(key));
        }
        Ok(keys.into())
    })
}
