//! `setTimeout`-backed scheduler for the reapplication loop

use std::time::Duration;

use sk_core::reapply::Scheduler;
use sk_core::DomError;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use crate::dom::js_error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeoutHandle(i32);

/// One shared callback receives the token of whichever timer fired.
pub struct WindowScheduler {
    window: Window,
    callback: Closure<dyn FnMut(JsValue)>,
}

impl WindowScheduler {
    pub fn new(window: Window, on_fire: impl FnMut(u64) + 'static) -> Self {
        let mut on_fire = on_fire;
        let callback = Closure::wrap(Box::new(move |token: JsValue| {
            if let Some(token) = token.as_f64() {
                on_fire(token as u64);
            }
        }) as Box<dyn FnMut(JsValue)>);
        Self { window, callback }
    }
}

impl Scheduler for WindowScheduler {
    type Handle = TimeoutHandle;

    fn schedule(&mut self, delay: Duration, token: u64) -> Result<TimeoutHandle, DomError> {
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_1(
                self.callback.as_ref().unchecked_ref(),
                delay.as_millis().try_into().unwrap_or(i32::MAX),
                &JsValue::from_f64(token as f64),
            )
            .map(TimeoutHandle)
            .map_err(|e| js_error("setTimeout", e))
    }

    fn cancel(&mut self, handle: TimeoutHandle) {
        self.window.clear_timeout_with_handle(handle.0);
    }
}
