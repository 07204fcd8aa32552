//! Optional KaTeX auto-render hook.
//!
//! The page may or may not load KaTeX's `renderMathInElement`. When present it runs
//! once the document is ready; when absent, or when it throws, nothing happens.

use js_sys::{Array, Function, Object, Reflect};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

use crate::dom::set_field as set;

const HOOK_NAME: &str = "renderMathInElement";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delimiter {
    pub left: &'static str,
    pub right: &'static str,
    pub display: bool,
}

/// Display math first so `$$` is not split into two empty inline spans.
pub const DELIMITERS: [Delimiter; 2] = [
    Delimiter { left: "$$", right: "$$", display: true },
    Delimiter { left: "$", right: "$", display: false },
];

/// `{ delimiters: [...], throwOnError: false }`
pub fn render_options() -> Result<Object, JsValue> {
    let delimiters = Array::new();
    for d in DELIMITERS {
        let entry = Object::new();
        set(&entry, "left", &JsValue::from_str(d.left))?;
        set(&entry, "right", &JsValue::from_str(d.right))?;
        set(&entry, "display", &JsValue::from_bool(d.display))?;
        delimiters.push(&entry);
    }
    let options = Object::new();
    set(&options, "delimiters", &delimiters)?;
    set(&options, "throwOnError", &JsValue::FALSE)?;
    Ok(options)
}

/// Call the hook on `document.body` if the page defines it. Returns whether it ran.
pub fn render_now(window: &Window, document: &Document) -> Result<bool, JsValue> {
    let hook = Reflect::get(window, &JsValue::from_str(HOOK_NAME))?;
    let Some(hook) = hook.dyn_ref::<Function>() else {
        return Ok(false);
    };
    let Some(body) = document.body() else {
        return Ok(false);
    };
    let body: JsValue = body.into();
    let options: JsValue = render_options()?.into();
    hook.call2(&JsValue::UNDEFINED, &body, &options)?;
    Ok(true)
}

fn render_quietly(window: &Window, document: &Document) {
    match render_now(window, document) {
        Ok(true) => debug!("math markup rendered"),
        Ok(false) => {}
        Err(err) => debug!(?err, "math render hook failed"),
    }
}

/// Run the hook on `DOMContentLoaded`, or right away if that already fired.
pub fn install_hook(window: &Window, document: &Document) -> Result<(), JsValue> {
    if document.ready_state() != "loading" {
        render_quietly(window, document);
        return Ok(());
    }
    let win = window.clone();
    let doc = document.clone();
    let closure = Closure::once(move || render_quietly(&win, &doc));
    document.add_event_listener_with_callback("DOMContentLoaded", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_delimiter_comes_first() {
        assert!(DELIMITERS[0].display);
        assert_eq!(DELIMITERS[0].left, "$$");
        assert!(!DELIMITERS[1].display);
        assert_eq!(DELIMITERS[1].right, "$");
    }
}
