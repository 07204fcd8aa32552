//! Browser implementation of [`Stage`] on top of `web-sys`.
//!
//! Layers are looked up by class first and only created when missing, so a page that
//! ships its own `.pourLayer` (or calls into us twice) keeps a single copy.

use js_sys::{Array, Function, Object, Reflect};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlAudioElement, HtmlElement, HtmlImageElement, Window, window};

use crate::audio;
use crate::config::{AssetConfig, AudioConfig, CelebrationConfig, LayerConfig};
use crate::particle::{EASING, FILL, ParticleSpawnRequest};
use crate::stage::{Stage, Viewport};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

pub(crate) fn set_field(target: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
}

/// The injected overlay layers. Only the particle container is kept; the overlay,
/// cute and message layers are static once created.
#[derive(Clone, Debug)]
pub struct Layers {
    /// Container every heart is appended to.
    pub pour: Element,
}

impl Layers {
    fn ensure(document: &Document, config: &CelebrationConfig) -> Result<Self, JsValue> {
        let names = &config.layers;
        ensure_layer(document, &names.overlay_class, |_, _| Ok(()))?;
        ensure_layer(document, &names.cute_class, |doc, layer| {
            for (i, src) in config.assets.cute.iter().enumerate() {
                let img = doc.create_element("img")?.dyn_into::<HtmlImageElement>()?;
                img.set_class_name(&format!("c{}", i + 1));
                img.set_src(src);
                img.set_alt("");
                layer.append_child(&img)?;
            }
            Ok(())
        })?;
        ensure_layer(document, &names.message_class, |doc, layer| {
            let line = doc.create_element("div")?;
            line.set_class_name("line1");
            line.set_text_content(Some(&names.message_text));
            layer.append_child(&line)?;
            Ok(())
        })?;
        let pour = ensure_layer(document, &names.pour_class, |_, _| Ok(()))?;
        Ok(Self { pour })
    }
}

/// Find `.{class}` or append a new `<div class="{class}">` to body, filled by `fill`.
fn ensure_layer<F>(document: &Document, class: &str, fill: F) -> Result<Element, JsValue>
where
    F: FnOnce(&Document, &Element) -> Result<(), JsValue>,
{
    if let Some(existing) = document.query_selector(&format!(".{class}"))? {
        return Ok(existing);
    }
    let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let layer = document.create_element("div")?;
    layer.set_class_name(class);
    fill(document, &layer)?;
    body.append_child(&layer)?;
    Ok(layer)
}

pub struct DomStage {
    window: Window,
    document: Document,
    layers: Option<Layers>,
    audio: Option<HtmlAudioElement>,
}

impl DomStage {
    pub fn new() -> Result<Self, JsValue> {
        let window = window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self { window, document, layers: None, audio: None })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn ensure_layers(&mut self, config: &CelebrationConfig) -> Result<&Layers, JsValue> {
        if self.layers.is_none() {
            self.layers = Some(Layers::ensure(&self.document, config)?);
        }
        self.layers
            .as_ref()
            .ok_or_else(|| JsValue::from_str("layers unavailable"))
    }

    /// Warm the image cache so the first hearts are not blank.
    pub fn preload_hearts(&self, assets: &AssetConfig) -> Result<(), JsValue> {
        for src in &assets.hearts {
            let img = HtmlImageElement::new()?;
            img.set_src(src);
        }
        Ok(())
    }

    /// Attach `on_click` to the trigger control. Returns `false` if the page has none.
    pub fn wire_trigger<F>(&self, layers: &LayerConfig, mut on_click: F) -> Result<bool, JsValue>
    where
        F: FnMut() + 'static,
    {
        let Some(button) = self.document.query_selector(&layers.trigger_selector)? else {
            return Ok(false);
        };
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| on_click()) as Box<dyn FnMut(_)>);
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(true)
    }

    fn try_prepare(&mut self, config: &CelebrationConfig) -> Result<(), JsValue> {
        self.ensure_layers(config)?;
        if let Some(body) = self.document.body() {
            body.class_list().add_1(&config.layers.body_class)?;
        }
        if let Some(button) = self.document.query_selector(&config.layers.trigger_selector)? {
            let button: HtmlElement = button.dyn_into()?;
            let style = button.style();
            style.set_property("opacity", "0")?;
            style.set_property("pointer-events", "none")?;
        }
        Ok(())
    }

    fn build_particle(
        &self,
        pour: &Element,
        request: &ParticleSpawnRequest,
        config: &CelebrationConfig,
    ) -> Result<Element, JsValue> {
        let el: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        el.set_class_name(&config.layers.particle_class);

        let img = self.document.create_element("img")?.dyn_into::<HtmlImageElement>()?;
        let hearts = &config.assets.hearts;
        if let Some(src) = hearts.get(request.image).or_else(|| hearts.first()) {
            img.set_src(src);
        }
        img.set_alt("");
        el.append_child(&img)?;

        let style = el.style();
        let size = format!("{}px", request.size);
        style.set_property("width", &size)?;
        style.set_property("height", &size)?;
        style.set_property("left", &format!("{}px", request.x))?;
        style.set_property("top", &format!("{}px", request.y))?;

        pour.append_child(&el)?;
        if let Err(err) = animate(&el, request) {
            // Element stays (static) until its lifetime ends.
            debug!(?err, "heart animation failed");
        }
        Ok(el.into())
    }
}

/// Keyframe array handed to `Element.animate`.
pub fn animation_keyframes(request: &ParticleSpawnRequest) -> Result<Array, JsValue> {
    let frames = Array::new();
    for kf in request.keyframes() {
        let frame = Object::new();
        set_field(&frame, "transform", &JsValue::from_str(&kf.transform))?;
        set_field(&frame, "opacity", &JsValue::from_f64(kf.opacity))?;
        if let Some(offset) = kf.offset {
            set_field(&frame, "offset", &JsValue::from_f64(offset))?;
        }
        frames.push(&frame);
    }
    Ok(frames)
}

/// `{ duration, easing, fill }`
pub fn animation_options(request: &ParticleSpawnRequest) -> Result<Object, JsValue> {
    let options = Object::new();
    set_field(&options, "duration", &JsValue::from_f64(request.duration_ms))?;
    set_field(&options, "easing", &JsValue::from_str(EASING))?;
    set_field(&options, "fill", &JsValue::from_str(FILL))?;
    Ok(options)
}

/// `el.animate(keyframes, options)`
fn animate(el: &Element, request: &ParticleSpawnRequest) -> Result<(), JsValue> {
    let frames: JsValue = animation_keyframes(request)?.into();
    let options: JsValue = animation_options(request)?.into();
    let target: &JsValue = el.as_ref();
    let animate: Function = Reflect::get(target, &JsValue::from_str("animate"))?.dyn_into()?;
    animate.call2(target, &frames, &options)?;
    Ok(())
}

impl Stage for DomStage {
    type Particle = Element;

    fn prefers_reduced_motion(&self) -> bool {
        self.window
            .match_media(REDUCED_MOTION_QUERY)
            .ok()
            .flatten()
            .is_some_and(|query| query.matches())
    }

    fn viewport(&self) -> Viewport {
        let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport {
            width: dim(self.window.inner_width()),
            height: dim(self.window.inner_height()),
        }
    }

    fn prepare(&mut self, config: &CelebrationConfig) {
        if let Err(err) = self.try_prepare(config) {
            debug!(?err, "celebration layers incomplete");
        }
    }

    fn start_audio(&mut self, config: &AudioConfig) {
        if self.audio.is_some() {
            return;
        }
        match audio::start_music(config) {
            Ok(element) => self.audio = Some(element),
            Err(err) => debug!(?err, "music unavailable"),
        }
    }

    fn spawn(&mut self, request: &ParticleSpawnRequest, config: &CelebrationConfig) -> Option<Element> {
        let pour = match self.ensure_layers(config) {
            Ok(layers) => layers.pour.clone(),
            Err(err) => {
                debug!(?err, "no particle layer");
                return None;
            }
        };
        match self.build_particle(&pour, request, config) {
            Ok(el) => Some(el),
            Err(err) => {
                debug!(?err, "heart not created");
                None
            }
        }
    }

    fn remove(&mut self, particle: Element) {
        particle.remove();
    }
}
