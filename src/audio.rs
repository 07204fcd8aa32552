//! Background music: looped `<audio>` with a stepped volume fade-in.
//!
//! Playback is best effort. Browsers reject `play()` without a user gesture (or when
//! the file is missing); that rejection is logged at debug level and otherwise ignored.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlAudioElement, window};

use crate::config::AudioConfig;

/// Volume values applied on each fade tick: accumulator grows by `step`, volume is
/// capped at `ceiling`, and the ramp ends on the tick that reaches the ceiling.
#[derive(Clone, Debug)]
pub struct VolumeRamp {
    acc: f64,
    step: f64,
    ceiling: f64,
    done: bool,
}

impl VolumeRamp {
    pub fn new(step: f64, ceiling: f64) -> Self {
        Self { acc: 0.0, step, ceiling, done: false }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(config.volume_step, config.volume_ceiling)
    }
}

impl Iterator for VolumeRamp {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.done {
            return None;
        }
        if self.step <= 0.0 {
            self.done = true;
            return Some(self.ceiling);
        }
        self.acc += self.step;
        if self.acc >= self.ceiling {
            self.done = true;
        }
        Some(self.acc.min(self.ceiling))
    }
}

/// Create the audio element and ask it to play. The fade starts once playback
/// actually begins.
pub fn start_music(config: &AudioConfig) -> Result<HtmlAudioElement, JsValue> {
    let audio = HtmlAudioElement::new_with_src(&config.src)?;
    audio.set_loop(config.looped);
    audio.set_volume(0.0);

    let promise = audio.play()?;
    let fading = audio.clone();
    let ramp = VolumeRamp::from_config(config);
    let interval_ms = config.fade_interval_ms as i32;
    wasm_bindgen_futures::spawn_local(async move {
        match JsFuture::from(promise).await {
            Ok(_) => {
                if let Err(err) = start_fade(fading, ramp, interval_ms) {
                    debug!(?err, "volume fade could not be scheduled");
                }
            }
            Err(err) => debug!(?err, "music playback rejected"),
        }
    });
    Ok(audio)
}

fn start_fade(audio: HtmlAudioElement, mut ramp: VolumeRamp, interval_ms: i32) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let handle: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let handle_in = handle.clone();
    let closure = Closure::wrap(Box::new(move || match ramp.next() {
        Some(volume) => audio.set_volume(volume),
        None => {
            if let (Some(w), Some(id)) = (window(), handle_in.take()) {
                w.clear_interval_with_handle(id);
            }
        }
    }) as Box<dyn FnMut()>);
    let id = win.set_interval_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        interval_ms,
    )?;
    handle.set(Some(id));
    closure.forget();
    Ok(())
}
