//! Heart Burst core crate.
//!
//! One-shot page celebration: the first click on the trigger button brings up the
//! overlay layers, fades in background music and pours a few thousand heart particles
//! out of the middle of the viewport.
//!
//! The timeline and the lifetime bookkeeping are plain Rust (see [`timeline`],
//! [`dispatch`], [`celebration`]) and run natively in tests. Everything that touches the
//! browser sits behind [`stage::Stage`] and lives in [`dom`], [`audio`] and [`math`].

use std::cell::{Cell, RefCell};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::window;

pub mod audio;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod dom;
pub mod math;
pub mod particle;
pub mod stage;
pub mod timeline;

pub use celebration::{Celebration, CelebrationState, TickReport, TriggerOutcome};
pub use config::{CelebrationConfig, ConfigError};
pub use particle::{ParamRange, ParticleSpawnRequest, Point, SpawnOverrides, SpawnProfile};
pub use timeline::{Phase, ScheduledSpawn, Timeline};

use clock::PerformanceClock;
use dom::DomStage;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

type PageCelebration = Celebration<DomStage, PerformanceClock>;
type FrameCallback = Closure<dyn FnMut(f64)>;

thread_local! {
    static CELEBRATION: RefCell<Option<PageCelebration>> = const { RefCell::new(None) };
    static FRAME_CALLBACK: RefCell<Option<FrameCallback>> = const { RefCell::new(None) };
    static LOOP_RUNNING: Cell<bool> = const { Cell::new(false) };
}

fn with_celebration<R>(f: impl FnOnce(&mut PageCelebration) -> R) -> Option<R> {
    CELEBRATION.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn seeded_rng() -> Result<StdRng, JsValue> {
    let mut seed = [0u8; 32];
    getrandom::getrandom(&mut seed).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(StdRng::from_seed(seed))
}

// -----------------------------------------------------------------------------
// Exported entrypoints
// -----------------------------------------------------------------------------

/// Wire the page with the default configuration.
#[wasm_bindgen]
pub fn install() -> Result<(), JsValue> {
    install_config(CelebrationConfig::default())
}

/// Wire the page with a JSON config merged over the defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn install_with_config(json: &str) -> Result<(), JsValue> {
    let config = CelebrationConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    install_config(config)
}

fn install_config(config: CelebrationConfig) -> Result<(), JsValue> {
    if CELEBRATION.with(|cell| cell.borrow().is_some()) {
        debug!("already installed");
        return Ok(());
    }
    config.validate().map_err(|e| JsValue::from_str(&e.to_string()))?;

    let stage = DomStage::new()?;
    if let Err(err) = stage.preload_hearts(&config.assets) {
        debug!(?err, "heart preload failed");
    }
    if config.math_autorender {
        math::install_hook(stage.window(), stage.document())?;
    }
    let wired = stage.wire_trigger(&config.layers, || {
        celebrate();
    })?;
    if !wired {
        debug!(selector = %config.layers.trigger_selector, "no trigger control on page");
    }

    let controller = Celebration::new(config, stage, PerformanceClock, seeded_rng()?);
    CELEBRATION.with(|cell| cell.replace(Some(controller)));
    info!("celebration installed");
    Ok(())
}

/// Trigger the celebration. Returns `true` only for the call that started it.
#[wasm_bindgen]
pub fn celebrate() -> bool {
    let outcome = with_celebration(|c| c.trigger());
    match outcome {
        Some(TriggerOutcome::Started { .. }) => {
            start_frame_loop();
            true
        }
        Some(TriggerOutcome::ReducedMotion) => true,
        Some(TriggerOutcome::AlreadyCelebrated) | None => false,
    }
}

/// Spawn a single heart at page coordinates.
#[wasm_bindgen]
pub fn spawn_heart(x: f64, y: f64) -> bool {
    let spawned = with_celebration(|c| c.spawn_one(Point::new(x, y), &SpawnOverrides::default()))
        .unwrap_or(false);
    if spawned {
        start_frame_loop();
    }
    spawned
}

#[wasm_bindgen]
pub fn has_celebrated() -> bool {
    with_celebration(|c| c.has_celebrated()).unwrap_or(false)
}

// -----------------------------------------------------------------------------
// Frame loop: ticks the controller until nothing is queued or alive
// -----------------------------------------------------------------------------

fn start_frame_loop() {
    if LOOP_RUNNING.with(|running| running.replace(true)) {
        return;
    }
    FRAME_CALLBACK.with(|cb| {
        let mut cb = cb.borrow_mut();
        if cb.is_none() {
            *cb = Some(Closure::wrap(Box::new(move |_ts: f64| on_frame()) as Box<dyn FnMut(f64)>));
        }
    });
    request_frame();
}

fn request_frame() {
    let request = FRAME_CALLBACK.with(|cb| match (window(), cb.borrow().as_ref()) {
        (Some(w), Some(cb)) => Some(w.request_animation_frame(cb.as_ref().unchecked_ref())),
        _ => None,
    });
    if !frame_scheduled(request) {
        LOOP_RUNNING.with(|running| running.set(false));
    }
}

/// `None` means there was no window or callback to ask with.
fn frame_scheduled<E: std::fmt::Debug>(request: Option<Result<i32, E>>) -> bool {
    match request {
        Some(Ok(_)) => true,
        Some(Err(err)) => {
            debug!(?err, "requestAnimationFrame failed");
            false
        }
        None => {
            debug!("no window, frame loop stopped");
            false
        }
    }
}

fn on_frame() {
    let idle = with_celebration(|c| {
        c.tick();
        c.is_idle()
    })
    .unwrap_or(true);
    if idle {
        LOOP_RUNNING.with(|running| running.set(false));
    } else {
        request_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_stops_unless_a_frame_was_scheduled() {
        assert!(frame_scheduled(Some(Ok::<i32, ()>(7))));
        assert!(!frame_scheduled(Some(Err("blocked"))));
        assert!(!frame_scheduled(None::<Result<i32, ()>>));
    }
}
