//! Browser bindings.
//!
//! The cores never touch the DOM. Each exported object records what the page
//! should do (audio commands, canvas draws, class changes) and the loader script
//! drains those records after every call. Results cross the boundary as JSON
//! strings or typed arrays.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::audio::{AudioFadeController, ChannelRegistry, Cue, Playback, PlaybackError};
use crate::cursor::CursorFollower;
use crate::glitch::{GlitchEffect, Intensity, VisualAdapter, VisualChange};
use crate::hover::HoverCue;
use crate::noise::{Layer, NoiseCanvasRenderer, NoiseConfig, Surface};
use crate::playlist::TrackPlaylistPlayer;
use crate::power_on::{PowerOnConfig, PowerOnSequence};
use crate::timers::Millis;
use crate::typewriter::{Typewriter, TypewriterOptions};

#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();
}

/// `performance.now()` as whole milliseconds
fn millis(now: f64) -> Millis {
    if now.is_finite() && now > 0.0 {
        now as Millis
    } else {
        0
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => serde_json::json!({ "error": format!("Failed to serialize: {}", e) }).to_string(),
    }
}

// ============================================================================
// Audio
// ============================================================================

/// One operation for the page to run on an `<audio>` element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum AudioCommand {
    Play { cue: Cue },
    Pause { cue: Cue },
    Rewind { cue: Cue },
    Volume { cue: Cue, value: f64 },
    Source { cue: Cue, src: String },
    Loop { cue: Cue, looping: bool },
}

type CommandQueue = Rc<RefCell<Vec<AudioCommand>>>;

/// Playback that queues commands instead of playing.
///
/// The browser's `play()` settles asynchronously, so a start is taken as
/// accepted here and a later refusal comes back through [`StudioAudio::play_rejected`].
#[derive(Debug, Clone)]
pub struct CommandPlayback {
    cue: Cue,
    queue: CommandQueue,
}

impl CommandPlayback {
    fn push(&self, command: AudioCommand) {
        self.queue.borrow_mut().push(command);
    }
}

impl Playback for CommandPlayback {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.push(AudioCommand::Play { cue: self.cue });
        Ok(())
    }

    fn pause(&mut self) {
        self.push(AudioCommand::Pause { cue: self.cue });
    }

    fn rewind(&mut self) {
        self.push(AudioCommand::Rewind { cue: self.cue });
    }

    fn set_volume(&mut self, volume: f64) {
        self.push(AudioCommand::Volume { cue: self.cue, value: volume });
    }

    fn set_source(&mut self, src: &str) {
        self.push(AudioCommand::Source {
            cue: self.cue,
            src: src.to_string(),
        });
    }

    fn set_looping(&mut self, looping: bool) {
        self.push(AudioCommand::Loop { cue: self.cue, looping });
    }
}

/// Every sound on a page: the power-on cues, hover, typing and admin music.
#[wasm_bindgen]
pub struct StudioAudio {
    queue: CommandQueue,
    registry: ChannelRegistry<CommandPlayback>,
    fades: AudioFadeController,
    player: TrackPlaylistPlayer,
    power_on: Option<PowerOnSequence>,
    hover: HoverCue,
    typewriter: Option<Typewriter>,
    seed: u64,
}

#[wasm_bindgen]
impl StudioAudio {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32) -> StudioAudio {
        let seed = u64::from(seed);
        StudioAudio {
            queue: Rc::default(),
            registry: ChannelRegistry::new(),
            fades: AudioFadeController::new(),
            player: TrackPlaylistPlayer::new(seed),
            power_on: None,
            hover: HoverCue::new(),
            typewriter: None,
            seed,
        }
    }

    /// Attach the page's element for `cue`. Returns false for an unknown cue name.
    pub fn register(&mut self, cue: &str, volume: f64) -> bool {
        let Some(cue) = Cue::parse(cue) else {
            tracing::warn!("Unknown sound cue '{}'", cue);
            return false;
        };
        let playback = CommandPlayback {
            cue,
            queue: Rc::clone(&self.queue),
        };
        self.registry.register(cue, playback, volume);
        true
    }

    /// `config_json` may be empty for the defaults.
    pub fn power_on(&mut self, config_json: &str, now: f64) {
        let config = if config_json.trim().is_empty() {
            PowerOnConfig::default()
        } else {
            serde_json::from_str(config_json).unwrap_or_else(|e| {
                tracing::warn!("Bad power-on config, using defaults: {}", e);
                PowerOnConfig::default()
            })
        };
        if let Some(mut previous) = self.power_on.take() {
            previous.teardown(&mut self.registry);
        }
        self.power_on = Some(PowerOnSequence::start(config, &mut self.registry, millis(now)));
    }

    pub fn play_cue(&mut self, cue: &str) -> bool {
        match Cue::parse(cue) {
            Some(cue) => self.fades.play_once(&mut self.registry, cue, None),
            None => false,
        }
    }

    pub fn load_music(&mut self, body: &str, now: f64) {
        self.player.load(&mut self.registry, &mut self.fades, body, millis(now));
    }

    pub fn music_failed(&mut self, reason: &str) {
        self.player.load_failed(reason);
    }

    pub fn set_music_volume(&mut self, volume: f64) {
        self.player.set_volume(&mut self.registry, &self.fades, volume);
    }

    pub fn skip_track(&mut self, now: f64) {
        self.player.skip(&mut self.registry, &mut self.fades, millis(now));
    }

    pub fn current_track(&self) -> Option<String> {
        self.player.current_track().map(str::to_string)
    }

    pub fn wants_interaction(&self) -> bool {
        self.player.wants_interaction()
    }

    pub fn interaction(&mut self, now: f64) {
        self.player.on_interaction(&mut self.registry, &mut self.fades, millis(now));
    }

    /// The page's `play()` promise for `cue` was rejected.
    pub fn play_rejected(&mut self, cue: &str) {
        match Cue::parse(cue) {
            Some(Cue::Ambient) => self.player.on_play_rejected(&mut self.registry, &mut self.fades),
            Some(cue) => {
                tracing::debug!("Cue '{}' was blocked", cue.as_str());
                if let Some(channel) = self.registry.get_mut(cue) {
                    channel.mark_ended();
                }
            }
            None => {}
        }
    }

    /// The element for `cue` fired `ended`.
    pub fn ended(&mut self, cue: &str, now: f64) {
        match Cue::parse(cue) {
            Some(Cue::Ambient) => {
                self.player
                    .on_track_ended(&mut self.registry, &mut self.fades, millis(now))
            }
            Some(cue) => {
                if let Some(channel) = self.registry.get_mut(cue) {
                    channel.mark_ended();
                }
            }
            None => {}
        }
    }

    pub fn hover_enter(&mut self, element: u32, now: f64) -> bool {
        self.hover
            .enter(&mut self.registry, &mut self.fades, u64::from(element), millis(now))
    }

    pub fn hover_leave(&mut self) {
        self.hover.leave(&mut self.registry, &mut self.fades);
    }

    /// Start typing `text`, replacing any typing already running.
    pub fn type_text(&mut self, text: &str, start_delay: f64, loading_dots: bool, now: f64) {
        if let Some(mut previous) = self.typewriter.take() {
            previous.teardown(&mut self.registry, &mut self.fades);
        }
        let options = TypewriterOptions {
            start_delay: millis(start_delay),
            loading_dots,
        };
        self.seed = self.seed.wrapping_add(1);
        self.typewriter = Some(Typewriter::new(text, options, millis(now), self.seed));
    }

    pub fn typed_text(&self) -> String {
        self.typewriter.as_ref().map(Typewriter::visible).unwrap_or_default()
    }

    pub fn show_dots(&self) -> bool {
        self.typewriter.as_ref().is_some_and(Typewriter::show_dots)
    }

    /// Run everything due by `now`. Returns true when typing finished on this call.
    pub fn advance(&mut self, now: f64) -> bool {
        let now = millis(now);
        let finished = self.fades.advance(&mut self.registry, now);
        self.player
            .advance(&mut self.registry, &mut self.fades, &finished, now);
        if let Some(power_on) = self.power_on.as_mut() {
            power_on.advance(&mut self.registry, &mut self.fades, now);
        }
        self.hover.advance(&mut self.registry, &mut self.fades, now);
        match self.typewriter.as_mut() {
            Some(typewriter) => typewriter.advance(&mut self.registry, &mut self.fades, now),
            None => false,
        }
    }

    /// Earliest pending deadline across every core
    pub fn next_due(&self) -> Option<f64> {
        [
            self.fades.next_due(),
            self.power_on.as_ref().and_then(PowerOnSequence::next_due),
            self.hover.next_due(),
            self.typewriter.as_ref().and_then(Typewriter::next_due),
        ]
        .into_iter()
        .flatten()
        .min()
        .map(|at| at as f64)
    }

    /// Queued element commands as a JSON array, oldest first.
    pub fn take_commands(&mut self) -> String {
        let commands = std::mem::take(&mut *self.queue.borrow_mut());
        to_json(&commands)
    }

    pub fn teardown(&mut self) {
        self.player.teardown(&mut self.registry, &mut self.fades);
        if let Some(power_on) = self.power_on.as_mut() {
            power_on.teardown(&mut self.registry);
        }
        self.hover.teardown(&mut self.registry, &mut self.fades);
        if let Some(typewriter) = self.typewriter.as_mut() {
            typewriter.teardown(&mut self.registry, &mut self.fades);
        }
        self.fades.clear();
    }
}

// ============================================================================
// Noise canvases
// ============================================================================

/// Surface that keeps this frame's drawing for the page to replay.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    width: f64,
    height: f64,
    resized: bool,
    rects: Vec<f64>,
    pixels: Vec<u8>,
}

impl Surface for FrameBuffer {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.resized = true;
    }

    fn clear(&mut self) {
        self.rects.clear();
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.rects.extend_from_slice(&[x, y, width, height]);
    }

    fn put_pixels(&mut self, _width: u32, _height: u32, pixels: &[u32]) {
        self.pixels.clear();
        self.pixels.extend(pixels.iter().flat_map(|p| p.to_le_bytes()));
    }
}

#[wasm_bindgen]
pub struct NoiseCanvas {
    renderer: NoiseCanvasRenderer<FrameBuffer>,
}

#[wasm_bindgen]
impl NoiseCanvas {
    /// `config_json` may be empty for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, seed: u32) -> NoiseCanvas {
        let config = if config_json.trim().is_empty() {
            NoiseConfig::default()
        } else {
            serde_json::from_str(config_json).unwrap_or_else(|e| {
                tracing::warn!("Bad noise config, using defaults: {}", e);
                NoiseConfig::default()
            })
        };
        NoiseCanvas {
            renderer: NoiseCanvasRenderer::new(
                config,
                FrameBuffer::default(),
                FrameBuffer::default(),
                u64::from(seed),
            ),
        }
    }

    pub fn start(&mut self, width: f64, height: f64, now: f64) {
        self.renderer.start(width, height, millis(now));
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.renderer.resize(width, height);
    }

    /// Returns the number of frames drawn.
    pub fn advance(&mut self, now: f64) -> usize {
        self.renderer.advance(millis(now))
    }

    pub fn next_due(&self) -> Option<f64> {
        self.renderer.next_due().map(|at| at as f64)
    }

    /// Tracking dots as flattened `[x, y, w, h, ...]`. Empty when nothing new was drawn.
    pub fn take_tracking(&mut self) -> Vec<f64> {
        self.renderer
            .surface_mut(Layer::Tracking)
            .map(|s| std::mem::take(&mut s.rects))
            .unwrap_or_default()
    }

    /// The latest snow frame as RGBA bytes at half the container size.
    pub fn take_snow(&mut self) -> Vec<u8> {
        self.renderer
            .surface_mut(Layer::Snow)
            .map(|s| std::mem::take(&mut s.pixels))
            .unwrap_or_default()
    }

    pub fn snow_width(&self) -> u32 {
        self.renderer.snow_surface().map_or(0, |s| s.width as u32)
    }

    pub fn snow_height(&self) -> u32 {
        self.renderer.snow_surface().map_or(0, |s| s.height as u32)
    }

    pub fn teardown(&mut self) {
        self.renderer.teardown();
    }
}

// ============================================================================
// Glitches
// ============================================================================

#[derive(Debug, Default)]
pub struct ChangeQueue(Vec<VisualChange>);

impl VisualAdapter for ChangeQueue {
    fn apply(&mut self, change: VisualChange) {
        self.0.push(change);
    }
}

#[wasm_bindgen]
pub struct Glitches {
    effect: GlitchEffect<ChangeQueue>,
}

#[wasm_bindgen]
impl Glitches {
    /// Unknown intensity names fall back to low.
    #[wasm_bindgen(constructor)]
    pub fn new(targets: usize, intensity: &str, period_secs: f64, enabled: bool, now: f64, seed: u32) -> Glitches {
        let intensity = Intensity::parse(intensity).unwrap_or_default();
        Glitches {
            effect: GlitchEffect::start(
                ChangeQueue::default(),
                targets,
                intensity,
                period_secs,
                enabled,
                millis(now),
                u64::from(seed),
            ),
        }
    }

    pub fn advance(&mut self, now: f64) {
        self.effect.advance(millis(now));
    }

    pub fn next_due(&self) -> Option<f64> {
        self.effect.schedule().next_due().map(|at| at as f64)
    }

    /// Class changes as a JSON array of `{op, target, intensity?}`.
    pub fn take_changes(&mut self) -> String {
        let changes = std::mem::take(&mut self.effect.adapter_mut().0);
        to_json(&changes)
    }

    pub fn teardown(&mut self) {
        self.effect.teardown();
    }
}

// ============================================================================
// Cursor
// ============================================================================

#[wasm_bindgen]
pub struct Cursor {
    follower: CursorFollower,
}

#[wasm_bindgen]
impl Cursor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Cursor {
        Cursor {
            follower: CursorFollower::default(),
        }
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.follower.pointer_moved(x, y);
    }

    /// Position to draw on this frame as `[x, y]`
    pub fn frame(&mut self) -> Vec<f64> {
        let at = self.follower.frame();
        vec![at.x, at.y]
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}
