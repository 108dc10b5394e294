//! Audio and CRT effects for the Studio UB pages.
//!
//! Every effect is a plain state machine over virtual time: hosts feed it events
//! and call `advance(now)`, and it acts on audio channels or drawing surfaces it
//! is handed. The [`wasm`] module wires these cores to the browser.

pub mod audio;
pub mod cursor;
pub mod glitch;
pub mod hover;
pub mod noise;
pub mod playlist;
pub mod power_on;
pub mod timers;
pub mod typewriter;
pub mod wasm;

pub use audio::{AudioChannel, AudioFadeController, ChannelRegistry, Cue, Playback, PlaybackError};
pub use glitch::{EffectSchedule, GlitchEffect, Intensity, VisualAdapter, VisualChange};
pub use noise::{NoiseCanvasRenderer, NoiseConfig, Surface};
pub use playlist::{PlayerState, Playlist, TrackPlaylistPlayer};
pub use timers::{Millis, TimerId, TimerQueue};
