//! Audio channels, the channel registry and volume fades.

pub mod channel;
pub mod fade;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{clamp_volume, AudioChannel, Cue, Playback, PlaybackError};
pub use fade::{AudioFadeController, FADE_STEPS};
pub use registry::ChannelRegistry;
