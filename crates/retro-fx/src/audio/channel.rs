use serde::{Deserialize, Serialize};

/// Why the platform refused to start playback
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// Autoplay policy: needs a user gesture first
    #[error("playback blocked until the user interacts with the page")]
    NotAllowed,
    #[error("playback failed: {0}")]
    Failed(String),
}

/// The platform side of one audio element.
pub trait Playback {
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    /// Seek back to the start
    fn rewind(&mut self);
    fn set_volume(&mut self, volume: f64);
    fn set_source(&mut self, src: &str);
    fn set_looping(&mut self, looping: bool);
}

/// Named sound cues owned by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cue {
    TurnOn,
    Noise,
    Button,
    Click,
    Typewriter,
    Hover,
    Ambient,
}

impl Cue {
    pub const ALL: [Cue; 7] = [
        Cue::TurnOn,
        Cue::Noise,
        Cue::Button,
        Cue::Click,
        Cue::Typewriter,
        Cue::Hover,
        Cue::Ambient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TurnOn => "turn-on",
            Self::Noise => "noise",
            Self::Button => "button",
            Self::Click => "click",
            Self::Typewriter => "typewriter",
            Self::Hover => "hover",
            Self::Ambient => "ambient",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cue| cue.as_str() == name)
    }
}

/// One playback unit and the volume the effects believe it has.
#[derive(Debug)]
pub struct AudioChannel<P> {
    playback: P,
    volume: f64,
    playing: bool,
}

impl<P: Playback> AudioChannel<P> {
    pub fn new(mut playback: P, volume: f64) -> Self {
        let volume = clamp_volume(volume);
        playback.set_volume(volume);
        Self {
            playback,
            volume,
            playing: false,
        }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = clamp_volume(volume);
        self.playback.set_volume(self.volume);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) -> Result<(), PlaybackError> {
        self.playback.play()?;
        self.playing = true;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.playback.pause();
        self.playing = false;
    }

    /// Pause and seek back to the start.
    pub fn stop(&mut self) {
        self.pause();
        self.playback.rewind();
    }

    pub fn rewind(&mut self) {
        self.playback.rewind();
    }

    pub fn set_source(&mut self, src: &str) {
        self.playing = false;
        self.playback.set_source(src);
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.playback.set_looping(looping);
    }

    /// The media element reached its end on its own.
    pub fn mark_ended(&mut self) {
        self.playing = false;
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }
}

/// NaN counts as silence.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
