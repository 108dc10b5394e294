//! The TV switching on: turn-on thump, then the looping static hiss.

use serde::Deserialize;

use crate::audio::{AudioFadeController, ChannelRegistry, Cue, Playback};
use crate::timers::{Millis, TimerQueue};

/// Starting volume of each cue the sequence owns
pub const CUE_VOLUMES: [(Cue, f64); 5] = [
    (Cue::TurnOn, 0.5),
    (Cue::Noise, 0.3),
    (Cue::Button, 0.4),
    (Cue::Click, 0.3),
    (Cue::Typewriter, 0.25),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PowerOnConfig {
    pub autoplay: bool,
    pub turn_on_delay: Millis,
    pub noise_delay: Millis,
}

impl Default for PowerOnConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            turn_on_delay: 1500,
            noise_delay: 1500,
        }
    }
}

#[derive(Debug)]
pub struct PowerOnSequence {
    config: PowerOnConfig,
    timers: TimerQueue<Cue>,
}

impl PowerOnSequence {
    /// Apply the cue volumes and, with autoplay on, schedule both cues.
    pub fn start<P: Playback>(config: PowerOnConfig, registry: &mut ChannelRegistry<P>, now: Millis) -> Self {
        for (cue, volume) in CUE_VOLUMES {
            if let Some(channel) = registry.get_mut(cue) {
                channel.set_volume(volume);
            }
        }
        if let Some(noise) = registry.get_mut(Cue::Noise) {
            noise.set_looping(true);
        }

        let mut timers = TimerQueue::new();
        if config.autoplay {
            timers.schedule(now.saturating_add(config.turn_on_delay), Cue::TurnOn);
            timers.schedule(now.saturating_add(config.noise_delay), Cue::Noise);
        }
        Self { config, timers }
    }

    pub fn config(&self) -> &PowerOnConfig {
        &self.config
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn advance<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        now: Millis,
    ) {
        while let Some((_, _, cue)) = self.timers.pop_due(now) {
            fades.play_once(registry, cue, None);
        }
    }

    /// Cancel both timers and silence both cues.
    pub fn teardown<P: Playback>(&mut self, registry: &mut ChannelRegistry<P>) {
        self.timers.clear();
        for cue in [Cue::TurnOn, Cue::Noise] {
            if let Some(channel) = registry.get_mut(cue) {
                channel.pause();
            }
        }
    }
}
