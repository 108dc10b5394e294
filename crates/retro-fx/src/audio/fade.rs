//! Stepped volume ramps.
//!
//! A fade moves a channel's volume to a target in a fixed number of equal steps
//! spread over the fade duration. The step size is fixed when the fade starts.
//! Starting a fade on a channel cancels the one already running there, so each
//! channel has at most one.

use std::collections::HashMap;

use super::channel::{clamp_volume, Cue, Playback, PlaybackError};
use super::registry::ChannelRegistry;
use crate::timers::{Millis, TimerId, TimerQueue};

/// Volume steps per fade
pub const FADE_STEPS: u32 = 20;

#[derive(Debug, Clone, Copy)]
struct Fade {
    timer: TimerId,
    step: f64,
    target: f64,
    remaining: u32,
    interval: Millis,
}

#[derive(Debug)]
pub struct AudioFadeController {
    steps: u32,
    fades: HashMap<Cue, Fade>,
    timers: TimerQueue<Cue>,
}

impl Default for AudioFadeController {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFadeController {
    pub fn new() -> Self {
        Self::with_steps(FADE_STEPS)
    }

    pub fn with_steps(steps: u32) -> Self {
        Self {
            steps: steps.max(1),
            fades: HashMap::new(),
            timers: TimerQueue::new(),
        }
    }

    /// Ramp `cue` from its current volume to `target` over `duration` ms.
    /// Reaching a target of 0 pauses the channel. Returns false when no such
    /// channel is registered.
    pub fn fade_to<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        cue: Cue,
        target: f64,
        duration: Millis,
        now: Millis,
    ) -> bool {
        self.cancel(cue);
        let Some(channel) = registry.get_mut(cue) else {
            tracing::debug!("No '{}' channel to fade", cue.as_str());
            return false;
        };

        let target = clamp_volume(target);
        let step = (target - channel.volume()) / f64::from(self.steps);
        let interval = duration / Millis::from(self.steps);
        let timer = self.timers.schedule(now.saturating_add(interval), cue);
        self.fades.insert(
            cue,
            Fade {
                timer,
                step,
                target,
                remaining: self.steps,
                interval,
            },
        );
        true
    }

    /// Restart `cue` at volume 0 and ramp it up to `target`.
    ///
    /// When the platform refuses to start playback the channel stays silent, no
    /// ramp is scheduled and the refusal is returned for the caller to handle.
    pub fn fade_in<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        cue: Cue,
        target: f64,
        duration: Millis,
        now: Millis,
    ) -> Result<(), PlaybackError> {
        self.cancel(cue);
        let Some(channel) = registry.get_mut(cue) else {
            tracing::debug!("No '{}' channel to fade in", cue.as_str());
            return Ok(());
        };

        channel.set_volume(0.0);
        if let Err(e) = channel.play() {
            tracing::debug!("Fade-in of '{}' could not start: {}", cue.as_str(), e);
            return Err(e);
        }
        self.fade_to(registry, cue, target, duration, now);
        Ok(())
    }

    pub fn fade_out<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        cue: Cue,
        duration: Millis,
        now: Millis,
    ) -> bool {
        self.fade_to(registry, cue, 0.0, duration, now)
    }

    /// Rewind and start a one-shot cue. A refusal is logged and dropped.
    pub fn play_once<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        cue: Cue,
        volume: Option<f64>,
    ) -> bool {
        self.cancel(cue);
        let Some(channel) = registry.get_mut(cue) else {
            return false;
        };
        if let Some(volume) = volume {
            channel.set_volume(volume);
        }
        channel.rewind();
        match channel.play() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Cue '{}' failed: {}", cue.as_str(), e);
                false
            }
        }
    }

    /// Cancel the fade on `cue`, pause and rewind it.
    pub fn stop<P: Playback>(&mut self, registry: &mut ChannelRegistry<P>, cue: Cue) {
        self.cancel(cue);
        if let Some(channel) = registry.get_mut(cue) {
            channel.stop();
        }
    }

    /// Cancel the fade on `cue`, leaving its volume where it is.
    pub fn cancel(&mut self, cue: Cue) -> bool {
        match self.fades.remove(&cue) {
            Some(fade) => {
                self.timers.cancel(fade.timer);
                true
            }
            None => false,
        }
    }

    /// Cancel every fade.
    pub fn clear(&mut self) {
        self.fades.clear();
        self.timers.clear();
    }

    pub fn is_fading(&self, cue: Cue) -> bool {
        self.fades.contains_key(&cue)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    /// Run the fade steps due by `now`. Returns the channels whose fade finished.
    pub fn advance<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        now: Millis,
    ) -> Vec<Cue> {
        let mut finished = Vec::new();

        while let Some((_, at, cue)) = self.timers.pop_due(now) {
            let Some(fade) = self.fades.get_mut(&cue) else {
                continue;
            };
            let Some(channel) = registry.get_mut(cue) else {
                self.fades.remove(&cue);
                continue;
            };

            fade.remaining -= 1;
            if fade.remaining == 0 {
                let target = fade.target;
                self.fades.remove(&cue);
                channel.set_volume(target);
                if target == 0.0 {
                    channel.pause();
                }
                finished.push(cue);
            } else {
                channel.set_volume(channel.volume() + fade.step);
                fade.timer = self.timers.schedule(at.saturating_add(fade.interval), cue);
            }
        }

        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakePlayback;

    fn registry(volume: f64) -> (ChannelRegistry<FakePlayback>, FakePlayback) {
        let fake = FakePlayback::default();
        let mut registry = ChannelRegistry::new();
        registry.register(Cue::Ambient, fake.clone(), volume);
        (registry, fake)
    }

    fn volume(registry: &ChannelRegistry<FakePlayback>) -> f64 {
        registry.get(Cue::Ambient).unwrap().volume()
    }

    #[test]
    fn test_fade_out_reaches_zero_and_pauses() {
        let (mut registry, fake) = registry(0.8);
        let mut fades = AudioFadeController::new();
        registry.get_mut(Cue::Ambient).unwrap().play().unwrap();

        assert!(fades.fade_out(&mut registry, Cue::Ambient, 1000, 0));
        assert!(fades.advance(&mut registry, 999).is_empty());
        assert!(volume(&registry) > 0.0);

        assert_eq!(fades.advance(&mut registry, 1000), vec![Cue::Ambient]);
        assert_eq!(volume(&registry), 0.0);
        assert!(!fake.is_playing());
        assert_eq!(fades.pending_timers(), 0);
    }

    #[test]
    fn test_steps_are_equal_and_fixed_at_start() {
        let (mut registry, fake) = registry(0.0);
        let mut fades = AudioFadeController::with_steps(4);

        fades.fade_to(&mut registry, Cue::Ambient, 1.0, 400, 0);
        fades.advance(&mut registry, 400);

        // Initial write from registration, then one write per step
        let steps: Vec<f64> = fake.volumes().into_iter().skip(1).collect();
        assert_eq!(steps, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_each_step_waits_for_the_interval() {
        let (mut registry, _) = registry(0.0);
        let mut fades = AudioFadeController::with_steps(4);

        fades.fade_to(&mut registry, Cue::Ambient, 1.0, 400, 0);
        fades.advance(&mut registry, 150);
        assert_eq!(volume(&registry), 0.25);
        assert_eq!(fades.next_due(), Some(200));
    }

    #[test]
    fn test_new_fade_cancels_previous() {
        let (mut registry, _) = registry(1.0);
        let mut fades = AudioFadeController::new();

        fades.fade_to(&mut registry, Cue::Ambient, 0.0, 1000, 0);
        fades.advance(&mut registry, 500);
        fades.fade_to(&mut registry, Cue::Ambient, 1.0, 1000, 500);

        assert_eq!(fades.pending_timers(), 1);
        assert_eq!(fades.advance(&mut registry, 1500), vec![Cue::Ambient]);
        assert_eq!(volume(&registry), 1.0);
    }

    #[test]
    fn test_volume_stays_in_range() {
        let (mut registry, fake) = registry(0.5);
        let mut fades = AudioFadeController::new();

        fades.fade_to(&mut registry, Cue::Ambient, 7.0, 200, 0);
        fades.advance(&mut registry, 200);

        assert_eq!(volume(&registry), 1.0);
        assert!(fake.volumes().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_fade_in_restarts_from_silence() {
        let (mut registry, fake) = registry(0.6);
        let mut fades = AudioFadeController::new();

        fades.fade_in(&mut registry, Cue::Ambient, 0.4, 1000, 0).unwrap();
        assert!(fake.is_playing());
        assert_eq!(fake.volumes()[1], 0.0);

        fades.advance(&mut registry, 1000);
        assert!((volume(&registry) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_rejected_fade_in_stays_silent() {
        let (mut registry, fake) = registry(0.6);
        fake.set_blocked(true);
        let mut fades = AudioFadeController::new();

        let result = fades.fade_in(&mut registry, Cue::Ambient, 0.4, 1000, 0);

        assert_eq!(result, Err(PlaybackError::NotAllowed));
        assert_eq!(volume(&registry), 0.0);
        assert_eq!(fades.pending_timers(), 0);
    }

    #[test]
    fn test_zero_duration_completes_on_next_advance() {
        let (mut registry, _) = registry(1.0);
        let mut fades = AudioFadeController::new();

        fades.fade_out(&mut registry, Cue::Ambient, 0, 10);
        assert_eq!(fades.advance(&mut registry, 10), vec![Cue::Ambient]);
        assert_eq!(volume(&registry), 0.0);
    }

    #[test]
    fn test_fade_steps_near_the_end_of_the_clock_saturate() {
        let (mut registry, _) = registry(1.0);
        let mut fades = AudioFadeController::with_steps(2);

        fades.fade_out(&mut registry, Cue::Ambient, Millis::MAX, Millis::MAX - 10);
        assert_eq!(fades.next_due(), Some(Millis::MAX));
        assert!(fades.advance(&mut registry, Millis::MAX - 1).is_empty());
    }

    #[test]
    fn test_missing_channel() {
        let mut registry: ChannelRegistry<FakePlayback> = ChannelRegistry::new();
        let mut fades = AudioFadeController::new();
        assert!(!fades.fade_to(&mut registry, Cue::Hover, 1.0, 100, 0));
        assert!(!fades.play_once(&mut registry, Cue::Hover, None));
        assert_eq!(fades.pending_timers(), 0);
    }

    #[test]
    fn test_play_once_and_stop() {
        let (mut registry, fake) = registry(0.2);
        let mut fades = AudioFadeController::new();

        assert!(fades.play_once(&mut registry, Cue::Ambient, Some(0.7)));
        assert_eq!(fake.volume(), 0.7);
        assert_eq!(fake.rewinds(), 1);

        fades.fade_out(&mut registry, Cue::Ambient, 1000, 0);
        fades.stop(&mut registry, Cue::Ambient);
        assert!(!fades.is_fading(Cue::Ambient));
        assert!(!fake.is_playing());
        assert_eq!(fake.rewinds(), 2);
    }
}
