//! Short sound cue when the pointer moves onto an interactive element.

use crate::audio::{AudioFadeController, ChannelRegistry, Cue, Playback};
use crate::timers::{Millis, TimerId, TimerQueue};

pub const HOVER_VOLUME: f64 = 0.32;
/// Re-entering the same element sooner than this stays silent
pub const REPLAY_AFTER_MS: Millis = 800;
pub const AUTO_STOP_MS: Millis = 420;

#[derive(Debug, Default)]
pub struct HoverCue {
    last_element: Option<u64>,
    last_played: Option<Millis>,
    stop_timer: Option<TimerId>,
    timers: TimerQueue<()>,
}

impl HoverCue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pointer entered the interactive element `element`.
    /// Returns true when the cue was started.
    pub fn enter<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        element: u64,
        now: Millis,
    ) -> bool {
        let same = self.last_element == Some(element);
        let recent = self
            .last_played
            .is_some_and(|at| now.saturating_sub(at) <= REPLAY_AFTER_MS);
        if same && recent {
            return false;
        }

        self.last_element = Some(element);
        self.last_played = Some(now);
        if !fades.play_once(registry, Cue::Hover, Some(HOVER_VOLUME)) {
            return false;
        }

        if let Some(timer) = self.stop_timer.take() {
            self.timers.cancel(timer);
        }
        self.stop_timer = Some(self.timers.schedule(now.saturating_add(AUTO_STOP_MS), ()));
        true
    }

    /// The pointer left to somewhere that is not an interactive element.
    pub fn leave<P: Playback>(&mut self, registry: &mut ChannelRegistry<P>, fades: &mut AudioFadeController) {
        self.stop(registry, fades);
        self.last_element = None;
    }

    pub fn advance<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        now: Millis,
    ) {
        if self.timers.pop_due(now).is_some() {
            self.stop(registry, fades);
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn teardown<P: Playback>(&mut self, registry: &mut ChannelRegistry<P>, fades: &mut AudioFadeController) {
        self.leave(registry, fades);
        self.last_played = None;
    }

    fn stop<P: Playback>(&mut self, registry: &mut ChannelRegistry<P>, fades: &mut AudioFadeController) {
        self.timers.clear();
        self.stop_timer = None;
        fades.stop(registry, Cue::Hover);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakePlayback;

    fn setup() -> (ChannelRegistry<FakePlayback>, FakePlayback, AudioFadeController) {
        let fake = FakePlayback::default();
        let mut registry = ChannelRegistry::new();
        registry.register(Cue::Hover, fake.clone(), 0.0);
        (registry, fake, AudioFadeController::new())
    }

    #[test]
    fn test_same_element_is_debounced() {
        let (mut registry, fake, mut fades) = setup();
        let mut hover = HoverCue::new();

        assert!(hover.enter(&mut registry, &mut fades, 1, 0));
        assert_eq!(fake.volume(), HOVER_VOLUME);
        assert!(!hover.enter(&mut registry, &mut fades, 1, 800));
        assert!(hover.enter(&mut registry, &mut fades, 1, 801));
        assert_eq!(fake.plays(), 2);
    }

    #[test]
    fn test_new_element_plays_immediately() {
        let (mut registry, fake, mut fades) = setup();
        let mut hover = HoverCue::new();

        hover.enter(&mut registry, &mut fades, 1, 0);
        assert!(hover.enter(&mut registry, &mut fades, 2, 100));
        assert_eq!(fake.plays(), 2);
    }

    #[test]
    fn test_auto_stop_is_rearmed_by_each_start() {
        let (mut registry, fake, mut fades) = setup();
        let mut hover = HoverCue::new();

        hover.enter(&mut registry, &mut fades, 1, 0);
        hover.enter(&mut registry, &mut fades, 2, 300);
        assert_eq!(hover.pending_timers(), 1);
        assert_eq!(hover.next_due(), Some(720));

        hover.advance(&mut registry, &mut fades, 420);
        assert!(fake.is_playing());
        hover.advance(&mut registry, &mut fades, 720);
        assert!(!fake.is_playing());
        assert_eq!(hover.pending_timers(), 0);
    }

    #[test]
    fn test_leaving_stops_and_forgets_element() {
        let (mut registry, fake, mut fades) = setup();
        let mut hover = HoverCue::new();

        hover.enter(&mut registry, &mut fades, 1, 0);
        hover.leave(&mut registry, &mut fades);
        assert!(!fake.is_playing());
        assert_eq!(hover.pending_timers(), 0);

        // Forgotten, so the same element plays again right away
        assert!(hover.enter(&mut registry, &mut fades, 1, 100));
    }

    #[test]
    fn test_rejection_is_dropped() {
        let (mut registry, fake, mut fades) = setup();
        fake.set_blocked(true);
        let mut hover = HoverCue::new();

        assert!(!hover.enter(&mut registry, &mut fades, 1, 0));
        assert_eq!(fake.rejected(), 1);
        assert_eq!(hover.pending_timers(), 0);
    }
}
