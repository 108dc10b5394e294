//! Character-by-character text reveal with its typing sound.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::audio::{AudioFadeController, ChannelRegistry, Cue, Playback};
use crate::timers::{Millis, TimerQueue};

/// Shortest gap between characters; up to `TYPE_JITTER_MS` more is added
pub const TYPE_BASE_MS: Millis = 50;
pub const TYPE_JITTER_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypewriterOptions {
    pub start_delay: Millis,
    /// Show the trailing "..." animation once the text is typed
    pub loading_dots: bool,
}

#[derive(Debug)]
pub struct Typewriter {
    chars: Vec<char>,
    revealed: usize,
    options: TypewriterOptions,
    show_dots: bool,
    done: bool,
    timers: TimerQueue<Step>,
    rng: SmallRng,
}

impl Typewriter {
    pub fn new(text: &str, options: TypewriterOptions, now: Millis, seed: u64) -> Self {
        let mut timers = TimerQueue::new();
        timers.schedule(now.saturating_add(options.start_delay), Step::Start);
        Self {
            chars: text.chars().collect(),
            revealed: 0,
            options,
            show_dots: false,
            done: false,
            timers,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// The part of the text shown so far
    pub fn visible(&self) -> String {
        self.chars[..self.revealed].iter().collect()
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn show_dots(&self) -> bool {
        self.show_dots
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    /// Run the steps due by `now`. Returns true exactly once, when typing completes.
    pub fn advance<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        now: Millis,
    ) -> bool {
        let mut completed = false;
        while let Some((_, at, step)) = self.timers.pop_due(now) {
            match step {
                Step::Start => {
                    fades.play_once(registry, Cue::Typewriter, None);
                    self.type_next(at);
                }
                Step::Type => {
                    if self.revealed < self.chars.len() {
                        self.type_next(at);
                    } else {
                        self.finish(registry, fades);
                        completed = true;
                    }
                }
            }
        }
        completed
    }

    pub fn teardown<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
    ) {
        self.timers.clear();
        fades.stop(registry, Cue::Typewriter);
    }

    fn type_next(&mut self, at: Millis) {
        if self.revealed < self.chars.len() {
            self.revealed += 1;
        }
        let delay = TYPE_BASE_MS + (self.rng.random::<f64>() * TYPE_JITTER_MS) as Millis;
        self.timers.schedule(at.saturating_add(delay), Step::Type);
    }

    fn finish<P: Playback>(&mut self, registry: &mut ChannelRegistry<P>, fades: &mut AudioFadeController) {
        fades.stop(registry, Cue::Typewriter);
        self.show_dots = self.options.loading_dots;
        self.done = true;
        tracing::debug!("Typed {} characters", self.revealed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakePlayback;

    fn setup() -> (ChannelRegistry<FakePlayback>, FakePlayback, AudioFadeController) {
        let fake = FakePlayback::default();
        let mut registry = ChannelRegistry::new();
        registry.register(Cue::Typewriter, fake.clone(), 0.25);
        (registry, fake, AudioFadeController::new())
    }

    fn run_to_end(
        typewriter: &mut Typewriter,
        registry: &mut ChannelRegistry<FakePlayback>,
        fades: &mut AudioFadeController,
    ) -> usize {
        let mut completions = 0;
        while let Some(at) = typewriter.next_due() {
            if typewriter.advance(registry, fades, at) {
                completions += 1;
            }
        }
        completions
    }

    #[test]
    fn test_waits_for_start_delay() {
        let (mut registry, fake, mut fades) = setup();
        let options = TypewriterOptions {
            start_delay: 500,
            loading_dots: false,
        };
        let mut typewriter = Typewriter::new("Bonjour", options, 0, 1);

        typewriter.advance(&mut registry, &mut fades, 499);
        assert_eq!(typewriter.visible(), "");
        assert_eq!(fake.plays(), 0);

        typewriter.advance(&mut registry, &mut fades, 500);
        assert_eq!(typewriter.visible(), "B");
        assert!(fake.is_playing());
    }

    #[test]
    fn test_character_delays_are_jittered_within_bounds() {
        let (mut registry, _, mut fades) = setup();
        let mut typewriter = Typewriter::new("magnétoscope", TypewriterOptions::default(), 0, 7);
        typewriter.advance(&mut registry, &mut fades, 0);

        let mut last = 0;
        while typewriter.revealed() < 12 {
            let at = typewriter.next_due().unwrap();
            let gap = at - last;
            assert!((50..150).contains(&gap), "gap {}", gap);
            typewriter.advance(&mut registry, &mut fades, at);
            last = at;
        }
        assert_eq!(typewriter.visible(), "magnétoscope");
    }

    #[test]
    fn test_completion_stops_cue_and_reports_once() {
        let (mut registry, fake, mut fades) = setup();
        let options = TypewriterOptions {
            start_delay: 0,
            loading_dots: true,
        };
        let mut typewriter = Typewriter::new("UB", options, 0, 3);

        assert_eq!(run_to_end(&mut typewriter, &mut registry, &mut fades), 1);
        assert!(typewriter.is_done());
        assert!(typewriter.show_dots());
        assert!(!fake.is_playing());
        // Once when the cue starts, once after it stops
        assert_eq!(fake.rewinds(), 2);
        assert_eq!(typewriter.pending_timers(), 0);
    }

    #[test]
    fn test_dots_stay_hidden_unless_enabled() {
        let (mut registry, _, mut fades) = setup();
        let mut typewriter = Typewriter::new("x", TypewriterOptions::default(), 0, 3);
        run_to_end(&mut typewriter, &mut registry, &mut fades);
        assert!(typewriter.is_done());
        assert!(!typewriter.show_dots());
    }

    #[test]
    fn test_teardown_mid_typing() {
        let (mut registry, fake, mut fades) = setup();
        let mut typewriter = Typewriter::new("Studio", TypewriterOptions::default(), 0, 5);
        typewriter.advance(&mut registry, &mut fades, 0);
        assert!(fake.is_playing());

        typewriter.teardown(&mut registry, &mut fades);

        assert_eq!(typewriter.pending_timers(), 0);
        assert!(!fake.is_playing());
        assert!(!typewriter.advance(&mut registry, &mut fades, 10_000));
        assert_eq!(typewriter.visible(), "S");
    }

    #[test]
    fn test_empty_text_completes() {
        let (mut registry, _, mut fades) = setup();
        let mut typewriter = Typewriter::new("", TypewriterOptions::default(), 0, 5);
        assert_eq!(run_to_end(&mut typewriter, &mut registry, &mut fades), 1);
        assert_eq!(typewriter.visible(), "");
    }
}
