//! Randomly timed TV glitches on a set of elements.
//!
//! [`EffectSchedule`] only computes timing and returns the [`VisualChange`]s to
//! make; a [`VisualAdapter`] applies them (CSS classes in the browser). Each
//! target runs its own chain: a first glitch after `[period, 2 * period)`, then
//! one every `[0.5 * period, 1.5 * period)`, each lasting a fixed time set by the
//! intensity. A host that stalls past several triggers gets one glitch per
//! target on its next advance, not the backlog.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::timers::{Millis, TimerQueue};

/// Marker set on a target while a glitch is showing
pub const ACTIVE_CLASS: &str = "tv-glitching";

/// Longest accepted period; larger values are clamped
pub const MAX_PERIOD_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    #[default]
    Low,
    Medium,
    High,
}

impl Intensity {
    /// How long one glitch stays visible
    pub fn duration(&self) -> Millis {
        match self {
            Self::Low => 150,
            Self::Medium => 250,
            Self::High => 300,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Low => "tv-glitch-low",
            Self::Medium => "tv-glitch-medium",
            Self::High => "tv-glitch-high",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum VisualChange {
    /// Mark the target with its intensity class
    Prepare { target: usize, intensity: Intensity },
    Activate { target: usize },
    Deactivate { target: usize },
    /// Remove both the active and the intensity markers
    Strip { target: usize, intensity: Intensity },
}

/// Applies visual changes to real elements.
pub trait VisualAdapter {
    fn apply(&mut self, change: VisualChange);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlitchEvent {
    Trigger(usize),
    Release(usize),
}

#[derive(Debug)]
pub struct EffectSchedule {
    intensity: Intensity,
    period: Millis,
    active: Vec<bool>,
    timers: TimerQueue<GlitchEvent>,
    rng: SmallRng,
}

impl EffectSchedule {
    pub fn new(seed: u64) -> Self {
        Self {
            intensity: Intensity::default(),
            period: 0,
            active: Vec::new(),
            timers: TimerQueue::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Start a chain for each of `targets` elements. Replaces any previous schedule.
    pub fn schedule(
        &mut self,
        targets: usize,
        intensity: Intensity,
        period_secs: f64,
        now: Millis,
    ) -> Vec<VisualChange> {
        let mut changes = self.teardown();
        if targets == 0 || !period_secs.is_finite() || period_secs <= 0.0 {
            return changes;
        }

        self.intensity = intensity;
        self.period = ((period_secs.min(MAX_PERIOD_SECS) * 1000.0) as Millis).max(1);
        self.active = vec![false; targets];

        for target in 0..targets {
            changes.push(VisualChange::Prepare { target, intensity });
            let delay = self.jitter(1.0, 2.0);
            self.timers
                .schedule(now.saturating_add(delay), GlitchEvent::Trigger(target));
        }
        changes
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    pub fn is_active(&self, target: usize) -> bool {
        self.active.get(target).copied().unwrap_or(false)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    pub fn advance(&mut self, now: Millis) -> Vec<VisualChange> {
        let mut changes = Vec::new();
        while let Some((_, at, event)) = self.timers.pop_due(now) {
            match event {
                GlitchEvent::Trigger(target) => {
                    let duration = self.intensity.duration();
                    // Missed entirely: show it now instead of replaying the backlog
                    let start = if at.saturating_add(duration) <= now { now } else { at };
                    self.active[target] = true;
                    changes.push(VisualChange::Activate { target });
                    self.timers
                        .schedule(start.saturating_add(duration), GlitchEvent::Release(target));

                    let delay = self.jitter(0.5, 1.5);
                    let mut next = start.saturating_add(delay);
                    if next <= now {
                        next = now.saturating_add(delay);
                    }
                    self.timers.schedule(next, GlitchEvent::Trigger(target));
                }
                GlitchEvent::Release(target) => {
                    self.active[target] = false;
                    changes.push(VisualChange::Deactivate { target });
                }
            }
        }
        changes
    }

    /// Cancel every chain and strip every marker.
    pub fn teardown(&mut self) -> Vec<VisualChange> {
        self.timers.clear();
        let intensity = self.intensity;
        let changes = (0..self.active.len())
            .map(|target| VisualChange::Strip { target, intensity })
            .collect();
        self.active.clear();
        changes
    }

    /// Uniform delay in `[low * period, high * period)`, at least 1 ms
    fn jitter(&mut self, low: f64, high: f64) -> Millis {
        let period = self.period as f64;
        (self.rng.random_range(low * period..high * period) as Millis).max(1)
    }
}

/// An [`EffectSchedule`] wired to the elements it animates.
pub struct GlitchEffect<A> {
    schedule: EffectSchedule,
    adapter: A,
}

impl<A: VisualAdapter> GlitchEffect<A> {
    /// `enabled = false` schedules nothing.
    pub fn start(
        adapter: A,
        targets: usize,
        intensity: Intensity,
        period_secs: f64,
        enabled: bool,
        now: Millis,
        seed: u64,
    ) -> Self {
        let mut effect = Self {
            schedule: EffectSchedule::new(seed),
            adapter,
        };
        if enabled {
            let changes = effect.schedule.schedule(targets, intensity, period_secs, now);
            effect.apply(changes);
        }
        effect
    }

    pub fn advance(&mut self, now: Millis) {
        let changes = self.schedule.advance(now);
        self.apply(changes);
    }

    pub fn teardown(&mut self) {
        let changes = self.schedule.teardown();
        self.apply(changes);
    }

    pub fn schedule(&self) -> &EffectSchedule {
        &self.schedule
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    fn apply(&mut self, changes: Vec<VisualChange>) {
        for change in changes {
            self.adapter.apply(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Tracks the classes on each target like `classList` would.
    #[derive(Debug, Default)]
    struct ClassRecorder {
        classes: Vec<BTreeSet<&'static str>>,
    }

    impl ClassRecorder {
        fn with_targets(n: usize) -> Self {
            Self {
                classes: vec![BTreeSet::new(); n],
            }
        }

        fn has(&self, target: usize, class: &str) -> bool {
            self.classes[target].contains(class)
        }
    }

    impl VisualAdapter for ClassRecorder {
        fn apply(&mut self, change: VisualChange) {
            match change {
                VisualChange::Prepare { target, intensity } => {
                    self.classes[target].insert(intensity.class_name());
                }
                VisualChange::Activate { target } => {
                    self.classes[target].insert(ACTIVE_CLASS);
                }
                VisualChange::Deactivate { target } => {
                    self.classes[target].remove(ACTIVE_CLASS);
                }
                VisualChange::Strip { target, intensity } => {
                    self.classes[target].remove(ACTIVE_CLASS);
                    self.classes[target].remove(intensity.class_name());
                }
            }
        }
    }

    #[test]
    fn test_first_glitch_within_one_to_two_periods() {
        for seed in 0..20 {
            let mut schedule = EffectSchedule::new(seed);
            schedule.schedule(1, Intensity::Low, 8.0, 0);
            let first = schedule.next_due().unwrap();
            assert!((8000..16_000).contains(&first), "first glitch at {}", first);
        }
    }

    #[test]
    fn test_glitch_duration_and_next_delay() {
        let mut schedule = EffectSchedule::new(3);
        schedule.schedule(1, Intensity::Medium, 2.0, 0);
        let first = schedule.next_due().unwrap();

        let changes = schedule.advance(first);
        assert_eq!(changes, vec![VisualChange::Activate { target: 0 }]);
        assert!(schedule.is_active(0));
        assert_eq!(schedule.pending_timers(), 2);

        let changes = schedule.advance(first + 250);
        assert!(changes.contains(&VisualChange::Deactivate { target: 0 }));
        assert!(!schedule.is_active(0));

        // The next trigger is the only timer left
        let next = schedule.next_due().unwrap() - first;
        assert!((1000..3000).contains(&next), "next glitch after {}", next);
    }

    #[test]
    fn test_chains_are_independent() {
        let mut schedule = EffectSchedule::new(8);
        schedule.schedule(4, Intensity::High, 5.0, 0);
        assert_eq!(schedule.pending_timers(), 4);

        let first = schedule.next_due().unwrap();
        let changes = schedule.advance(first);
        // Only the earliest target has fired
        assert_eq!(changes.len(), 1);
        assert_eq!(schedule.pending_timers(), 5);
    }

    #[test]
    fn test_teardown_leaves_nothing_behind() {
        let mut effect = GlitchEffect::start(
            ClassRecorder::with_targets(3),
            3,
            Intensity::High,
            1.0,
            true,
            0,
            21,
        );
        assert!(effect.adapter().has(0, "tv-glitch-high"));

        // Run until some target is mid-glitch
        let mut now = 0;
        while !(0..3).any(|t| effect.schedule().is_active(t)) {
            now = effect.schedule().next_due().unwrap();
            effect.advance(now);
        }

        effect.teardown();

        assert_eq!(effect.schedule().pending_timers(), 0);
        for target in 0..3 {
            assert!(!effect.schedule().is_active(target));
            assert!(!effect.adapter().has(target, ACTIVE_CLASS));
            assert!(!effect.adapter().has(target, "tv-glitch-high"));
        }

        effect.advance(now + 60_000);
        assert!(effect.adapter().classes.iter().all(|c| c.is_empty()));
    }

    #[test]
    fn test_disabled_or_empty_schedules_nothing() {
        let effect = GlitchEffect::start(ClassRecorder::with_targets(2), 2, Intensity::Low, 8.0, false, 0, 1);
        assert_eq!(effect.schedule().pending_timers(), 0);
        assert!(!effect.adapter().has(0, "tv-glitch-low"));

        let mut schedule = EffectSchedule::new(1);
        assert!(schedule.schedule(0, Intensity::Low, 8.0, 0).is_empty());
        assert_eq!(schedule.pending_timers(), 0);
    }

    #[test]
    fn test_stalled_host_gets_one_glitch_per_target() {
        let mut schedule = EffectSchedule::new(4);
        schedule.schedule(3, Intensity::Low, 1.0, 0);

        // A backgrounded tab wakes up long after many triggers were due
        let now = 1_000_000;
        let changes = schedule.advance(now);
        for target in 0..3 {
            let activations = changes
                .iter()
                .filter(|c| **c == VisualChange::Activate { target })
                .count();
            assert_eq!(activations, 1, "target {} in {:?}", target, changes);
            assert!(schedule.is_active(target));
        }
        assert_eq!(changes.len(), 3);
        assert!(schedule.next_due().unwrap() > now);

        let changes = schedule.advance(now + Intensity::Low.duration());
        assert_eq!(changes.len(), 3);
        assert!(changes.iter().all(|c| matches!(c, VisualChange::Deactivate { .. })));
    }

    #[test]
    fn test_huge_period_is_clamped() {
        let mut schedule = EffectSchedule::new(2);
        schedule.schedule(1, Intensity::Low, 1e20, 10);
        let first = schedule.next_due().unwrap();
        let max = (MAX_PERIOD_SECS * 1000.0) as Millis;
        assert!((10 + max..10 + 2 * max).contains(&first), "first glitch at {}", first);

        // Deadlines near the end of the clock saturate instead of overflowing
        schedule.schedule(1, Intensity::High, 1e20, Millis::MAX - 5);
        assert_eq!(schedule.next_due(), Some(Millis::MAX));
    }

    #[test]
    fn test_intensity_names() {
        assert_eq!(Intensity::parse("medium"), Some(Intensity::Medium));
        assert_eq!(Intensity::parse("extreme"), None);
        assert_eq!(Intensity::High.duration(), 300);
    }
}
