//! The one place audio channels live.
//!
//! Created once at start-up and lent (`&mut`) to each effect that plays sound,
//! so no effect looks channels up globally.

use std::collections::BTreeMap;

use super::channel::{AudioChannel, Cue, Playback};

#[derive(Debug)]
pub struct ChannelRegistry<P> {
    channels: BTreeMap<Cue, AudioChannel<P>>,
}

impl<P> Default for ChannelRegistry<P> {
    fn default() -> Self {
        Self {
            channels: BTreeMap::new(),
        }
    }
}

impl<P: Playback> ChannelRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the channel for `cue`.
    pub fn register(&mut self, cue: Cue, playback: P, volume: f64) {
        if self
            .channels
            .insert(cue, AudioChannel::new(playback, volume))
            .is_some()
        {
            tracing::debug!("Replaced audio channel '{}'", cue.as_str());
        }
    }

    pub fn get(&self, cue: Cue) -> Option<&AudioChannel<P>> {
        self.channels.get(&cue)
    }

    pub fn get_mut(&mut self, cue: Cue) -> Option<&mut AudioChannel<P>> {
        self.channels.get_mut(&cue)
    }

    pub fn contains(&self, cue: Cue) -> bool {
        self.channels.contains_key(&cue)
    }

    pub fn cues(&self) -> impl Iterator<Item = Cue> + '_ {
        self.channels.keys().copied()
    }

    /// Pause every channel.
    pub fn pause_all(&mut self) {
        for channel in self.channels.values_mut() {
            channel.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakePlayback;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ChannelRegistry::new();
        registry.register(Cue::Click, FakePlayback::default(), 0.3);

        assert!(registry.contains(Cue::Click));
        assert!(registry.get(Cue::Hover).is_none());
        assert_eq!(registry.get(Cue::Click).map(|c| c.volume()), Some(0.3));
        assert_eq!(registry.cues().collect::<Vec<_>>(), vec![Cue::Click]);
    }

    #[test]
    fn test_pause_all() {
        let mut registry = ChannelRegistry::new();
        let a = FakePlayback::default();
        let b = FakePlayback::default();
        registry.register(Cue::Noise, a.clone(), 0.3);
        registry.register(Cue::Ambient, b.clone(), 0.1);
        for cue in [Cue::Noise, Cue::Ambient] {
            registry.get_mut(cue).unwrap().play().unwrap();
        }

        registry.pause_all();

        assert!(!a.is_playing());
        assert!(!b.is_playing());
    }
}
