//! Recording playback fake shared by the audio tests.

use std::cell::RefCell;
use std::rc::Rc;

use super::channel::{Playback, PlaybackError};

#[derive(Debug, Default)]
struct Log {
    volume: f64,
    playing: bool,
    blocked: bool,
    looping: bool,
    source: Option<String>,
    plays: usize,
    rejected: usize,
    pauses: usize,
    rewinds: usize,
    volumes: Vec<f64>,
}

/// Clones share one log, so a test can keep a handle after the registry takes ownership.
#[derive(Debug, Clone, Default)]
pub struct FakePlayback {
    log: Rc<RefCell<Log>>,
}

impl FakePlayback {
    pub fn blocked() -> Self {
        let fake = Self::default();
        fake.set_blocked(true);
        fake
    }

    pub fn set_blocked(&self, blocked: bool) {
        self.log.borrow_mut().blocked = blocked;
    }

    pub fn volume(&self) -> f64 {
        self.log.borrow().volume
    }

    /// Every volume written, in order
    pub fn volumes(&self) -> Vec<f64> {
        self.log.borrow().volumes.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.log.borrow().playing
    }

    pub fn is_looping(&self) -> bool {
        self.log.borrow().looping
    }

    pub fn source(&self) -> Option<String> {
        self.log.borrow().source.clone()
    }

    pub fn plays(&self) -> usize {
        self.log.borrow().plays
    }

    pub fn rejected(&self) -> usize {
        self.log.borrow().rejected
    }

    pub fn pauses(&self) -> usize {
        self.log.borrow().pauses
    }

    pub fn rewinds(&self) -> usize {
        self.log.borrow().rewinds
    }
}

impl Playback for FakePlayback {
    fn play(&mut self) -> Result<(), PlaybackError> {
        let mut log = self.log.borrow_mut();
        if log.blocked {
            log.rejected += 1;
            return Err(PlaybackError::NotAllowed);
        }
        log.plays += 1;
        log.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        let mut log = self.log.borrow_mut();
        log.pauses += 1;
        log.playing = false;
    }

    fn rewind(&mut self) {
        self.log.borrow_mut().rewinds += 1;
    }

    fn set_volume(&mut self, volume: f64) {
        let mut log = self.log.borrow_mut();
        log.volume = volume;
        log.volumes.push(volume);
    }

    fn set_source(&mut self, src: &str) {
        let mut log = self.log.borrow_mut();
        log.source = Some(src.to_string());
        log.playing = false;
    }

    fn set_looping(&mut self, looping: bool) {
        self.log.borrow_mut().looping = looping;
    }
}
