//! Admin background music.
//!
//! The player loads a track listing, shuffles it and plays tracks back to back on
//! the ambient channel, never repeating a track immediately when it has a choice.
//! Track changes cross-fade: the outgoing track fades to silence, then the source
//! is swapped and the incoming track fades in.
//!
//! Autoplay may be refused until the visitor interacts with the page. The player
//! then waits in [`PlayerState::AwaitingInteraction`] and retries on the first
//! pointer or key event.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::audio::{AudioFadeController, ChannelRegistry, Cue, Playback};
use crate::timers::Millis;

pub const DEFAULT_VOLUME: f64 = 0.1;
pub const DEFAULT_CROSSFADE_MS: Millis = 1000;

/// Browser events that count as the user interacting with the page
pub const INTERACTION_EVENTS: [&str; 2] = ["pointerdown", "keydown"];

/// Track URLs from a `{ "tracks": [...] }` listing body.
///
/// Non-string and blank entries are dropped, a leading `/` is ensured and
/// duplicates are removed keeping the first occurrence. Anything unparsable
/// yields an empty list.
pub fn parse_listing(body: &str) -> Vec<String> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Unreadable track listing: {}", e);
            return Vec::new();
        }
    };
    let Some(entries) = value.get("tracks").and_then(|t| t.as_array()) else {
        return Vec::new();
    };

    let mut tracks: Vec<String> = Vec::new();
    for track in entries.iter().filter_map(|t| t.as_str()) {
        if track.trim().is_empty() {
            continue;
        }
        let track = if track.starts_with('/') {
            track.to_string()
        } else {
            format!("/{}", track)
        };
        if !tracks.contains(&track) {
            tracks.push(track);
        }
    }
    tracks
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Playlist {
    tracks: Vec<String>,
    current: Option<usize>,
}

impl Playlist {
    /// Shuffle `tracks` and pick a random starting track.
    pub fn shuffled(mut tracks: Vec<String>, rng: &mut impl Rng) -> Self {
        tracks.shuffle(rng);
        let current = (!tracks.is_empty()).then(|| rng.random_range(0..tracks.len()));
        Self { tracks, current }
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&str> {
        self.current.map(|i| self.tracks[i].as_str())
    }

    /// Index to play after the current one: any other track when there is one,
    /// otherwise the same track again.
    pub fn pick_next(&self, rng: &mut impl Rng) -> Option<usize> {
        let current = self.current?;
        let n = self.tracks.len();
        if n <= 1 {
            return Some(current);
        }
        let pick = rng.random_range(0..n - 1);
        Some(if pick >= current { pick + 1 } else { pick })
    }

    pub fn select(&mut self, index: usize) {
        if index < self.tracks.len() {
            self.current = Some(index);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    NotStarted,
    AwaitingInteraction,
    Playing,
    /// Fading out before switching to `next`
    Switching { next: usize },
    TornDown,
}

/// Plays the admin listing on the ambient channel.
///
/// Fades go through the caller's [`AudioFadeController`], the same one every
/// other core on the page uses, so a ramp started elsewhere on the ambient
/// channel replaces the player's instead of running beside it.
#[derive(Debug)]
pub struct TrackPlaylistPlayer {
    playlist: Playlist,
    state: PlayerState,
    volume: f64,
    crossfade: Millis,
    rng: SmallRng,
}

impl TrackPlaylistPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            playlist: Playlist::default(),
            state: PlayerState::NotStarted,
            volume: DEFAULT_VOLUME,
            crossfade: DEFAULT_CROSSFADE_MS,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn with_crossfade(mut self, crossfade: Millis) -> Self {
        self.crossfade = crossfade;
        self
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_track(&self) -> Option<&str> {
        self.playlist.current()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// True while blocked autoplay waits for a user interaction.
    pub fn wants_interaction(&self) -> bool {
        self.state == PlayerState::AwaitingInteraction
    }

    /// Load a listing response body and start playing. An empty or broken listing
    /// leaves the player silent.
    pub fn load<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        body: &str,
        now: Millis,
    ) {
        if self.state != PlayerState::NotStarted {
            return;
        }
        self.playlist = Playlist::shuffled(parse_listing(body), &mut self.rng);
        match self.playlist.current_index() {
            Some(index) => {
                tracing::debug!("Loaded {} admin tracks", self.playlist.len());
                self.start_track(registry, fades, index, now);
            }
            None => tracing::debug!("No admin tracks to play"),
        }
    }

    /// The listing request failed outright.
    pub fn load_failed(&mut self, reason: &str) {
        tracing::warn!("Failed to load admin music tracks: {}", reason);
        if self.state == PlayerState::NotStarted {
            self.playlist = Playlist::default();
        }
    }

    /// Change the ambient volume now and for later fade-ins.
    pub fn set_volume<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &AudioFadeController,
        volume: f64,
    ) {
        self.volume = crate::audio::clamp_volume(volume);
        if self.state == PlayerState::Playing && !fades.is_fading(Cue::Ambient) {
            if let Some(channel) = registry.get_mut(Cue::Ambient) {
                channel.set_volume(self.volume);
            }
        }
    }

    /// First pointer/key interaction: retry a blocked start.
    pub fn on_interaction<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        now: Millis,
    ) {
        if self.state != PlayerState::AwaitingInteraction {
            return;
        }
        match fades.fade_in(registry, Cue::Ambient, self.volume, self.crossfade, now) {
            Ok(()) => self.state = PlayerState::Playing,
            Err(e) => tracing::info!("Admin music playback failed after interaction: {}", e),
        }
    }

    /// The platform refused a start that looked accepted (asynchronous rejection).
    pub fn on_play_rejected<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
    ) {
        if self.state != PlayerState::Playing {
            return;
        }
        tracing::info!("Admin music autoplay blocked, waiting for interaction");
        fades.cancel(Cue::Ambient);
        if let Some(channel) = registry.get_mut(Cue::Ambient) {
            channel.set_volume(0.0);
            channel.mark_ended();
        }
        self.state = PlayerState::AwaitingInteraction;
    }

    /// The current track played to its end.
    pub fn on_track_ended<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        now: Millis,
    ) {
        if self.state != PlayerState::Playing {
            return;
        }
        if let Some(channel) = registry.get_mut(Cue::Ambient) {
            channel.mark_ended();
        }
        self.transition(registry, fades, now);
    }

    /// Cross-fade to another track while the current one is still playing.
    pub fn skip<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        now: Millis,
    ) {
        if self.state == PlayerState::Playing {
            self.transition(registry, fades, now);
        }
    }

    /// Finish a pending switch. `finished` is what [`AudioFadeController::advance`]
    /// just returned for `now`.
    pub fn advance<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        finished: &[Cue],
        now: Millis,
    ) {
        let PlayerState::Switching { next } = self.state else {
            return;
        };
        if finished.contains(&Cue::Ambient) {
            self.start_track(registry, fades, next, now);
        } else if !fades.is_fading(Cue::Ambient) {
            // Someone else took the channel over mid fade-out; keep the current track
            tracing::debug!("Admin music fade-out was replaced, staying on the current track");
            self.state = PlayerState::Playing;
        }
    }

    /// Stop for good: cancel the fade, pause playback and ignore later events.
    pub fn teardown<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
    ) {
        if self.state == PlayerState::TornDown {
            return;
        }
        fades.cancel(Cue::Ambient);
        if let Some(channel) = registry.get_mut(Cue::Ambient) {
            channel.pause();
        }
        self.state = PlayerState::TornDown;
    }

    fn transition<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        now: Millis,
    ) {
        let Some(next) = self.playlist.pick_next(&mut self.rng) else {
            return;
        };
        if Some(next) == self.playlist.current_index() {
            // Single track: loop it
            self.start_track(registry, fades, next, now);
            return;
        }
        if fades.fade_out(registry, Cue::Ambient, self.crossfade, now) {
            self.state = PlayerState::Switching { next };
        }
    }

    fn start_track<P: Playback>(
        &mut self,
        registry: &mut ChannelRegistry<P>,
        fades: &mut AudioFadeController,
        index: usize,
        now: Millis,
    ) {
        self.playlist.select(index);
        let Some(track) = self.playlist.current() else {
            return;
        };
        let Some(channel) = registry.get_mut(Cue::Ambient) else {
            tracing::warn!("No ambient channel registered for admin music");
            return;
        };
        channel.set_source(track);
        channel.set_looping(false);
        channel.rewind();

        self.state = match fades.fade_in(registry, Cue::Ambient, self.volume, self.crossfade, now) {
            Ok(()) => PlayerState::Playing,
            Err(e) => {
                tracing::info!("Admin music autoplay blocked: {}", e);
                PlayerState::AwaitingInteraction
            }
        };
    }
}
