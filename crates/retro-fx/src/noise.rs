//! Analog video noise: VCR tracking artifacts and static snow.
//!
//! Both layers redraw on every tick on their own surface. The tracking surface
//! matches the container; snow renders at half resolution. A surface without a
//! usable size (zero, negative or non-finite) skips the frame.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::timers::{Millis, TimerQueue};

/// Nominal animation frame length
pub const FRAME_MS: Millis = 16;

/// Size of each tracking dot before its tail shrinks it
const DOT_RADIUS: f64 = 2.0;

/// A 2D drawing target (a canvas in the browser).
pub trait Surface {
    fn size(&self) -> (f64, f64);
    fn resize(&mut self, width: f64, height: f64);
    fn clear(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    /// Replace the whole surface with packed RGBA pixels
    fn put_pixels(&mut self, width: u32, height: u32, pixels: &[u32]);
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub tracking_enabled: bool,
    pub snow_enabled: bool,
    /// Where the tracking bands split, in px from the top
    pub tracking: f64,
    /// Tracking dots drawn per frame, minus one
    pub tape_age: u32,
    /// Tracking frame rate; 60 and above follows animation frames
    pub fps: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            tracking_enabled: true,
            snow_enabled: true,
            tracking: 220.0,
            tape_age: 70,
            fps: 60,
        }
    }
}

impl NoiseConfig {
    /// Delay between tracking frames
    pub fn tracking_interval(&self) -> Millis {
        if self.fps >= 60 {
            FRAME_MS
        } else {
            1000 / Millis::from(self.fps.max(1))
        }
    }
}

fn usable(width: f64, height: f64) -> bool {
    width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
}

/// Integer in `[min, max]` (both rounded down), like `floor(random * (max - min + 1)) + min`.
fn random_int(rng: &mut impl Rng, min: f64, max: f64) -> f64 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    (rng.random::<f64>() * (max - min + 1.0)).floor() + min
}

/// Draw one frame of tracking noise. Returns false when the frame was skipped.
pub fn render_tracking<S: Surface>(surface: &mut S, config: &NoiseConfig, rng: &mut impl Rng) -> bool {
    let (width, height) = surface.size();
    if !usable(width, height) {
        return false;
    }

    surface.clear();
    let mut lower = config.tracking;
    let mut upper = config.tracking;

    for _ in 0..=config.tape_age {
        lower += 3.0;
        upper -= 3.0;
        let x = rng.random::<f64>() * width;
        let y1 = random_int(rng, lower.clamp(0.0, height), height);
        let y2 = random_int(rng, 0.0, upper.clamp(0.0, height));

        surface.fill_rect(x, y1, DOT_RADIUS, DOT_RADIUS);
        surface.fill_rect(x, y2, DOT_RADIUS, DOT_RADIUS);
        render_tail(surface, x, y1, rng);
        render_tail(surface, x, y2, rng);
    }
    true
}

fn render_tail<S: Surface>(surface: &mut S, mut x: f64, y: f64, rng: &mut impl Rng) {
    let samples = rng.random_range(1..=50);
    let direction = if rng.random::<bool>() { 1.0 } else { -1.0 };
    let mut radius = DOT_RADIUS;
    let mut floor = DOT_RADIUS;

    for _ in 0..samples {
        floor -= 0.01;
        let size = random_int(rng, floor, radius).max(0.0);
        let dx = f64::from(rng.random_range(1..=4u8)) * direction;
        radius -= 0.1;
        x += dx;
        surface.fill_rect(x, y, size, size);
    }
}

/// One frame of snow: black pixels with a random alpha byte.
pub fn snow_pixels(width: u32, height: u32, rng: &mut impl Rng) -> Vec<u32> {
    let len = width as usize * height as usize;
    (0..len).map(|_| u32::from(rng.random::<u8>()) << 24).collect()
}

/// Draw one frame of snow. Returns false when the frame was skipped.
pub fn render_snow<S: Surface>(surface: &mut S, rng: &mut impl Rng) -> bool {
    let (width, height) = surface.size();
    if !usable(width, height) {
        return false;
    }
    let (width, height) = (width as u32, height as u32);
    if width == 0 || height == 0 {
        return false;
    }
    let pixels = snow_pixels(width, height, rng);
    surface.put_pixels(width, height, &pixels);
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Tracking,
    Snow,
}

pub struct NoiseCanvasRenderer<S> {
    config: NoiseConfig,
    tracking: Option<S>,
    snow: Option<S>,
    timers: TimerQueue<Layer>,
    rng: SmallRng,
    started: bool,
    torn_down: bool,
}

impl<S: Surface> NoiseCanvasRenderer<S> {
    /// Layers disabled in `config` drop their surface.
    pub fn new(config: NoiseConfig, tracking: S, snow: S, seed: u64) -> Self {
        Self {
            config,
            tracking: config.tracking_enabled.then_some(tracking),
            snow: config.snow_enabled.then_some(snow),
            timers: TimerQueue::new(),
            rng: SmallRng::seed_from_u64(seed),
            started: false,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    pub fn tracking_surface(&self) -> Option<&S> {
        self.tracking.as_ref()
    }

    pub fn snow_surface(&self) -> Option<&S> {
        self.snow.as_ref()
    }

    pub fn surface_mut(&mut self, layer: Layer) -> Option<&mut S> {
        match layer {
            Layer::Tracking => self.tracking.as_mut(),
            Layer::Snow => self.snow.as_mut(),
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.timers.next_due()
    }

    /// Size the surfaces for a container of `width` x `height` px.
    pub fn resize(&mut self, width: f64, height: f64) {
        if let Some(surface) = self.tracking.as_mut() {
            surface.resize(width, height);
        }
        if let Some(surface) = self.snow.as_mut() {
            surface.resize(width / 2.0, height / 2.0);
        }
    }

    /// Draw the first frame of each layer and schedule the next ones.
    pub fn start(&mut self, width: f64, height: f64, now: Millis) {
        if self.torn_down || self.started {
            return;
        }
        self.started = true;
        self.resize(width, height);
        for layer in [Layer::Tracking, Layer::Snow] {
            if self.has_layer(layer) {
                self.render(layer);
                self.schedule(layer, now.saturating_add(self.interval(layer)));
            }
        }
    }

    /// Render every frame due by `now`. Returns the number of frames drawn.
    pub fn advance(&mut self, now: Millis) -> usize {
        if self.torn_down {
            return 0;
        }
        let mut drawn = 0;
        while let Some((_, at, layer)) = self.timers.pop_due(now) {
            if self.render(layer) {
                drawn += 1;
            }
            // A host that fell behind does not get a burst of catch-up frames
            let mut next = at.saturating_add(self.interval(layer));
            if next <= now {
                next = now.saturating_add(self.interval(layer));
            }
            self.schedule(layer, next);
        }
        drawn
    }

    /// Cancel every pending frame. Nothing is drawn afterwards.
    pub fn teardown(&mut self) {
        self.timers.clear();
        self.torn_down = true;
    }

    fn has_layer(&self, layer: Layer) -> bool {
        match layer {
            Layer::Tracking => self.tracking.is_some(),
            Layer::Snow => self.snow.is_some(),
        }
    }

    fn interval(&self, layer: Layer) -> Millis {
        match layer {
            Layer::Tracking => self.config.tracking_interval(),
            Layer::Snow => FRAME_MS,
        }
    }

    fn schedule(&mut self, layer: Layer, at: Millis) {
        self.timers.schedule(at, layer);
    }

    fn render(&mut self, layer: Layer) -> bool {
        match layer {
            Layer::Tracking => match self.tracking.as_mut() {
                Some(surface) => render_tracking(surface, &self.config, &mut self.rng),
                None => false,
            },
            Layer::Snow => match self.snow.as_mut() {
                Some(surface) => render_snow(surface, &mut self.rng),
                None => false,
            },
        }
    }
}
