use rand::{rngs::StdRng, SeedableRng};

use crate::flock::Flock;
use crate::render::{Pixmap, Rgb};
use crate::sky::{Cloud, Mist};
use crate::terrain::Ridge;

pub(crate) const MIST_COUNT: usize = 6;
pub(crate) const CLOUD_COUNT: usize = 5;

/// Fraction of the remaining distance the darkness scalar covers per tick.
const BLEND_RATE: f32 = 0.05;

/// Ticks before a second flock joins the scene (about five seconds at the
/// default frame rate). One-shot, not a recurring timer.
const SECOND_FLOCK_TICK: u64 = 300;

/// Odd-indexed mist banks draw after this terrain layer. Purely a visual
/// tunable; any back layer works.
const MIST_INTERLEAVE_LAYER: usize = 1;

const SKY_DAY: Rgb = Rgb::new(242.0 / 255.0, 238.0 / 255.0, 228.0 / 255.0);
const SKY_NIGHT: Rgb = Rgb::new(10.0 / 255.0, 12.0 / 255.0, 20.0 / 255.0);
const INK_DAY: Rgb = Rgb::new(40.0 / 255.0, 40.0 / 255.0, 45.0 / 255.0);
const INK_NIGHT: Rgb = Rgb::new(60.0 / 255.0, 60.0 / 255.0, 70.0 / 255.0);

/// All transient scene state: the element collections, the tick counter and
/// the day/night blend scalar. Owns its RNG so a fixed seed reproduces the
/// exact same landscape and every reseed that follows.
pub(crate) struct Scene {
    pub width: f32,
    pub height: f32,
    pub time: u64,
    pub darkness: f32,
    pub layers: Vec<Ridge>,
    pub mists: Vec<Mist>,
    pub clouds: Vec<Cloud>,
    pub flocks: Vec<Flock>,
    rng: StdRng,
    layer_count: usize,
    second_flock_at: Option<u64>,
}

impl Scene {
    pub(crate) fn new(width: f32, height: f32, layer_count: usize, seed: u64) -> Self {
        let mut scene = Self {
            width: 1.0,
            height: 1.0,
            time: 0,
            darkness: 0.0,
            layers: Vec::new(),
            mists: Vec::new(),
            clouds: Vec::new(),
            flocks: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            layer_count: layer_count.max(1),
            second_flock_at: None,
        };
        scene.reseed(width, height);
        scene
    }

    /// Total replacement of every element collection for the given viewport.
    /// Old element state is discarded, never carried across a resize.
    pub(crate) fn reseed(&mut self, width: f32, height: f32) {
        self.width = if width.is_finite() { width.max(1.0) } else { 1.0 };
        self.height = if height.is_finite() { height.max(1.0) } else { 1.0 };
        let (w, h) = (self.width, self.height);

        self.layers = (0..self.layer_count)
            .map(|i| Ridge::new(i, self.layer_count, &mut self.rng))
            .collect();
        self.mists = (0..MIST_COUNT)
            .map(|_| Mist::new(&mut self.rng, w, h))
            .collect();
        self.clouds = (0..CLOUD_COUNT)
            .map(|_| Cloud::new(&mut self.rng, w, h))
            .collect();
        self.flocks = vec![Flock::new(&mut self.rng, w, h)];
        self.second_flock_at = Some(self.time + SECOND_FLOCK_TICK);
    }

    /// One simulation tick. `night` is the externally owned dark-mode flag,
    /// read here and never written; the visible transition comes entirely
    /// from the exponential pull on `darkness`.
    pub(crate) fn advance(&mut self, night: bool) {
        let target = if night { 1.0 } else { 0.0 };
        self.darkness += (target - self.darkness) * BLEND_RATE;
        self.time += 1;

        if let Some(at) = self.second_flock_at {
            if self.time >= at {
                let (w, h) = (self.width, self.height);
                self.flocks.push(Flock::new(&mut self.rng, w, h));
                self.second_flock_at = None;
            }
        }

        let (w, h) = (self.width, self.height);
        for m in &mut self.mists {
            m.update(&mut self.rng, w, h);
        }
        for c in &mut self.clouds {
            c.update(&mut self.rng, w, h);
        }
        for f in &mut self.flocks {
            f.update(&mut self.rng, w, h);
        }
    }

    /// Fixed back-to-front compositing order: clouds, half the mist, the
    /// terrain layers with the other half of the mist interleaved behind
    /// one of them, then the flocks. Reordering breaks the depth illusion.
    pub(crate) fn draw(&self, pix: &mut Pixmap) {
        pix.clear(SKY_DAY.lerp(SKY_NIGHT, self.darkness));
        let night = self.darkness > 0.5;

        for cloud in &self.clouds {
            cloud.draw(pix, night);
        }
        for mist in self.mists.iter().step_by(2) {
            mist.draw(pix, night);
        }

        let interleave = MIST_INTERLEAVE_LAYER.min(self.layers.len().saturating_sub(1));
        for (i, layer) in self.layers.iter().enumerate() {
            layer.draw(pix, self.time, self.darkness);
            if i == interleave {
                for mist in self.mists.iter().skip(1).step_by(2) {
                    mist.draw(pix, night);
                }
            }
        }

        for flock in &self.flocks {
            flock.draw(pix, self.time, night);
        }
    }

    /// Foreground tone for inked detail at the current blend.
    pub(crate) fn ink_tone(&self) -> Rgb {
        INK_DAY.lerp(INK_NIGHT, self.darkness)
    }
}
