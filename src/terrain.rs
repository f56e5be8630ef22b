use rand::Rng;

use crate::render::{Pixmap, Rgb};

// Terrain fill fades to nothing between these height fractions, so the
// mountain feet dissolve into mist instead of ending on a hard line.
const FADE_TOP: f32 = 0.4;

/// One mountain silhouette. Fixed at creation; shape comes purely from
/// (x, time) through `height_at`, so a layer never stores motion state.
pub(crate) struct Ridge {
    /// 0.0 = farthest layer, 1.0 = nearest.
    pub depth: f32,
    phase: f32,
    drift: f32,
    detail: f32,
}

impl Ridge {
    pub(crate) fn new(index: usize, total: usize, rng: &mut impl Rng) -> Self {
        let depth = if total > 1 {
            index as f32 / (total - 1) as f32
        } else {
            1.0
        };
        Self {
            depth,
            phase: rng.gen::<f32>() * 1000.0,
            // Near layers scroll faster for parallax.
            drift: 0.05 + depth * 0.15,
            // Near layers pick up more high-frequency jaggedness.
            detail: 1.0 + depth * 1.5,
        }
    }

    /// Ridge line height (screen y, growing downward) at column `x`.
    /// Pure in (x, time) for a given layer.
    pub(crate) fn height_at(&self, x: f32, time: u64, view_w: f32, view_h: f32) -> f32 {
        let t = time as f32 * 0.005;
        let xo = x / view_w.max(1.0) * 3.0 + self.phase + t * self.drift;

        let y = xo.sin()
            + (xo * 2.3 * self.detail).sin() * 0.5
            + (xo * 4.7 * self.detail).sin() * 0.25;

        // Far layers sit high with shallow relief, near layers low and tall.
        let base = view_h * (0.55 + self.depth * 0.36);
        let amplitude = view_h * (0.10 + self.depth * 0.15);
        base - (y * amplitude).abs()
    }

    pub(crate) fn draw(&self, pix: &mut Pixmap, time: u64, darkness: f32) {
        let w = pix.w as f32;
        let h = pix.h as f32;

        // Atmospheric perspective: far = pale wash, near = dense ink.
        let day_val = (160.0 - self.depth * 130.0) / 255.0;
        let night_val = (10.0 + self.depth * 10.0) / 255.0;
        let val = day_val + (night_val - day_val) * darkness;
        let color = Rgb::new(val, val + 2.0 / 255.0, val + 5.0 / 255.0);
        let foot = Rgb::new(val + 20.0 / 255.0, val + 22.0 / 255.0, val + 25.0 / 255.0);

        let day_alpha = 0.5 + self.depth * 0.5;
        let alpha = day_alpha + (0.8 - day_alpha) * darkness;

        let outline = 0.2 + self.depth * 0.6;

        // Trace every subpixel column; the last column lands exactly on the
        // right edge so the fill never shows a seam.
        for xi in 0..pix.w {
            let ridge = self.height_at(xi as f32, time, w, h);
            let top = ridge.max(0.0) as i32;

            pix.mark(xi as i32, top, outline);

            for yi in top..pix.h as i32 {
                let fy = yi as f32 / h.max(1.0);
                let sink = ((fy - FADE_TOP) / (1.0 - FADE_TOP)).clamp(0.0, 1.0);
                let a = alpha * (1.0 - sink);
                if a <= 0.004 {
                    break;
                }
                pix.blend(xi as i32, yi, color.lerp(foot, sink), a);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn layers(total: usize, seed: u64) -> Vec<Ridge> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..total).map(|i| Ridge::new(i, total, &mut rng)).collect()
    }

    #[test]
    fn heights_stay_inside_viewport_with_margin() {
        for &(w, h) in &[(40.0f32, 16.0f32), (160.0, 96.0), (640.0, 400.0), (1.0, 1.0)] {
            for ridge in layers(4, 7) {
                for &time in &[0u64, 1, 599, 100_000] {
                    for &x in &[0.0, w] {
                        let y = ridge.height_at(x, time, w, h);
                        assert!(y.is_finite());
                        // base <= 0.91h, relief <= 1.75 * 0.25h.
                        let overshoot = h * 1.75 * 0.25;
                        assert!(y >= -overshoot && y <= h + overshoot, "y={y} h={h}");
                    }
                }
            }
        }
    }

    #[test]
    fn height_is_pure() {
        let ridge = &layers(4, 3)[2];
        let a = ridge.height_at(33.0, 42, 200.0, 100.0);
        let b = ridge.height_at(33.0, 42, 200.0, 100.0);
        assert_eq!(a, b);
    }

    #[test]
    fn near_layers_sit_lower_and_move_faster() {
        let ls = layers(4, 11);
        for pair in ls.windows(2) {
            assert!(pair[1].depth > pair[0].depth);
            assert!(pair[1].drift > pair[0].drift);
        }
        // With relief flattened out of the picture, the base levels must
        // descend front-to-back: compare mean height over many columns.
        let mean = |r: &Ridge| -> f32 {
            (0..200)
                .map(|i| r.height_at(i as f32, 0, 200.0, 100.0))
                .sum::<f32>()
                / 200.0
        };
        assert!(mean(&ls[3]) > mean(&ls[0]));
    }

    #[test]
    fn rightmost_column_is_covered() {
        let ridge = &layers(3, 9)[0];
        let y = ridge.height_at(199.0, 17, 200.0, 100.0);
        assert!(y.is_finite() && y > 0.0);
    }
}
