use rand::Rng;

use crate::render::{Pixmap, Rgb};

const INK_DAY: Rgb = Rgb::new(40.0 / 255.0, 40.0 / 255.0, 45.0 / 255.0);
const INK_NIGHT: Rgb = Rgb::new(60.0 / 255.0, 60.0 / 255.0, 70.0 / 255.0);

/// One bird: a fixed offset from the flock leader and a private wing-flap
/// phase. Immutable after formation.
pub(crate) struct Goose {
    pub dx: f32,
    pub dy: f32,
    pub flap: f32,
}

/// A V-formation of geese crossing the sky. The whole formation moves as
/// one; only the wing strokes animate per frame.
pub(crate) struct Flock {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub geese: Vec<Goose>,
}

impl Flock {
    pub(crate) fn new(rng: &mut impl Rng, view_w: f32, view_h: f32) -> Self {
        let mut flock = Self {
            x: 0.0,
            y: 0.0,
            speed: 0.0,
            geese: Vec::new(),
        };
        flock.reseed(rng, view_w, view_h);
        flock.x = rng.gen::<f32>() * view_w;
        flock
    }

    fn margin(view_h: f32) -> f32 {
        view_h * 0.28
    }

    /// New formation: leader at the origin, then mirrored follower pairs
    /// trailing behind, each pair sharing one jitter roll so the V stays
    /// recognizable but not machine-perfect.
    fn reseed(&mut self, rng: &mut impl Rng, view_w: f32, view_h: f32) {
        self.y = view_h * (0.1 + rng.gen::<f32>() * 0.25);
        self.speed = view_w * (2.0 + rng.gen::<f32>() * 1.3) * 1e-4;

        let spacing_x = (view_h * 0.035).max(3.0);
        let spacing_y = (view_h * 0.016).max(1.5);

        self.geese.clear();
        self.geese.push(Goose {
            dx: 0.0,
            dy: 0.0,
            flap: rng.gen::<f32>() * std::f32::consts::TAU,
        });

        let pairs = 3 + rng.gen_range(0..4);
        for i in 1..=pairs {
            let nx = (rng.gen::<f32>() - 0.5) * spacing_x * 0.2;
            let ny = (rng.gen::<f32>() - 0.5) * spacing_y * 0.4;
            // Flying right, so the V opens leftward behind the leader.
            for side in [-1.0f32, 1.0] {
                self.geese.push(Goose {
                    dx: -(i as f32) * spacing_x + nx,
                    dy: side * (i as f32) * spacing_y + ny,
                    flap: rng.gen::<f32>() * std::f32::consts::TAU,
                });
            }
        }
    }

    pub(crate) fn update(&mut self, rng: &mut impl Rng, view_w: f32, view_h: f32) {
        self.x += self.speed;
        let margin = Self::margin(view_h);
        if self.x > view_w + margin {
            self.reseed(rng, view_w, view_h);
            // Extra random runway so passes recur irregularly.
            self.x = -margin - rng.gen::<f32>() * margin * 1.33;
        }
    }

    pub(crate) fn draw(&self, pix: &mut Pixmap, time: u64, night: bool) {
        let color = if night { INK_NIGHT } else { INK_DAY };
        let alpha = if night { 0.4 } else { 0.7 };

        let span = (pix.h as f32 * 0.012).max(2.0);
        let flap_amp = span * 0.4;

        for g in &self.geese {
            let bx = self.x + g.dx;
            let by = self.y + g.dy;
            let flap = (time as f32 * 0.15 + g.flap).sin() * flap_amp;

            // Two shallow arcs meeting at the body make the classic
            // distant-bird "m" stroke; wingtips rise and fall with flap.
            pix.stroke_quad(
                (bx - span, by - flap),
                (bx - span * 0.5, by + span * 0.25),
                (bx, by + span * 0.5),
                color,
                alpha,
            );
            pix.stroke_quad(
                (bx, by + span * 0.5),
                (bx + span * 0.5, by + span * 0.25),
                (bx + span, by - flap),
                color,
                alpha,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    const W: f32 = 200.0;
    const H: f32 = 100.0;

    #[test]
    fn formation_has_one_leader_and_mirrored_pairs() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..10 {
            let flock = Flock::new(&mut rng, W, H);
            let leader = &flock.geese[0];
            assert_eq!((leader.dx, leader.dy), (0.0, 0.0));

            let followers = &flock.geese[1..];
            assert_eq!(followers.len() % 2, 0);
            assert!(!followers.is_empty());

            let spacing_y = (H * 0.016f32).max(1.5);
            for pair in followers.chunks(2) {
                let (l, r) = (&pair[0], &pair[1]);
                assert_eq!(l.dx, r.dx);
                assert!(l.dx < 0.0, "followers trail the leader");
                // Shared jitter: the mirrored offsets differ by exactly
                // twice the rank spacing.
                let rank = ((r.dy - l.dy) / (2.0 * spacing_y)).round();
                assert!(rank >= 1.0);
                assert!(((r.dy - l.dy) - 2.0 * spacing_y * rank).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn exit_right_regenerates_off_screen_left() {
        let mut rng = StdRng::seed_from_u64(22);
        let mut flock = Flock::new(&mut rng, W, H);
        let margin = H * 0.28;
        flock.x = W + margin + 1.0;
        flock.update(&mut rng, W, H);
        assert!(flock.x <= -margin);
        assert!(flock.x >= -margin - margin * 1.33 - 1e-3);
        assert_eq!((flock.geese[0].dx, flock.geese[0].dy), (0.0, 0.0));
    }

    #[test]
    fn regeneration_varies_the_runway() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut flock = Flock::new(&mut rng, W, H);
        let margin = H * 0.28;
        let mut restarts = Vec::new();
        for _ in 0..5 {
            flock.x = W + margin + 1.0;
            flock.update(&mut rng, W, H);
            restarts.push(flock.x);
        }
        let first = restarts[0];
        assert!(restarts.iter().any(|&x| (x - first).abs() > 1e-3));
    }
}
