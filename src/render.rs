use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate},
};

// Braille: each terminal cell is 2x4 subpixels.
pub(crate) const SUB_X: usize = 2;
pub(crate) const SUB_Y: usize = 4;

// Ink channel level at which a braille dot turns on.
const INK_THRESHOLD: f32 = 0.30;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub(crate) const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub(crate) fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub(crate) fn pack(self) -> u32 {
        let f = |v: f32| -> u32 { (v.clamp(0.0, 1.0) * 255.0).round() as u32 };
        (f(self.r) << 16) | (f(self.g) << 8) | f(self.b)
    }
}

fn unpack(c: u32) -> Color {
    Color::Rgb {
        r: (c >> 16) as u8,
        g: (c >> 8) as u8,
        b: c as u8,
    }
}

/// Subpixel canvas the scene paints into: straight RGB plus a separate
/// "ink" channel for crisp detail (ridge lines, birds) that becomes
/// braille dots instead of background wash.
pub(crate) struct Pixmap {
    pub w: usize,
    pub h: usize,
    rgb: Vec<Rgb>,
    ink: Vec<f32>,
}

impl Pixmap {
    pub(crate) fn new(cols: usize, rows: usize) -> Self {
        let w = cols * SUB_X;
        let h = rows * SUB_Y;
        Self {
            w,
            h,
            rgb: vec![Rgb::new(0.0, 0.0, 0.0); w * h],
            ink: vec![0.0; w * h],
        }
    }

    pub(crate) fn resize(&mut self, cols: usize, rows: usize) {
        self.w = cols * SUB_X;
        self.h = rows * SUB_Y;
        self.rgb.resize(self.w * self.h, Rgb::new(0.0, 0.0, 0.0));
        self.ink.resize(self.w * self.h, 0.0);
    }

    pub(crate) fn clear(&mut self, bg: Rgb) {
        self.rgb.fill(bg);
        self.ink.fill(0.0);
    }

    #[inline]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.w as i32 || y >= self.h as i32 {
            return None;
        }
        Some(y as usize * self.w + x as usize)
    }

    /// Source-over blend of `color` at `alpha` onto one subpixel.
    pub(crate) fn blend(&mut self, x: i32, y: i32, color: Rgb, alpha: f32) {
        if let Some(i) = self.idx(x, y) {
            let a = alpha.clamp(0.0, 1.0);
            self.rgb[i] = self.rgb[i].lerp(color, a);
        }
    }

    /// Deposit ink detail; keeps the strongest mark.
    pub(crate) fn mark(&mut self, x: i32, y: i32, v: f32) {
        if let Some(i) = self.idx(x, y) {
            self.ink[i] = self.ink[i].max(v.clamp(0.0, 1.0));
        }
    }

    /// Soft elliptical blob: opaque center falling off linearly to a
    /// transparent rim, the pixmap stand-in for a radial gradient fill.
    pub(crate) fn soft_blob(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgb, opacity: f32) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let x0 = (cx - rx).floor() as i32;
        let x1 = (cx + rx).ceil() as i32;
        let y0 = (cy - ry).floor() as i32;
        let y1 = (cy + ry).ceil() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                let t = (dx * dx + dy * dy).sqrt();
                if t < 1.0 {
                    self.blend(x, y, color, opacity * (1.0 - t));
                }
            }
        }
    }

    /// Stroke a quadratic curve by sampling; lays down both wash color and
    /// ink detail so thin strokes survive the cell mapping.
    pub(crate) fn stroke_quad(
        &mut self,
        a: (f32, f32),
        ctrl: (f32, f32),
        b: (f32, f32),
        color: Rgb,
        alpha: f32,
    ) {
        let steps = 10;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let u = 1.0 - t;
            let x = u * u * a.0 + 2.0 * u * t * ctrl.0 + t * t * b.0;
            let y = u * u * a.1 + 2.0 * u * t * ctrl.1 + t * t * b.1;
            let (xi, yi) = (x.round() as i32, y.round() as i32);
            self.blend(xi, yi, color, alpha);
            self.mark(xi, yi, alpha);
        }
    }

    fn cell_avg(&self, tx: usize, ty: usize) -> Rgb {
        let mut acc = Rgb::new(0.0, 0.0, 0.0);
        for sy in 0..SUB_Y {
            for sx in 0..SUB_X {
                let c = self.rgb[(ty * SUB_Y + sy) * self.w + tx * SUB_X + sx];
                acc.r += c.r;
                acc.g += c.g;
                acc.b += c.b;
            }
        }
        let n = (SUB_X * SUB_Y) as f32;
        Rgb::new(acc.r / n, acc.g / n, acc.b / n)
    }

    fn cell_mask(&self, tx: usize, ty: usize) -> u8 {
        let mut mask = 0u8;
        for sy in 0..SUB_Y {
            for sx in 0..SUB_X {
                if self.ink[(ty * SUB_Y + sy) * self.w + tx * SUB_X + sx] > INK_THRESHOLD {
                    mask |= dot_bit(sx, sy);
                }
            }
        }
        mask
    }
}

// Unicode braille dot numbering:
// (0,0)->dot1 (0,1)->dot2 (0,2)->dot3 (0,3)->dot7
// (1,0)->dot4 (1,1)->dot5 (1,2)->dot6 (1,3)->dot8
fn dot_bit(sx: usize, sy: usize) -> u8 {
    match (sx, sy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0,
    }
}

fn braille_char(mask: u8) -> char {
    char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
}

/// Terminal cell buffer with a copy of the previous frame so flushes only
/// touch cells that changed.
pub(crate) struct Frame {
    pub cols: u16,
    pub rows: u16,
    glyphs: Vec<char>,
    fg: Vec<u32>,
    bg: Vec<u32>,
    last_glyphs: Vec<char>,
    last_fg: Vec<u32>,
    last_bg: Vec<u32>,
}

impl Frame {
    pub(crate) fn new(cols: u16, rows: u16) -> Self {
        let cells = (cols as usize) * (rows as usize);
        Self {
            cols,
            rows,
            glyphs: vec![' '; cells],
            fg: vec![0; cells],
            bg: vec![0; cells],
            last_glyphs: vec!['\0'; cells],
            last_fg: vec![u32::MAX; cells],
            last_bg: vec![u32::MAX; cells],
        }
    }

    pub(crate) fn resize(&mut self, cols: u16, rows: u16) {
        *self = Frame::new(cols, rows);
    }

    pub(crate) fn force_redraw(&mut self) {
        self.last_glyphs.fill('\0');
        self.last_fg.fill(u32::MAX);
        self.last_bg.fill(u32::MAX);
    }

    /// Map the pixmap onto cells: cell background is the average wash,
    /// inked subpixels become braille dots in the current ink tone.
    pub(crate) fn compose(&mut self, pix: &Pixmap, ink_tone: Rgb) {
        let cols = self.cols as usize;
        let rows = self.rows as usize;
        let ink = ink_tone.pack();
        for ty in 0..rows {
            for tx in 0..cols {
                let i = ty * cols + tx;
                let bg = pix.cell_avg(tx, ty).pack();
                let mask = pix.cell_mask(tx, ty);
                if mask == 0 {
                    self.glyphs[i] = ' ';
                    self.fg[i] = bg;
                } else {
                    self.glyphs[i] = braille_char(mask);
                    self.fg[i] = ink;
                }
                self.bg[i] = bg;
            }
        }
    }

    pub(crate) fn put_text(&mut self, x: usize, y: usize, s: &str, fg: u32, bg: u32) {
        let cols = self.cols as usize;
        if y >= self.rows as usize {
            return;
        }
        let mut cx = x;
        for ch in s.chars() {
            if cx >= cols {
                break;
            }
            let i = y * cols + cx;
            self.glyphs[i] = ch;
            self.fg[i] = fg;
            self.bg[i] = bg;
            cx += 1;
        }
    }

    pub(crate) fn flush(&mut self, stdout: &mut io::Stdout) -> io::Result<()> {
        let cols = self.cols as usize;
        let rows = self.rows as usize;

        queue!(stdout, BeginSynchronizedUpdate)?;

        for y in 0..rows {
            for x in 0..cols {
                let i = y * cols + x;
                let ch = self.glyphs[i];
                let fg = self.fg[i];
                let bg = self.bg[i];
                if ch == self.last_glyphs[i] && fg == self.last_fg[i] && bg == self.last_bg[i] {
                    continue;
                }
                self.last_glyphs[i] = ch;
                self.last_fg[i] = fg;
                self.last_bg[i] = bg;

                queue!(
                    stdout,
                    cursor::MoveTo(x as u16, y as u16),
                    SetForegroundColor(unpack(fg)),
                    SetBackgroundColor(unpack(bg)),
                    Print(ch)
                )?;
            }
        }

        queue!(stdout, ResetColor, EndSynchronizedUpdate)?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_is_bounds_checked() {
        let mut pix = Pixmap::new(4, 4);
        pix.blend(-5, -5, Rgb::new(1.0, 1.0, 1.0), 1.0);
        pix.blend(1000, 1000, Rgb::new(1.0, 1.0, 1.0), 1.0);
        pix.mark(-1, 0, 1.0);
        pix.soft_blob(-20.0, -20.0, 5.0, 5.0, Rgb::new(1.0, 0.0, 0.0), 0.5);
    }

    #[test]
    fn blob_falls_off_from_center() {
        let mut pix = Pixmap::new(8, 8);
        pix.clear(Rgb::new(0.0, 0.0, 0.0));
        pix.soft_blob(8.0, 16.0, 7.0, 7.0, Rgb::new(1.0, 1.0, 1.0), 1.0);
        let center = pix.rgb[16 * pix.w + 8].r;
        let edge = pix.rgb[16 * pix.w + 13].r;
        assert!(center > edge);
        assert!(edge >= 0.0);
    }

    #[test]
    fn inked_cells_get_braille_glyphs() {
        let mut pix = Pixmap::new(2, 1);
        pix.clear(Rgb::new(0.5, 0.5, 0.5));
        pix.mark(0, 0, 1.0);
        let mut frame = Frame::new(2, 1);
        frame.compose(&pix, Rgb::new(0.0, 0.0, 0.0));
        assert_eq!(frame.glyphs[0], '\u{2801}');
        assert_eq!(frame.glyphs[1], ' ');
    }
}
