use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    queue,
    style::ResetColor,
    terminal::{
        self, DisableLineWrap, EnableLineWrap, EndSynchronizedUpdate, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use crate::config::Opts;
use crate::render::{Frame, Pixmap, SUB_X, SUB_Y};
use crate::scene::Scene;

const MIN_COLS: u16 = 20;
const MIN_ROWS: u16 = 8;

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = queue!(
            out,
            EndSynchronizedUpdate,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = out.flush();
        let _ = terminal::disable_raw_mode();
    }
}

pub(crate) fn run(opts: Opts) -> Result<()> {
    let mut out = io::stdout();

    // If the terminal refuses raw mode there is nothing to animate; bail
    // before touching the screen.
    terminal::enable_raw_mode()?;
    let _guard = CleanupGuard;
    queue!(out, EnterAlternateScreen, DisableLineWrap, cursor::Hide)?;
    out.flush()?;

    let seed = opts.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x1_2B3C)
            ^ 0x5EED_1234
    });

    let (mut cols, mut rows) = terminal::size()?;
    cols = cols.max(MIN_COLS);
    rows = rows.max(MIN_ROWS);

    let mut frame = Frame::new(cols, rows);
    let mut pix = Pixmap::new(cols as usize, rows as usize);
    let mut scene = Scene::new(
        (cols as usize * SUB_X) as f32,
        (rows as usize * SUB_Y) as f32,
        opts.layers as usize,
        seed,
    );

    let mut night = opts.night;
    let mut paused = false;
    let mut show_help = true;

    let frame_dt = Duration::from_millis(1000 / opts.fps.max(1) as u64);

    loop {
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Resize(c, r) => {
                    cols = c.max(MIN_COLS);
                    rows = r.max(MIN_ROWS);
                    frame.resize(cols, rows);
                    pix.resize(cols as usize, rows as usize);
                    scene.reseed(
                        (cols as usize * SUB_X) as f32,
                        (rows as usize * SUB_Y) as f32,
                    );
                }
                Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') => night = !night,
                    KeyCode::Char(' ') => paused = !paused,
                    KeyCode::Char('h') | KeyCode::Char('H') => show_help = !show_help,
                    KeyCode::Char('r') | KeyCode::Char('R') => {
                        scene.reseed(scene.width, scene.height);
                    }
                    KeyCode::Char('l') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                        frame.force_redraw();
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        let tick_start = Instant::now();

        if !paused {
            scene.advance(night);
        }
        scene.draw(&mut pix);
        frame.compose(&pix, scene.ink_tone());

        if show_help {
            let line = format!(
                "inkwash  {}  |  N night  Space pause  R reseed  H help  Q quit",
                if night { "night" } else { "day" }
            );
            let (fg, bg) = if scene.darkness > 0.5 {
                (0x9a9aa8, 0x0a0c14)
            } else {
                (0x50505a, 0xf2eee4)
            };
            frame.put_text(1, 0, &line, fg, bg);
        }

        frame.flush(&mut out)?;

        let elapsed = tick_start.elapsed();
        if elapsed < frame_dt {
            std::thread::sleep(frame_dt - elapsed);
        }
    }
}
