mod render;
mod session;

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::cli::AuthGates;
use crate::config::Config;
use crate::db::Database;

use super::advance::MetaObserver;
use super::meta::ShowMeta;
use super::playback::Playback;
use super::{build_advancer, build_controller, build_player};

use self::render::{PlayerView, draw_player};
use self::session::ScreenGuard;

const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const SEEK_STEP_SECONDS: f64 = 10.0;

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

pub(crate) fn run_tui(
    db: &mut Database,
    config: &Config,
    meta: ShowMeta,
    gates: AuthGates,
    speed: f64,
) -> Result<()> {
    let speed = if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        1.0
    };
    let autoplay_enabled = db.enable_autoplay()?;
    let controller = build_controller(db, config, gates)?;
    let changes: Rc<RefCell<Option<ShowMeta>>> = Rc::default();
    let observed = Rc::clone(&changes);
    let observer: MetaObserver = Box::new(move |meta: &ShowMeta| {
        *observed.borrow_mut() = Some(meta.clone());
    });

    let mut playback = Playback::new(
        build_player(config),
        controller,
        build_advancer(Some(observer)),
        db,
    );
    playback.start(meta);

    let mut screen = ScreenGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let result = drive(&mut terminal, &mut playback, &changes, autoplay_enabled, speed);

    playback.teardown();
    terminal.show_cursor()?;
    screen.leave()?;
    result
}

fn drive(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    playback: &mut Playback<'_>,
    changes: &RefCell<Option<ShowMeta>>,
    autoplay_enabled: bool,
    speed: f64,
) -> Result<()> {
    let mut controls_showing = true;
    let mut status = if autoplay_enabled {
        status_info("Playing. Autoplay is on.")
    } else {
        status_info("Playing. Autoplay is off (`nextep autoplay on`).")
    };
    let mut last_frame = Instant::now();

    loop {
        let now = Instant::now();
        let elapsed = now.duration_since(last_frame).as_secs_f64() * speed;
        last_frame = now;
        if playback.tick(now, elapsed) {
            status = status_info("Autoplay started the next episode.");
        }
        if let Some(meta) = changes.borrow_mut().take()
            && let Some(episode) = meta.episode.as_ref()
        {
            status = status_info(&format!("Now playing {}", episode.display_title()));
        }

        let decision = playback.visibility(controls_showing);
        let view = PlayerView {
            player: playback.player(),
            decision,
            controls_showing,
            phase: playback.phase(),
            autoplay_enabled,
            status: &status,
        };
        terminal
            .draw(|frame| draw_player(frame, &view))
            .context("failed to draw player")?;

        if !event::poll(FRAME_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char(' ') => playback.player_mut().toggle_pause(),
            KeyCode::Char('c') => controls_showing = !controls_showing,
            KeyCode::Left => playback.player_mut().seek_by(-SEEK_STEP_SECONDS),
            KeyCode::Right => playback.player_mut().seek_by(SEEK_STEP_SECONDS),
            KeyCode::Char('n') => {
                if !decision.visible {
                    status = status_info("The next-episode prompt is not showing.");
                    continue;
                }
                if playback.next_episode().is_none() {
                    status = status_error("No next episode available.");
                }
            }
            KeyCode::Char('x') => {
                if decision.visible {
                    playback.dismiss();
                    status = status_info("Next-episode prompt dismissed for this episode.");
                }
            }
            _ => {}
        }
    }
}
