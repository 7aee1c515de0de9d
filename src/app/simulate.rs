use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};

use crate::cli::AuthGates;
use crate::config::Config;
use crate::db::Database;

use super::advance::MetaObserver;
use super::meta::ShowMeta;
use super::playback::Playback;
use super::sources::ProgressSource;
use super::{build_advancer, build_controller, build_player, format_clock};

/// Hard stop so a run without autoplay still ends.
const MAX_SIMULATED_SECONDS: f64 = 6.0 * 3600.0;

#[derive(Debug, Clone, Copy)]
pub(crate) struct SimulateOptions {
    pub(crate) step_ms: u64,
    pub(crate) controls_showing: bool,
    pub(crate) max_advances: u32,
}

/// Plays `meta` on a virtual clock and reports every change of the prompt's
/// visibility and every episode advance.
pub(crate) fn run_simulation(
    db: &mut Database,
    config: &Config,
    meta: ShowMeta,
    gates: AuthGates,
    options: SimulateOptions,
) -> Result<Vec<String>> {
    if options.step_ms == 0 {
        bail!("--step-ms must be greater than zero");
    }
    let controller = build_controller(db, config, gates)?;
    let changes: Rc<RefCell<Vec<ShowMeta>>> = Rc::default();
    let observed = Rc::clone(&changes);
    let observer: MetaObserver = Box::new(move |meta: &ShowMeta| {
        observed.borrow_mut().push(meta.clone());
    });
    let advancer = build_advancer(Some(observer));

    let mut playback = Playback::new(build_player(config), controller, advancer, db);
    playback.start(meta);

    let step = Duration::from_millis(options.step_ms);
    let step_secs = step.as_secs_f64();
    let mut now = Instant::now();
    let mut simulated = 0.0;
    let mut report = vec![describe_episode(&playback, "start")];
    let mut last_visible = None;
    let mut advances = 0;

    while simulated < MAX_SIMULATED_SECONDS {
        now += step;
        simulated += step_secs;
        let advanced = playback.tick(now, step_secs);

        if advanced {
            advances += 1;
            last_visible = None;
            if let Some(meta) = changes.borrow().last() {
                report.push(format!(
                    "[{}] autoplay -> episode {}",
                    format_clock(simulated),
                    meta.current_number().unwrap_or_default()
                ));
            }
            report.push(describe_episode(&playback, "now playing"));
            if advances >= options.max_advances {
                break;
            }
            continue;
        }

        let decision = playback.visibility(options.controls_showing);
        if last_visible != Some(decision.visible) {
            let progress = playback.player().progress();
            report.push(format!(
                "[{}] prompt {} at {} ({}, {}, {})",
                format_clock(simulated),
                if decision.visible { "shown" } else { "hidden" },
                format_clock(progress.time),
                decision.state.label(),
                decision.animation.label(),
                decision.placement.label()
            ));
            last_visible = Some(decision.visible);
        }

        let idle = playback.autoplay_deadline().is_none();
        if playback.player().is_at_end() && idle {
            report.push(format!(
                "[{}] reached the end without autoplay ({})",
                format_clock(simulated),
                playback.phase().label()
            ));
            break;
        }
    }

    playback.teardown();
    Ok(report)
}

fn describe_episode(playback: &Playback<'_>, label: &str) -> String {
    let player = playback.player();
    let progress = player.progress();
    match player.meta().and_then(|meta| meta.episode.as_ref()) {
        Some(episode) => format!(
            "{label}: {} from {} of {}",
            episode.display_title(),
            format_clock(progress.time),
            format_clock(progress.duration)
        ),
        None => format!("{label}: nothing selected"),
    }
}

#[cfg(test)]
mod tests {
    use super::super::meta::parse_show;
    use super::*;

    const SHOW: &str = r#"{
        "id": "show-9",
        "title": "Night Ferry",
        "type": "show",
        "episodes": [
            {"number": 4, "runtime": 200},
            {"number": 3, "runtime": 200},
            {"number": 1, "runtime": 200}
        ]
    }"#;

    fn db() -> Database {
        let db = Database::open_in_memory().expect("in-memory db");
        db.migrate().expect("migrate");
        db
    }

    fn options() -> SimulateOptions {
        SimulateOptions {
            step_ms: 250,
            controls_showing: false,
            max_advances: 1,
        }
    }

    fn episode(number: u32) -> ShowMeta {
        let mut meta = parse_show(SHOW).expect("show should parse");
        meta.select_episode(Some(number)).expect("episode exists");
        meta
    }

    #[test]
    fn authorized_run_advances_once() {
        let mut db = db();
        let gates = AuthGates {
            extension: true,
            proxy: false,
        };
        let report = run_simulation(&mut db, &Config::default(), episode(3), gates, options())
            .expect("simulation should run");

        assert!(report.iter().any(|line| line.contains("prompt shown")));
        assert!(
            report
                .iter()
                .any(|line| line.contains("autoplay -> episode 4"))
        );
        let stored = db
            .progress_for("show-9", 4)
            .expect("query")
            .expect("episode 4 has a record");
        assert_eq!(stored.watched, 0.0);
    }

    #[test]
    fn ticks_faster_than_debounce_still_advance() {
        let mut db = db();
        let gates = AuthGates {
            extension: false,
            proxy: true,
        };
        let mut opts = options();
        opts.step_ms = 50;
        let report = run_simulation(&mut db, &Config::default(), episode(3), gates, opts)
            .expect("simulation should run");

        let advances = report
            .iter()
            .filter(|line| line.contains("autoplay -> episode 4"))
            .count();
        assert_eq!(advances, 1);
    }

    #[test]
    fn unauthorized_run_stops_at_the_end() {
        let mut db = db();
        let report = run_simulation(
            &mut db,
            &Config::default(),
            episode(3),
            AuthGates::default(),
            options(),
        )
        .expect("simulation should run");

        assert!(!report.iter().any(|line| line.contains("autoplay ->")));
        assert!(
            report
                .last()
                .is_some_and(|line| line.contains("reached the end without autoplay"))
        );
    }

    #[test]
    fn gap_in_numbering_never_shows_prompt() {
        let mut db = db();
        let gates = AuthGates {
            extension: true,
            proxy: true,
        };
        let report = run_simulation(&mut db, &Config::default(), episode(1), gates, options())
            .expect("simulation should run");

        assert!(!report.iter().any(|line| line.contains("prompt shown")));
        assert!(!report.iter().any(|line| line.contains("autoplay ->")));
    }

    #[test]
    fn zero_step_is_rejected() {
        let mut db = db();
        let mut opts = options();
        opts.step_ms = 0;
        assert!(
            run_simulation(&mut db, &Config::default(), episode(3), AuthGates::default(), opts)
                .is_err()
        );
    }
}
