use tracing::{debug, warn};

use super::meta::{PlaybackProgress, PlayerStatus, ShowMeta};
use super::sources::{PlayerSink, ProgressSource, ProgressStore};

/// Resume positions this close to the end restart the episode instead.
const RESUME_TAIL_SECONDS: f64 = 10.0;

/// In-memory stand-in for the player's state container. Time only moves when
/// [`PlayerState::advance_clock`] is called.
#[derive(Debug, Clone)]
pub(crate) struct PlayerState {
    progress: PlaybackProgress,
    status: PlayerStatus,
    meta: Option<ShowMeta>,
    hide_next_episode_btn: bool,
    should_start_from_beginning: bool,
    default_runtime: f64,
    pending_load: bool,
}

impl PlayerState {
    pub(crate) fn new(default_runtime: f64) -> Self {
        Self {
            progress: PlaybackProgress::default(),
            status: PlayerStatus::Idle,
            meta: None,
            hide_next_episode_btn: false,
            should_start_from_beginning: false,
            default_runtime,
            pending_load: false,
        }
    }

    /// Finishes loading the current episode: picks up the runtime and, unless a
    /// restart was requested, the stored watch position.
    pub(crate) fn finish_loading(&mut self, store: &dyn ProgressStore) {
        if !self.pending_load {
            return;
        }
        self.pending_load = false;
        let Some(meta) = self.meta.as_ref() else {
            self.status = PlayerStatus::Idle;
            return;
        };
        let Some(episode) = meta.episode.as_ref() else {
            self.status = PlayerStatus::Idle;
            return;
        };

        let duration = episode
            .runtime
            .filter(|runtime| runtime.is_finite() && *runtime > 0.0)
            .unwrap_or(self.default_runtime);
        let mut time = 0.0;
        if self.should_start_from_beginning {
            self.should_start_from_beginning = false;
        } else {
            match store.item(&meta.id, episode.number) {
                Ok(Some(record)) if record.watched < duration - RESUME_TAIL_SECONDS => {
                    time = record.watched.max(0.0);
                }
                Ok(_) => {}
                Err(err) => warn!(show = %meta.id, "failed to read stored progress: {err:#}"),
            }
        }
        debug!(show = %meta.id, episode = episode.number, time, duration, "episode loaded");
        self.progress = PlaybackProgress::new(time, duration);
        self.status = PlayerStatus::Playing;
    }

    pub(crate) fn advance_clock(&mut self, seconds: f64) {
        if self.status != PlayerStatus::Playing || !self.progress.is_ready() {
            return;
        }
        self.progress.time = (self.progress.time + seconds).min(self.progress.duration);
    }

    pub(crate) fn seek_by(&mut self, seconds: f64) {
        if !self.progress.is_ready() {
            return;
        }
        self.progress.time = (self.progress.time + seconds).clamp(0.0, self.progress.duration);
    }

    pub(crate) fn toggle_pause(&mut self) {
        self.status = match self.status {
            PlayerStatus::Playing => PlayerStatus::Paused,
            PlayerStatus::Paused => PlayerStatus::Playing,
            other => other,
        };
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.progress.is_ready() && self.progress.time >= self.progress.duration
    }

    #[cfg(test)]
    pub(crate) fn should_start_from_beginning(&self) -> bool {
        self.should_start_from_beginning
    }

    #[cfg(test)]
    pub(crate) fn set_progress(&mut self, time: f64, duration: f64) {
        self.progress = PlaybackProgress::new(time, duration);
    }

    #[cfg(test)]
    pub(crate) fn set_status(&mut self, status: PlayerStatus) {
        self.status = status;
    }
}

impl ProgressSource for PlayerState {
    fn progress(&self) -> PlaybackProgress {
        self.progress
    }

    fn status(&self) -> PlayerStatus {
        self.status
    }

    fn meta(&self) -> Option<&ShowMeta> {
        self.meta.as_ref()
    }

    fn next_episode_hidden(&self) -> bool {
        self.hide_next_episode_btn
    }
}

impl PlayerSink for PlayerState {
    fn set_should_start_from_beginning(&mut self, value: bool) {
        self.should_start_from_beginning = value;
    }

    fn set_direct_meta(&mut self, meta: ShowMeta) {
        self.meta = Some(meta);
        self.hide_next_episode_btn = false;
        self.progress = PlaybackProgress::default();
        self.status = PlayerStatus::Loading;
        self.pending_load = true;
    }

    fn hide_next_episode_button(&mut self) {
        self.hide_next_episode_btn = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_only_moves_while_playing_and_stops_at_the_end() {
        let mut player = PlayerState::new(100.0);
        player.set_progress(95.0, 100.0);
        player.advance_clock(3.0);
        assert_eq!(player.progress().time, 95.0);

        player.set_status(PlayerStatus::Playing);
        player.advance_clock(3.0);
        assert_eq!(player.progress().time, 98.0);
        player.advance_clock(10.0);
        assert_eq!(player.progress().time, 100.0);
        assert!(player.is_at_end());

        player.toggle_pause();
        assert_eq!(player.status(), PlayerStatus::Paused);
        player.seek_by(-250.0);
        assert_eq!(player.progress().time, 0.0);
    }

    #[test]
    fn new_meta_clears_dismissal_and_reloads() {
        let mut player = PlayerState::new(100.0);
        player.hide_next_episode_button();
        assert!(player.next_episode_hidden());

        let meta: ShowMeta = serde_json::from_str(
            r#"{"id":"s","title":"S","type":"show","episode":{"number":1},"episodes":[{"number":1},{"number":2}]}"#,
        )
        .expect("meta should parse");
        player.set_direct_meta(meta);
        assert!(!player.next_episode_hidden());
        assert_eq!(player.status(), PlayerStatus::Loading);
        assert!(!player.progress().is_ready());
    }
}
