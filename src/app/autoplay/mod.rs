mod scheduler;

use std::time::{Duration, Instant};

use tracing::debug;

use super::advance::EpisodeAdvancer;
use super::meta::{PlayerStatus, ShowMeta};
use super::sources::{
    AuthorizationSource, PlayerSink, PreferencesSource, ProgressSource, ProgressStore,
};

use self::scheduler::CoalescingScheduler;

/// Autoplay arms within the final `1 / AUTOPLAY_TAIL_DIVISOR` of the runtime.
pub(crate) const AUTOPLAY_TAIL_DIVISOR: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionPhase {
    Idle,
    Armed,
    Fired,
}

impl SessionPhase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Fired => "fired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AutoplayTiming {
    pub(crate) debounce: Duration,
    pub(crate) throttle: Duration,
}

pub(crate) fn is_ending(time: f64, duration: f64) -> bool {
    duration != 0.0 && time >= duration - duration / AUTOPLAY_TAIL_DIVISOR
}

pub(crate) struct AutoplayController {
    preferences: Box<dyn PreferencesSource>,
    authorization: Box<dyn AuthorizationSource>,
    scheduler: CoalescingScheduler<u32>,
    phase: SessionPhase,
    session_episode: Option<u32>,
    armed_with: Option<(u32, f64)>,
}

impl std::fmt::Debug for AutoplayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoplayController")
            .field("scheduler", &self.scheduler)
            .field("phase", &self.phase)
            .field("session_episode", &self.session_episode)
            .field("armed_with", &self.armed_with)
            .finish_non_exhaustive()
    }
}

impl AutoplayController {
    pub(crate) fn new(
        preferences: Box<dyn PreferencesSource>,
        authorization: Box<dyn AuthorizationSource>,
        timing: AutoplayTiming,
    ) -> Self {
        Self {
            preferences,
            authorization,
            scheduler: CoalescingScheduler::new(timing.debounce, timing.throttle),
            phase: SessionPhase::Idle,
            session_episode: None,
            armed_with: None,
        }
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Episode number an eligible tick would schedule, if any.
    pub(crate) fn eligible_target(&self, player: &dyn ProgressSource) -> Option<u32> {
        if !self.preferences.enable_autoplay() {
            return None;
        }
        let meta = player.meta()?;
        if !meta.is_show() {
            return None;
        }
        let next = meta.next_episode()?;
        if player.status() != PlayerStatus::Playing {
            return None;
        }
        let progress = player.progress();
        if !is_ending(progress.time, progress.duration) {
            return None;
        }
        if !self.authorization.autoplay_authorized() {
            return None;
        }
        Some(next.number)
    }

    pub(crate) fn on_tick(&mut self, now: Instant, player: &dyn ProgressSource) {
        let episode = player.meta().and_then(ShowMeta::current_number);
        if episode != self.session_episode {
            if self.scheduler.cancel() {
                debug!(?episode, "episode changed, dropped pending autoplay");
            }
            self.session_episode = episode;
            self.phase = SessionPhase::Idle;
            self.armed_with = None;
        }
        if self.phase == SessionPhase::Fired {
            return;
        }

        match self.eligible_target(player) {
            Some(target) => {
                // Identical ticks leave the quiescence timer running.
                let inputs = (target, player.progress().time);
                if self.armed_with == Some(inputs) && self.scheduler.next_deadline().is_some() {
                    return;
                }
                if self.phase == SessionPhase::Idle {
                    debug!(target, "autoplay armed");
                }
                self.scheduler.schedule(now, target);
                self.phase = SessionPhase::Armed;
                self.armed_with = Some(inputs);
            }
            None => {
                if self.scheduler.cancel() {
                    debug!("autoplay no longer eligible, cancelled pending advance");
                }
                self.phase = SessionPhase::Idle;
                self.armed_with = None;
            }
        }
    }

    /// Fires a due advance. Returns whether the episode changed.
    pub(crate) fn poll<P>(
        &mut self,
        now: Instant,
        player: &mut P,
        advancer: &mut EpisodeAdvancer,
        store: &mut dyn ProgressStore,
    ) -> bool
    where
        P: ProgressSource + PlayerSink,
    {
        let Some(target) = self.scheduler.poll(now) else {
            return false;
        };
        self.armed_with = None;
        if self.eligible_target(&*player) != Some(target) {
            debug!(target, "dropping stale autoplay advance");
            self.phase = SessionPhase::Idle;
            return false;
        }
        self.phase = SessionPhase::Fired;

        let current = player.meta().cloned();
        let next = current.as_ref().and_then(ShowMeta::next_episode).cloned();
        advancer
            .advance(current.as_ref(), next.as_ref(), player, store)
            .is_some()
    }

    /// Drops any pending advance, e.g. before a manual transition.
    pub(crate) fn cancel_pending(&mut self) -> bool {
        let cancelled = self.scheduler.cancel();
        self.armed_with = None;
        if self.phase == SessionPhase::Armed {
            self.phase = SessionPhase::Idle;
        }
        cancelled
    }

    pub(crate) fn teardown(&mut self) {
        if self.scheduler.cancel() {
            debug!("session ended, cancelled pending autoplay");
        }
        self.phase = SessionPhase::Idle;
        self.session_episode = None;
        self.armed_with = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ending_window_is_final_hundredth() {
        assert!(is_ending(199.0, 200.0));
        assert!(is_ending(198.0, 200.0));
        assert!(!is_ending(197.9, 200.0));
        assert!(!is_ending(0.0, 0.0));
        assert!(is_ending(200.0, 200.0));
    }
}
