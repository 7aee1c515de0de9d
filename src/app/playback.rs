use std::time::Instant;

use tracing::{debug, warn};

use super::advance::EpisodeAdvancer;
use super::autoplay::{AutoplayController, SessionPhase};
use super::meta::{ProgressRecord, ShowMeta};
use super::player::PlayerState;
use super::sources::{PlayerSink, ProgressSource, ProgressStore};
use super::visibility::{VisibilityDecision, VisibilityInputs, decide_for};

/// One viewing session: the player, the autoplay controller and the advancer
/// sharing a progress store.
pub(crate) struct Playback<'a> {
    player: PlayerState,
    autoplay: AutoplayController,
    advancer: EpisodeAdvancer,
    store: &'a mut dyn ProgressStore,
}

impl<'a> Playback<'a> {
    pub(crate) fn new(
        player: PlayerState,
        autoplay: AutoplayController,
        advancer: EpisodeAdvancer,
        store: &'a mut dyn ProgressStore,
    ) -> Self {
        Self {
            player,
            autoplay,
            advancer,
            store,
        }
    }

    pub(crate) fn start(&mut self, meta: ShowMeta) {
        self.player.set_direct_meta(meta);
        self.player.finish_loading(&*self.store);
    }

    pub(crate) fn player(&self) -> &PlayerState {
        &self.player
    }

    pub(crate) fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        self.autoplay.phase()
    }

    pub(crate) fn autoplay_deadline(&self) -> Option<Instant> {
        self.autoplay.next_deadline()
    }

    /// Handles one progress tick. A pending advance that came due before this
    /// tick fires first; then playback moves forward by `elapsed_secs` and
    /// autoplay eligibility is re-evaluated. Returns whether the episode changed.
    pub(crate) fn tick(&mut self, now: Instant, elapsed_secs: f64) -> bool {
        self.player.finish_loading(&*self.store);
        let advanced = self.autoplay.poll(
            now,
            &mut self.player,
            &mut self.advancer,
            &mut *self.store,
        );
        if advanced {
            self.player.finish_loading(&*self.store);
        }
        self.player.advance_clock(elapsed_secs);
        self.autoplay.on_tick(now, &self.player);
        advanced
    }

    pub(crate) fn visibility(&self, controls_showing: bool) -> VisibilityDecision {
        decide_for(
            self.player.meta(),
            &VisibilityInputs {
                progress: self.player.progress(),
                status: self.player.status(),
                hidden: self.player.next_episode_hidden(),
                controls_showing,
            },
        )
    }

    /// Manual "next episode" action.
    pub(crate) fn next_episode(&mut self) -> Option<ShowMeta> {
        if self.autoplay.cancel_pending() {
            debug!("manual advance replaced pending autoplay");
        }
        self.save_position();
        let advanced = self
            .advancer
            .load_next_episode(&mut self.player, &mut *self.store);
        if advanced.is_some() {
            self.player.finish_loading(&*self.store);
        }
        advanced
    }

    pub(crate) fn dismiss(&mut self) {
        self.player.hide_next_episode_button();
    }

    /// Ends the session: cancels any pending advance and stores the position.
    pub(crate) fn teardown(&mut self) {
        self.autoplay.teardown();
        self.save_position();
    }

    fn save_position(&mut self) {
        let progress = self.player.progress();
        let Some(meta) = self.player.meta() else {
            return;
        };
        if !progress.is_ready() {
            return;
        }
        let record = ProgressRecord {
            duration: progress.duration,
            watched: progress.time,
        };
        if let Err(err) = self.store.update_item(meta, record) {
            warn!(show = %meta.id, "failed to store watch position: {err:#}");
        }
    }
}
