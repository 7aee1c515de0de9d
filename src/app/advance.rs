use tracing::{debug, info, warn};

use super::meta::{EpisodeMeta, ProgressRecord, ShowMeta};
use super::sources::{PlayerSink, ProgressSource, ProgressStore};

pub(crate) type MetaObserver = Box<dyn FnMut(&ShowMeta)>;

/// The only path that switches the active episode. Manual and automatic
/// transitions both go through [`EpisodeAdvancer::advance`].
#[derive(Default)]
pub(crate) struct EpisodeAdvancer {
    on_change: Option<MetaObserver>,
}

impl std::fmt::Debug for EpisodeAdvancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpisodeAdvancer")
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

impl EpisodeAdvancer {
    pub(crate) fn with_observer(on_change: MetaObserver) -> Self {
        Self {
            on_change: Some(on_change),
        }
    }

    pub(crate) fn advance(
        &mut self,
        current: Option<&ShowMeta>,
        next: Option<&EpisodeMeta>,
        player: &mut dyn PlayerSink,
        store: &mut dyn ProgressStore,
    ) -> Option<ShowMeta> {
        let (Some(current), Some(next)) = (current, next) else {
            debug!(
                has_meta = current.is_some(),
                has_next = next.is_some(),
                "advance skipped: nothing to advance to"
            );
            return None;
        };

        let snapshot = current.with_episode(next.clone());
        player.set_should_start_from_beginning(true);
        player.set_direct_meta(snapshot.clone());
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&snapshot);
        }
        if let Err(err) = store.update_item(&snapshot, ProgressRecord::reset()) {
            warn!(
                show = %snapshot.id,
                episode = next.number,
                "failed to reset stored progress: {err:#}"
            );
        }

        info!(
            show = %snapshot.id,
            from = ?current.current_number(),
            to = next.number,
            "advanced to next episode"
        );
        Some(snapshot)
    }

    /// Advances whatever the player is currently showing.
    pub(crate) fn load_next_episode<P>(
        &mut self,
        player: &mut P,
        store: &mut dyn ProgressStore,
    ) -> Option<ShowMeta>
    where
        P: ProgressSource + PlayerSink,
    {
        let current = player.meta().cloned();
        let next = current.as_ref().and_then(ShowMeta::next_episode).cloned();
        self.advance(current.as_ref(), next.as_ref(), player, store)
    }
}
