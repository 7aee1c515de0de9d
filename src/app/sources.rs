use anyhow::Result;

use super::meta::{PlaybackProgress, PlayerStatus, ProgressRecord, ShowMeta};

pub(crate) trait ProgressSource {
    fn progress(&self) -> PlaybackProgress;
    fn status(&self) -> PlayerStatus;
    fn meta(&self) -> Option<&ShowMeta>;
    fn next_episode_hidden(&self) -> bool;
}

pub(crate) trait PreferencesSource {
    fn enable_autoplay(&self) -> bool;
}

/// Any single gate is enough to authorize autoplay.
pub(crate) trait AuthorizationSource {
    fn config_allows_autoplay(&self) -> bool;
    fn extension_active(&self) -> bool;
    fn proxy_set(&self) -> bool;

    fn autoplay_authorized(&self) -> bool {
        self.config_allows_autoplay() || self.extension_active() || self.proxy_set()
    }
}

pub(crate) trait PlayerSink {
    fn set_should_start_from_beginning(&mut self, value: bool);
    fn set_direct_meta(&mut self, meta: ShowMeta);
    fn hide_next_episode_button(&mut self);
}

pub(crate) trait ProgressStore {
    fn update_item(&mut self, meta: &ShowMeta, progress: ProgressRecord) -> Result<()>;
    fn item(&self, show_id: &str, episode: u32) -> Result<Option<ProgressRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Preferences {
    pub(crate) enable_autoplay: bool,
}

impl PreferencesSource for Preferences {
    fn enable_autoplay(&self) -> bool {
        self.enable_autoplay
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct AutoplayAuthorization {
    pub(crate) config_flag: bool,
    pub(crate) extension_active: bool,
    pub(crate) proxy_set: bool,
}

impl AuthorizationSource for AutoplayAuthorization {
    fn config_allows_autoplay(&self) -> bool {
        self.config_flag
    }

    fn extension_active(&self) -> bool {
        self.extension_active
    }

    fn proxy_set(&self) -> bool {
        self.proxy_set
    }
}
