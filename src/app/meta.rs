use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct PlaybackProgress {
    pub(crate) time: f64,
    pub(crate) duration: f64,
}

impl PlaybackProgress {
    pub(crate) fn new(time: f64, duration: f64) -> Self {
        Self { time, duration }
    }

    /// A zero duration means the media has not finished loading.
    pub(crate) fn is_ready(&self) -> bool {
        self.duration != 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum PlayerStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Errored,
}

impl PlayerStatus {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Errored => "errored",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MediaKind {
    Movie,
    Show,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct EpisodeMeta {
    pub(crate) number: u32,
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) runtime: Option<f64>,
}

impl EpisodeMeta {
    pub(crate) fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Episode {}", self.number)
        } else {
            format!("{}. {}", self.number, self.title.trim())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ShowMeta {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(rename = "type")]
    pub(crate) kind: MediaKind,
    #[serde(default)]
    pub(crate) episode: Option<EpisodeMeta>,
    #[serde(default)]
    pub(crate) episodes: Vec<EpisodeMeta>,
}

impl ShowMeta {
    /// Entry numbered one past the current episode; list order is irrelevant.
    pub(crate) fn next_episode(&self) -> Option<&EpisodeMeta> {
        let current = self.episode.as_ref()?;
        let wanted = current.number.checked_add(1)?;
        self.episodes.iter().find(|episode| episode.number == wanted)
    }

    pub(crate) fn with_episode(&self, episode: EpisodeMeta) -> Self {
        Self {
            episode: Some(episode),
            ..self.clone()
        }
    }

    pub(crate) fn current_number(&self) -> Option<u32> {
        self.episode.as_ref().map(|episode| episode.number)
    }

    pub(crate) fn is_show(&self) -> bool {
        self.kind == MediaKind::Show
    }

    /// Picks the starting episode: the requested number, the one already set
    /// in the file, or the lowest-numbered episode.
    pub(crate) fn select_episode(&mut self, number: Option<u32>) -> Result<()> {
        if let Some(number) = number {
            let Some(episode) = self.episodes.iter().find(|ep| ep.number == number) else {
                bail!("episode {number} is not listed for '{}'", self.title);
            };
            self.episode = Some(episode.clone());
            return Ok(());
        }
        if self.episode.is_none() {
            self.episode = self.episodes.iter().min_by_key(|ep| ep.number).cloned();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct ProgressRecord {
    pub(crate) duration: f64,
    pub(crate) watched: f64,
}

impl ProgressRecord {
    pub(crate) fn reset() -> Self {
        Self {
            duration: 0.0,
            watched: 0.0,
        }
    }
}

pub(crate) fn parse_show(raw: &str) -> Result<ShowMeta> {
    let show: ShowMeta = serde_json::from_str(raw).context("invalid show document")?;
    if let Some(bad) = show.episodes.iter().find(|episode| episode.number == 0) {
        bail!("episode numbers start at 1 (found '{}' numbered 0)", bad.title);
    }
    Ok(show)
}

pub(crate) fn load_show_file(path: &Path) -> Result<ShowMeta> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read show file {}", path.display()))?;
    parse_show(&raw).with_context(|| format!("failed to parse show file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SHOW: &str = r#"{
        "id": "tt-001",
        "title": "Harbour Lights",
        "type": "show",
        "episodes": [
            {"number": 2, "title": "Low Tide", "runtime": 1500},
            {"number": 1, "title": "Arrival"},
            {"number": 3}
        ]
    }"#;

    #[test]
    fn parse_show_reads_kind_and_defaults() {
        let show = parse_show(SHOW).expect("show should parse");
        assert_eq!(show.kind, MediaKind::Show);
        assert!(show.episode.is_none());
        assert_eq!(show.episodes.len(), 3);
        assert_eq!(show.episodes[2].title, "");
        assert_eq!(show.episodes[0].runtime, Some(1500.0));
    }

    #[test]
    fn parse_show_rejects_episode_zero() {
        let raw = r#"{"id":"x","title":"X","type":"show","episodes":[{"number":0}]}"#;
        assert!(parse_show(raw).is_err());
    }

    #[test]
    fn select_episode_defaults_to_lowest_number() {
        let mut show = parse_show(SHOW).expect("show should parse");
        show.select_episode(None).expect("selection should succeed");
        assert_eq!(show.current_number(), Some(1));
    }

    #[test]
    fn select_episode_rejects_unknown_number() {
        let mut show = parse_show(SHOW).expect("show should parse");
        assert!(show.select_episode(Some(9)).is_err());
        show.select_episode(Some(2)).expect("episode 2 exists");
        assert_eq!(show.current_number(), Some(2));
    }

    #[test]
    fn next_episode_matches_by_number_not_position() {
        let mut show = parse_show(SHOW).expect("show should parse");
        show.select_episode(Some(1)).expect("episode 1 exists");
        assert_eq!(show.next_episode().map(|ep| ep.number), Some(2));
        show.select_episode(Some(3)).expect("episode 3 exists");
        assert!(show.next_episode().is_none());
    }

    #[test]
    fn with_episode_only_replaces_episode() {
        let mut show = parse_show(SHOW).expect("show should parse");
        show.select_episode(Some(1)).expect("episode 1 exists");
        let next = show.next_episode().cloned().expect("next exists");
        let advanced = show.with_episode(next);
        assert_eq!(advanced.current_number(), Some(2));
        assert_eq!(advanced.id, show.id);
        assert_eq!(advanced.episodes, show.episodes);
    }

    #[test]
    fn display_title_falls_back_to_number() {
        let episode = EpisodeMeta {
            number: 4,
            title: "  ".to_string(),
            runtime: None,
        };
        assert_eq!(episode.display_title(), "Episode 4");
    }

    #[test]
    fn load_show_file_reports_path_on_failure() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"{not json").expect("write temp file");
        let err = load_show_file(file.path()).expect_err("broken file should fail");
        assert!(format!("{err:#}").contains("failed to parse show file"));

        let mut good = tempfile::NamedTempFile::new().expect("temp file");
        good.write_all(SHOW.as_bytes()).expect("write temp file");
        let show = load_show_file(good.path()).expect("valid file should load");
        assert_eq!(show.title, "Harbour Lights");
    }
}
