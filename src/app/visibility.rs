use super::meta::{PlaybackProgress, PlayerStatus, ShowMeta};

/// Within this many seconds of the end the prompt shows regardless of controls.
pub(crate) const ALWAYS_SHOW_SECONDS: f64 = 30.0;
/// Past this fraction of the runtime the prompt shows alongside the controls.
pub(crate) const HOVER_SHOW_FRACTION: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShowingState {
    Always,
    Hover,
    Never,
}

impl ShowingState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hover => "hover",
            Self::Never => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Animation {
    SlideUp,
    Fade,
}

impl Animation {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::SlideUp => "slide-up",
            Self::Fade => "fade",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Lifted clear of the transport controls.
    Raised,
    /// Close to the bottom edge.
    Lowered,
}

impl Placement {
    pub(crate) fn offset_rows(self) -> u16 {
        match self {
            Self::Raised => 6,
            Self::Lowered => 3,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Raised => "raised",
            Self::Lowered => "lowered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VisibilityDecision {
    pub(crate) state: ShowingState,
    pub(crate) visible: bool,
    pub(crate) animation: Animation,
    pub(crate) placement: Placement,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VisibilityInputs {
    pub(crate) progress: PlaybackProgress,
    pub(crate) status: PlayerStatus,
    pub(crate) hidden: bool,
    pub(crate) controls_showing: bool,
}

/// Callers must not pass a zero duration.
pub(crate) fn classify(time: f64, duration: f64) -> ShowingState {
    let percentage = time / duration;
    let seconds_from_end = duration - time;
    if seconds_from_end <= ALWAYS_SHOW_SECONDS {
        ShowingState::Always
    } else if percentage >= HOVER_SHOW_FRACTION {
        ShowingState::Hover
    } else {
        ShowingState::Never
    }
}

pub(crate) fn decide(inputs: &VisibilityInputs) -> VisibilityDecision {
    let progress = inputs.progress;
    let state = if progress.is_ready() {
        classify(progress.time, progress.duration)
    } else {
        ShowingState::Never
    };

    let mut visible = match state {
        ShowingState::Always => true,
        ShowingState::Hover => inputs.controls_showing,
        ShowingState::Never => false,
    };
    if inputs.hidden || inputs.status != PlayerStatus::Playing || !progress.is_ready() {
        visible = false;
    }

    let animation = match state {
        ShowingState::Hover => Animation::SlideUp,
        ShowingState::Always | ShowingState::Never => Animation::Fade,
    };
    let placement = if inputs.controls_showing {
        Placement::Raised
    } else {
        Placement::Lowered
    };

    VisibilityDecision {
        state,
        visible,
        animation,
        placement,
    }
}

/// The prompt only exists for shows that have a following episode.
pub(crate) fn affordance_available(meta: Option<&ShowMeta>) -> bool {
    meta.is_some_and(|meta| meta.is_show() && meta.next_episode().is_some())
}

pub(crate) fn decide_for(meta: Option<&ShowMeta>, inputs: &VisibilityInputs) -> VisibilityDecision {
    let mut decision = decide(inputs);
    if !affordance_available(meta) {
        decision.visible = false;
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::super::meta::{EpisodeMeta, MediaKind};
    use super::*;

    fn episode(number: u32) -> EpisodeMeta {
        EpisodeMeta {
            number,
            title: String::new(),
            runtime: None,
        }
    }

    fn show(current: u32, numbers: &[u32]) -> ShowMeta {
        ShowMeta {
            id: "show-1".to_string(),
            title: "Show".to_string(),
            kind: MediaKind::Show,
            episode: Some(episode(current)),
            episodes: numbers.iter().copied().map(episode).collect(),
        }
    }

    fn inputs(time: f64, duration: f64, controls: bool) -> VisibilityInputs {
        VisibilityInputs {
            progress: PlaybackProgress::new(time, duration),
            status: PlayerStatus::Playing,
            hidden: false,
            controls_showing: controls,
        }
    }

    #[test]
    fn classify_uses_thirty_second_rule_first() {
        assert_eq!(classify(176.0, 200.0), ShowingState::Always);
        assert_eq!(classify(185.0, 200.0), ShowingState::Always);
        assert_eq!(classify(170.0, 200.0), ShowingState::Always);
    }

    #[test]
    fn classify_uses_ninety_percent_rule_for_long_media() {
        assert_eq!(classify(1300.0, 1440.0), ShowingState::Hover);
        assert_eq!(classify(1296.0, 1440.0), ShowingState::Hover);
        assert_eq!(classify(1295.0, 1440.0), ShowingState::Never);
        assert_eq!(classify(150.0, 200.0), ShowingState::Never);
    }

    #[test]
    fn zero_duration_is_never_shown() {
        let decision = decide(&inputs(0.0, 0.0, true));
        assert_eq!(decision.state, ShowingState::Never);
        assert!(!decision.visible);
    }

    #[test]
    fn always_state_is_visible_without_controls_and_fades() {
        let decision = decide(&inputs(176.0, 200.0, false));
        assert_eq!(decision.state, ShowingState::Always);
        assert!(decision.visible);
        assert_eq!(decision.animation, Animation::Fade);
        assert_eq!(decision.placement, Placement::Lowered);

        let with_controls = decide(&inputs(176.0, 200.0, true));
        assert_eq!(with_controls.placement, Placement::Raised);
    }

    #[test]
    fn hover_state_needs_controls_and_slides() {
        let hidden_controls = decide(&inputs(1300.0, 1440.0, false));
        assert_eq!(hidden_controls.state, ShowingState::Hover);
        assert!(!hidden_controls.visible);

        let shown_controls = decide(&inputs(1300.0, 1440.0, true));
        assert!(shown_controls.visible);
        assert_eq!(shown_controls.animation, Animation::SlideUp);
        assert_eq!(shown_controls.placement, Placement::Raised);
    }

    #[test]
    fn never_state_is_invisible_regardless_of_controls() {
        assert!(!decide(&inputs(150.0, 200.0, true)).visible);
        assert!(!decide(&inputs(150.0, 200.0, false)).visible);
    }

    #[test]
    fn overrides_force_invisible() {
        let mut dismissed = inputs(190.0, 200.0, true);
        dismissed.hidden = true;
        assert!(!decide(&dismissed).visible);

        for status in [
            PlayerStatus::Idle,
            PlayerStatus::Loading,
            PlayerStatus::Paused,
            PlayerStatus::Errored,
        ] {
            let mut paused = inputs(190.0, 200.0, true);
            paused.status = status;
            assert!(!decide(&paused).visible, "{}", status.label());
        }
    }

    #[test]
    fn movies_and_missing_next_episode_have_no_affordance() {
        let ending = inputs(190.0, 200.0, true);
        let series = show(1, &[1, 2]);
        assert!(decide_for(Some(&series), &ending).visible);

        let mut movie = show(1, &[1, 2]);
        movie.kind = MediaKind::Movie;
        assert!(!decide_for(Some(&movie), &ending).visible);

        let gap = show(3, &[1, 2, 3, 5]);
        assert!(!decide_for(Some(&gap), &ending).visible);
        assert!(!decide_for(None, &ending).visible);
    }
}
