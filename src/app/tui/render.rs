use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, Padding, Paragraph};

use super::super::autoplay::SessionPhase;
use super::super::format_clock;
use super::super::meta::PlayerStatus;
use super::super::player::PlayerState;
use super::super::sources::ProgressSource;
use super::super::truncate;
use super::super::visibility::{Animation, VisibilityDecision};

const PROMPT_WIDTH: u16 = 44;
const PROMPT_HEIGHT: u16 = 3;
const CONTROLS_HEIGHT: u16 = 3;

pub(super) struct PlayerView<'a> {
    pub(super) player: &'a PlayerState,
    pub(super) decision: VisibilityDecision,
    pub(super) controls_showing: bool,
    pub(super) phase: SessionPhase,
    pub(super) autoplay_enabled: bool,
    pub(super) status: &'a str,
}

pub(super) fn draw_player(frame: &mut Frame, view: &PlayerView<'_>) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(header(view), chunks[0]);
    draw_screen(frame, view, chunks[1]);

    let status_widget = Paragraph::new(view.status.to_string())
        .style(status_style(view.status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[2]);
}

fn header(view: &PlayerView<'_>) -> Paragraph<'static> {
    let player = view.player;
    let (show_title, episode_title) = match player.meta() {
        Some(meta) => (
            truncate(&meta.title, 32),
            meta.episode
                .as_ref()
                .map(|episode| truncate(&episode.display_title(), 32))
                .unwrap_or_else(|| "-".to_string()),
        ),
        None => ("-".to_string(), "-".to_string()),
    };
    let autoplay_text = if view.autoplay_enabled {
        format!("autoplay {}", view.phase.label())
    } else {
        "autoplay off".to_string()
    };
    Paragraph::new(Line::from(vec![
        Span::styled(
            "NEXTEP",
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(show_title, Style::default().fg(Color::Rgb(230, 230, 230))),
        Span::styled("   ", Style::default()),
        Span::styled(
            episode_title,
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            player.status().label(),
            Style::default().fg(status_color(player.status())),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(autoplay_text, Style::default().fg(Color::Yellow)),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Now Playing"))
}

fn draw_screen(frame: &mut Frame, view: &PlayerView<'_>, area: Rect) {
    let screen = panel_block("Screen");
    let inner = screen.inner(area);
    frame.render_widget(screen, area);

    if view.controls_showing && inner.height >= CONTROLS_HEIGHT {
        let controls_area = Rect::new(
            inner.x,
            inner.y + inner.height - CONTROLS_HEIGHT,
            inner.width,
            CONTROLS_HEIGHT,
        );
        draw_controls(frame, view.player, controls_area);
    }

    if view.decision.visible {
        draw_prompt(frame, view.decision, inner);
    }
}

fn draw_controls(frame: &mut Frame, player: &PlayerState, area: Rect) {
    let progress = player.progress();
    let ratio = if progress.is_ready() {
        (progress.time / progress.duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(2)])
        .split(area);

    let gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(Color::Rgb(130, 190, 255))
                .bg(Color::Rgb(40, 44, 52))
                .add_modifier(Modifier::BOLD),
        )
        .label(format!(
            "{} / {}",
            format_clock(progress.time),
            format_clock(progress.duration)
        ))
        .ratio(ratio);
    frame.render_widget(gauge, rows[0]);

    let hints = Paragraph::new(Line::from(vec![Span::styled(
        "space pause  ←/→ seek  c controls  n next  x dismiss  q quit",
        Style::default().fg(Color::Rgb(185, 195, 210)),
    )]))
    .alignment(Alignment::Center);
    frame.render_widget(hints, rows[1]);
}

fn draw_prompt(frame: &mut Frame, decision: VisibilityDecision, screen: Rect) {
    let area = prompt_rect(screen, decision.placement.offset_rows());
    if area.width == 0 || area.height == 0 {
        return;
    }
    frame.render_widget(Clear, area);
    let line = Line::from(vec![
        Span::styled(" x Cancel ", pill_inactive()),
        Span::styled("  ", Style::default()),
        Span::styled(" ▶▶ Next episode (n) ", pill_active()),
    ]);
    let prompt = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(prompt_block(decision.animation));
    frame.render_widget(prompt, area);
}

/// Anchors the prompt to the bottom-right corner, `offset_rows` above the edge.
pub(super) fn prompt_rect(screen: Rect, offset_rows: u16) -> Rect {
    let width = PROMPT_WIDTH.min(screen.width);
    let height = PROMPT_HEIGHT.min(screen.height);
    let lift = offset_rows.min(screen.height.saturating_sub(height));
    let x = screen.x + screen.width.saturating_sub(width.saturating_add(2)).min(screen.width - width);
    let y = screen.y + screen.height.saturating_sub(height + lift);
    Rect::new(x, y, width, height)
}

fn prompt_block(animation: Animation) -> Block<'static> {
    let border = match animation {
        Animation::Fade => Style::default().fg(Color::Rgb(160, 190, 235)),
        Animation::SlideUp => Style::default()
            .fg(Color::Rgb(205, 165, 255))
            .add_modifier(Modifier::BOLD),
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .padding(Padding::horizontal(1))
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn pill_active() -> Style {
    Style::default()
        .bg(Color::Rgb(110, 170, 255))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn pill_inactive() -> Style {
    Style::default()
        .bg(Color::Rgb(72, 82, 96))
        .fg(Color::Rgb(230, 235, 242))
}

fn status_color(status: PlayerStatus) -> Color {
    match status {
        PlayerStatus::Playing => Color::Rgb(140, 220, 160),
        PlayerStatus::Paused | PlayerStatus::Loading => Color::Rgb(230, 200, 120),
        PlayerStatus::Errored => Color::Rgb(255, 145, 120),
        PlayerStatus::Idle => Color::Rgb(185, 195, 210),
    }
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}
