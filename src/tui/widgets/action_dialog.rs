use std::time::Instant;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

use crate::tui::Theme;
use crate::tui::async_action::{ActionEvent, ActionState, AsyncActionController, DialogChoice};
use crate::tui::escape::{EscapeHandler, EscapeSignal};
use crate::tui::kernel::Kernel;
use crate::tui::keyboard::{HELP_ENTER_CONFIRM, HELP_ESC_CANCEL, format_help_text};
use crate::tui::stack::Registration;

/// An [`AsyncActionController`] mounted on the kernel.
///
/// Opening the dialog pushes an escape frame and a footer-help frame; dropping it removes
/// both, so the owning screen's captions and escape handler come back.
pub struct ActionDialog {
    controller: AsyncActionController,
    escape: Registration<EscapeHandler>,
    escape_signal: EscapeSignal,
    help: Registration<String>,
    shown_state: ActionState,
}

impl ActionDialog {
    pub fn open(kernel: &Kernel, owner: &str, controller: AsyncActionController) -> Self {
        let frame_id = format!("{}:dialog", owner);
        let (escape, escape_signal) = kernel.escape.register_signal(frame_id.as_str());
        let state = controller.state();
        let help = kernel.footer_help.publish(frame_id.as_str(), help_for(state));
        log::debug!("Opened action dialog '{}' for {}", controller.title(), owner);

        Self {
            controller,
            escape,
            escape_signal,
            help,
            shown_state: state,
        }
    }

    pub fn controller(&self) -> &AsyncActionController {
        &self.controller
    }

    pub fn state(&self) -> ActionState {
        self.controller.state()
    }

    pub fn is_finished(&self) -> bool {
        self.controller.is_finished()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ActionEvent> {
        let event = self.controller.handle_key(key);
        self.sync_help();
        event
    }

    /// Apply an Escape press routed to this dialog's frame.
    ///
    /// Called by the owner right after the router ran the handler, before the next key.
    pub fn on_escape(&mut self) -> Option<ActionEvent> {
        if !self.escape_signal.take() {
            return None;
        }
        let event = self.controller.handle_escape();
        self.sync_help();
        event
    }

    /// Apply any Escape still pending, then drive the controller
    pub fn poll(&mut self, now: Instant) -> Option<ActionEvent> {
        let event = self.on_escape().or_else(|| self.controller.poll(now));
        self.sync_help();
        event
    }

    pub fn close(mut self) {
        self.escape.dispose();
        self.help.dispose();
    }

    fn sync_help(&mut self) {
        let state = self.controller.state();
        if state != self.shown_state {
            self.shown_state = state;
            self.help.replace(help_for(state));
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let c = &self.controller;
        let accent = theme.dialog_accent(c.is_destructive());
        let mut lines: Vec<Line> = Vec::new();

        match c.state() {
            ActionState::Confirming => {
                lines.push(Line::from(Span::styled(c.body().to_string(), Style::default().fg(theme.text))));
                lines.push(Line::default());
                let (items, hidden) = c.visible_items();
                for item in items {
                    lines.push(Line::from(Span::styled(item.clone(), Style::default().fg(theme.blue))));
                }
                if hidden > 0 {
                    lines.push(Line::from(Span::styled(format!("... and {} more", hidden), theme.muted_style())));
                }
                if !items.is_empty() {
                    lines.push(Line::default());
                }
                let confirm_style = if c.is_destructive() { theme.error_style() } else { theme.success_style() };
                lines.push(buttons(theme, c.selected(), c.confirm_label(), confirm_style, c.cancel_label()));
            }
            ActionState::Loading => {
                lines.push(Line::from(Span::styled(
                    c.loading_text().to_string(),
                    theme.warning_style().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::default());
                let progress = c.progress();
                if !progress.is_empty() {
                    lines.push(Line::from(Span::styled(progress, Style::default().fg(theme.sapphire))));
                } else if let Some(first) = c.all_items().first() {
                    let first = first.trim_start_matches("• ").to_string();
                    lines.push(Line::from(Span::styled(first, Style::default().fg(theme.text))));
                }
                lines.push(Line::default());
                lines.push(Line::from(Span::styled("Please wait...", theme.muted_style())));
            }
            ActionState::Success => {
                lines.push(Line::from(Span::styled(
                    c.success_text().to_string(),
                    theme.success_style().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::default());
                lines.push(Line::from(Span::styled("Closing...", theme.muted_style())));
            }
            ActionState::Error => {
                lines.push(Line::from(Span::styled(
                    "Error",
                    theme.error_style().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::default());
                for line in c.error().unwrap_or("Unknown error occurred").lines() {
                    lines.push(Line::from(Span::styled(line.to_string(), Style::default().fg(theme.text))));
                }
                lines.push(Line::default());
                lines.push(buttons(theme, c.selected(), "Try Again", theme.warning_style(), c.cancel_label()));
            }
        }

        let height = (lines.len() as u16 + 4).min(area.height);
        let width = (area.width * 7 / 10).max(40).min(area.width);
        let popup = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(accent))
            .title(Span::styled(
                format!(" {} ", c.title()),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ))
            .title_alignment(Alignment::Center);

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .style(Style::default().bg(theme.mantle)),
            popup,
        );
    }
}

fn buttons<'a>(
    theme: &Theme,
    selected: DialogChoice,
    confirm: &str,
    confirm_style: Style,
    cancel: &str,
) -> Line<'a> {
    let style_for = |choice: DialogChoice, idle: Style| {
        if choice == selected {
            theme.selected_style()
        } else {
            idle
        }
    };
    Line::from(vec![
        Span::styled(format!("[ {} ]", confirm), style_for(DialogChoice::Confirm, confirm_style)),
        Span::raw("   "),
        Span::styled(format!("[ {} ]", cancel), style_for(DialogChoice::Cancel, theme.muted_style())),
    ])
}

fn help_for(state: ActionState) -> String {
    match state {
        ActionState::Confirming => format_help_text(&["←→ select", HELP_ENTER_CONFIRM, HELP_ESC_CANCEL]),
        ActionState::Error => format_help_text(&["←→ select", "Enter choose", "Esc try again"]),
        ActionState::Loading | ActionState::Success => String::new(),
    }
}
