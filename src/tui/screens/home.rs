use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use super::ScreenContext;
use crate::tui::Theme;
use crate::tui::captions::{HeaderCaption, StatusMessage, TransientCaption};
use crate::tui::keyboard::{HELP_NAVIGATE, format_help_text};
use crate::tui::runtime::{Command, Screen, ScreenId};
use crate::tui::stack::Registration;

const OWNER: &str = "home";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Open(ScreenId),
    Quit,
}

const MENU: [(&str, &str, MenuAction); 3] = [
    ("Pages", "Browse, export and delete pages", MenuAction::Open(ScreenId::Pages)),
    ("Help", "Keyboard reference and CLI commands", MenuAction::Open(ScreenId::Help)),
    ("Quit", "Leave wikit", MenuAction::Quit),
];

/// Root menu. Registers no escape handler, so Escape here does nothing.
pub struct HomeScreen {
    ctx: ScreenContext,
    selected: usize,
    _header: Registration<HeaderCaption>,
    _help: Registration<String>,
    _status: Registration<StatusMessage>,
    notice: Option<TransientCaption<StatusMessage>>,
}

impl HomeScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        let kernel = &ctx.kernel;
        let mut header = HeaderCaption::new("Wiki.js Admin");
        if let Some(instance) = &ctx.instance {
            header = header.with_metadata(instance.clone());
        }
        let header = kernel.header.publish(OWNER, header);
        let help = kernel
            .footer_help
            .publish(OWNER, format_help_text(&[HELP_NAVIGATE, "Enter open", "1-3 quick select", "q quit"]));
        let status = kernel.footer_status.publish(OWNER, StatusMessage::info("Ready"));

        Self {
            ctx,
            selected: 0,
            _header: header,
            _help: help,
            _status: status,
            notice: None,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    fn activate(&mut self, index: usize) -> Command {
        let Some((label, _, action)) = MENU.get(index) else {
            return Command::None;
        };
        match action {
            MenuAction::Open(ScreenId::Pages) if self.ctx.api.is_none() => {
                log::warn!("Pages requested without a configured instance");
                self.notice = Some(self.ctx.kernel.footer_status.publish_transient(
                    format!("{}-notice", OWNER),
                    StatusMessage::error("No instance configured. Run `wikit instances add` first."),
                    self.ctx.settings.status_duration(),
                    Instant::now(),
                ));
                Command::None
            }
            MenuAction::Open(id) => {
                log::debug!("Home: opening {}", label);
                Command::NavigateTo(*id)
            }
            MenuAction::Quit => Command::Quit,
        }
    }
}

impl Screen for HomeScreen {
    fn id(&self) -> ScreenId {
        ScreenId::Home
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        match key.code {
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                Command::None
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1).min(MENU.len() - 1);
                Command::None
            }
            KeyCode::Enter => self.activate(self.selected),
            KeyCode::Char(c @ '1'..='3') => {
                self.selected = c as usize - '1' as usize;
                self.activate(self.selected)
            }
            KeyCode::Char('q') => Command::Quit,
            KeyCode::Char('?') => Command::NavigateTo(ScreenId::Help),
            _ => Command::None,
        }
    }

    fn poll(&mut self, now: Instant) -> Command {
        if let Some(notice) = self.notice.as_mut() {
            if notice.expire_if_due(now) {
                self.notice = None;
            }
        }
        Command::None
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let items: Vec<ListItem> = MENU
            .iter()
            .enumerate()
            .map(|(i, (label, description, _))| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {}  {:<8}", i + 1, label), Style::default().fg(theme.text)),
                    Span::styled(description.to_string(), theme.muted_style()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.surface1))
                    .title(Span::styled(" Menu ", theme.title_style())),
            )
            .highlight_style(theme.selected_style());

        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TuiSettings;
    use crate::tui::kernel::Kernel;
    use crossterm::event::KeyModifiers;
    use std::time::Duration;

    fn ctx(kernel: &Kernel) -> ScreenContext {
        ScreenContext {
            kernel: kernel.clone(),
            api: None,
            instance: Some("docs".into()),
            settings: TuiSettings::default(),
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_menu_navigation() {
        let kernel = Kernel::new();
        let mut home = HomeScreen::new(ctx(&kernel));
        assert_eq!(kernel.header.current().to_string(), "Wiki.js Admin: docs");

        home.handle_key(press(KeyCode::Down));
        assert_eq!(home.handle_key(press(KeyCode::Enter)), Command::NavigateTo(ScreenId::Help));
        assert_eq!(home.handle_key(press(KeyCode::Char('3'))), Command::Quit);
        home.handle_key(press(KeyCode::Down));
        assert_eq!(home.selected(), 2);
    }

    #[test]
    fn test_pages_without_instance_shows_transient_error() {
        let kernel = Kernel::new();
        let mut home = HomeScreen::new(ctx(&kernel));

        assert_eq!(home.handle_key(press(KeyCode::Char('1'))), Command::None);
        assert!(kernel.footer_status.current().text.contains("No instance configured"));

        home.poll(Instant::now() + Duration::from_secs(6));
        assert_eq!(kernel.footer_status.current().text, "Ready");
    }

    #[test]
    fn test_home_registers_no_escape_frame() {
        let kernel = Kernel::new();
        let _home = HomeScreen::new(ctx(&kernel));
        assert_eq!(kernel.escape.depth(), 0);
    }
}
