use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::Theme;
use super::kernel::Kernel;
use super::keyboard::format_help_text;
use super::screens::{self, ScreenContext};
use super::stack::ListenerGuard;

/// Side effects a screen asks the runtime to perform
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    None,
    Batch(Vec<Command>),
    /// Mount a new screen on top of the current one
    NavigateTo(ScreenId),
    /// Unmount the current screen
    Back,
    Quit,
}

impl Command {
    pub fn batch(commands: Vec<Command>) -> Self {
        Command::Batch(commands)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Home,
    Pages,
    Help,
}

/// A mounted screen.
///
/// Screens publish their kernel frames when constructed and release them when dropped.
pub trait Screen {
    fn id(&self) -> ScreenId;

    fn handle_key(&mut self, key: KeyEvent) -> Command;

    /// Apply an Escape the router just delivered to one of this screen's frames.
    ///
    /// Runs before the next input event is handled.
    fn on_escape(&mut self) -> Command {
        Command::None
    }

    /// Called once per frame: async work, timers
    fn poll(&mut self, _now: Instant) -> Command {
        Command::None
    }

    /// True while the screen shows something that changes without input
    fn is_busy(&self) -> bool {
        false
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);
}

const GLOBAL_HELP: &str = "Esc back • Ctrl+C quit";

pub struct Runtime {
    ctx: ScreenContext,
    theme: Theme,
    screens: Vec<Box<dyn Screen>>,
    captions_dirty: Arc<AtomicBool>,
    _caption_guards: Vec<ListenerGuard>,
    redraw: bool,
    quit: bool,
}

impl Runtime {
    pub fn new(ctx: ScreenContext) -> Self {
        let (captions_dirty, guards) = ctx.kernel.watch_captions();
        let theme = Theme::new(ctx.settings.theme);
        let home = screens::build(ScreenId::Home, &ctx);

        Self {
            ctx,
            theme,
            screens: vec![home],
            captions_dirty,
            _caption_guards: guards,
            redraw: true,
            quit: false,
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.ctx.kernel
    }

    pub fn current_screen(&self) -> Option<ScreenId> {
        self.screens.last().map(|s| s.id())
    }

    pub fn depth(&self) -> usize {
        self.screens.len()
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            log::info!("Ctrl+C pressed, quitting");
            self.quit = true;
            return;
        }

        self.redraw = true;
        if key.code == KeyCode::Esc {
            if !self.ctx.kernel.escape.dispatch() {
                return;
            }
            if let Some(screen) = self.screens.last_mut() {
                let command = screen.on_escape();
                self.apply(command);
            }
            return;
        }

        if let Some(screen) = self.screens.last_mut() {
            let command = screen.handle_key(key);
            self.apply(command);
        }
    }

    /// Force the next [`Runtime::take_redraw`] to report a change, e.g. after a resize
    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    /// Whether the next frame must be drawn; clears the pending state.
    ///
    /// True after input, after a caption stack changed, or while the top screen is busy.
    pub fn take_redraw(&mut self) -> bool {
        let captions = self.captions_dirty.swap(false, Ordering::SeqCst);
        if captions {
            log::debug!(
                "Captions changed: header='{}' help='{}' status='{}'",
                self.ctx.kernel.header.current(),
                self.ctx.kernel.footer_help.current(),
                self.ctx.kernel.footer_status.current()
            );
        }
        let busy = self.screens.last().is_some_and(|s| s.is_busy());
        std::mem::take(&mut self.redraw) || captions || busy
    }

    /// Poll the top screen and apply whatever it asks for
    pub fn tick(&mut self, now: Instant) {
        if let Some(screen) = self.screens.last_mut() {
            let command = screen.poll(now);
            self.apply(command);
        }
    }

    pub fn apply(&mut self, command: Command) {
        if !command.is_none() {
            self.redraw = true;
        }
        match command {
            Command::None => {}
            Command::Batch(commands) => {
                for command in commands {
                    self.apply(command);
                }
            }
            Command::NavigateTo(id) => {
                log::info!("Navigating to {:?}", id);
                let screen = screens::build(id, &self.ctx);
                self.screens.push(screen);
            }
            Command::Back => {
                if self.screens.len() > 1 {
                    if let Some(screen) = self.screens.pop() {
                        log::info!("Leaving {:?}", screen.id());
                    }
                } else {
                    log::debug!("Back at the root screen, ignoring");
                }
            }
            Command::Quit => {
                log::info!("Quit requested");
                self.quit = true;
            }
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        if let Some(screen) = self.screens.last_mut() {
            screen.render(frame, chunks[1], &self.theme);
        }
        self.render_footer(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let header = self.ctx.kernel.header.current();

        let mut spans = vec![Span::styled(header.title.clone(), theme.title_style())];
        if let Some(metadata) = header.metadata.filter(|m| !m.is_empty()) {
            spans.push(Span::styled(format!(" • {}", metadata), theme.muted_style()));
        }

        let badge = match &self.ctx.instance {
            Some(instance) => Span::styled(
                format!(" {} ", instance),
                Style::default()
                    .fg(theme.base)
                    .bg(theme.instance_color(instance))
                    .add_modifier(Modifier::BOLD),
            ),
            None => Span::styled(" no instance ", theme.error_style()),
        };
        let badge_width = badge.width() as u16 + 2;

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.surface1));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(badge_width)])
            .split(inner);
        frame.render_widget(Paragraph::new(Line::from(spans)), columns[0]);
        frame.render_widget(
            Paragraph::new(Line::from(badge)).alignment(ratatui::layout::Alignment::Right),
            columns[1],
        );
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let status = self.ctx.kernel.footer_status.current();
        let help = self
            .ctx
            .kernel
            .footer_help
            .published()
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| format_help_text(&[GLOBAL_HELP]));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.surface1));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let status_width = (status.text.chars().count() as u16 + 1).min(inner.width / 2);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(status_width), Constraint::Min(0)])
            .split(inner);

        frame.render_widget(
            Paragraph::new(Span::styled(status.text.clone(), theme.status_style(status.level))),
            columns[0],
        );
        frame.render_widget(
            Paragraph::new(Span::styled(help, theme.muted_style()))
                .alignment(ratatui::layout::Alignment::Right),
            columns[1],
        );
    }
}
