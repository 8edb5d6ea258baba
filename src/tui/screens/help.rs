use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Tabs};

use super::ScreenContext;
use crate::tui::Theme;
use crate::tui::captions::HeaderCaption;
use crate::tui::escape::{EscapeHandler, EscapeSignal};
use crate::tui::keyboard::{
    HELP_ENTER_LIST, HELP_ESC_BACK, HELP_NAVIGATE, HELP_QUICK_JUMP, HELP_TABS,
    HELP_TABS_IN_CONTENT, HELP_TO_TAB_BAR, KeyboardMode, TabbedScreen, dispatch_key,
    format_help_text, tab_help,
};
use crate::tui::runtime::{Command, Screen, ScreenId};
use crate::tui::stack::Registration;

const OWNER: &str = "help";
const TAB_TITLES: [&str; 2] = ["Navigation", "Commands"];

const NAVIGATION: &[(&str, &str)] = &[
    ("Tab / Shift+Tab", "Next / previous tab, from anywhere"),
    ("1-9", "Jump to a tab (except while editing a field)"),
    ("← →", "Switch tabs while the tab bar is focused"),
    ("↓", "Enter the list from the tab bar or the search box"),
    ("↑", "Move up; from the first row, back to the tab bar"),
    ("s", "Search the current list"),
    ("Space", "Mark or unmark a page"),
    ("c", "Clear all marks"),
    ("Enter", "Open, confirm or start editing"),
    ("Esc", "Close the innermost thing: dialog, search, field, tab, screen"),
    ("Ctrl+C", "Quit immediately"),
];

const COMMANDS: &[(&str, &str)] = &[
    ("wikit", "Open this interface"),
    ("wikit instances list", "Show configured Wiki.js instances"),
    ("wikit instances add NAME --url URL --key KEY", "Add an instance"),
    ("wikit instances use NAME", "Make an instance the default"),
    ("wikit pages list [--search Q]", "List pages"),
    ("wikit pages export FILE", "Write every page to a JSON file"),
    ("wikit pages delete ID... [--yes]", "Delete pages by id"),
    ("wikit --instance NAME ...", "Run against a specific instance"),
];

/// Keyboard reference and CLI cheat sheet
pub struct HelpScreen {
    tab: usize,
    mode: KeyboardMode,
    selection: usize,
    _header: Registration<HeaderCaption>,
    help: Registration<String>,
    _escape: Registration<EscapeHandler>,
    escape_signal: EscapeSignal,
}

impl HelpScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        let kernel = &ctx.kernel;
        let header = kernel.header.publish(OWNER, HeaderCaption::new("Help"));
        let help = kernel.footer_help.publish(OWNER, help_text(KeyboardMode::TabBar));
        let (escape, escape_signal) = kernel.escape.register_signal(OWNER);

        Self {
            tab: 0,
            mode: KeyboardMode::TabBar,
            selection: 0,
            _header: header,
            help,
            _escape: escape,
            escape_signal,
        }
    }

    fn entries(&self) -> &'static [(&'static str, &'static str)] {
        if self.tab == 0 { NAVIGATION } else { COMMANDS }
    }
}

fn help_text(mode: KeyboardMode) -> String {
    let tabs = TAB_TITLES.len();
    match mode {
        KeyboardMode::Content => format_help_text(&[
            HELP_NAVIGATE,
            HELP_TO_TAB_BAR,
            &tab_help(HELP_TABS_IN_CONTENT, tabs),
            HELP_ESC_BACK,
        ]),
        _ => format_help_text(&[
            HELP_TABS,
            &tab_help(HELP_QUICK_JUMP, tabs),
            HELP_ENTER_LIST,
            HELP_ESC_BACK,
        ]),
    }
}

impl TabbedScreen for HelpScreen {
    fn tab_count(&self) -> usize {
        TAB_TITLES.len()
    }

    fn current_tab(&self) -> usize {
        self.tab
    }

    fn set_tab(&mut self, tab: usize) {
        self.tab = tab;
        self.selection = 0;
    }

    fn mode(&self) -> KeyboardMode {
        self.mode
    }

    fn set_mode(&mut self, mode: KeyboardMode) {
        self.mode = mode;
        self.help.replace(help_text(mode));
    }

    fn item_count(&self) -> usize {
        self.entries().len()
    }

    fn selection(&self) -> usize {
        self.selection
    }

    fn set_selection(&mut self, index: usize) {
        self.selection = index;
    }
}

impl Screen for HelpScreen {
    fn id(&self) -> ScreenId {
        ScreenId::Help
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        dispatch_key(self, key);
        Command::None
    }

    fn on_escape(&mut self) -> Command {
        if !self.escape_signal.take() {
            return Command::None;
        }
        if self.mode == KeyboardMode::TabBar {
            Command::Back
        } else {
            self.set_mode(KeyboardMode::TabBar);
            Command::None
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let tab_border = if self.mode == KeyboardMode::TabBar {
            theme.mauve
        } else {
            theme.surface1
        };
        let tabs = Tabs::new(
            TAB_TITLES
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{} {}", i + 1, t)),
        )
        .select(self.tab)
        .style(Style::default().fg(theme.subtext0))
        .highlight_style(theme.selected_style())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(tab_border)),
        );
        frame.render_widget(tabs, chunks[0]);

        let key_width = self
            .entries()
            .iter()
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(0);
        let items: Vec<ListItem> = self
            .entries()
            .iter()
            .map(|(keys, what)| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {:<width$}  ", keys, width = key_width), theme.info_style()),
                    Span::styled(*what, Style::default().fg(theme.text)),
                ]))
            })
            .collect();

        let content_border = if self.mode == KeyboardMode::Content {
            theme.mauve
        } else {
            theme.surface1
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(content_border))
                    .title(Span::styled(format!(" {} ", TAB_TITLES[self.tab]), theme.title_style())),
            )
            .highlight_style(theme.selected_style());

        let selected = (self.mode == KeyboardMode::Content).then_some(self.selection);
        let mut state = ListState::default().with_selected(selected);
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }
}
