use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use futures::FutureExt;
use futures::future::BoxFuture;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};

use super::ScreenContext;
use crate::api::{BatchReport, ExportSummary, Page, delete_pages, export_pages};
use crate::tui::Theme;
use crate::tui::async_action::{ActionEvent, ActionState, AsyncActionController, ProgressReporter};
use crate::tui::captions::{HeaderCaption, StatusMessage, TransientCaption};
use crate::tui::escape::{EscapeHandler, EscapeSignal};
use crate::tui::keyboard::{
    HELP_ENTER_CONFIRM, HELP_ENTER_LIST, HELP_ENTER_RESULTS, HELP_ESC_BACK, HELP_ESC_CANCEL,
    HELP_EXIT_SEARCH, HELP_NAVIGATE, HELP_QUICK_JUMP, HELP_SEARCH, HELP_TABS,
    HELP_TABS_IN_CONTENT, HELP_TO_TAB_BAR, HELP_TYPE_TO_EDIT, HELP_TYPE_TO_SEARCH, KeyboardMode,
    TabbedScreen, dispatch_key, format_help_text, tab_help,
};
use crate::tui::runtime::{Command, Screen, ScreenId};
use crate::tui::search::filter_pages;
use crate::tui::stack::Registration;
use crate::tui::widgets::{ActionDialog, TextField};

const OWNER: &str = "pages";
const NOTICE_OWNER: &str = "pages:notice";

const TAB_TITLES: [&str; 3] = ["Pages", "Export", "Delete"];
pub const TAB_PAGES: usize = 0;
pub const TAB_EXPORT: usize = 1;
pub const TAB_DELETE: usize = 2;

const ROW_DIRECTORY: usize = 0;
const ROW_FILENAME: usize = 1;
const ROW_BUTTONS: usize = 2;
const EXPORT_ROWS: usize = 3;

const NO_INSTANCE: &str = "No instance configured. Run `wikit instances add` first.";

type PageLoad = BoxFuture<'static, anyhow::Result<Vec<Page>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportButton {
    Export,
    Cancel,
}

enum PendingAction {
    Export,
    Delete { report: Arc<Mutex<Option<BatchReport>>> },
}

/// Browse, export and bulk-delete pages of the active instance
pub struct PagesScreen {
    ctx: ScreenContext,
    tab: usize,
    mode: KeyboardMode,

    pages: Vec<Page>,
    load: Option<PageLoad>,
    load_error: Option<String>,

    page_query: String,
    page_view: Vec<usize>,
    page_selection: usize,

    delete_query: String,
    delete_view: Vec<usize>,
    delete_selection: usize,
    marked: BTreeSet<u64>,

    directory: TextField,
    filename: TextField,
    export_row: usize,
    export_button: ExportButton,
    edit_backup: String,

    dialog: Option<(ActionDialog, PendingAction)>,

    header: Registration<HeaderCaption>,
    help: Registration<String>,
    status: Registration<StatusMessage>,
    notice: Option<TransientCaption<StatusMessage>>,
    _escape: Registration<EscapeHandler>,
    escape_signal: EscapeSignal,
    shown_header: HeaderCaption,
    shown_help: String,
}

impl PagesScreen {
    pub fn new(ctx: ScreenContext) -> Self {
        let kernel = ctx.kernel.clone();
        let (escape, escape_signal) = kernel.escape.register_signal(OWNER);
        let status = kernel.footer_status.publish(OWNER, StatusMessage::info(""));
        let filename = format!("pages-export-{}.json", chrono::Local::now().format("%Y-%m-%d"));

        let mut screen = Self {
            tab: TAB_PAGES,
            mode: KeyboardMode::TabBar,
            pages: Vec::new(),
            load: None,
            load_error: None,
            page_query: String::new(),
            page_view: Vec::new(),
            page_selection: 0,
            delete_query: String::new(),
            delete_view: Vec::new(),
            delete_selection: 0,
            marked: BTreeSet::new(),
            directory: TextField::new("."),
            filename: TextField::new(filename),
            export_row: ROW_DIRECTORY,
            export_button: ExportButton::Export,
            edit_backup: String::new(),
            dialog: None,
            header: kernel.header.publish(OWNER, HeaderCaption::new("Pages")),
            help: kernel.footer_help.publish(OWNER, String::new()),
            status,
            notice: None,
            _escape: escape,
            escape_signal,
            shown_header: HeaderCaption::new("Pages"),
            shown_help: String::new(),
            ctx,
        };

        if screen.ctx.api.is_some() {
            screen.start_load();
        } else {
            screen.status.replace(StatusMessage::error(NO_INSTANCE));
        }
        screen.sync_captions();
        screen
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn is_loading(&self) -> bool {
        self.load.is_some()
    }

    /// Pages shown on the current list tab, in display order
    pub fn visible_pages(&self) -> Vec<&Page> {
        let view = if self.tab == TAB_DELETE {
            &self.delete_view
        } else {
            &self.page_view
        };
        view.iter().filter_map(|&i| self.pages.get(i)).collect()
    }

    pub fn marked(&self) -> &BTreeSet<u64> {
        &self.marked
    }

    pub fn query(&self) -> &str {
        match self.tab {
            TAB_DELETE => &self.delete_query,
            _ => &self.page_query,
        }
    }

    pub fn dialog_state(&self) -> Option<ActionState> {
        self.dialog.as_ref().map(|(dialog, _)| dialog.state())
    }

    pub fn export_target(&self) -> PathBuf {
        Path::new(self.directory.value()).join(self.filename.value())
    }

    pub fn set_export_target(&mut self, directory: &str, filename: &str) {
        self.directory.set(directory);
        self.filename.set(filename);
    }

    pub fn export_button(&self) -> ExportButton {
        self.export_button
    }

    fn start_load(&mut self) {
        let Some(api) = self.ctx.api.clone() else {
            return;
        };
        log::info!("Loading pages");
        self.status.replace(StatusMessage::info("Loading pages..."));
        self.load_error = None;
        self.load = Some(async move { api.list_pages().await }.boxed());
    }

    fn poll_load(&mut self) {
        let Some(load) = self.load.as_mut() else {
            return;
        };
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let Poll::Ready(result) = load.poll_unpin(&mut cx) else {
            return;
        };
        self.load = None;

        match result {
            Ok(pages) => {
                log::info!("Loaded {} pages", pages.len());
                self.status
                    .replace(StatusMessage::info(format!("{} pages loaded", pages.len())));
                self.marked.retain(|id| pages.iter().any(|p| p.id == *id));
                self.pages = pages;
                self.refresh_views();
            }
            Err(err) => {
                let message = format!("{:#}", err);
                log::error!("Failed to load pages: {}", message);
                self.status
                    .replace(StatusMessage::error(format!("Error loading pages: {}", message)));
                self.load_error = Some(message);
            }
        }
    }

    fn refresh_views(&mut self) {
        self.page_view = filter_pages(&self.pages, &self.page_query);
        self.delete_view = filter_pages(&self.pages, &self.delete_query);
        self.page_selection = self.page_selection.min(self.page_view.len().saturating_sub(1));
        self.delete_selection = self
            .delete_selection
            .min(self.delete_view.len().saturating_sub(1));
    }

    fn notify(&mut self, message: StatusMessage) {
        self.notice = Some(self.ctx.kernel.footer_status.publish_transient(
            NOTICE_OWNER,
            message,
            self.ctx.settings.status_duration(),
            Instant::now(),
        ));
    }

    fn header_caption(&self) -> HeaderCaption {
        let metadata = if self.tab == TAB_DELETE {
            format!("{} marked", self.marked.len())
        } else {
            self.ctx
                .instance
                .clone()
                .unwrap_or_else(|| "No instance".to_string())
        };
        HeaderCaption::new("Pages").with_metadata(metadata)
    }

    fn help_text(&self) -> String {
        let tabs = TAB_TITLES.len();
        let in_content = tab_help(HELP_TABS_IN_CONTENT, tabs);
        let quick_jump = tab_help(HELP_QUICK_JUMP, tabs);

        match (self.tab, self.mode) {
            (_, KeyboardMode::Search) => {
                format_help_text(&[HELP_TYPE_TO_SEARCH, HELP_ENTER_RESULTS, HELP_EXIT_SEARCH])
            }
            (_, KeyboardMode::Editing) => {
                format_help_text(&[HELP_TYPE_TO_EDIT, HELP_ENTER_CONFIRM, HELP_ESC_CANCEL])
            }
            (TAB_EXPORT, KeyboardMode::Content) if self.export_row == ROW_BUTTONS => {
                format_help_text(&[&in_content, "←→ navigate buttons", "Enter select", "↑ to fields"])
            }
            (TAB_EXPORT, KeyboardMode::Content) => {
                format_help_text(&[&in_content, HELP_NAVIGATE, "Enter edit", HELP_TO_TAB_BAR])
            }
            (TAB_EXPORT, _) => {
                format_help_text(&[HELP_TABS, &quick_jump, "↓ enter form", HELP_ESC_BACK])
            }
            (TAB_DELETE, KeyboardMode::Content) => format_help_text(&[
                &in_content,
                HELP_SEARCH,
                HELP_NAVIGATE,
                "Space toggle",
                "c clear",
                "Enter delete",
                HELP_TO_TAB_BAR,
                HELP_ESC_BACK,
            ]),
            (_, KeyboardMode::Content) => format_help_text(&[
                &in_content,
                HELP_SEARCH,
                HELP_NAVIGATE,
                "Enter view",
                HELP_TO_TAB_BAR,
                HELP_ESC_BACK,
            ]),
            _ => format_help_text(&[HELP_TABS, &quick_jump, HELP_SEARCH, HELP_ENTER_LIST, HELP_ESC_BACK]),
        }
    }

    fn sync_captions(&mut self) {
        let header = self.header_caption();
        if header != self.shown_header {
            self.header.replace(header.clone());
            self.shown_header = header;
        }
        let help = self.help_text();
        if help != self.shown_help {
            self.help.replace(help.clone());
            self.shown_help = help;
        }
    }

    /// Innermost first: search mode, query, field edit, secondary tab, screen
    fn handle_escape(&mut self) -> Command {
        if self.mode == KeyboardMode::Search {
            self.mode = KeyboardMode::TabBar;
            return Command::None;
        }
        if self.tab != TAB_EXPORT && !self.query().is_empty() {
            self.set_query(String::new());
            return Command::None;
        }
        if self.mode == KeyboardMode::Editing {
            self.cancel_edit();
            return Command::None;
        }
        if self.tab != TAB_PAGES {
            self.tab = TAB_PAGES;
            self.mode = KeyboardMode::TabBar;
            return Command::None;
        }
        Command::Back
    }

    fn set_query(&mut self, query: String) {
        if self.tab == TAB_DELETE {
            self.delete_query = query;
            self.delete_selection = 0;
        } else {
            self.page_query = query;
            self.page_selection = 0;
        }
        self.refresh_views();
    }

    fn selected_page(&self) -> Option<&Page> {
        let (view, selection) = match self.tab {
            TAB_DELETE => (&self.delete_view, self.delete_selection),
            _ => (&self.page_view, self.page_selection),
        };
        view.get(selection).and_then(|&i| self.pages.get(i))
    }

    fn show_details(&mut self) -> bool {
        let Some(page) = self.selected_page() else {
            return false;
        };
        let details = format!(
            "{} • {} • {} • {} • id {}",
            page.path,
            page.title,
            page.locale,
            if page.is_published { "published" } else { "draft" },
            page.id
        );
        self.notify(StatusMessage::info(details));
        true
    }

    fn field_mut(&mut self, row: usize) -> Option<&mut TextField> {
        match row {
            ROW_DIRECTORY => Some(&mut self.directory),
            ROW_FILENAME => Some(&mut self.filename),
            _ => None,
        }
    }

    fn begin_edit(&mut self) {
        let row = self.export_row;
        if let Some(field) = self.field_mut(row) {
            let value = field.value().to_string();
            self.edit_backup = value;
            self.mode = KeyboardMode::Editing;
        }
    }

    fn cancel_edit(&mut self) {
        let row = self.export_row;
        let backup = std::mem::take(&mut self.edit_backup);
        if let Some(field) = self.field_mut(row) {
            field.set(backup);
        }
        self.mode = KeyboardMode::Content;
    }

    fn open_export_dialog(&mut self) {
        let Some(api) = self.ctx.api.clone() else {
            self.notify(StatusMessage::error(NO_INSTANCE));
            return;
        };
        if self.filename.value().trim().is_empty() {
            self.notify(StatusMessage::error("Filename is required"));
            return;
        }

        let target = self.export_target();
        let instance = self.ctx.instance.clone();
        let counts = ExportSummary::of(&self.pages);
        let items = vec![
            format!("• Location: {}", target.display()),
            format!(
                "• Pages: {} ({} published, {} unpublished)",
                counts.total_pages, counts.published_pages, counts.unpublished_pages
            ),
            format!("• Instance: {}", instance.as_deref().unwrap_or("default")),
        ];
        let success = format!(
            "Successfully exported {} pages to {}",
            counts.total_pages,
            target.display()
        );

        let controller = AsyncActionController::new("EXPORT PAGES", move |progress: ProgressReporter| {
            let api = api.clone();
            let target = target.clone();
            let instance = instance.clone();
            async move {
                export_pages(api.as_ref(), &target, instance, |message| progress.set(message))
                    .await
                    .map(|_| ())
            }
        })
        .message("Confirm export with the following settings:")
        .items(items)
        .confirm_text("Export")
        .cancel_text("Cancel")
        .loading_message("Exporting pages...")
        .success_message(success)
        .success_duration(self.ctx.settings.success_duration());

        let dialog = ActionDialog::open(&self.ctx.kernel, OWNER, controller);
        self.dialog = Some((dialog, PendingAction::Export));
    }

    fn open_delete_dialog(&mut self) -> bool {
        let Some(api) = self.ctx.api.clone() else {
            self.notify(StatusMessage::error(NO_INSTANCE));
            return false;
        };
        let targets: Vec<Page> = self
            .pages
            .iter()
            .filter(|p| self.marked.contains(&p.id))
            .cloned()
            .collect();
        if targets.is_empty() {
            self.notify(StatusMessage::warning("Mark pages with Space first"));
            return false;
        }

        let report = Arc::new(Mutex::new(None));
        let slot = report.clone();
        let items: Vec<String> = targets.iter().map(|p| format!("• {}", p.label())).collect();
        let message = format!("Are you sure you want to delete {} page(s)?", targets.len());

        let controller = AsyncActionController::new("CONFIRM DELETION", move |progress: ProgressReporter| {
            let api = api.clone();
            let targets = targets.clone();
            let slot = slot.clone();
            async move {
                let report = delete_pages(api.as_ref(), &targets, |i, total, page| {
                    progress.set(format!("Deleting page {}/{}: {}", i, total, page.path))
                })
                .await;
                if let Ok(mut stored) = slot.lock() {
                    *stored = Some(report.clone());
                }
                report.into_result().map(|_| ())
            }
        })
        .message(message)
        .items(items)
        .confirm_text("Yes, delete them")
        .cancel_text("No, cancel")
        .destructive(true)
        .loading_message("Deleting pages...")
        .success_message("Pages deleted successfully!")
        .success_duration(self.ctx.settings.success_duration());

        let dialog = ActionDialog::open(&self.ctx.kernel, OWNER, controller);
        self.dialog = Some((dialog, PendingAction::Delete { report }));
        true
    }

    fn on_dialog_event(&mut self, event: ActionEvent) {
        match event {
            ActionEvent::Succeeded => self.on_action_succeeded(),
            ActionEvent::Failed(message) => {
                if matches!(self.dialog, Some((_, PendingAction::Delete { .. }))) {
                    self.take_delete_report();
                }
                log::warn!("Pages action failed: {}", message);
            }
            ActionEvent::Cancelled | ActionEvent::Closed => {
                if let Some((dialog, _)) = self.dialog.take() {
                    dialog.close();
                }
            }
            ActionEvent::Started | ActionEvent::Retrying => {}
        }
    }

    fn on_action_succeeded(&mut self) {
        let exported = self
            .dialog
            .as_ref()
            .map(|(_, action)| matches!(action, PendingAction::Export));
        match exported {
            Some(true) => {
                self.notify(StatusMessage::success("Export complete"));
                self.tab = TAB_PAGES;
                self.mode = KeyboardMode::TabBar;
            }
            Some(false) => {
                self.take_delete_report();
                self.marked.clear();
                self.start_load();
            }
            None => {}
        }
    }

    /// Surface the latest delete tally as a transient status
    fn take_delete_report(&mut self) {
        let report = match &self.dialog {
            Some((_, PendingAction::Delete { report })) => {
                report.lock().ok().and_then(|mut stored| stored.take())
            }
            _ => None,
        };
        if let Some(report) = report {
            let message = if report.all_failed() {
                StatusMessage::error(report.summary())
            } else if report.failed() > 0 {
                StatusMessage::warning(report.summary())
            } else {
                StatusMessage::success(report.summary())
            };
            self.notify(message);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let border = if self.mode == KeyboardMode::TabBar {
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
                .border_style(Style::default().fg(border)),
        );
        frame.render_widget(tabs, area);
    }

    fn render_list(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let delete = self.tab == TAB_DELETE;
        let (view, selection, query) = if delete {
            (&self.delete_view, self.delete_selection, &self.delete_query)
        } else {
            (&self.page_view, self.page_selection, &self.page_query)
        };

        let searching = self.mode == KeyboardMode::Search;
        let show_search = searching || !query.is_empty();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(if show_search { 3 } else { 0 }),
                Constraint::Min(0),
            ])
            .split(area);

        if show_search {
            let border = if searching { theme.mauve } else { theme.surface1 };
            let text = if searching {
                format!("{}│", query)
            } else {
                query.clone()
            };
            let search = Paragraph::new(Span::styled(text, Style::default().fg(theme.text))).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(Span::styled(" Search ", theme.muted_style())),
            );
            frame.render_widget(search, chunks[0]);
        }

        let title = if delete {
            format!(" Select pages to delete ({} marked) ", self.marked.len())
        } else {
            format!(" Pages ({}/{}) ", view.len(), self.pages.len())
        };
        let border = if self.mode == KeyboardMode::Content {
            theme.mauve
        } else {
            theme.surface1
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Span::styled(title, theme.title_style()));

        if let Some(placeholder) = self.placeholder(view.is_empty(), theme) {
            frame.render_widget(placeholder.block(block).wrap(Wrap { trim: true }), chunks[1]);
            return;
        }

        let items: Vec<ListItem> = view
            .iter()
            .filter_map(|&i| self.pages.get(i))
            .map(|page| {
                let mut spans = Vec::new();
                if delete {
                    let marked = self.marked.contains(&page.id);
                    spans.push(if marked {
                        Span::styled("[x] ", theme.error_style())
                    } else {
                        Span::styled("[ ] ", theme.muted_style())
                    });
                }
                spans.push(Span::styled(page.path.clone(), Style::default().fg(theme.text)));
                spans.push(Span::styled(format!("  {}", page.title), theme.muted_style()));
                if !page.is_published {
                    spans.push(Span::styled("  draft", theme.warning_style()));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(theme.selected_style());
        let selected = (self.mode == KeyboardMode::Content).then_some(selection);
        let mut state = ListState::default().with_selected(selected);
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn placeholder(&self, empty: bool, theme: &Theme) -> Option<Paragraph<'static>> {
        if self.ctx.api.is_none() {
            return Some(Paragraph::new(Span::styled(NO_INSTANCE, theme.error_style())));
        }
        if self.load.is_some() {
            return Some(Paragraph::new(Span::styled("Loading pages...", theme.muted_style())));
        }
        if let Some(error) = &self.load_error {
            return Some(Paragraph::new(Span::styled(
                format!("Error loading pages: {}", error),
                theme.error_style(),
            )));
        }
        if empty {
            return Some(Paragraph::new(Span::styled("No pages found", theme.muted_style())));
        }
        None
    }

    fn render_export(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let focused = self.mode == KeyboardMode::Content || self.mode == KeyboardMode::Editing;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { theme.mauve } else { theme.surface1 }))
            .title(Span::styled(" Export pages ", theme.title_style()));

        let field = |row: usize, label: &str, input: &TextField| {
            let active = focused && self.export_row == row;
            let editing = active && self.mode == KeyboardMode::Editing;
            let value = if editing {
                input.display_with_cursor()
            } else {
                input.value().to_string()
            };
            let marker = if active { "▶ " } else { "  " };
            let value_style = if editing {
                Style::default().fg(theme.text).add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(theme.text)
            };
            Line::from(vec![
                Span::styled(marker, theme.info_style()),
                Span::styled(format!("{:<11}", label), theme.muted_style()),
                Span::styled(value, value_style),
            ])
        };

        let button = |which: ExportButton, label: &str| {
            let active = focused && self.export_row == ROW_BUTTONS && self.export_button == which;
            let style = if active {
                theme.selected_style()
            } else {
                Style::default().fg(theme.subtext0)
            };
            Span::styled(format!("[ {} ]", label), style)
        };

        let counts = ExportSummary::of(&self.pages);
        let lines = vec![
            field(ROW_DIRECTORY, "Directory", &self.directory),
            field(ROW_FILENAME, "Filename", &self.filename),
            Line::from(""),
            Line::from(vec![
                Span::raw("  "),
                button(ExportButton::Export, "Export"),
                Span::raw("  "),
                button(ExportButton::Cancel, "Cancel"),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "  {} pages ({} published, {} unpublished) → {}",
                    counts.total_pages,
                    counts.published_pages,
                    counts.unpublished_pages,
                    self.export_target().display()
                ),
                theme.muted_style(),
            )),
        ];

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

impl TabbedScreen for PagesScreen {
    fn tab_count(&self) -> usize {
        TAB_TITLES.len()
    }

    fn current_tab(&self) -> usize {
        self.tab
    }

    fn set_tab(&mut self, tab: usize) {
        self.tab = tab;
    }

    fn mode(&self) -> KeyboardMode {
        self.mode
    }

    fn set_mode(&mut self, mode: KeyboardMode) {
        self.mode = mode;
    }

    fn item_count(&self) -> usize {
        match self.tab {
            TAB_EXPORT => EXPORT_ROWS,
            TAB_DELETE => self.delete_view.len(),
            _ => self.page_view.len(),
        }
    }

    fn selection(&self) -> usize {
        match self.tab {
            TAB_EXPORT => self.export_row,
            TAB_DELETE => self.delete_selection,
            _ => self.page_selection,
        }
    }

    fn set_selection(&mut self, index: usize) {
        match self.tab {
            TAB_EXPORT => self.export_row = index,
            TAB_DELETE => self.delete_selection = index,
            _ => self.page_selection = index,
        }
    }

    fn supports_search(&self) -> bool {
        self.tab != TAB_EXPORT
    }

    fn search_char(&mut self, c: char) {
        let mut query = self.query().to_string();
        query.push(c);
        self.set_query(query);
    }

    fn search_backspace(&mut self) {
        let mut query = self.query().to_string();
        query.pop();
        self.set_query(query);
    }

    fn on_select(&mut self) -> bool {
        match self.tab {
            TAB_EXPORT if self.export_row == ROW_BUTTONS => {
                match self.export_button {
                    ExportButton::Export => self.open_export_dialog(),
                    ExportButton::Cancel => {
                        self.tab = TAB_PAGES;
                        self.mode = KeyboardMode::TabBar;
                    }
                }
                true
            }
            TAB_EXPORT => {
                self.begin_edit();
                true
            }
            TAB_DELETE => self.open_delete_dialog(),
            _ => self.show_details(),
        }
    }

    fn on_mark(&mut self) -> bool {
        if self.tab != TAB_DELETE {
            return false;
        }
        let Some(id) = self.selected_page().map(|p| p.id) else {
            return false;
        };
        if !self.marked.remove(&id) {
            self.marked.insert(id);
        }
        true
    }

    fn on_edit_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Enter {
            self.edit_backup.clear();
            self.mode = KeyboardMode::Content;
            return true;
        }
        let row = self.export_row;
        self.field_mut(row)
            .map(|field| field.handle_key(key.code))
            .unwrap_or(false)
    }

    fn on_content_key(&mut self, key: KeyEvent) -> bool {
        match (self.tab, key.code) {
            (TAB_DELETE, KeyCode::Char('c')) => {
                self.marked.clear();
                true
            }
            (TAB_EXPORT, KeyCode::Left) if self.export_row == ROW_BUTTONS => {
                self.export_button = ExportButton::Export;
                true
            }
            (TAB_EXPORT, KeyCode::Right) if self.export_row == ROW_BUTTONS => {
                self.export_button = ExportButton::Cancel;
                true
            }
            _ => false,
        }
    }

    fn modal_open(&self) -> bool {
        self.dialog.is_some()
    }

    fn reset_modes(&mut self) {
        if self.mode == KeyboardMode::Editing {
            self.cancel_edit();
        }
        self.mode = KeyboardMode::TabBar;
    }
}

impl Screen for PagesScreen {
    fn id(&self) -> ScreenId {
        ScreenId::Pages
    }

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        if let Some((dialog, _)) = self.dialog.as_mut() {
            if let Some(event) = dialog.handle_key(key) {
                self.on_dialog_event(event);
            }
        } else {
            let outcome = dispatch_key(self, key);
            log::trace!("pages: {:?} -> {:?}", key.code, outcome);
        }
        self.sync_captions();
        Command::None
    }

    fn on_escape(&mut self) -> Command {
        let mut command = Command::None;
        if let Some((dialog, _)) = self.dialog.as_mut() {
            if let Some(event) = dialog.on_escape() {
                self.on_dialog_event(event);
            }
        } else if self.escape_signal.take() {
            command = self.handle_escape();
        }
        self.sync_captions();
        command
    }

    fn poll(&mut self, now: Instant) -> Command {
        if let Some((dialog, _)) = self.dialog.as_mut() {
            if let Some(event) = dialog.poll(now) {
                self.on_dialog_event(event);
            }
        }

        self.poll_load();

        if let Some(notice) = self.notice.as_mut() {
            if notice.expire_if_due(now) {
                self.notice = None;
            }
        }
        self.sync_captions();
        Command::None
    }

    fn is_busy(&self) -> bool {
        self.is_loading() || self.dialog.is_some()
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        self.render_tabs(frame, chunks[0], theme);
        match self.tab {
            TAB_EXPORT => self.render_export(frame, chunks[1], theme),
            _ => self.render_list(frame, chunks[1], theme),
        }

        if let Some((dialog, _)) = &self.dialog {
            dialog.render(frame, area, theme);
        }
    }
}
