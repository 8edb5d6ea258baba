//! Shared key-handling precedence for tabbed screens.
//!
//! Every screen with tabs routes its keys through [`dispatch_key`], which applies the same
//! order of checks everywhere:
//!
//! 1. an open modal owns all input, Escape always belongs to the escape router
//! 2. Tab / Shift-Tab and digit keys switch tabs, resetting nested modes
//! 3. Left / Right switch tabs, but only while the tab bar has focus
//! 4. search mode eats characters and editing mode eats everything
//! 5. list navigation: Up/Down, Enter to select, Space to mark
//!
//! Screens only describe their state through [`TabbedScreen`]; the decisions live here.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub const HELP_SEPARATOR: &str = " • ";

pub const HELP_TABS: &str = "Tab/←→ switch tabs";
pub const HELP_TABS_IN_CONTENT: &str = "Tab/1-{n} switch tabs";
pub const HELP_QUICK_JUMP: &str = "1-{n} quick jump";
pub const HELP_SEARCH: &str = "s=search";
pub const HELP_TYPE_TO_SEARCH: &str = "Type to search";
pub const HELP_ENTER_RESULTS: &str = "↓ enter results";
pub const HELP_EXIT_SEARCH: &str = "Esc exit search";
pub const HELP_ENTER_LIST: &str = "↓ enter list";
pub const HELP_NAVIGATE: &str = "↑↓ navigate";
pub const HELP_TO_TAB_BAR: &str = "↑ to tab bar";
pub const HELP_TYPE_TO_EDIT: &str = "Type to edit";
pub const HELP_ENTER_CONFIRM: &str = "Enter confirm";
pub const HELP_ESC_CANCEL: &str = "Esc cancel";
pub const HELP_ESC_BACK: &str = "Esc back";

/// Where a screen's keyboard focus currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyboardMode {
    #[default]
    TabBar,
    Content,
    Search,
    Editing,
}

/// What [`dispatch_key`] did with a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A modal is open; the screen must not interpret the key
    Blocked,
    /// Escape; the host routes it to the escape router
    Delegated,
    TabSwitched(usize),
    ModeChanged(KeyboardMode),
    SearchEdited,
    SelectionMoved(usize),
    Selected,
    Marked,
    Edited,
    /// Consumed by a screen-specific shortcut
    Handled,
    Unhandled,
}

impl KeyOutcome {
    pub fn is_consumed(&self) -> bool {
        !matches!(self, KeyOutcome::Unhandled | KeyOutcome::Blocked)
    }
}

/// State and callbacks a screen exposes to the dispatcher
pub trait TabbedScreen {
    fn tab_count(&self) -> usize;
    fn current_tab(&self) -> usize;
    fn set_tab(&mut self, tab: usize);

    fn mode(&self) -> KeyboardMode;
    fn set_mode(&mut self, mode: KeyboardMode);

    /// Length of the list in the current tab
    fn item_count(&self) -> usize {
        0
    }

    fn selection(&self) -> usize {
        0
    }

    fn set_selection(&mut self, _index: usize) {}

    /// Whether `s` opens search on the current tab
    fn supports_search(&self) -> bool {
        false
    }

    fn search_char(&mut self, _c: char) {}

    fn search_backspace(&mut self) {}

    /// Enter in content mode
    fn on_select(&mut self) -> bool {
        false
    }

    /// Space in content mode
    fn on_mark(&mut self) -> bool {
        false
    }

    /// Any key while editing
    fn on_edit_key(&mut self, _key: KeyEvent) -> bool {
        false
    }

    /// Screen-specific shortcuts in content mode (for example `c` to clear marks)
    fn on_content_key(&mut self, _key: KeyEvent) -> bool {
        false
    }

    /// True while a dialog or other modal sits on top of the screen
    fn modal_open(&self) -> bool {
        false
    }

    /// Leave search, content and editing; called on every tab switch
    fn reset_modes(&mut self) {
        self.set_mode(KeyboardMode::TabBar);
    }
}

/// Apply the five-step precedence to `key` on behalf of `screen`
pub fn dispatch_key<S: TabbedScreen + ?Sized>(screen: &mut S, key: KeyEvent) -> KeyOutcome {
    // 1. modal exclusivity and escape delegation
    if screen.modal_open() {
        return KeyOutcome::Blocked;
    }
    if key.code == KeyCode::Esc {
        return KeyOutcome::Delegated;
    }
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return KeyOutcome::Unhandled;
    }

    let mode = screen.mode();
    let tabs = screen.tab_count();

    // 2. always-available tab keys
    match key.code {
        KeyCode::Tab if tabs > 0 => {
            let next = (screen.current_tab() + 1) % tabs;
            return switch_tab(screen, next);
        }
        KeyCode::BackTab if tabs > 0 => {
            let prev = (screen.current_tab() + tabs - 1) % tabs;
            return switch_tab(screen, prev);
        }
        // digits are text while a field is being edited
        KeyCode::Char(c) if mode != KeyboardMode::Editing => {
            if let Some(n) = c.to_digit(10).map(|d| d as usize) {
                if (1..=tabs).contains(&n) {
                    return switch_tab(screen, n - 1);
                }
            }
        }
        _ => {}
    }

    // 3. arrows switch tabs only at the tab bar
    if mode == KeyboardMode::TabBar {
        match key.code {
            KeyCode::Left if screen.current_tab() > 0 => {
                let prev = screen.current_tab() - 1;
                return switch_tab(screen, prev);
            }
            KeyCode::Right if screen.current_tab() + 1 < tabs => {
                let next = screen.current_tab() + 1;
                return switch_tab(screen, next);
            }
            KeyCode::Left | KeyCode::Right => return KeyOutcome::Unhandled,
            _ => {}
        }
    }

    // 4. search and editing modes
    match mode {
        KeyboardMode::Search => {
            return match key.code {
                KeyCode::Char(c) => {
                    screen.search_char(c);
                    KeyOutcome::SearchEdited
                }
                KeyCode::Backspace => {
                    screen.search_backspace();
                    KeyOutcome::SearchEdited
                }
                KeyCode::Down => change_mode(screen, KeyboardMode::Content),
                _ => KeyOutcome::Unhandled,
            };
        }
        KeyboardMode::Editing => {
            return if screen.on_edit_key(key) {
                KeyOutcome::Edited
            } else {
                KeyOutcome::Unhandled
            };
        }
        KeyboardMode::TabBar | KeyboardMode::Content => {
            if key.code == KeyCode::Char('s') && screen.supports_search() {
                return change_mode(screen, KeyboardMode::Search);
            }
        }
    }

    // 5. content navigation
    match (mode, key.code) {
        (KeyboardMode::TabBar, KeyCode::Down) => change_mode(screen, KeyboardMode::Content),
        (KeyboardMode::Content, KeyCode::Up) => {
            let selection = screen.selection();
            if selection == 0 {
                change_mode(screen, KeyboardMode::TabBar)
            } else {
                screen.set_selection(selection - 1);
                KeyOutcome::SelectionMoved(selection - 1)
            }
        }
        (KeyboardMode::Content, KeyCode::Down) => {
            let last = screen.item_count().saturating_sub(1);
            let next = (screen.selection() + 1).min(last);
            screen.set_selection(next);
            KeyOutcome::SelectionMoved(next)
        }
        (KeyboardMode::Content, KeyCode::Enter) => {
            if screen.on_select() {
                KeyOutcome::Selected
            } else {
                KeyOutcome::Unhandled
            }
        }
        (KeyboardMode::Content, KeyCode::Char(' ')) => {
            if screen.on_mark() {
                KeyOutcome::Marked
            } else {
                KeyOutcome::Unhandled
            }
        }
        (KeyboardMode::Content, _) => {
            if screen.on_content_key(key) {
                KeyOutcome::Handled
            } else {
                KeyOutcome::Unhandled
            }
        }
        _ => KeyOutcome::Unhandled,
    }
}

fn switch_tab<S: TabbedScreen + ?Sized>(screen: &mut S, tab: usize) -> KeyOutcome {
    screen.reset_modes();
    screen.set_tab(tab);
    log::debug!("keyboard: switched to tab {}", tab + 1);
    KeyOutcome::TabSwitched(tab)
}

fn change_mode<S: TabbedScreen + ?Sized>(screen: &mut S, mode: KeyboardMode) -> KeyOutcome {
    screen.set_mode(mode);
    KeyOutcome::ModeChanged(mode)
}

/// Join footer-help fragments with the standard separator
pub fn format_help_text(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(HELP_SEPARATOR)
}

/// Fill in the tab count for the `{n}` fragments
pub fn tab_help(fragment: &str, tabs: usize) -> String {
    fragment.replace("{n}", &tabs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeScreen {
        tab: usize,
        mode: KeyboardMode,
        selection: usize,
        items: usize,
        query: String,
        modal: bool,
        selected: usize,
        marked: usize,
        edits: Vec<KeyCode>,
        cleared: bool,
    }

    impl TabbedScreen for FakeScreen {
        fn tab_count(&self) -> usize {
            3
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
            self.items
        }
        fn selection(&self) -> usize {
            self.selection
        }
        fn set_selection(&mut self, index: usize) {
            self.selection = index;
        }
        fn supports_search(&self) -> bool {
            self.tab != 1
        }
        fn search_char(&mut self, c: char) {
            self.query.push(c);
        }
        fn search_backspace(&mut self) {
            self.query.pop();
        }
        fn on_select(&mut self) -> bool {
            self.selected += 1;
            true
        }
        fn on_mark(&mut self) -> bool {
            self.marked += 1;
            true
        }
        fn on_edit_key(&mut self, key: KeyEvent) -> bool {
            self.edits.push(key.code);
            true
        }
        fn on_content_key(&mut self, key: KeyEvent) -> bool {
            if key.code == KeyCode::Char('c') {
                self.cleared = true;
                return true;
            }
            false
        }
        fn modal_open(&self) -> bool {
            self.modal
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen_with(mode: KeyboardMode, items: usize) -> FakeScreen {
        FakeScreen {
            mode,
            items,
            ..Default::default()
        }
    }

    #[test]
    fn test_digit_in_search_switches_tab_and_exits_search() {
        let mut screen = screen_with(KeyboardMode::Search, 10);
        screen.query = "ho".into();

        let outcome = dispatch_key(&mut screen, press(KeyCode::Char('2')));

        assert_eq!(outcome, KeyOutcome::TabSwitched(1));
        assert_eq!(screen.tab, 1);
        assert_eq!(screen.mode, KeyboardMode::TabBar);
        assert_eq!(screen.query, "ho");
    }

    #[test]
    fn test_up_at_top_returns_to_tab_bar() {
        let mut screen = screen_with(KeyboardMode::Content, 10);

        let outcome = dispatch_key(&mut screen, press(KeyCode::Up));

        assert_eq!(outcome, KeyOutcome::ModeChanged(KeyboardMode::TabBar));
        assert_eq!(screen.selection, 0);
        assert_eq!(screen.tab, 0);
    }

    #[test]
    fn test_modal_blocks_everything() {
        let mut screen = screen_with(KeyboardMode::Content, 10);
        screen.modal = true;

        for code in [KeyCode::Tab, KeyCode::Char('3'), KeyCode::Down, KeyCode::Esc] {
            assert_eq!(dispatch_key(&mut screen, press(code)), KeyOutcome::Blocked);
        }
        assert_eq!(screen.selection, 0);
        assert_eq!(screen.tab, 0);
    }

    #[test]
    fn test_escape_is_delegated() {
        let mut screen = screen_with(KeyboardMode::Search, 0);
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Esc)), KeyOutcome::Delegated);
        assert_eq!(screen.mode, KeyboardMode::Search);
    }

    #[test]
    fn test_tab_cycles_and_wraps() {
        let mut screen = screen_with(KeyboardMode::Content, 3);
        screen.tab = 2;

        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Tab)), KeyOutcome::TabSwitched(0));
        assert_eq!(screen.mode, KeyboardMode::TabBar);
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::BackTab)), KeyOutcome::TabSwitched(2));
    }

    #[test]
    fn test_arrows_switch_tabs_only_at_tab_bar() {
        let mut screen = screen_with(KeyboardMode::TabBar, 3);
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Right)), KeyOutcome::TabSwitched(1));
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Left)), KeyOutcome::TabSwitched(0));
        // no wrap at the edges
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Left)), KeyOutcome::Unhandled);

        screen.mode = KeyboardMode::Content;
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Right)), KeyOutcome::Unhandled);
        assert_eq!(screen.tab, 0);
    }

    #[test]
    fn test_search_consumes_characters() {
        let mut screen = screen_with(KeyboardMode::TabBar, 3);

        assert_eq!(
            dispatch_key(&mut screen, press(KeyCode::Char('s'))),
            KeyOutcome::ModeChanged(KeyboardMode::Search)
        );
        for c in "sc ".chars() {
            assert_eq!(dispatch_key(&mut screen, press(KeyCode::Char(c))), KeyOutcome::SearchEdited);
        }
        dispatch_key(&mut screen, press(KeyCode::Backspace));
        assert_eq!(screen.query, "sc");
        assert!(!screen.cleared);
        assert_eq!(screen.marked, 0);

        assert_eq!(
            dispatch_key(&mut screen, press(KeyCode::Down)),
            KeyOutcome::ModeChanged(KeyboardMode::Content)
        );
    }

    #[test]
    fn test_search_not_offered_on_tabs_without_it() {
        let mut screen = screen_with(KeyboardMode::TabBar, 3);
        screen.tab = 1;
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Char('s'))), KeyOutcome::Unhandled);
        assert_eq!(screen.mode, KeyboardMode::TabBar);
    }

    #[test]
    fn test_selection_clamps_to_list() {
        let mut screen = screen_with(KeyboardMode::Content, 2);

        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Down)), KeyOutcome::SelectionMoved(1));
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Down)), KeyOutcome::SelectionMoved(1));
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Up)), KeyOutcome::SelectionMoved(0));

        let mut empty = screen_with(KeyboardMode::Content, 0);
        assert_eq!(dispatch_key(&mut empty, press(KeyCode::Down)), KeyOutcome::SelectionMoved(0));
    }

    #[test]
    fn test_enter_space_and_shortcuts_in_content() {
        let mut screen = screen_with(KeyboardMode::Content, 4);
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Enter)), KeyOutcome::Selected);
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Char(' '))), KeyOutcome::Marked);
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Char('c'))), KeyOutcome::Handled);
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Char('x'))), KeyOutcome::Unhandled);
        assert_eq!((screen.selected, screen.marked, screen.cleared), (1, 1, true));
    }

    #[test]
    fn test_tab_bar_down_enters_content() {
        let mut screen = screen_with(KeyboardMode::TabBar, 4);
        assert_eq!(
            dispatch_key(&mut screen, press(KeyCode::Down)),
            KeyOutcome::ModeChanged(KeyboardMode::Content)
        );
        // Enter at the tab bar does nothing
        screen.mode = KeyboardMode::TabBar;
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Enter)), KeyOutcome::Unhandled);
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn test_editing_takes_digits_but_not_tab() {
        let mut screen = screen_with(KeyboardMode::Editing, 4);
        screen.tab = 1;

        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Char('2'))), KeyOutcome::Edited);
        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Left)), KeyOutcome::Edited);
        assert_eq!(screen.edits, vec![KeyCode::Char('2'), KeyCode::Left]);
        assert_eq!(screen.tab, 1);

        assert_eq!(dispatch_key(&mut screen, press(KeyCode::Tab)), KeyOutcome::TabSwitched(2));
        assert_eq!(screen.mode, KeyboardMode::TabBar);
    }

    #[test]
    fn test_control_chords_are_ignored() {
        let mut screen = screen_with(KeyboardMode::Search, 4);
        let key = KeyEvent::new(KeyCode::Char('2'), KeyModifiers::CONTROL);
        assert_eq!(dispatch_key(&mut screen, key), KeyOutcome::Unhandled);
        assert_eq!(screen.tab, 0);
    }

    #[test]
    fn test_format_help_text() {
        let tabs = tab_help(HELP_TABS_IN_CONTENT, 3);
        assert_eq!(
            format_help_text(&[&tabs, HELP_NAVIGATE, "", HELP_ESC_BACK]),
            "Tab/1-3 switch tabs • ↑↓ navigate • Esc back"
        );
    }
}
