use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use wikit::api::{Page, PageApi, ResponseResult};
use wikit::config::TuiSettings;
use wikit::tui::{Kernel, Runtime, ScreenContext, ScreenId};

struct MemoryWiki {
    pages: Mutex<Vec<Page>>,
    deleted: Mutex<Vec<u64>>,
}

impl MemoryWiki {
    fn new(pages: Vec<Page>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages),
            deleted: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PageApi for MemoryWiki {
    async fn list_pages(&self) -> Result<Vec<Page>> {
        Ok(self.pages.lock().unwrap().clone())
    }

    async fn delete_page(&self, id: u64) -> Result<ResponseResult> {
        self.pages.lock().unwrap().retain(|p| p.id != id);
        self.deleted.lock().unwrap().push(id);
        Ok(ResponseResult::ok())
    }
}

fn page(id: u64, path: &str) -> Page {
    Page {
        id,
        path: path.to_string(),
        title: path.to_uppercase(),
        locale: "en".to_string(),
        is_published: true,
    }
}

fn runtime(wiki: Arc<MemoryWiki>) -> Runtime {
    let api: Arc<dyn PageApi> = wiki;
    Runtime::new(ScreenContext {
        kernel: Kernel::new(),
        api: Some(api),
        instance: Some("docs".to_string()),
        settings: TuiSettings {
            success_duration_ms: 0,
            ..TuiSettings::default()
        },
    })
}

fn press(rt: &mut Runtime, code: KeyCode) {
    rt.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    rt.tick(Instant::now());
}

#[test]
fn test_open_pages_and_escape_home() {
    let wiki = MemoryWiki::new(vec![page(1, "home"), page(2, "about")]);
    let mut rt = runtime(wiki);
    let home_header = rt.kernel().header.current();

    press(&mut rt, KeyCode::Enter);
    assert_eq!(rt.current_screen(), Some(ScreenId::Pages));
    assert_eq!(rt.kernel().header.current().to_string(), "Pages: docs");
    assert_eq!(rt.kernel().footer_status.current().text, "2 pages loaded");

    press(&mut rt, KeyCode::Esc);
    assert_eq!(rt.current_screen(), Some(ScreenId::Home));
    assert_eq!(rt.kernel().header.current(), home_header);
    assert_eq!(rt.kernel().escape.depth(), 0);
}

#[test]
fn test_escape_unwinds_one_level_per_press() {
    let wiki = MemoryWiki::new(vec![page(1, "home"), page(2, "about")]);
    let mut rt = runtime(wiki);
    press(&mut rt, KeyCode::Enter);

    // delete tab, search for a page
    press(&mut rt, KeyCode::Char('3'));
    press(&mut rt, KeyCode::Char('s'));
    for c in "abo".chars() {
        press(&mut rt, KeyCode::Char(c));
    }

    press(&mut rt, KeyCode::Esc); // leave search
    press(&mut rt, KeyCode::Esc); // clear query
    assert_eq!(rt.kernel().header.current().to_string(), "Pages: 0 marked");
    press(&mut rt, KeyCode::Esc); // back to the pages tab
    assert_eq!(rt.kernel().header.current().to_string(), "Pages: docs");
    assert_eq!(rt.current_screen(), Some(ScreenId::Pages));
    press(&mut rt, KeyCode::Esc); // leave the screen
    assert_eq!(rt.current_screen(), Some(ScreenId::Home));
}

#[test]
fn test_bulk_delete_through_dialog() {
    let wiki = MemoryWiki::new(vec![page(1, "home"), page(2, "about"), page(3, "faq")]);
    let mut rt = runtime(wiki.clone());
    press(&mut rt, KeyCode::Enter);

    press(&mut rt, KeyCode::Char('3'));
    press(&mut rt, KeyCode::Down);
    press(&mut rt, KeyCode::Char(' '));
    press(&mut rt, KeyCode::Down);
    press(&mut rt, KeyCode::Char(' '));
    assert_eq!(rt.kernel().header.current().to_string(), "Pages: 2 marked");

    press(&mut rt, KeyCode::Enter);
    assert_eq!(rt.kernel().escape.current_id().as_deref(), Some("pages:dialog"));
    assert!(rt.kernel().footer_help.current().contains("Esc cancel"));

    press(&mut rt, KeyCode::Left);
    press(&mut rt, KeyCode::Enter);
    // the success screen closes on the following tick
    rt.tick(Instant::now());

    assert_eq!(*wiki.deleted.lock().unwrap(), vec![1, 2]);
    assert_eq!(rt.kernel().escape.current_id().as_deref(), Some("pages"));
    assert_eq!(rt.kernel().footer_status.current().text, "Delete complete");
    assert_eq!(rt.kernel().header.current().to_string(), "Pages: 0 marked");
}

#[test]
fn test_cancelled_dialog_deletes_nothing() {
    let wiki = MemoryWiki::new(vec![page(1, "home")]);
    let mut rt = runtime(wiki.clone());
    press(&mut rt, KeyCode::Enter);

    press(&mut rt, KeyCode::Char('3'));
    press(&mut rt, KeyCode::Down);
    press(&mut rt, KeyCode::Char(' '));
    press(&mut rt, KeyCode::Enter);
    press(&mut rt, KeyCode::Esc);

    assert!(wiki.deleted.lock().unwrap().is_empty());
    assert_eq!(rt.current_screen(), Some(ScreenId::Pages));
    assert_eq!(rt.kernel().escape.current_id().as_deref(), Some("pages"));
    assert_eq!(rt.kernel().header.current().to_string(), "Pages: 1 marked");
}

/// Several keys arriving within one frame, followed by a single tick
fn press_batch(rt: &mut Runtime, codes: &[KeyCode]) {
    for code in codes {
        rt.handle_key(KeyEvent::new(*code, KeyModifiers::NONE));
    }
    rt.tick(Instant::now());
}

fn open_delete_dialog(rt: &mut Runtime) {
    press(rt, KeyCode::Enter);
    press(rt, KeyCode::Char('3'));
    press(rt, KeyCode::Down);
    press(rt, KeyCode::Char(' '));
    press(rt, KeyCode::Enter);
    assert_eq!(rt.kernel().escape.current_id().as_deref(), Some("pages:dialog"));
}

#[test]
fn test_escape_then_confirm_in_one_frame_deletes_nothing() {
    let wiki = MemoryWiki::new(vec![page(1, "home"), page(2, "about")]);
    let mut rt = runtime(wiki.clone());
    open_delete_dialog(&mut rt);

    press_batch(&mut rt, &[KeyCode::Esc, KeyCode::Left, KeyCode::Enter]);
    rt.tick(Instant::now());

    assert!(wiki.deleted.lock().unwrap().is_empty());
    assert_eq!(rt.current_screen(), Some(ScreenId::Pages));
    assert_eq!(rt.kernel().header.current().to_string(), "Pages: 1 marked");
}

#[test]
fn test_two_escapes_in_one_frame_leave_delete_tab_and_screen() {
    let wiki = MemoryWiki::new(vec![page(1, "home")]);
    let mut rt = runtime(wiki);
    press(&mut rt, KeyCode::Enter);
    press(&mut rt, KeyCode::Char('3'));

    press_batch(&mut rt, &[KeyCode::Esc, KeyCode::Esc]);
    assert_eq!(rt.current_screen(), Some(ScreenId::Home));
    assert_eq!(rt.kernel().escape.depth(), 0);
}

#[test]
fn test_escape_from_search_stops_typing_in_same_frame() {
    let wiki = MemoryWiki::new(vec![page(1, "home"), page(2, "about")]);
    let mut rt = runtime(wiki);
    press(&mut rt, KeyCode::Enter);

    press_batch(
        &mut rt,
        &[KeyCode::Char('s'), KeyCode::Char('a'), KeyCode::Esc, KeyCode::Char('x')],
    );
    assert_eq!(rt.current_screen(), Some(ScreenId::Pages));

    // the query stayed "a", so "about" is still listed
    press_batch(&mut rt, &[KeyCode::Down, KeyCode::Enter]);
    assert!(rt.kernel().footer_status.current().text.starts_with("about"));
}
