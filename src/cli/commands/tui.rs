use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use crate::api::{PageApi, WikiClient};
use crate::config::Config;
use crate::tui::{Kernel, Runtime, ScreenContext};

const FRAME: Duration = Duration::from_millis(16);

/// Resolve the instance and run the TUI until the user quits
pub async fn tui_command(instance: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let ctx = build_context(&config, instance)?;
    launch_tui(ctx).await
}

/// An explicitly requested instance must exist; otherwise a missing instance only
/// disables the pages screen.
fn build_context(config: &Config, requested: Option<&str>) -> Result<ScreenContext> {
    let (api, instance): (Option<Arc<dyn PageApi>>, Option<String>) = match config.resolve(requested) {
        Ok(resolved) => {
            let client = WikiClient::new(&resolved.config)?;
            log::info!("TUI using instance '{}' at {}", resolved.name, client.endpoint());
            let api: Arc<dyn PageApi> = Arc::new(client);
            (Some(api), Some(resolved.name))
        }
        Err(err) if requested.is_none() => {
            log::warn!("Starting TUI without an instance: {:#}", err);
            (None, None)
        }
        Err(err) => return Err(err),
    };

    Ok(ScreenContext {
        kernel: Kernel::new(),
        api,
        instance,
        settings: config.tui.clone(),
    })
}

async fn launch_tui(ctx: ScreenContext) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runtime = Runtime::new(ctx);
    let result = run_tui(&mut terminal, &mut runtime).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_tui<B: Backend>(terminal: &mut Terminal<B>, runtime: &mut Runtime) -> Result<()> {
    log::info!("TUI started");
    loop {
        let frame_start = Instant::now();

        // drain input before drawing so keys show up in this frame
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => runtime.handle_key(key),
                Event::Resize(..) => runtime.request_redraw(),
                _ => {}
            }
            if runtime.should_quit() {
                break;
            }
        }
        if runtime.should_quit() {
            break;
        }

        runtime.tick(Instant::now());
        if runtime.should_quit() {
            break;
        }

        if runtime.take_redraw() {
            terminal.draw(|frame| runtime.render(frame))?;
        }

        if let Some(remaining) = FRAME.checked_sub(frame_start.elapsed()) {
            tokio::time::sleep(remaining).await;
        }
    }
    log::info!("TUI stopped");
    Ok(())
}
