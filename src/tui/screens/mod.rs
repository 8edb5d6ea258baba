pub mod help;
pub mod home;
pub mod pages;

use std::sync::Arc;

use crate::api::PageApi;
use crate::config::TuiSettings;

use super::kernel::Kernel;
use super::runtime::{Screen, ScreenId};

pub use help::HelpScreen;
pub use home::HomeScreen;
pub use pages::PagesScreen;

/// What every screen gets when it is mounted
#[derive(Clone)]
pub struct ScreenContext {
    pub kernel: Kernel,
    /// `None` when no instance is configured
    pub api: Option<Arc<dyn PageApi>>,
    pub instance: Option<String>,
    pub settings: TuiSettings,
}

pub fn build(id: ScreenId, ctx: &ScreenContext) -> Box<dyn Screen> {
    match id {
        ScreenId::Home => Box::new(HomeScreen::new(ctx.clone())),
        ScreenId::Pages => Box::new(PagesScreen::new(ctx.clone())),
        ScreenId::Help => Box::new(HelpScreen::new(ctx.clone())),
    }
}
