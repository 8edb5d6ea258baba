pub mod instances;
pub mod pages;
pub mod tui;

pub use instances::{InstancesCommands, instances_command};
pub use pages::{PagesCommands, pages_command};
pub use tui::tui_command;
