pub mod prompts;
pub mod spinner;

pub use prompts::*;
pub use spinner::with_spinner;
