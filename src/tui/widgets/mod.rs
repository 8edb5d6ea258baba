pub mod action_dialog;
pub mod text_field;

pub use action_dialog::ActionDialog;
pub use text_field::TextField;
