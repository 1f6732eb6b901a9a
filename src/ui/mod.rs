// UI module - TUI components

pub mod help;
pub mod login;
pub mod recovery;
pub mod styles;


pub use help::HelpState;
pub use login::{LoginField, LoginForm};
pub use recovery::{AttemptInfo, RecoveryView};
pub use styles::*;
