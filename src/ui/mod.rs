//! Operator-facing terminal interface.
//!
//! - **prompt**: line input and styled output over any reader/writer pair
//! - **menu**: main, router and switch menus that dispatch configuration jobs

pub mod menu;
pub mod prompt;

pub use menu::App;
pub use prompt::Prompter;
