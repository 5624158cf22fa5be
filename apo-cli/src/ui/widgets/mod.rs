mod input;
mod list;
mod status_bar;
mod tabs;

pub use input::TextInput;
pub use list::{List, ListItem};
pub use status_bar::StatusBar;
pub use tabs::TabBar;
