pub mod frame;
pub mod style;
pub mod views;
pub mod widgets;
