pub mod command;
pub mod console;
pub mod style;
