pub mod config;
pub mod context;
pub mod debugger;
pub mod ui;
