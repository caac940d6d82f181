pub mod app;
pub mod cli;
pub mod config;
pub mod scene;
pub mod viewer;

pub use app::{App, AppError};
pub use config::Config;
