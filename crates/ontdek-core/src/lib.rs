pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod io;
pub mod migrations;
pub mod paths;
pub mod ranking;
pub mod settings;
pub mod types;
pub mod user;

pub use error::{CmsError, Result};
