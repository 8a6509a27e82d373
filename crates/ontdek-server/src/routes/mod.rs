pub mod content;
pub mod health;
pub mod settings;
pub mod users;
