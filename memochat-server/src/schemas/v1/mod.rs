pub mod chat;
pub mod models;
pub mod preferences;
pub mod session;
