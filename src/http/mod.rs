pub mod app_error;
pub mod health;
pub mod locations;
pub mod notifier_api;
pub mod server;
pub mod state;
