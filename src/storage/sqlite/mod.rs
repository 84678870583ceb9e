#[allow(clippy::module_inception)]
pub mod sqlite;

pub use sqlite::SqliteNotifiedStore;
