mod queries;
#[allow(clippy::module_inception)]
mod sqlite;
mod sqlite_utilities;

pub use sqlite::{SqliteSettings, SqliteStorage};
