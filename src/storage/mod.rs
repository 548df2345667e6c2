pub mod sqlite;
pub mod traits;

pub use sqlite::{SqliteAlertRepository, SqliteJobRepository, SqliteMigrationRepository, SqliteStorage};
pub use traits::{AlertRepository, JobRepository, MigrationRepository};
