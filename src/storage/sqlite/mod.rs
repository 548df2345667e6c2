mod alert_repository;
mod connection;
mod job_repository;
mod migration_repository;

pub use alert_repository::SqliteAlertRepository;
pub use connection::SqliteStorage;
pub use job_repository::SqliteJobRepository;
pub use migration_repository::SqliteMigrationRepository;
