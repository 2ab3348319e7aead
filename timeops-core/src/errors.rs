use thiserror::Error;
use timeops_remote::RemoteError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("No tags available")]
    NoTags,
}
