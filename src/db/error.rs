use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
}

