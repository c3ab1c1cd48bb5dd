use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("missing userId")]
    MissingUserId,
    #[error("missing location")]
    MissingLocation,
    #[error("missing sosId")]
    MissingSosId,
    #[error("missing coordinates")]
    MissingCoordinates,
    #[error("invalid coordinates")]
    InvalidCoordinates,
    #[error("username is required")]
    EmptyUsername,
    #[error("invalid sos status: {0}")]
    InvalidStatus(String),
}
