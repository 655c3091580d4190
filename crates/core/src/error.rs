use thiserror::Error;
use uuid::Uuid;

pub type TourResult<T> = Result<T, TourError>;

#[derive(Error, Debug)]
pub enum TourError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payment {0} is already split into installments")]
    AlreadySplit(Uuid),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TourError {
    /// Not-found error for an entity id. Cross-tenant hits use the same
    /// message as missing rows so existence never leaks across tenants.
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        Self::NotFound(format!("{entity} {id}"))
    }
}
