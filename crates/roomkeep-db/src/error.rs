//! Database-specific error types and conversions.

use roomkeep_core::error::RoomkeepError;
use uuid::Uuid;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}")]
    Duplicate { entity: String },

    #[error("Room {room_id} already reserved for these dates")]
    RoomUnavailable { room_id: Uuid },

    #[error("Invalid stored value: {0}")]
    Corrupt(String),
}

impl DbError {
    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Classify a failed write, turning unique-index violations into
    /// [`DbError::Duplicate`].
    pub(crate) fn from_write(entity: &str, message: String) -> Self {
        if message.contains("already contains") {
            Self::Duplicate {
                entity: entity.into(),
            }
        } else {
            Self::Query(message)
        }
    }
}

impl From<DbError> for RoomkeepError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RoomkeepError::NotFound { entity, id },
            DbError::Duplicate { entity } => RoomkeepError::AlreadyExists { entity },
            DbError::RoomUnavailable { room_id } => RoomkeepError::RoomUnavailable { room_id },
            other => RoomkeepError::Database(other.to_string()),
        }
    }
}
