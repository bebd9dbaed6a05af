//! Refresh-token sessions. Only the SHA-256 of the raw token is stored.

use chrono::{DateTime, Utc};
use roomkeep_core::error::{RoomkeepError, RoomkeepResult};
use roomkeep_core::models::session::{CreateSession, Session};
use roomkeep_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    record_id: String,
    user_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// What `DELETE … RETURN BEFORE` hands back; only its presence matters.
#[derive(Debug, SurrealValue)]
struct RemovedRow {
    #[allow(dead_code)]
    user_id: String,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, DbError> {
        Ok(Session {
            id: parse_uuid(&self.record_id, "session")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            token_hash: self.token_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> RoomkeepResult<Session> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('session', $id) SET \
                 user_id = $user_id, \
                 token_hash = $token_hash, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 expires_at = $expires_at",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("session", e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> RoomkeepResult<Session> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('session', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("session", id))?;

        Ok(row.try_into_session()?)
    }

    async fn get_by_token_hash(&self, token_hash: &str) -> RoomkeepResult<Session> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE token_hash = $token_hash",
            )
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("session", "token_hash=<redacted>"))?;

        Ok(row.try_into_session()?)
    }

    async fn invalidate(&self, id: Uuid) -> RoomkeepResult<bool> {
        let deleted = self
            .db
            .query("DELETE type::record('session', $id) RETURN BEFORE")
            .bind(("id", id.to_string()))
            .await
            .and_then(|mut result| result.take::<Vec<RemovedRow>>(0));

        match deleted {
            Ok(rows) => Ok(!rows.is_empty()),
            // a competing delete of the same row aborts ours; the row being
            // gone afterwards means the other caller consumed it
            Err(e) => match self.get_by_id(id).await {
                Err(RoomkeepError::NotFound { .. }) => Ok(false),
                _ => Err(DbError::from(e).into()),
            },
        }
    }

    async fn invalidate_user_sessions(&self, user_id: Uuid) -> RoomkeepResult<()> {
        self.db
            .query("DELETE session WHERE user_id = $user_id")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> RoomkeepResult<u64> {
        let mut result = self
            .db
            .query(
                "LET $stale = SELECT VALUE id FROM session WHERE expires_at < time::now();\n\
                 DELETE $stale;\n\
                 RETURN array::len($stale);",
            )
            .await
            .map_err(DbError::from)?;

        let purged: Option<u64> = result.take(2).map_err(DbError::from)?;
        Ok(purged.unwrap_or(0))
    }
}
