//! Versioned DDL for the hotel tables and the runner that applies it.
//!
//! Every table is SCHEMAFULL. Ids are UUID strings, enums are PascalCase
//! strings guarded by ASSERT, and calendar dates are midnight-UTC datetimes.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Rooms
-- =======================================================================
DEFINE TABLE room SCHEMAFULL;
DEFINE FIELD number ON TABLE room TYPE string;
DEFINE FIELD room_type ON TABLE room TYPE string;
DEFINE FIELD capacity ON TABLE room TYPE int ASSERT $value > 0;
DEFINE FIELD price_cents ON TABLE room TYPE int ASSERT $value >= 0;
DEFINE FIELD description ON TABLE room TYPE string DEFAULT '';
DEFINE FIELD metadata ON TABLE room TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD is_reserved ON TABLE room TYPE bool DEFAULT false;
DEFINE FIELD housekeeping ON TABLE room TYPE string \
    ASSERT $value IN ['Clean', 'Dirty'];
DEFINE FIELD created_at ON TABLE room TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE room TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_room_number ON TABLE room COLUMNS number UNIQUE;
DEFINE INDEX idx_room_price ON TABLE room COLUMNS price_cents;

-- =======================================================================
-- Reservations
-- =======================================================================
DEFINE TABLE reservation SCHEMAFULL;
DEFINE FIELD room_id ON TABLE reservation TYPE string;
DEFINE FIELD user_id ON TABLE reservation TYPE option<string>;
DEFINE FIELD customer_name ON TABLE reservation TYPE string;
DEFINE FIELD guests ON TABLE reservation TYPE int ASSERT $value > 0;
DEFINE FIELD check_in ON TABLE reservation TYPE datetime;
DEFINE FIELD check_out ON TABLE reservation TYPE datetime;
DEFINE FIELD status ON TABLE reservation TYPE string \
    ASSERT $value IN ['Pending', 'Confirmed', 'Cancelled'];
DEFINE FIELD created_at ON TABLE reservation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE reservation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_reservation_room ON TABLE reservation \
    COLUMNS room_id, check_in;
DEFINE INDEX idx_reservation_user ON TABLE reservation COLUMNS user_id;

-- =======================================================================
-- Payments (one per reservation)
-- =======================================================================
DEFINE TABLE payment SCHEMAFULL;
DEFINE FIELD reservation_id ON TABLE payment TYPE string;
DEFINE FIELD amount_cents ON TABLE payment TYPE int ASSERT $value >= 0;
DEFINE FIELD cardholder_name ON TABLE payment TYPE string;
DEFINE FIELD bank_name ON TABLE payment TYPE string;
DEFINE FIELD card_last4 ON TABLE payment TYPE string;
DEFINE FIELD card_expiry ON TABLE payment TYPE string;
DEFINE FIELD sealed_card_number ON TABLE payment TYPE option<string>;
DEFINE FIELD paid_at ON TABLE payment TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_payment_reservation ON TABLE payment \
    COLUMNS reservation_id UNIQUE;

-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['Admin', 'Receptionist', 'Cleaner', 'User'];
DEFINE FIELD status ON TABLE user TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Sessions
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session COLUMNS user_id;

-- =======================================================================
-- Staff schedules
-- =======================================================================
DEFINE TABLE schedule SCHEMAFULL;
DEFINE FIELD staff_id ON TABLE schedule TYPE string;
DEFINE FIELD work_date ON TABLE schedule TYPE datetime;
DEFINE FIELD shift_start ON TABLE schedule TYPE string;
DEFINE FIELD shift_end ON TABLE schedule TYPE string;
DEFINE FIELD status ON TABLE schedule TYPE string \
    ASSERT $value IN ['Planned', 'Completed', 'Canceled'];
DEFINE FIELD note ON TABLE schedule TYPE option<string>;
DEFINE FIELD created_at ON TABLE schedule TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE schedule TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_schedule_staff_date ON TABLE schedule \
    COLUMNS staff_id, work_date;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Bring the database up to the newest schema version.
///
/// Idempotent: versions already recorded in `_migration` are skipped, so
/// this runs on every server start and in every integration test.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let applied: Vec<MigrationRecord> = result.take(0)?;
    let applied = applied.first().map_or(0, |m| m.version);

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        info!(version = migration.version, name = migration.name, "applying schema migration");

        let fail = |stage: &str, e: surrealdb::Error| {
            DbError::Migration(format!("v{} ({}) {stage}: {e}", migration.version, migration.name))
        };

        db.query(migration.sql)
            .await?
            .check()
            .map_err(|e| fail("apply", e))?;
        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| fail("record", e))?;
    }

    Ok(())
}

/// DDL of the first schema version.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "versions must strictly increase"
            );
        }
    }

    #[test]
    fn payment_is_unique_per_reservation() {
        assert!(SCHEMA_V1.contains("COLUMNS reservation_id UNIQUE"));
    }
}
