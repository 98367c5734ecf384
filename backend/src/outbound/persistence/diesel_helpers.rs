//! Shared helpers for Diesel repository implementations.
//!
//! This module provides common utilities for database access including:
//! - Integer casting between unsigned domain counters and signed columns
//! - Decoding stored labels and JSON documents into domain types
//! - Unique-constraint inspection and transaction error plumbing
//! - Event log and domain progress writes shared by several repositories

use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};
use diesel::upsert::excluded;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::domain::progress::level_for_xp;
use crate::domain::{DomainDelta, NewEvent, UserId};

use super::models::{DomainProgressRow, NewEventRow};
use super::schema::{domain_progress, event_log};

/// Store an unsigned counter in an `INTEGER` column.
pub(crate) fn to_db_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Store an unsigned counter in a `BIGINT` column.
pub(crate) fn to_db_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Read an `INTEGER` counter; check constraints keep it non-negative.
pub(crate) fn from_db_i32(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

/// Read a `BIGINT` counter; check constraints keep it non-negative.
pub(crate) fn from_db_i64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Read a `SMALLINT` difficulty.
pub(crate) fn from_db_i16(value: i16) -> u8 {
    u8::try_from(value).unwrap_or(0)
}

/// Decode an upper-case storage label such as `"SILVER"` into its domain enum.
pub(crate) fn decode_label<T: DeserializeOwned>(raw: &str, column: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_owned()))
        .map_err(|err| format!("invalid {column} value {raw:?}: {err}"))
}

/// Decode a JSONB column into its domain shape.
pub(crate) fn decode_json<T: DeserializeOwned>(
    value: serde_json::Value,
    column: &str,
) -> Result<T, String> {
    serde_json::from_value(value).map_err(|err| format!("invalid {column} document: {err}"))
}

/// Encode a value for a JSONB column inside a Diesel operation.
pub(crate) fn encode_json<T: serde::Serialize>(
    value: &T,
) -> Result<serde_json::Value, diesel::result::Error> {
    serde_json::to_value(value)
        .map_err(|err| diesel::result::Error::SerializationError(Box::new(err)))
}

/// Convert rows with a fallible mapping, stopping at the first bad row.
pub(crate) fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

/// Name of the unique constraint violated by `error`, if any.
pub(crate) fn violated_unique_constraint(error: &diesel::result::Error) -> Option<&str> {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name().unwrap_or(""))
        }
        _ => None,
    }
}

/// Error raised inside a transaction: either a database failure or a domain
/// rejection that rolls the transaction back.
#[derive(Debug)]
pub(crate) enum TxError<E> {
    Diesel(diesel::result::Error),
    Rejected(E),
}

impl<E> From<diesel::result::Error> for TxError<E> {
    fn from(value: diesel::result::Error) -> Self {
        Self::Diesel(value)
    }
}

impl<E> TxError<E> {
    /// Collapse into the repository error type.
    pub(crate) fn into_repository_error(
        self,
        map_diesel_error: impl FnOnce(diesel::result::Error) -> E,
    ) -> E {
        match self {
            Self::Diesel(err) => map_diesel_error(err),
            Self::Rejected(err) => err,
        }
    }
}

/// Append an audit event on `conn`, typically inside the caller's transaction.
pub(crate) async fn append_event(
    conn: &mut AsyncPgConnection,
    event: &NewEvent,
    at: DateTime<Utc>,
) -> QueryResult<()> {
    let row = NewEventRow {
        id: Uuid::new_v4(),
        user_id: event.user_id.map(|id| *id.as_uuid()),
        team_id: event.team_id.map(|id| *id.as_uuid()),
        event_type: event.payload.event_type(),
        payload: encode_json(&event.payload)?,
        created_at: at,
    };
    diesel::insert_into(event_log::table)
        .values(&row)
        .execute(conn)
        .await
        .map(|_| ())
}

/// Add `delta` to the user's progress in one domain.
///
/// The level is recomputed in the same statement as `1 + xp / level_size`.
pub(crate) async fn upsert_domain_progress(
    conn: &mut AsyncPgConnection,
    user: &UserId,
    delta: &DomainDelta,
    level_size: u64,
) -> QueryResult<DomainProgressRow> {
    let xp = i64::from(delta.xp);
    let first_level = to_db_i32(level_for_xp(u64::from(delta.xp), level_size));
    let level_size = to_db_i64(level_size.max(1));
    diesel::insert_into(domain_progress::table)
        .values((
            domain_progress::user_id.eq(user.as_uuid()),
            domain_progress::domain.eq(delta.domain.as_str()),
            domain_progress::xp.eq(xp),
            domain_progress::level.eq(first_level),
            domain_progress::lessons_completed.eq(to_db_i32(delta.lessons)),
            domain_progress::missions_completed.eq(to_db_i32(delta.missions)),
        ))
        .on_conflict((domain_progress::user_id, domain_progress::domain))
        .do_update()
        .set((
            domain_progress::xp.eq(domain_progress::xp + excluded(domain_progress::xp)),
            domain_progress::level.eq(sql::<Integer>(
                "(1 + (domain_progress.xp + EXCLUDED.xp) / ",
            )
            .bind::<BigInt, _>(level_size)
            .sql(")::int")),
            domain_progress::lessons_completed.eq(domain_progress::lessons_completed
                + excluded(domain_progress::lessons_completed)),
            domain_progress::missions_completed.eq(domain_progress::missions_completed
                + excluded(domain_progress::missions_completed)),
        ))
        .returning(DomainProgressRow::as_returning())
        .get_result(conn)
        .await
}
