//! Direct SQL fixtures for the Diesel adapter suites.
//!
//! Rows are written and read with the synchronous `postgres` client so the
//! assertions never depend on the adapter under test.

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls};
use uuid::Uuid;

/// Render a `postgres` error with its SQLSTATE and detail.
pub(crate) fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

pub(crate) fn connect(url: &str) -> Client {
    Client::connect(url, NoTls)
        .unwrap_or_else(|err| panic!("connect: {}", format_postgres_error(&err)))
}

/// Player columns a suite cares about; everything else takes its default.
#[derive(Debug, Clone)]
pub(crate) struct PlayerRow {
    pub(crate) login: &'static str,
    pub(crate) hearts: i32,
    pub(crate) gems: i32,
    pub(crate) streak: i32,
    pub(crate) last_active: Option<DateTime<Utc>>,
    pub(crate) team_id: Option<Uuid>,
}

impl PlayerRow {
    pub(crate) fn new(login: &'static str) -> Self {
        Self {
            login,
            hearts: 5,
            gems: 0,
            streak: 0,
            last_active: None,
            team_id: None,
        }
    }
}

/// Balances read back after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Balances {
    pub(crate) hearts: i32,
    pub(crate) gems: i32,
    pub(crate) xp_total: i64,
    pub(crate) streak: i32,
}

pub(crate) fn insert_player(client: &mut Client, player: &PlayerRow) -> Uuid {
    let id = Uuid::new_v4();
    let email = format!("{}@podium.test", player.login);
    client
        .execute(
            concat!(
                "INSERT INTO users (id, login, name, email, password_hash, hearts, gems, ",
                "streak, last_active_date, team_id) ",
                "VALUES ($1, $2, $2, $3, 'not-a-hash', $4, $5, $6, $7, $8)"
            ),
            &[
                &id,
                &player.login,
                &email,
                &player.hearts,
                &player.gems,
                &player.streak,
                &player.last_active,
                &player.team_id,
            ],
        )
        .unwrap_or_else(|err| panic!("insert player: {}", format_postgres_error(&err)));
    id
}

pub(crate) fn insert_team(client: &mut Client, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let invite_code = id.simple().to_string()[..8].to_uppercase();
    client
        .execute(
            "INSERT INTO teams (id, name, invite_code) VALUES ($1, $2, $3)",
            &[&id, &name, &invite_code],
        )
        .unwrap_or_else(|err| panic!("insert team: {}", format_postgres_error(&err)));
    id
}

/// A passed attempt on a seeded lesson at `at`.
pub(crate) fn insert_pass(client: &mut Client, user: Uuid, lesson: Uuid, at: DateTime<Utc>) {
    client
        .execute(
            concat!(
                "INSERT INTO lesson_attempts (id, user_id, lesson_id, result, errors_count, ",
                "xp_earned, hearts_used, created_at) VALUES ($1, $2, $3, 'PASS', 0, 10, 0, $4)"
            ),
            &[&Uuid::new_v4(), &user, &lesson, &at],
        )
        .unwrap_or_else(|err| panic!("insert pass: {}", format_postgres_error(&err)));
}

pub(crate) fn balances(client: &mut Client, user: Uuid) -> Balances {
    let row = client
        .query_one(
            "SELECT hearts, gems, xp_total, streak FROM users WHERE id = $1",
            &[&user],
        )
        .unwrap_or_else(|err| panic!("read balances: {}", format_postgres_error(&err)));
    Balances {
        hearts: row.get(0),
        gems: row.get(1),
        xp_total: row.get(2),
        streak: row.get(3),
    }
}

/// Run a `SELECT COUNT(*) ...` bound to one user or team id.
pub(crate) fn count(client: &mut Client, sql: &str, id: Uuid) -> i64 {
    client
        .query_one(sql, &[&id])
        .unwrap_or_else(|err| panic!("count: {}", format_postgres_error(&err)))
        .get(0)
}
