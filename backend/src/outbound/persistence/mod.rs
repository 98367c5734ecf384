//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations translate between Diesel
//!   rows and domain types. Reward and settlement rules stay in the domain.
//! - **Atomic mutations**: Every mutation that moves gems, XP, hearts or
//!   points runs in one transaction together with its audit event.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leak to the domain layer.
//! - **Strongly typed errors**: Database errors are mapped to the port error
//!   of each repository.
//!
//! # Example
//!
//! ```ignore
//! use podium::outbound::persistence::{DbPool, PoolConfig, DieselUserRepository};
//!
//! let config = PoolConfig::new("postgres://localhost/podium");
//! let pool = DbPool::new(config).await?;
//! let repo = DieselUserRepository::new(pool);
//! ```

mod diesel_badge_repository;
mod diesel_basic_error_mapping;
mod diesel_event_log;
pub(crate) mod diesel_helpers;
mod diesel_league_repository;
mod diesel_learning_repository;
mod diesel_maintenance_repository;
mod diesel_mission_repository;
mod diesel_progress_repository;
mod diesel_social_repository;
mod diesel_store_repository;
mod diesel_team_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_badge_repository::DieselBadgeRepository;
pub use diesel_event_log::DieselEventLog;
pub use diesel_league_repository::DieselLeagueRepository;
pub use diesel_learning_repository::DieselLearningRepository;
pub use diesel_maintenance_repository::DieselMaintenanceRepository;
pub use diesel_mission_repository::DieselMissionRepository;
pub use diesel_progress_repository::DieselProgressRepository;
pub use diesel_social_repository::DieselSocialRepository;
pub use diesel_store_repository::DieselStoreRepository;
pub use diesel_team_repository::DieselTeamRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
