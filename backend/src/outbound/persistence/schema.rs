//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Teams and their aggregate counters.
    teams (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Nullable<Text>,
        total_points -> Int8,
        team_xp -> Int8,
        momentum_score -> Int8,
        /// Unique uppercase join token.
        invite_code -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Player accounts with progression counters.
    ///
    /// `weekly_xp_baseline` holds `xp_total` at the last league settlement so
    /// weekly XP is `xp_total - weekly_xp_baseline`.
    users (id) {
        id -> Uuid,
        login -> Varchar,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        avatar -> Nullable<Text>,
        roles -> Array<Text>,
        hearts -> Int4,
        streak -> Int4,
        xp_total -> Int8,
        gems -> Int4,
        league -> Text,
        weekly_xp_baseline -> Int8,
        last_active_date -> Nullable<Timestamptz>,
        team_id -> Nullable<Uuid>,
        accessibility_prefs -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed follow edges.
    follows (follower_id, following_id) {
        follower_id -> Uuid,
        following_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    units (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        domain -> Text,
        sort_order -> Int4,
        is_checkpoint -> Bool,
        required_unit_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    lessons (id) {
        id -> Uuid,
        unit_id -> Uuid,
        title -> Text,
        description -> Text,
        difficulty -> Int2,
        xp_reward -> Int4,
        heart_cost -> Int4,
        sort_order -> Int4,
        /// Tagged lesson content (`{"type": "QUIZ", ...}`).
        content -> Jsonb,
    }
}

diesel::table! {
    lesson_attempts (id) {
        id -> Uuid,
        user_id -> Uuid,
        lesson_id -> Uuid,
        result -> Text,
        errors_count -> Int4,
        xp_earned -> Int4,
        hearts_used -> Int4,
        answers -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    domain_progress (user_id, domain) {
        user_id -> Uuid,
        domain -> Text,
        xp -> Int8,
        level -> Int4,
        lessons_completed -> Int4,
        missions_completed -> Int4,
    }
}

diesel::table! {
    missions (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        category -> Text,
        points -> Int4,
        xp_reward -> Int4,
        gems_reward -> Int4,
        requirements -> Jsonb,
        difficulty -> Int2,
        status -> Text,
    }
}

diesel::table! {
    submissions (id) {
        id -> Uuid,
        team_id -> Uuid,
        mission_id -> Uuid,
        user_id -> Uuid,
        status -> Text,
        repository_url -> Nullable<Text>,
        notes -> Nullable<Text>,
        ci_run_id -> Nullable<Text>,
        ci_result -> Nullable<Jsonb>,
        verifier_id -> Nullable<Uuid>,
        verifier_notes -> Nullable<Text>,
        created_at -> Timestamptz,
        verified_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    badges (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        icon -> Text,
        criteria -> Jsonb,
        rarity -> Text,
    }
}

diesel::table! {
    user_badges (user_id, badge_id) {
        user_id -> Uuid,
        badge_id -> Uuid,
        earned_at -> Timestamptz,
    }
}

diesel::table! {
    store_items (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        item_type -> Text,
        cost_gems -> Int4,
        icon -> Text,
        available -> Bool,
    }
}

diesel::table! {
    active_boosters (id) {
        id -> Uuid,
        user_id -> Uuid,
        booster_type -> Text,
        expires_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    purchases (id) {
        id -> Uuid,
        user_id -> Uuid,
        item_id -> Uuid,
        cost_gems -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    flash_quests (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        xp_reward -> Int4,
        starts_at -> Timestamptz,
        ends_at -> Timestamptz,
        active -> Bool,
    }
}

diesel::table! {
    /// One row per league per ISO week.
    league_snapshots (id) {
        id -> Uuid,
        league -> Text,
        iso_year -> Int4,
        iso_week -> Int4,
        user_ranks -> Jsonb,
        promoted_users -> Array<Uuid>,
        demoted_users -> Array<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit log.
    event_log (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        team_id -> Nullable<Uuid>,
        event_type -> Text,
        payload -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(users -> teams (team_id));
diesel::joinable!(lessons -> units (unit_id));
diesel::joinable!(lesson_attempts -> lessons (lesson_id));
diesel::joinable!(lesson_attempts -> users (user_id));
diesel::joinable!(domain_progress -> users (user_id));
diesel::joinable!(submissions -> missions (mission_id));
diesel::joinable!(submissions -> teams (team_id));
diesel::joinable!(user_badges -> badges (badge_id));
diesel::joinable!(user_badges -> users (user_id));
diesel::joinable!(active_boosters -> users (user_id));
diesel::joinable!(purchases -> store_items (item_id));

diesel::allow_tables_to_appear_in_same_query!(
    teams,
    users,
    follows,
    units,
    lessons,
    lesson_attempts,
    domain_progress,
    missions,
    submissions,
    badges,
    user_badges,
    store_items,
    active_boosters,
    purchases,
    flash_quests,
    league_snapshots,
    event_log,
);
