//! Learning path: domains, units, lessons and attempt records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ids::{AttemptId, LessonId, UnitId, UserId};

/// Thematic learning category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NirdDomain {
    Accessibility,
    OpenSource,
    Sustainability,
    DigitalSobriety,
    ResponsibleDevops,
}

/// Error raised when a stored domain label is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown learning domain: {0}")]
pub struct UnknownDomain(pub String);

impl NirdDomain {
    /// Every domain in path order.
    pub const ALL: [NirdDomain; 5] = [
        NirdDomain::Accessibility,
        NirdDomain::OpenSource,
        NirdDomain::Sustainability,
        NirdDomain::DigitalSobriety,
        NirdDomain::ResponsibleDevops,
    ];

    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accessibility => "ACCESSIBILITY",
            Self::OpenSource => "OPEN_SOURCE",
            Self::Sustainability => "SUSTAINABILITY",
            Self::DigitalSobriety => "DIGITAL_SOBRIETY",
            Self::ResponsibleDevops => "RESPONSIBLE_DEVOPS",
        }
    }
}

impl std::fmt::Display for NirdDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NirdDomain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str() == s)
            .ok_or_else(|| UnknownDomain(s.to_owned()))
    }
}

/// Ordered learning module inside one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub title: String,
    pub description: String,
    pub domain: NirdDomain,
    pub order: i32,
    pub is_checkpoint: bool,
    pub required_unit_id: Option<UnitId>,
}

/// Lesson format, matching the tag of [`LessonContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonKind {
    Quiz,
    Practice,
    Story,
    Reading,
}

impl LessonKind {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quiz => "QUIZ",
            Self::Practice => "PRACTICE",
            Self::Story => "STORY",
            Self::Reading => "READING",
        }
    }
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

/// Branch offered at the end of a story scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryChoice {
    pub text: String,
    pub consequence: String,
    /// Signed XP adjustment shown to the learner for this choice.
    pub xp_modifier: i32,
}

/// Narrative step of a story lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoryScene {
    pub text: String,
    #[serde(default)]
    pub choices: Vec<StoryChoice>,
}

/// Lesson payload; the shape depends on the lesson format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonContent {
    Quiz {
        questions: Vec<QuizQuestion>,
    },
    Practice {
        instructions: String,
        #[serde(default)]
        checklist: Vec<String>,
    },
    Story {
        scenes: Vec<StoryScene>,
    },
    Reading {
        body: String,
    },
}

impl LessonContent {
    /// Format of this payload.
    pub const fn kind(&self) -> LessonKind {
        match self {
            Self::Quiz { .. } => LessonKind::Quiz,
            Self::Practice { .. } => LessonKind::Practice,
            Self::Story { .. } => LessonKind::Story,
            Self::Reading { .. } => LessonKind::Reading,
        }
    }
}

/// A lesson belonging to exactly one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub unit_id: UnitId,
    pub title: String,
    pub description: String,
    pub difficulty: u8,
    pub xp_reward: u32,
    pub heart_cost: u32,
    pub order: i32,
    pub content: LessonContent,
}

impl Lesson {
    /// Format of the lesson.
    pub const fn kind(&self) -> LessonKind {
        self.content.kind()
    }
}

/// Lesson together with the domain of its unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonInDomain {
    pub lesson: Lesson,
    pub domain: NirdDomain,
}

/// Outcome of a lesson attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptResult {
    Pass,
    Fail,
}

impl AttemptResult {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

/// Immutable record of a lesson attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonAttempt {
    pub id: AttemptId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub result: AttemptResult,
    pub errors_count: u32,
    pub xp_earned: u32,
    pub hearts_used: u32,
    #[schema(value_type = Object)]
    pub answers: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Lesson as shown on the learning path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathLesson {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub completed: bool,
}

/// Unit as shown on the learning path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathUnit {
    #[serde(flatten)]
    pub unit: Unit,
    pub lessons: Vec<PathLesson>,
    pub completed: bool,
    pub locked: bool,
}

/// Assemble the learning path for one learner.
///
/// Units are ordered by domain then order and lessons by order. A lesson is
/// completed once it has a passing attempt; a unit is completed when it has
/// lessons and all of them are completed. A unit is locked while the unit it
/// requires is not completed.
pub fn assemble_path(
    mut units: Vec<Unit>,
    mut lessons: Vec<Lesson>,
    passed: &HashSet<LessonId>,
) -> Vec<PathUnit> {
    units.sort_by_key(|unit| (unit.domain, unit.order));
    lessons.sort_by_key(|lesson| lesson.order);

    let mut path: Vec<PathUnit> = units
        .into_iter()
        .map(|unit| {
            let unit_lessons: Vec<PathLesson> = lessons
                .iter()
                .filter(|lesson| lesson.unit_id == unit.id)
                .map(|lesson| PathLesson {
                    completed: passed.contains(&lesson.id),
                    lesson: lesson.clone(),
                })
                .collect();
            let completed =
                !unit_lessons.is_empty() && unit_lessons.iter().all(|lesson| lesson.completed);
            PathUnit {
                unit,
                lessons: unit_lessons,
                completed,
                locked: false,
            }
        })
        .collect();

    let completed_units: HashSet<UnitId> = path
        .iter()
        .filter(|unit| unit.completed)
        .map(|unit| unit.unit.id)
        .collect();
    for unit in &mut path {
        unit.locked = unit
            .unit
            .required_unit_id
            .is_some_and(|required| !completed_units.contains(&required));
    }
    path
}
