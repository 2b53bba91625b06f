//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable so CI hosts can evolve independently.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::challenge::{BuildOutcome, Challenge};
use crate::state::{ChallengeStatus, TrackedChallenge};

/// Which challenge to create.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChallengeIn {
    Build,
    /// Strict: fails when the class has nothing left to cover.
    LineCoverage {
        package: String,
        class: String,
        #[serde(default)]
        branch: Option<String>,
    },
    /// Line challenge, or a build challenge for a fully covered class.
    Class {
        package: String,
        class: String,
        #[serde(default)]
        branch: Option<String>,
    },
    Test {
        user: String,
        commit: String,
        #[serde(rename = "testCount")]
        test_count: u32,
        #[serde(default)]
        branch: Option<String>,
    },
}

/// DTO for challenge delivery.
#[derive(Debug, Serialize)]
pub struct ChallengeOut {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub description: String,
    pub score: u32,
    pub created: u64,
    pub solved: u64,
    #[serde(flatten)]
    pub status: ChallengeStatus,
    #[serde(rename = "toolTip", skip_serializing_if = "Option::is_none")]
    pub tool_tip: Option<String>,
    pub detail: Challenge,
}

/// Convert a tracked challenge (internal) to the public DTO.
pub fn to_out(t: &TrackedChallenge) -> ChallengeOut {
    ChallengeOut {
        id: t.id.clone(),
        type_name: t.challenge.type_name(),
        description: t.challenge.to_string(),
        score: t.challenge.score(),
        created: t.challenge.created(),
        solved: t.challenge.solved(),
        status: t.status.clone(),
        tool_tip: t.challenge.tool_tip(),
        detail: t.challenge.clone(),
    }
}

/// A finished build, as reported by the CI host.
#[derive(Debug, Deserialize)]
pub struct BuildIn {
    #[serde(default)]
    pub branch: Option<String>,
    /// Extra named parameters for the evaluation context.
    #[serde(default)]
    pub constants: HashMap<String, String>,
    #[serde(flatten)]
    pub outcome: BuildOutcome,
}

#[derive(Debug, Serialize)]
pub struct EvaluationOut {
    pub branch: String,
    pub solved: Vec<ChallengeOut>,
    pub rejected: Vec<ChallengeOut>,
    pub open: usize,
    /// Open challenges whose reports were unreadable on this build.
    pub deferred: usize,
    pub score: u32,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
