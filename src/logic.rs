//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Creating challenges (line coverage, build, test) through the factory
//!   - Evaluating every open challenge against a finished build
//!   - Exporting all tracked challenges as XML

use std::collections::HashMap;

use tokio::task::JoinError;
use tracing::{debug, info, instrument, warn, Span};

use crate::challenge::{BuildOutcome, EvaluationContext, Solvability, BRANCH_KEY};
use crate::factory::{ChallengeFactory, GenerationError};
use crate::protocol::{to_out, ChallengeIn, EvaluationOut};
use crate::state::{AppState, ChallengeStatus, TrackedChallenge};

/// Reason recorded when the host retires a stale challenge.
pub const NOT_SOLVABLE: &str = "Not solvable";

#[instrument(level = "info", skip_all)]
pub async fn create_challenge(state: &AppState, req: ChallengeIn) -> Result<TrackedChallenge, GenerationError> {
    let factory = ChallengeFactory::new(state.reports.as_ref());
    let default_branch = &state.config.project.default_branch;
    let challenge = match req {
        ChallengeIn::Build => factory.generate_build().into(),
        ChallengeIn::LineCoverage { package, class, branch } => {
            let details = state.class_details(&package, &class);
            let branch = branch.as_deref().unwrap_or(default_branch);
            state
                .with_rng(|rng| factory.generate_line_coverage(details, branch, rng))?
                .into()
        }
        ChallengeIn::Class { package, class, branch } => {
            let details = state.class_details(&package, &class);
            let branch = branch.as_deref().unwrap_or(default_branch);
            state.with_rng(|rng| factory.generate_for_class(details, branch, rng))?
        }
        ChallengeIn::Test { user, commit, test_count, branch } => {
            let branch = branch.as_deref().unwrap_or(default_branch);
            factory.generate_test(&commit, test_count, &user, branch).into()
        }
    };
    let tracked = state.insert_challenge(challenge).await;
    info!(target: "challenge", id = %tracked.id, kind = tracked.challenge.type_name(), score = tracked.challenge.score(), "Challenge created");
    Ok(tracked)
}

/// Check every open challenge against a finished build.
///
/// Solved challenges complete; stale ones are rejected. A challenge whose reports
/// can't be read this time stays open and is retried on the next build.
/// Report reads are blocking, so the pass runs on the blocking pool while it
/// holds the write lock.
#[instrument(level = "info", skip(state, constants, outcome), fields(result = ?outcome.result))]
pub async fn evaluate_build(
    state: &AppState,
    branch: Option<String>,
    mut constants: HashMap<String, String>,
    outcome: BuildOutcome,
) -> Result<EvaluationOut, JoinError> {
    let branch = branch.unwrap_or_else(|| state.config.project.default_branch.clone());
    constants.insert(BRANCH_KEY.to_string(), branch.clone());
    let reports = state.reports.clone();
    let mut challenges = state.challenges.clone().write_owned().await;
    let span = Span::current();

    let (solved, rejected, open, deferred) = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        let ctx = EvaluationContext::new(constants, reports.as_ref());
        let mut solved = Vec::new();
        let mut rejected = Vec::new();
        let mut open = 0;
        let mut deferred = 0;

        for tracked in challenges.values_mut().filter(|t| t.is_open()) {
            if tracked.challenge.is_solved(&ctx, &outcome) {
                tracked.status = ChallengeStatus::Completed;
                solved.push(to_out(tracked));
                continue;
            }
            match tracked.challenge.solvability(&ctx, &outcome) {
                Solvability::Solvable => open += 1,
                Solvability::Undetermined => {
                    debug!(target: "challenge", id = %tracked.id, "Reports unreadable; challenge left open");
                    open += 1;
                    deferred += 1;
                }
                Solvability::Stale => {
                    tracked.status = ChallengeStatus::Rejected { reason: NOT_SOLVABLE.to_string() };
                    warn!(target: "challenge", id = %tracked.id, challenge = %tracked.challenge, "Challenge no longer solvable; rejected");
                    rejected.push(to_out(tracked));
                }
            }
        }
        (solved, rejected, open, deferred)
    })
    .await?;

    let score = solved.iter().map(|c| c.score).sum();
    info!(target: "challenge", %branch, solved = solved.len(), rejected = rejected.len(), open, deferred, score, "Build evaluated");
    Ok(EvaluationOut { branch, solved, rejected, open, deferred, score })
}

/// All tracked challenges as one XML document, rejected ones with their reason.
#[instrument(level = "debug", skip_all)]
pub async fn export_xml(state: &AppState) -> String {
    let all = state.list_challenges().await;
    let mut out = format!("<Challenges project=\"{}\" count=\"{}\">\n", crate::util::escape_attr(&state.config.project.name), all.len());
    for t in &all {
        let reason = match &t.status {
            ChallengeStatus::Rejected { reason } => reason.as_str(),
            ChallengeStatus::Open | ChallengeStatus::Completed => "",
        };
        out.push_str(&t.challenge.print_to_xml(reason, "    "));
        out.push('\n');
    }
    out.push_str("</Challenges>");
    debug!(target: "covquest", challenges = all.len(), bytes = out.len(), "XML export built");
    out
}
