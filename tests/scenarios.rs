//! End-to-end challenge lifecycles through the public engine API, with a
//! report accessor the test controls build by build.

use std::collections::HashMap;
use std::sync::Mutex;

use covquest_backend::challenge::{
  BuildChallenge, BuildOutcome, BuildResult, Challenge, EvaluationContext, BRANCH_KEY,
};
use covquest_backend::coverage::{
  ClassDetails, CoverageError, CoverageLine, CoverageReportAccessor, CoverageTag,
};
use covquest_backend::factory::ChallengeFactory;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One class whose markup and percentage change between "builds".
struct Build {
  lines: Mutex<Option<Vec<CoverageLine>>>,
  percentage: Mutex<f64>,
}

impl Build {
  fn new(lines: Vec<CoverageLine>, percentage: f64) -> Self {
    Self { lines: Mutex::new(Some(lines)), percentage: Mutex::new(percentage) }
  }

  fn next(&self, lines: Vec<CoverageLine>, percentage: f64) {
    *self.lines.lock().unwrap() = Some(lines);
    *self.percentage.lock().unwrap() = percentage;
  }
}

impl CoverageReportAccessor for Build {
  fn lines(&self, class: &ClassDetails) -> Result<Vec<CoverageLine>, CoverageError> {
    self.lines.lock().unwrap().clone().ok_or_else(|| CoverageError::Io {
      path: class.source_file.clone(),
      source: std::io::Error::new(std::io::ErrorKind::NotFound, "mid-write"),
    })
  }

  fn coverage_percentage(&self, _class: &ClassDetails) -> Result<f64, CoverageError> {
    Ok(*self.percentage.lock().unwrap())
  }
}

fn class() -> ClassDetails {
  ClassDetails::new("Calculator", "com.example", "Calculator.java.html", "jacoco.csv")
}

fn ten_lines(uncovered: &[u32]) -> Vec<CoverageLine> {
  (1..=10)
    .map(|n| CoverageLine {
      number: n,
      tag: if uncovered.contains(&n) { CoverageTag::NotCovered } else { CoverageTag::FullyCovered },
      text: format!("total += {n};"),
      title: None,
    })
    .collect()
}

fn on_branch<'a>(reports: &'a Build, branch: &str) -> EvaluationContext<'a> {
  EvaluationContext::new(HashMap::from([(BRANCH_KEY.to_string(), branch.to_string())]), reports)
}

#[test]
fn covering_the_selected_line_solves_the_challenge() {
  let reports = Build::new(ten_lines(&[2, 5, 8]), 70.0);
  let mut challenge: Challenge = ChallengeFactory::new(&reports)
    .generate_line_coverage(class(), "main", &mut StdRng::seed_from_u64(2024))
    .unwrap()
    .into();
  let Challenge::LineCoverage(line) = &challenge else { panic!("expected a line challenge") };
  let target = line.line_number();
  assert!([2, 5, 8].contains(&target));
  assert_eq!(challenge.score(), 2);

  let outcome = BuildOutcome::new(BuildResult::Success);
  assert!(!challenge.is_solved(&on_branch(&reports, "main"), &outcome));
  assert_eq!(challenge.solved(), 0);

  let remaining: Vec<u32> = [2, 5, 8].into_iter().filter(|n| *n != target).collect();
  reports.next(ten_lines(&remaining), 80.0);
  assert!(challenge.is_solved(&on_branch(&reports, "main"), &outcome));
  let Challenge::LineCoverage(line) = &challenge else { unreachable!() };
  assert_eq!(line.base().solved_coverage(), Some(80.0));
}

#[test]
fn build_challenge_follows_outcome_history() {
  let reports = Build::new(Vec::new(), 0.0);
  let ctx = on_branch(&reports, "main");
  let mut challenge: Challenge = BuildChallenge::new().into();

  let seen: Vec<bool> = [BuildResult::Failure, BuildResult::Failure, BuildResult::Success, BuildResult::Failure]
    .into_iter()
    .map(|r| challenge.is_solved(&ctx, &BuildOutcome::new(r)))
    .collect();
  assert_eq!(seen, vec![false, false, true, true]);
  assert!(challenge.is_solvable(&ctx, &BuildOutcome::new(BuildResult::Aborted)));
}

#[test]
fn deleting_the_line_retires_the_challenge() {
  let reports = Build::new(ten_lines(&[4]), 50.0);
  let mut challenge: Challenge = ChallengeFactory::new(&reports)
    .generate_line_coverage(class(), "main", &mut StdRng::seed_from_u64(1))
    .unwrap()
    .into();

  let without_line_4: Vec<CoverageLine> = ten_lines(&[]).into_iter().filter(|l| l.number != 4).collect();
  reports.next(without_line_4, 100.0);
  let ctx = on_branch(&reports, "main");
  let outcome = BuildOutcome::new(BuildResult::Success);
  assert!(!challenge.is_solvable(&ctx, &outcome));
  assert!(!challenge.is_solved(&ctx, &outcome));
}

#[test]
fn unreadable_markup_never_escapes_evaluation() {
  let reports = Build::new(ten_lines(&[4]), 50.0);
  let mut challenge: Challenge = ChallengeFactory::new(&reports)
    .generate_line_coverage(class(), "main", &mut StdRng::seed_from_u64(1))
    .unwrap()
    .into();
  *reports.lines.lock().unwrap() = None;

  let ctx = on_branch(&reports, "main");
  let outcome = BuildOutcome::new(BuildResult::Success);
  assert!(!challenge.is_solved(&ctx, &outcome));
  assert!(!challenge.is_solvable(&ctx, &outcome));
  assert!(challenge.is_solvable(&on_branch(&reports, "release"), &outcome));
}

#[test]
fn xml_reason_is_optional_and_last() {
  let challenge: Challenge = BuildChallenge::new().into();
  let created = challenge.created();
  assert_eq!(
    challenge.print_to_xml("", ""),
    format!("<BuildChallenge created=\"{created}\" solved=\"0\"/>")
  );
  assert_eq!(
    challenge.print_to_xml("Not solvable", "  "),
    format!("  <BuildChallenge created=\"{created}\" solved=\"0\" reason=\"Not solvable\"/>")
  );
}
