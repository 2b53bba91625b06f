//! Coverage report access: class locations, line-level markup, and aggregate percentages.
//!
//! The engine only consumes reports. `JacocoReports` reads the HTML source page and
//! the CSV summary that JaCoCo writes for every build; tests swap in `FakeReports`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::util::{collapse_whitespace, decode_entities};

/// Identifies a class and where its coverage artifacts live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDetails {
  pub class_name: String,
  pub package_name: String,
  /// Per-class HTML source page (`<package>/<Class>.java.html`).
  pub source_file: PathBuf,
  /// Report-wide CSV summary.
  pub csv_file: PathBuf,
}

impl ClassDetails {
  pub fn new(
    class_name: impl Into<String>,
    package_name: impl Into<String>,
    source_file: impl Into<PathBuf>,
    csv_file: impl Into<PathBuf>,
  ) -> Self {
    Self {
      class_name: class_name.into(),
      package_name: package_name.into(),
      source_file: source_file.into(),
      csv_file: csv_file.into(),
    }
  }

  /// Locate a class inside a standard JaCoCo HTML report tree.
  pub fn in_report(results_path: &Path, csv_file: &Path, source_suffix: &str, package_name: &str, class_name: &str) -> Self {
    // Nested classes share the outer class's source page.
    let outer = class_name.split('.').next().unwrap_or(class_name);
    let source_file = results_path
      .join(package_name)
      .join(format!("{outer}{source_suffix}"));
    Self::new(class_name, package_name, source_file, csv_file)
  }
}

/// Per-line coverage state as JaCoCo tags it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageTag {
  #[serde(rename = "nc")]
  NotCovered,
  #[serde(rename = "pc")]
  PartiallyCovered,
  #[serde(rename = "fc")]
  FullyCovered,
}

impl CoverageTag {
  pub fn from_class_token(token: &str) -> Option<Self> {
    match token {
      "nc" => Some(Self::NotCovered),
      "pc" => Some(Self::PartiallyCovered),
      "fc" => Some(Self::FullyCovered),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::NotCovered => "nc",
      Self::PartiallyCovered => "pc",
      Self::FullyCovered => "fc",
    }
  }
}

/// One source line from the HTML markup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageLine {
  pub number: u32,
  pub tag: CoverageTag,
  pub text: String,
  /// JaCoCo's branch hint, e.g. "1 of 2 branches missed."
  #[serde(default)]
  pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum CoverageError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("coverage summary is missing column {0}")]
  MissingColumn(&'static str),
  #[error("class {package}.{class} not found in coverage summary")]
  ClassNotInSummary { package: String, class: String },
  #[error("malformed coverage summary row {row}: {detail}")]
  MalformedRow { row: usize, detail: String },
}

/// Source of parsed coverage state for a class.
pub trait CoverageReportAccessor: Send + Sync {
  /// Every tagged line of the class's source page, in file order.
  fn lines(&self, class: &ClassDetails) -> Result<Vec<CoverageLine>, CoverageError>;

  /// Line coverage of the class in percent, `0.0..=100.0`.
  fn coverage_percentage(&self, class: &ClassDetails) -> Result<f64, CoverageError>;
}

/// Reads JaCoCo artifacts from disk on every call.
#[derive(Clone, Debug, Default)]
pub struct JacocoReports;

impl CoverageReportAccessor for JacocoReports {
  #[instrument(level = "debug", skip_all, fields(class = %class.class_name))]
  fn lines(&self, class: &ClassDetails) -> Result<Vec<CoverageLine>, CoverageError> {
    let html = read(&class.source_file)?;
    let lines = parse_source_lines(&html);
    debug!(target: "coverage", class = %class.class_name, lines = lines.len(), "Parsed source page");
    Ok(lines)
  }

  #[instrument(level = "debug", skip_all, fields(class = %class.class_name))]
  fn coverage_percentage(&self, class: &ClassDetails) -> Result<f64, CoverageError> {
    let csv = read(&class.csv_file)?;
    parse_csv_coverage(&csv, &class.package_name, &class.class_name)
  }
}

fn read(path: &Path) -> Result<String, CoverageError> {
  std::fs::read_to_string(path).map_err(|source| CoverageError::Io { path: path.to_path_buf(), source })
}

fn span_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?s)<span\b([^>]*)>(.*?)</span>").expect("valid span regex"))
}

fn attr_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*"([^"]*)""#).expect("valid attribute regex"))
}

fn tag_re() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

/// Extract the tagged lines of a JaCoCo source page.
///
/// Only spans carrying an `L<n>` id and one of the `nc`/`pc`/`fc` class tokens
/// count; everything else on the page is ignored.
pub fn parse_source_lines(html: &str) -> Vec<CoverageLine> {
  let mut out = Vec::new();
  for caps in span_re().captures_iter(html) {
    let mut id = None;
    let mut class = None;
    let mut title = None;
    for attr in attr_re().captures_iter(&caps[1]) {
      match &attr[1] {
        "id" => id = Some(attr[2].to_string()),
        "class" => class = Some(attr[2].to_string()),
        "title" => title = Some(decode_entities(&attr[2])),
        _ => {}
      }
    }
    let Some(number) = id
      .as_deref()
      .and_then(|id| id.strip_prefix('L'))
      .and_then(|n| n.parse::<u32>().ok())
    else {
      continue;
    };
    let Some(tag) = class
      .as_deref()
      .and_then(|c| c.split_whitespace().find_map(CoverageTag::from_class_token))
    else {
      continue;
    };
    let inner = tag_re().replace_all(&caps[2], "");
    out.push(CoverageLine {
      number,
      tag,
      text: collapse_whitespace(&decode_entities(&inner)),
      title,
    });
  }
  out
}

/// Line coverage percentage for one class from a JaCoCo CSV summary.
pub fn parse_csv_coverage(csv: &str, package: &str, class: &str) -> Result<f64, CoverageError> {
  let mut rows = csv.lines().filter(|l| !l.trim().is_empty());
  let header: Vec<&str> = rows
    .next()
    .ok_or(CoverageError::MissingColumn("CLASS"))?
    .split(',')
    .map(str::trim)
    .collect();
  let column = |name: &'static str| {
    header
      .iter()
      .position(|h| *h == name)
      .ok_or(CoverageError::MissingColumn(name))
  };
  let package_col = column("PACKAGE")?;
  let class_col = column("CLASS")?;
  let missed_col = column("LINE_MISSED")?;
  let covered_col = column("LINE_COVERED")?;

  for (idx, row) in rows.enumerate() {
    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.get(class_col) != Some(&class) || fields.get(package_col) != Some(&package) {
      continue;
    }
    let number = |col: usize| -> Result<f64, CoverageError> {
      fields
        .get(col)
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| CoverageError::MalformedRow {
          row: idx + 2,
          detail: format!("column {col} is not a number"),
        })
    };
    let missed = number(missed_col)?;
    let covered = number(covered_col)?;
    let total = missed + covered;
    return Ok(if total <= 0.0 { 0.0 } else { covered / total * 100.0 });
  }

  Err(CoverageError::ClassNotInSummary {
    package: package.to_string(),
    class: class.to_string(),
  })
}
