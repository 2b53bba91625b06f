//! Builder for the single-element XML form challenges export.
//!
//! Attribute order is part of the export format: `created`, `solved`, then the
//! variant's own attributes, then `reason` (only when non-empty).

use std::fmt::{Display, Write};

use crate::util::escape_attr;

pub struct XmlElement {
  out: String,
}

impl XmlElement {
  /// Start `<name created=".." solved=".."` with the given indentation in front.
  pub fn new(indentation: &str, name: &str, created: u64, solved: u64) -> Self {
    Self { out: format!("{indentation}<{name}") }
      .attr("created", created)
      .attr("solved", solved)
  }

  pub fn attr(mut self, key: &str, value: impl Display) -> Self {
    let _ = write!(self.out, " {}=\"{}\"", key, escape_attr(&value.to_string()));
    self
  }

  pub fn finish(self, reason: &str) -> String {
    let mut el = if reason.is_empty() { self } else { self.attr("reason", reason) };
    el.out.push_str("/>");
    el.out
  }
}
