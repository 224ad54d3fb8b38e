//! Build diagnostics.
//!
//! The builder never rejects a script for containing constructs it does not
//! model; it records them here and moves on. Only a declaration it cannot
//! name at all is fatal.

use crate::error::line_col;
use crate::model::Range;
use serde::Serialize;

// ─── Diagnostic types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A construct the model does not represent; skipped.
    Missed,
    /// Modelled, but probably not what the author meant.
    Warning,
    /// The build stopped here.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub range: Range,
    /// Short rule identifier (e.g. "unsupported", "no-effect").
    pub rule: &'static str,
}

impl Diagnostic {
    pub fn missed(range: Range, what: &str) -> Self {
        Self {
            severity: Severity::Missed,
            message: format!("{what} is not part of the form model"),
            range,
            rule: "unsupported",
        }
    }

    pub fn warning(range: Range, rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            range,
            rule,
        }
    }

    pub fn fatal(range: Range, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
            range,
            rule: "fatal",
        }
    }
}

// ─── Reporting ────────────────────────────────────────────────────────────

/// Deliver diagnostics to a caller-supplied sink, one message per group:
/// missed constructs first, then warnings, then the fatal error if any.
/// Empty groups produce no message.
pub fn report(
    file_name: &str,
    source: &str,
    diagnostics: &[Diagnostic],
    mut sink: impl FnMut(&str),
) {
    let groups = [
        (Severity::Missed, "Missed constructs"),
        (Severity::Warning, "Warnings"),
        (Severity::Fatal, "Fatal error"),
    ];
    for (severity, title) in groups {
        let mut message = String::new();
        for diag in diagnostics.iter().filter(|d| d.severity == severity) {
            // Ranges start at the leading trivia; point at the token instead.
            let text = diag.range.slice(source);
            let skipped = text.len() - text.trim_start().len();
            let (line, col) = line_col(source, diag.range.pos + skipped);
            message.push_str(&format!("\n  {line}:{col} {}", diag.message));
        }
        if !message.is_empty() {
            sink(&format!("{title} in {file_name}:{message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_groups_by_severity() {
        let source = "a;\n  b;";
        let diags = vec![
            Diagnostic::warning(Range::new(0, 1), "no-effect", "expression has no effect"),
            Diagnostic::missed(Range::new(2, 6), "element access"),
        ];
        let mut out = Vec::new();
        report("form.js", source, &diags, |msg| out.push(msg.to_string()));

        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0],
            "Missed constructs in form.js:\n  2:3 element access is not part of the form model"
        );
        assert_eq!(out[1], "Warnings in form.js:\n  1:1 expression has no effect");
    }

    #[test]
    fn report_is_silent_without_diagnostics() {
        let mut called = false;
        report("form.js", "", &[], |_| called = true);
        assert!(!called);
    }
}
