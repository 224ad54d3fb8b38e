//! Emitter: statement snippets inserted into form scripts.
//!
//! Every snippet starts with a newline so it can be dropped in right after
//! an existing statement.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Position and size of a component on its form.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// `let <name> = NewForm();` followed by the call that shows it.
#[must_use]
pub fn emit_form(name: &str) -> String {
    format!("let {name} = NewForm();\n\n{name}.Show();\n")
}

/// Component declaration plus its layout call.
#[must_use]
pub fn emit_component(
    name: &str,
    owner: &str,
    constructor: &str,
    args: &[String],
    rect: &LayoutRect,
) -> String {
    let mut out = String::with_capacity(64);
    let _ = write!(
        out,
        "\nlet {name} = {owner}.{constructor}({});",
        args.join(", ")
    );
    let _ = write!(
        out,
        "\n{name}.SetLayout({}, {}, {}, {});",
        format_number(rect.left),
        format_number(rect.top),
        format_number(rect.width),
        format_number(rect.height)
    );
    out
}

/// `<target> = <value>;`
#[must_use]
pub fn emit_assignment(target: &str, value: &str) -> String {
    format!("\n{target} = {value};")
}

/// `<target>(<value>);`
#[must_use]
pub fn emit_call(target: &str, value: &str) -> String {
    format!("\n{target}({value});")
}

/// Format a number without a trailing `.0` when it is integral.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
