//! Dependency extraction from formula strings.
//!
//! Finds the `{Field}` references a formula reads without fully parsing it,
//! so it also works on formulas that fail to compile. Schema tooling uses
//! this to show which fields a formula depends on.
//!
//! Handles:
//! - Name references: `{Price}`, `{Unit Cost}`
//! - Id references: `{3f2504e0-4f89-11d3-9a0c-0305e82c3301}`
//! - Ignores braces inside string literals

use regex::Regex;
use std::sync::OnceLock;

/// Extract the field references of a formula, in order of first appearance,
/// without duplicates.
pub fn extract_field_refs(expression: &str) -> Vec<String> {
    let expression = strip_string_literals(expression);
    let mut refs: Vec<String> = Vec::new();

    for caps in field_ref_re().captures_iter(&expression) {
        let name = caps[1].trim();
        if name.is_empty() || refs.iter().any(|r| r == name) {
            continue;
        }
        refs.push(name.to_string());
    }

    refs
}

fn field_ref_re() -> &'static Regex {
    static FIELD_RE: OnceLock<Regex> = OnceLock::new();
    FIELD_RE.get_or_init(|| {
        Regex::new(r"\{([^{}]*)\}").expect("field reference regex must compile")
    })
}

/// Blank out string literal contents (keeping the quotes) so the reference
/// regex cannot match inside them.
fn strip_string_literals(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in expression.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(' ');
                continue;
            }
            if ch == '\\' {
                escaped = true;
                out.push(' ');
                continue;
            }
            if ch == '"' {
                in_string = false;
                out.push('"');
            } else {
                out.push(' ');
            }
        } else if ch == '"' {
            in_string = true;
            out.push('"');
        } else {
            out.push(ch);
        }
    }

    out
}
