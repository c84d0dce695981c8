//! Sample policy file generation
//!
//! Walks a catalog and renders a YAML policy file in which every rule appears, with
//! its description, operations, scope types and deprecation notice as comments and its
//! default check commented out. Operators copy the entries they want to change.

use crate::catalog::Catalog;
use crate::rule::Rule;
use std::fmt::Write;

fn quoted(value: &str) -> String {
    // JSON strings are valid YAML double-quoted scalars
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

fn comment_block(out: &mut String, text: &str) {
    for line in text.trim().lines() {
        let line = line.trim_end();
        if line.is_empty() {
            out.push_str("#\n");
        } else {
            let _ = writeln!(out, "# {}", line);
        }
    }
}

fn render_rule(out: &mut String, rule: &Rule) {
    comment_block(out, &rule.description);

    for operation in &rule.operations {
        let _ = writeln!(out, "# {:<7} {}", operation.method.as_str(), operation.path);
    }

    let scopes: Vec<&str> = rule.scope_types.iter().map(|s| s.as_str()).collect();
    let _ = writeln!(out, "# Intended scope(s): {}", scopes.join(", "));

    let _ = writeln!(
        out,
        "#{}: {}",
        quoted(&rule.name),
        quoted(&rule.check.to_string())
    );

    if let Some(deprecation) = &rule.deprecation {
        out.push_str("\n# DEPRECATED\n");
        let _ = writeln!(
            out,
            "# {}:{} has been deprecated since {} in favor of {}:{}.",
            quoted(&deprecation.prior_name),
            quoted(&deprecation.prior_check.to_string()),
            deprecation.since,
            quoted(&rule.name),
            quoted(&rule.check.to_string())
        );
        comment_block(out, &deprecation.reason);
    }

    out.push('\n');
}

/// Render a sample policy file for every rule in the catalog, in name order
pub fn render_sample(catalog: &Catalog) -> String {
    let mut out = String::new();
    for rule in catalog.iter() {
        render_rule(&mut out, rule);
    }
    out
}
