//! Mingpan Report: BatchReport → Markdown
//!
//! Renders the aggregated outcome of a batch run into a structured,
//! human-readable summary: header, statistics, then per-record detail with
//! error/warning lists and `old → new` correction lines. The template is
//! compiled in; callers get a string to print, mail, or archive.

use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use thiserror::Error;

use mingpan_core::{BatchReport, Correction, Issue, RecordOutcome, ENGINE_VERSION};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("RENDER/{0}")]
    Render(#[from] handlebars::RenderError),
}

const TEMPLATE_NAME: &str = "batch_report";

const REPORT_TEMPLATE: &str = "\
# Birth Data Integrity Report

- Generated: {{generated_at}}
- Engine: v{{engine_version}}

## Statistics

- Total records: {{total}}
- Valid: {{valid_count}}
- Invalid: {{invalid_count}}
- Fixed: {{fixed_count}}
- Unchanged: {{unchanged_count}}
- Skipped: {{skipped_count}}
- Errors: {{error_count}}
- Warnings: {{warning_count}}
- Corrections: {{correction_count}}

## Details
{{#each details}}

### Record {{index}}{{#if label}} — {{{label}}}{{/if}}

- Status: {{status}}
{{#if has_errors}}
- Errors:
{{#each errors}}
  - [{{kind}}] {{{message}}}{{#if field}} ({{{field}}}){{/if}}
{{/each}}
{{/if}}
{{#if has_warnings}}
- Warnings:
{{#each warnings}}
  - [{{kind}}] {{{message}}}{{#if field}} ({{{field}}}){{/if}}
{{/each}}
{{/if}}
{{#if has_corrections}}
- Corrections:
{{#each corrections}}
  - {{{field}}}: {{{old}}} → {{{new}}}
{{/each}}
{{/if}}
{{/each}}
";

static RENDERER: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);
    let _ = handlebars.register_template_string(TEMPLATE_NAME, REPORT_TEMPLATE);
    handlebars
});

/// Render a batch report as Markdown
pub fn render_report(report: &BatchReport) -> Result<String, ReportError> {
    let data = report_data(report);
    Ok(RENDERER.render(TEMPLATE_NAME, &data)?)
}

/// Flatten the report into a template payload. Presence flags are
/// precomputed so the template never relies on collection truthiness.
fn report_data(report: &BatchReport) -> Value {
    json!({
        "generated_at": report.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        "engine_version": ENGINE_VERSION,
        "total": report.total,
        "valid_count": report.valid_count,
        "invalid_count": report.invalid_count,
        "fixed_count": report.fixed_count,
        "unchanged_count": report.unchanged_count,
        "skipped_count": report.skipped_count,
        "error_count": report.error_count(),
        "warning_count": report.warning_count(),
        "correction_count": report.correction_count(),
        "details": report.details.iter().map(outcome_data).collect::<Vec<_>>(),
    })
}

fn outcome_data(outcome: &RecordOutcome) -> Value {
    json!({
        "index": outcome.index,
        "label": outcome.label,
        "status": outcome.status.to_string(),
        "has_errors": !outcome.errors.is_empty(),
        "errors": outcome.errors.iter().map(issue_data).collect::<Vec<_>>(),
        "has_warnings": !outcome.warnings.is_empty(),
        "warnings": outcome.warnings.iter().map(issue_data).collect::<Vec<_>>(),
        "has_corrections": !outcome.corrections.is_empty(),
        "corrections": outcome
            .corrections
            .iter()
            .map(|(field, c)| correction_data(field, c))
            .collect::<Vec<_>>(),
    })
}

fn issue_data(issue: &Issue) -> Value {
    json!({
        "kind": issue.kind.to_string(),
        "message": issue.message,
        "field": issue.field,
    })
}

fn correction_data(field: &str, correction: &Correction) -> Value {
    json!({
        "field": field,
        "old": correction.old.as_deref().unwrap_or("(none)"),
        "new": correction.new,
    })
}
