//! Incident report rendering: a markdown narrative built from a closed case's
//! full record, plus an optional best-effort paginated PDF rendering of the
//! same text: five sections (Summary, Indicators/Artifacts, Actions, Tickets,
//! Timeline), with a "wrap plain text across pages" PDF strategy in place of
//! a real markdown renderer.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Mm, PdfDocument};
use thiserror::Error;

use soar_core::{Action, Artifact, Case, CaseId, Ticket, TimelineEvent};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf rendering error: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub markdown_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
}

/// Render a case's full record as a markdown incident report.
#[must_use]
pub fn build_markdown(
    case: &Case,
    artifacts: &[Artifact],
    timeline: &[TimelineEvent],
    actions: &[Action],
    tickets: &[Ticket],
) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "# Incident Report — Case {}", case.id);
    let _ = writeln!(md);
    let _ = writeln!(md, "## Summary");
    let _ = writeln!(md);
    let _ = writeln!(md, "- **Type:** {}", case.r#type);
    let _ = writeln!(md, "- **Status:** {}", case.status);
    let _ = writeln!(md, "- **Severity:** {}", case.severity);
    let _ = writeln!(md, "- **Score:** {}", case.score);
    let _ = writeln!(md, "- **Created:** {}", case.created_at.to_rfc3339());
    let _ = writeln!(md, "- **Updated:** {}", case.updated_at.to_rfc3339());
    let _ = writeln!(md);

    let _ = writeln!(md, "## Indicators / Artifacts");
    let _ = writeln!(md);
    if artifacts.is_empty() {
        let _ = writeln!(md, "_No artifacts recorded._");
    } else {
        let mut by_type: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for artifact in artifacts {
            by_type.entry(artifact.r#type.to_string()).or_default().push(artifact.value.clone());
        }
        for (kind, mut values) in by_type {
            values.sort();
            values.dedup();
            let _ = writeln!(md, "### {kind}");
            for value in values {
                let _ = writeln!(md, "- `{value}`");
            }
            let _ = writeln!(md);
        }
    }

    let _ = writeln!(md, "## Actions");
    let _ = writeln!(md);
    if actions.is_empty() {
        let _ = writeln!(md, "_No actions executed._");
    } else {
        for action in actions {
            let _ = writeln!(
                md,
                "- **{}** | success={:?} | started={} | finished={}",
                action.action_type,
                action.success,
                action.started_at.to_rfc3339(),
                action.finished_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            );
            if is_present(&action.params) {
                let _ = writeln!(md, "  - params: `{}`", action.params);
            }
            if is_present(&action.result) {
                let _ = writeln!(md, "  - result: `{}`", action.result);
            }
        }
    }
    let _ = writeln!(md);

    let _ = writeln!(md, "## Tickets");
    let _ = writeln!(md);
    if tickets.is_empty() {
        let _ = writeln!(md, "_No tickets created._");
    } else {
        for ticket in tickets {
            let _ = writeln!(
                md,
                "- **{}** | status={} | created={} | summary={}",
                ticket.id,
                ticket.status,
                ticket.created_at.to_rfc3339(),
                ticket.summary,
            );
        }
    }
    let _ = writeln!(md);

    let _ = writeln!(md, "## Timeline");
    let _ = writeln!(md);
    if timeline.is_empty() {
        let _ = writeln!(md, "_No timeline events._");
    } else {
        for event in timeline {
            let _ = writeln!(md, "- `{}` **{}** — {}", event.ts.to_rfc3339(), event.event_type, event.message);
            if is_present(&event.details) {
                let _ = writeln!(md, "  - details: `{}`", event.details);
            }
        }
    }

    md
}

/// `true` unless `value` is JSON null, an empty object, or an empty array.
fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Write the markdown (and, if `render_pdf`, a paginated PDF) to `report_dir`.
pub fn write_files(
    report_dir: &Path,
    case_id: CaseId,
    markdown: &str,
    render_pdf: bool,
) -> Result<ReportPaths, ReportError> {
    std::fs::create_dir_all(report_dir)?;

    let markdown_path = report_dir.join(format!("case_{case_id}.md"));
    std::fs::write(&markdown_path, markdown)?;

    let pdf_path = if render_pdf {
        let path = report_dir.join(format!("case_{case_id}.pdf"));
        render_pdf_document(markdown, &path)?;
        Some(path)
    } else {
        None
    };

    Ok(ReportPaths { markdown_path, pdf_path })
}

/// Minimal, dependency-free markdown -> PDF: render as wrapped plain text,
/// paginating once a page fills up.
fn render_pdf_document(markdown: &str, path: &Path) -> Result<(), ReportError> {
    const PAGE_WIDTH_MM: f64 = 215.9;
    const PAGE_HEIGHT_MM: f64 = 279.4;
    const TOP_MM: f64 = 270.0;
    const LEFT_MM: f64 = 15.0;
    const BOTTOM_MM: f64 = 15.0;
    const LINE_HEIGHT_MM: f64 = 5.0;
    const WRAP_WIDTH: usize = 100;

    let (doc, page1, layer1) =
        PdfDocument::new("Incident Report", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| ReportError::Pdf(e.to_string()))?;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    let mut y = TOP_MM;

    for raw_line in markdown.lines() {
        for wrapped in wrap_line(raw_line, WRAP_WIDTH) {
            if y <= BOTTOM_MM {
                let (page, pdf_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
                layer = doc.get_page(page).get_layer(pdf_layer);
                y = TOP_MM;
            }
            layer.use_text(wrapped, 10.0, Mm(LEFT_MM), Mm(y), &font);
            y -= LINE_HEIGHT_MM;
        }
    }

    let file = std::fs::File::create(path)?;
    doc.save(&mut std::io::BufWriter::new(file)).map_err(|e| ReportError::Pdf(e.to_string()))?;
    Ok(())
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![String::new()];
    }

    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > width {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use soar_core::{CaseStatus, CaseType, Severity};

    fn sample_case() -> Case {
        let now = Utc::now();
        Case {
            id: CaseId::new(),
            title: "hash".to_string(),
            r#type: CaseType::Phishing,
            severity: Severity::High,
            status: CaseStatus::Closed,
            score: 70,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn markdown_includes_each_artifact_value_once_per_type() {
        let case = sample_case();
        let now = Utc::now();
        let artifacts = vec![
            Artifact {
                id: soar_core::ArtifactId::new(),
                case_id: case.id,
                r#type: soar_core::ArtifactType::Domain,
                value: "evil.example.com".to_string(),
                first_seen: now,
            },
            Artifact {
                id: soar_core::ArtifactId::new(),
                case_id: case.id,
                r#type: soar_core::ArtifactType::Domain,
                value: "evil.example.com".to_string(),
                first_seen: now,
            },
        ];

        let md = build_markdown(&case, &artifacts, &[], &[], &[]);
        assert_eq!(md.matches("evil.example.com").count(), 1);
        assert!(md.contains("## Indicators / Artifacts"));
    }

    #[test]
    fn empty_sections_render_placeholder_text() {
        let case = sample_case();
        let md = build_markdown(&case, &[], &[], &[], &[]);
        assert!(md.contains("_No artifacts recorded._"));
        assert!(md.contains("_No actions executed._"));
        assert!(md.contains("_No tickets created._"));
        assert!(md.contains("_No timeline events._"));
    }

    #[test]
    fn write_files_creates_markdown_and_skips_pdf_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let case_id = CaseId::new();
        let paths = write_files(dir.path(), case_id, "# hi\n", false).unwrap();
        assert!(paths.markdown_path.exists());
        assert!(paths.pdf_path.is_none());
    }
}
