use std::fs;
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::domain::{validate_rcept_no, Report, ReportItem, ReportPayload, SavedPaths};
use crate::error::{codes, AppError};

/// `YYYYMMDD_HHMMSS` in UTC.
pub fn report_timestamp(at: OffsetDateTime) -> Result<String, AppError> {
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    at.to_offset(time::UtcOffset::UTC).format(&fmt).map_err(|e| {
        AppError::new(codes::REPORT_ENCODE_FAILED, "Failed to format report timestamp")
            .with_details(e.to_string())
    })
}

/// `{rcept_no}_report_{timestamp}`; shared by both serialised forms.
pub fn report_stem(rcept_no: &str, timestamp: &str) -> String {
    format!("{rcept_no}_report_{timestamp}")
}

pub fn report_paths(
    reports_dir: &Path,
    rcept_no: &str,
    timestamp: &str,
) -> Result<(PathBuf, PathBuf), AppError> {
    validate_rcept_no(rcept_no)?;
    let stem = report_stem(rcept_no, timestamp);
    Ok((
        reports_dir.join(format!("{stem}.json")),
        reports_dir.join(format!("{stem}.md")),
    ))
}

/// Narrative form: one section per question with its answer followed by its sources.
pub fn render_markdown(report: &Report) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("# 공시 요약 리포트".to_string());
    lines.push(String::new());
    lines.push(format!("- 문서: **{}**", report.report_name));
    lines.push(format!("- rcept_no: `{}`", report.rcept_no));
    lines.push(format!("- 원문 링크: {}", report.viewer));
    lines.push(format!("- 생성 시각: {}", report.generated_at));
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());

    for item in &report.items {
        lines.push(format!("## {}", item.label));
        lines.push(String::new());
        lines.push(item.answer.trim().to_string());
        lines.push(String::new());
        lines.push("Sources:".to_string());
        for s in &item.sources {
            lines.push(format!(
                "- [{}] chunk_id={} (score={:.4})",
                s.sid, s.chunk_id, s.score
            ));
        }
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

pub fn render_json(report: &Report) -> Result<String, AppError> {
    serde_json::to_string_pretty(report).map_err(|e| {
        AppError::new(codes::REPORT_ENCODE_FAILED, "Failed to encode report JSON")
            .with_details(e.to_string())
    })
}

/// Input for [`persist_report`]; everything except the storage locations.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub rcept_no: String,
    pub report_name: String,
    pub viewer: String,
    pub items: Vec<ReportItem>,
}

/// Render both forms and write them under `reports_dir`.
///
/// Both files are staged as temp files first and only renamed into place once
/// both writes succeeded. If the second rename fails the first is rolled back.
pub fn persist_report(
    reports_dir: &Path,
    draft: ReportDraft,
    generated_at: OffsetDateTime,
) -> Result<ReportPayload, AppError> {
    let ts = report_timestamp(generated_at)?;
    let generated_at = generated_at
        .to_offset(time::UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|e| {
            AppError::new(codes::REPORT_ENCODE_FAILED, "Failed to format report time")
                .with_details(e.to_string())
        })?;
    let (json_path, md_path) = report_paths(reports_dir, &draft.rcept_no, &ts)?;

    let report = Report {
        rcept_no: draft.rcept_no,
        report_name: draft.report_name,
        viewer: draft.viewer,
        generated_at,
        items: draft.items,
        saved: SavedPaths {
            json: json_path.to_string_lossy().to_string(),
            md: md_path.to_string_lossy().to_string(),
        },
    };
    let json_text = render_json(&report)?;
    let md_text = render_markdown(&report);

    fs::create_dir_all(reports_dir).map_err(|e| {
        AppError::new(codes::REPORT_WRITE_FAILED, "Failed to create reports directory")
            .with_details(format!("path={}; err={}", reports_dir.display(), e))
    })?;

    let json_tmp = json_path.with_extension("json.tmp");
    let md_tmp = md_path.with_extension("md.tmp");
    let staged = write_tmp(&json_tmp, &json_text).and_then(|_| write_tmp(&md_tmp, &md_text));
    if let Err(e) = staged {
        let _ = fs::remove_file(&json_tmp);
        let _ = fs::remove_file(&md_tmp);
        return Err(e);
    }
    if let Err(e) = finalize(&json_tmp, &json_path) {
        let _ = fs::remove_file(&json_tmp);
        let _ = fs::remove_file(&md_tmp);
        return Err(e);
    }
    if let Err(e) = finalize(&md_tmp, &md_path) {
        // A report is only ever visible as a pair.
        let _ = fs::remove_file(&json_path);
        let _ = fs::remove_file(&md_tmp);
        return Err(e);
    }

    log::info!(
        "saved report: json={} md={}",
        json_path.display(),
        md_path.display()
    );

    Ok(ReportPayload {
        report,
        json_text,
        md_text,
    })
}

fn write_tmp(path: &Path, text: &str) -> Result<(), AppError> {
    fs::write(path, text.as_bytes()).map_err(|e| {
        AppError::new(codes::REPORT_WRITE_FAILED, "Failed to write report")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

fn finalize(tmp: &Path, dest: &Path) -> Result<(), AppError> {
    fs::rename(tmp, dest).map_err(|e| {
        AppError::new(codes::REPORT_WRITE_FAILED, "Failed to finalize report write")
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), dest.display(), e))
    })
}
