use std::fmt::Write;

use anyhow::{anyhow, Context};

use crate::models::{AnalysisRecord, AnalysisResult, IndicatorDelta, IndicatorScore, Mode};

/// Status band for an overall score, matching the gauge labels users know.
pub fn overall_label(overall: i32) -> &'static str {
    if overall >= 85 {
        "卓越狀態"
    } else if overall >= 75 {
        "優化提升期"
    } else if overall >= 65 {
        "可改善區"
    } else if overall >= 55 {
        "警示區"
    } else {
        "失衡區"
    }
}

/// Remaining headroom as a percentage, floored at 5 and capped at 40.
pub fn improvement_potential(overall: i32) -> i32 {
    (100 - overall).clamp(5, 40)
}

/// Estimated biological age: every 5 overall points above 50 takes one year
/// off the real age.
pub fn biological_age(age: i32, overall: i32) -> i32 {
    (f64::from(age) - (f64::from(overall) - 50.0) / 5.0).round() as i32
}

pub fn lowest_indicators(result: &AnalysisResult, count: usize) -> Vec<&IndicatorScore> {
    let mut ranked: Vec<&IndicatorScore> = result.items.iter().collect();
    ranked.sort_by(|a, b| a.score.cmp(&b.score));
    ranked.truncate(count);
    ranked
}

pub fn build_report(
    user_id: &str,
    mode: Mode,
    result: &AnalysisResult,
    deltas: &[IndicatorDelta],
    history: &[AnalysisRecord],
    age: Option<i32>,
    overall_move: Option<i32>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Wellness Analysis Report");
    let _ = writeln!(output, "Generated for {} ({} mode)", user_id, mode);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(
        output,
        "- Overall: {} ({})",
        result.overall,
        overall_label(result.overall)
    );

    match overall_move {
        Some(movement) => {
            let _ = writeln!(output, "- Trend: {movement:+} vs previous analysis");
        }
        None => {
            let _ = writeln!(output, "- Trend: first analysis, no comparison yet");
        }
    }

    let _ = writeln!(
        output,
        "- Improvement potential: {}%",
        improvement_potential(result.overall)
    );

    if let Some(age) = age {
        let _ = writeln!(
            output,
            "- Estimated biological age: {} (actual {})",
            biological_age(age, result.overall),
            age
        );
    }

    let _ = writeln!(output, "- Note: {}", result.note);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Indicators");

    for (item, delta) in result.items.iter().zip(deltas) {
        match (delta.previous, delta.delta) {
            (Some(previous), Some(movement)) => {
                let _ = writeln!(
                    output,
                    "- {}: {} ({}, {:+} vs {}) {}",
                    item.name, item.score, item.grade, movement, previous, item.description
                );
            }
            _ => {
                let _ = writeln!(
                    output,
                    "- {}: {} ({}) {}",
                    item.name, item.score, item.grade, item.description
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Needs Attention");

    for item in lowest_indicators(result, 3) {
        let _ = writeln!(
            output,
            "- {}: {} ({}) {}",
            item.name, item.score, item.grade, item.description
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Analyses");

    if history.is_empty() {
        let _ = writeln!(output, "No stored analyses yet.");
    } else {
        for record in history.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} [{}] overall {} ({})",
                record.created_at.format("%Y-%m-%d %H:%M"),
                record.mode,
                record.overall,
                overall_label(record.overall)
            );
        }
    }

    output
}

pub fn history_csv(records: &[AnalysisRecord]) -> anyhow::Result<String> {
    #[derive(serde::Serialize)]
    struct Row<'a> {
        id: String,
        user_id: &'a str,
        mode: &'a str,
        created_at: String,
        overall: i32,
        items: String,
    }

    let mut writer = csv::Writer::from_writer(Vec::new());

    for record in records {
        writer.serialize(Row {
            id: record.id.to_string(),
            user_id: &record.user_id,
            mode: record.mode.key(),
            created_at: record.created_at.to_rfc3339(),
            overall: record.overall,
            items: serde_json::to_string(&record.items)
                .context("failed to serialize indicator items")?,
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("failed to flush csv buffer: {err}"))?;
    String::from_utf8(bytes).context("csv output was not utf-8")
}
