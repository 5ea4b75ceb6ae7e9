//! CSV export of an already-ranked candidate list. Input order is output order.

use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::models::candidate::CandidateAnalysis;

pub const CSV_HEADERS: [&str; 10] = [
    "Rank",
    "Candidate Name",
    "Email",
    "Phone",
    "Fit Score",
    "Total Experience (Years)",
    "Top Skills",
    "Strengths",
    "Mismatches",
    "Education",
];

const MISSING: &str = "N/A";
const LIST_SEPARATOR: &str = "; ";
const TOP_SKILLS: usize = 5;

/// Serializes candidates as CSV: header first, every cell double-quoted with embedded
/// quotes doubled, rows joined by `\n` with no trailing newline.
pub fn to_csv(records: &[CandidateAnalysis]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADERS)
        .context("Failed to write CSV header")?;
    for (index, record) in records.iter().enumerate() {
        writer
            .write_record(row(index + 1, record))
            .with_context(|| format!("Failed to write CSV row {}", index + 1))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    let mut csv = String::from_utf8(bytes).context("CSV output was not valid UTF-8")?;
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

fn row(rank: usize, c: &CandidateAnalysis) -> [String; 10] {
    [
        rank.to_string(),
        c.candidate_name.clone(),
        c.email.clone().unwrap_or_else(|| MISSING.to_string()),
        c.phone.clone().unwrap_or_else(|| MISSING.to_string()),
        c.fit_score.to_string(),
        format_years(c.total_experience_years),
        c.skills
            .iter()
            .take(TOP_SKILLS)
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        c.strengths.join(LIST_SEPARATOR),
        c.mismatches
            .iter()
            .map(|m| m.description.as_str())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        c.education.join(LIST_SEPARATOR),
    ]
}

/// Whole years print without a fractional part.
fn format_years(years: f64) -> String {
    if years.fract() == 0.0 {
        format!("{years:.0}")
    } else {
        years.to_string()
    }
}
