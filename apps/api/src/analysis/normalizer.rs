//! Field Normalizer: maps loosely-structured provider output into `CandidateAnalysis`.
//!
//! Each canonical field is described by a [`FieldRule`]: a primary key, one alias key and
//! a shape coercion. A key whose value is null, empty or fails coercion is skipped, and the
//! field falls back to its default. Only a record that is not a JSON object is rejected.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::AnalysisError;
use crate::models::candidate::{
    clamp_fit_score, dedup_skills, CandidateAnalysis, ExtractedSkill, Mismatch, MismatchKind,
    Severity, SkillLevel, MAX_MISMATCHES, MAX_STRENGTHS,
};
use crate::models::resume::AnalysisBatch;

/// Where one canonical field may be found, and how its value is coerced.
pub struct FieldRule<T> {
    pub primary: &'static str,
    pub alias: &'static str,
    pub coerce: fn(&Value) -> Option<T>,
}

impl<T> FieldRule<T> {
    pub fn resolve(&self, record: &Map<String, Value>) -> Option<T> {
        [self.primary, self.alias]
            .into_iter()
            .filter_map(|key| record.get(key))
            .filter(|v| !v.is_null())
            .find_map(|v| (self.coerce)(v))
    }
}

pub const ID: FieldRule<String> = FieldRule {
    primary: "id",
    alias: "candidateId",
    coerce: coerce_text,
};
pub const SOURCE_DOCUMENT: FieldRule<String> = FieldRule {
    primary: "resumeId",
    alias: "sourceDocumentId",
    coerce: coerce_text,
};
pub const NAME: FieldRule<String> = FieldRule {
    primary: "candidateName",
    alias: "name",
    coerce: coerce_text,
};
pub const EMAIL: FieldRule<String> = FieldRule {
    primary: "email",
    alias: "emailAddress",
    coerce: coerce_text,
};
pub const PHONE: FieldRule<String> = FieldRule {
    primary: "phone",
    alias: "phoneNumber",
    coerce: coerce_text,
};
pub const FIT_SCORE: FieldRule<u8> = FieldRule {
    primary: "fitScore",
    alias: "score",
    coerce: coerce_score,
};
pub const SKILLS: FieldRule<Vec<ExtractedSkill>> = FieldRule {
    primary: "skills",
    alias: "matchedSkills",
    coerce: coerce_skills,
};
pub const TOTAL_EXPERIENCE: FieldRule<f64> = FieldRule {
    primary: "totalExperience",
    alias: "experience",
    coerce: coerce_years,
};
pub const EXPERIENCE_BREAKDOWN: FieldRule<Vec<String>> = FieldRule {
    primary: "experienceBreakdown",
    alias: "experiences",
    coerce: coerce_string_list,
};
pub const EDUCATION: FieldRule<Vec<String>> = FieldRule {
    primary: "education",
    alias: "qualifications",
    coerce: coerce_string_list,
};
pub const MISMATCHES: FieldRule<Vec<Mismatch>> = FieldRule {
    primary: "mismatches",
    alias: "gaps",
    coerce: coerce_mismatches,
};
pub const STRENGTHS: FieldRule<Vec<String>> = FieldRule {
    primary: "strengths",
    alias: "summary",
    coerce: coerce_string_list,
};
pub const RAW_CONTENT: FieldRule<String> = FieldRule {
    primary: "rawContent",
    alias: "content",
    coerce: coerce_raw_text,
};
pub const ANALYZED_AT: FieldRule<DateTime<Utc>> = FieldRule {
    primary: "analyzedAt",
    alias: "timestamp",
    coerce: coerce_timestamp,
};

const UNKNOWN_CANDIDATE: &str = "Unknown";

/// Run-scoped inputs the normalizer falls back on.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub batch: &'a AnalysisBatch,
    pub run_timestamp: DateTime<Utc>,
}

impl<'a> RunContext<'a> {
    pub fn new(batch: &'a AnalysisBatch) -> Self {
        Self {
            batch,
            run_timestamp: Utc::now(),
        }
    }
}

/// Normalizes one provider record. `position` is the record's index in the provider
/// response and pairs it with the resume at the same index when no id is given.
pub fn normalize(
    raw: &Value,
    run: &RunContext<'_>,
    position: usize,
) -> Result<CandidateAnalysis, AnalysisError> {
    let record = raw.as_object().ok_or_else(|| {
        AnalysisError::ProviderMalformedResponse(format!(
            "candidate at position {position} is {}, expected an object",
            json_type(raw)
        ))
    })?;

    let source_document_id = SOURCE_DOCUMENT
        .resolve(record)
        .or_else(|| run.batch.resumes.get(position).map(|r| r.id.clone()))
        .unwrap_or_else(synthesize_id);

    let raw_content = RAW_CONTENT
        .resolve(record)
        .or_else(|| {
            run.batch
                .find_resume(&source_document_id)
                .map(|r| r.content.clone())
        })
        .unwrap_or_default();

    let mut mismatches = MISMATCHES.resolve(record).unwrap_or_default();
    mismatches.truncate(MAX_MISMATCHES);
    let mut strengths = STRENGTHS.resolve(record).unwrap_or_default();
    strengths.truncate(MAX_STRENGTHS);

    Ok(CandidateAnalysis {
        id: ID.resolve(record).unwrap_or_else(synthesize_id),
        source_document_id,
        candidate_name: NAME
            .resolve(record)
            .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string()),
        email: EMAIL.resolve(record),
        phone: PHONE.resolve(record),
        fit_score: FIT_SCORE.resolve(record).unwrap_or(0),
        skills: SKILLS.resolve(record).unwrap_or_default(),
        total_experience_years: TOTAL_EXPERIENCE.resolve(record).unwrap_or(0.0),
        experience_breakdown: EXPERIENCE_BREAKDOWN.resolve(record).unwrap_or_default(),
        education: EDUCATION.resolve(record).unwrap_or_default(),
        mismatches,
        strengths,
        raw_content,
        analyzed_at: ANALYZED_AT.resolve(record).unwrap_or(run.run_timestamp),
    })
}

/// Confirms the provider's top-level shape and returns its candidate records.
///
/// Accepts a bare array, `{ "candidates": [...] }`, or a single candidate object.
/// `{ "error": ... }` becomes [`AnalysisError::ProviderReportedError`].
pub fn extract_records(body: Value) -> Result<Vec<Value>, AnalysisError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            if let Some(candidates) = map.remove("candidates") {
                return match candidates {
                    Value::Array(items) => Ok(items),
                    other => Err(AnalysisError::ProviderMalformedResponse(format!(
                        "`candidates` is {}, expected an array",
                        json_type(&other)
                    ))),
                };
            }
            if let Some(error) = map.get("error").filter(|e| !e.is_null()) {
                return Err(AnalysisError::ProviderReportedError {
                    status: None,
                    message: error_message(error),
                });
            }
            Ok(vec![Value::Object(map)])
        }
        other => Err(AnalysisError::ProviderMalformedResponse(format!(
            "response is {}, expected an array or object",
            json_type(&other)
        ))),
    }
}

/// Extracts and normalizes every record of a provider response, in response order.
/// A record id already used earlier in the response is replaced with a fresh one.
pub fn normalize_response(
    body: Value,
    run: &RunContext<'_>,
) -> Result<Vec<CandidateAnalysis>, AnalysisError> {
    let mut seen_ids = HashSet::new();
    extract_records(body)?
        .iter()
        .enumerate()
        .map(|(position, raw)| -> Result<CandidateAnalysis, AnalysisError> {
            let mut record = normalize(raw, run, position)?;
            if !seen_ids.insert(record.id.clone()) {
                record.id = synthesize_id();
                seen_ids.insert(record.id.clone());
            }
            Ok(record)
        })
        .collect()
}

/// Message of an `{ "error": ... }` body, whether a string or `{ "message": ... }`.
pub fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

fn synthesize_id() -> String {
    Uuid::new_v4().to_string()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Coercions
// ────────────────────────────────────────────────────────────────────────────

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)").expect("leading number pattern"));

/// Parses the leading number of strings like `"5 years"` or `"87%"`.
pub fn leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }
}

/// Non-empty trimmed string; numbers are accepted and printed.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()).map(String::from),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Like [`coerce_text`] but keeps surrounding whitespace.
fn coerce_raw_text(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(String::from)
}

pub fn coerce_score(value: &Value) -> Option<u8> {
    as_number(value).map(clamp_fit_score)
}

pub fn coerce_years(value: &Value) -> Option<f64> {
    as_number(value)
        .filter(|n| n.is_finite())
        .map(|n| n.max(0.0))
}

/// A list of strings, or a single string wrapped into a one-element list.
pub fn coerce_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(coerce_text).collect()),
        Value::String(_) => coerce_text(value).map(|s| vec![s]),
        _ => None,
    }
}

/// Skills as bare names, `{name, level, yearsOfExperience | years}` objects, or a single
/// comma-separated string. Missing level is intermediate, missing years is 0.
pub fn coerce_skills(value: &Value) -> Option<Vec<ExtractedSkill>> {
    let skills: Vec<ExtractedSkill> = match value {
        Value::Array(items) => items.iter().filter_map(coerce_skill).collect(),
        Value::String(s) => s
            .split([',', ';'])
            .filter_map(|name| coerce_skill(&Value::String(name.to_string())))
            .collect(),
        _ => return None,
    };
    Some(dedup_skills(skills))
}

fn coerce_skill(value: &Value) -> Option<ExtractedSkill> {
    match value {
        Value::String(_) | Value::Number(_) => coerce_text(value).map(|name| ExtractedSkill {
            name,
            level: SkillLevel::Intermediate,
            years_of_experience: Some(0.0),
        }),
        Value::Object(map) => {
            let name = ["name", "skill"]
                .iter()
                .filter_map(|k| map.get(*k))
                .find_map(coerce_text)?;
            let level = map
                .get("level")
                .and_then(Value::as_str)
                .and_then(SkillLevel::parse)
                .unwrap_or(SkillLevel::Intermediate);
            let years = ["yearsOfExperience", "years"]
                .iter()
                .filter_map(|k| map.get(*k))
                .find_map(coerce_years)
                .unwrap_or(0.0);
            Some(ExtractedSkill {
                name,
                level,
                years_of_experience: Some(years),
            })
        }
        _ => None,
    }
}

/// Mismatches as bare descriptions or partial objects. Missing kind is `missing_skill`,
/// missing severity is `medium`, missing description is derived from the kind.
pub fn coerce_mismatches(value: &Value) -> Option<Vec<Mismatch>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(coerce_mismatch).collect()),
        Value::String(_) => coerce_mismatch(value).map(|m| vec![m]),
        _ => None,
    }
}

fn coerce_mismatch(value: &Value) -> Option<Mismatch> {
    match value {
        Value::String(_) => coerce_text(value).map(|description| Mismatch {
            kind: MismatchKind::MissingSkill,
            description,
            severity: Severity::Medium,
        }),
        Value::Object(map) => {
            let kind = ["type", "kind"]
                .iter()
                .filter_map(|k| map.get(*k).and_then(Value::as_str))
                .find_map(MismatchKind::parse)
                .unwrap_or(MismatchKind::MissingSkill);
            let description = ["description", "text"]
                .iter()
                .filter_map(|k| map.get(*k))
                .find_map(coerce_text)
                .unwrap_or_else(|| default_mismatch_description(kind).to_string());
            let severity = map
                .get("severity")
                .and_then(Value::as_str)
                .and_then(Severity::parse)
                .unwrap_or(Severity::Medium);
            Some(Mismatch {
                kind,
                description,
                severity,
            })
        }
        _ => None,
    }
}

fn default_mismatch_description(kind: MismatchKind) -> &'static str {
    match kind {
        MismatchKind::MissingSkill => "Missing a required skill",
        MismatchKind::ExperienceGap => "Experience gap against the role",
        MismatchKind::QualificationMismatch => "Qualifications do not match the role",
    }
}

/// RFC 3339 string or epoch milliseconds.
pub fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
