//! Canonical candidate analysis record. Every backend, local or remote, ends up here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mismatches are truncated to this many entries after generation.
pub const MAX_MISMATCHES: usize = 4;
/// Strengths are truncated to this many entries after generation.
pub const MAX_STRENGTHS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    /// Contribution of a matched skill to the heuristic fit score.
    pub fn weight(self) -> u32 {
        match self {
            SkillLevel::Beginner => 1,
            SkillLevel::Intermediate => 2,
            SkillLevel::Advanced => 3,
            SkillLevel::Expert => 4,
        }
    }

    /// Lenient parse used for provider output. Unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "beginner" | "novice" | "basic" => Some(SkillLevel::Beginner),
            "intermediate" | "proficient" => Some(SkillLevel::Intermediate),
            "advanced" => Some(SkillLevel::Advanced),
            "expert" => Some(SkillLevel::Expert),
            _ => None,
        }
    }

    pub fn is_senior(self) -> bool {
        matches!(self, SkillLevel::Advanced | SkillLevel::Expert)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSkill {
    /// Display casing is preserved; comparisons go through [`ExtractedSkill::key`].
    pub name: String,
    pub level: SkillLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<f64>,
}

impl ExtractedSkill {
    pub fn key(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    MissingSkill,
    ExperienceGap,
    QualificationMismatch,
}

impl MismatchKind {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "missing_skill" => Some(MismatchKind::MissingSkill),
            "experience_gap" => Some(MismatchKind::ExperienceGap),
            "qualification_mismatch" => Some(MismatchKind::QualificationMismatch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    #[serde(rename = "type")]
    pub kind: MismatchKind,
    pub description: String,
    pub severity: Severity,
}

/// One analysed candidate. Built once per resume per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateAnalysis {
    pub id: String,
    pub source_document_id: String,
    pub candidate_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Always within 0..=100.
    pub fit_score: u8,
    pub skills: Vec<ExtractedSkill>,
    pub total_experience_years: f64,
    pub experience_breakdown: Vec<String>,
    pub education: Vec<String>,
    pub mismatches: Vec<Mismatch>,
    pub strengths: Vec<String>,
    pub raw_content: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Rounds and clamps any numeric score into the canonical 0..=100 range.
/// NaN collapses to 0.
pub fn clamp_fit_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

/// Keeps the first occurrence of every skill name, compared case-insensitively.
pub fn dedup_skills(skills: Vec<ExtractedSkill>) -> Vec<ExtractedSkill> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .filter(|s| seen.insert(s.key()))
        .collect()
}
