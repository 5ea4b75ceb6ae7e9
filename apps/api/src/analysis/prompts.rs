use crate::llm_client::prompts::{EVIDENCE_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::models::resume::AnalysisBatch;

pub const ANALYSIS_SYSTEM: &str = "You are an expert HR analyst and resume screener. \
    You compare resumes against a job description and report how well each candidate fits.";

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze every resume below against the job description.

For each resume, evaluate:
1. Overall fit score (0-100) based on how well the candidate matches the job requirements
2. Key skills that match the job requirements
3. Requirements that are missing from the resume
4. Years of experience, estimated from the resume
5. Education level and relevance
6. A brief summary of the candidate's strengths

Return a JSON array with one object per resume, in the same order as the resumes:
{
  "resumeId": "the id shown in the resume header",
  "name": "Candidate name extracted from the resume",
  "email": "email if present",
  "phone": "phone if present",
  "fitScore": 85,
  "skills": [{"name": "skill", "level": "beginner|intermediate|advanced|expert", "years": 2}],
  "mismatches": [{"type": "missing_skill|experience_gap|qualification_mismatch", "description": "...", "severity": "low|medium|high"}],
  "experience": "X years",
  "experienceBreakdown": ["Role at Company (dates)"],
  "education": ["Degree / certification"],
  "strengths": ["..."]
}

Job Description:
{job_description}

Resumes to analyze:
{resumes}"#;

pub fn analysis_system_prompt() -> String {
    format!("{ANALYSIS_SYSTEM} {EVIDENCE_INSTRUCTION} {JSON_ONLY_SYSTEM}")
}

pub fn build_analysis_prompt(batch: &AnalysisBatch) -> String {
    let resumes = batch
        .resumes
        .iter()
        .map(|r| format!("--- {} (id: {}) ---\n{}", r.name, r.id, r.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    ANALYSIS_PROMPT_TEMPLATE
        .replace("{job_description}", &batch.job_description)
        .replace("{resumes}", &resumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ResumeDocument;

    #[test]
    fn test_prompt_carries_jd_and_resume_headers() {
        let mut doc = ResumeDocument::new("jane.txt", "Jane Doe\nReact");
        doc.id = "r-1".to_string();
        let prompt = build_analysis_prompt(&AnalysisBatch::new("Need React", vec![doc]));
        assert!(prompt.contains("Need React"));
        assert!(prompt.contains("--- jane.txt (id: r-1) ---\nJane Doe\nReact"));
        assert!(!prompt.contains("{resumes}"));
    }

    #[test]
    fn test_system_prompt_demands_json() {
        assert!(analysis_system_prompt().contains("valid JSON only"));
    }
}
