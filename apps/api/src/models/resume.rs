use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_MEDIA_TYPE: &str = "text/plain";

/// A decoded resume as handed to the pipeline. Owned by the caller for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub id: String,
    pub name: String,
    pub content: String,
    pub media_type: String,
    pub size_bytes: u64,
}

impl ResumeDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            size_bytes: content.len() as u64,
            content,
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
        }
    }
}

/// Resume as it arrives over the wire. Everything but `content` may be omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeInput {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub content: String,
    pub media_type: Option<String>,
    pub size_bytes: Option<u64>,
}

impl From<ResumeInput> for ResumeDocument {
    fn from(input: ResumeInput) -> Self {
        let mut doc = ResumeDocument::new(input.name, input.content);
        if let Some(id) = input.id.filter(|id| !id.trim().is_empty()) {
            doc.id = id;
        }
        if let Some(media_type) = input.media_type.filter(|m| !m.trim().is_empty()) {
            doc.media_type = media_type;
        }
        if let Some(size_bytes) = input.size_bytes {
            doc.size_bytes = size_bytes;
        }
        doc
    }
}

/// Everything one analysis run works on.
#[derive(Debug, Clone)]
pub struct AnalysisBatch {
    pub job_description: String,
    pub resumes: Vec<ResumeDocument>,
}

impl AnalysisBatch {
    pub fn new(job_description: impl Into<String>, resumes: Vec<ResumeDocument>) -> Self {
        Self {
            job_description: job_description.into(),
            resumes,
        }
    }

    pub fn find_resume(&self, id: &str) -> Option<&ResumeDocument> {
        self.resumes.iter().find(|r| r.id == id)
    }
}

/// Per-resume payload sent to remote providers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResume<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub content: &'a str,
    pub media_type: &'a str,
}

/// Request body sent to remote providers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest<'a> {
    pub job_description: &'a str,
    pub resumes: Vec<ProviderResume<'a>>,
}

impl<'a> From<&'a AnalysisBatch> for ProviderRequest<'a> {
    fn from(batch: &'a AnalysisBatch) -> Self {
        Self {
            job_description: &batch.job_description,
            resumes: batch
                .resumes
                .iter()
                .map(|r| ProviderResume {
                    id: &r.id,
                    name: &r.name,
                    content: &r.content,
                    media_type: &r.media_type,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resume_input_fills_defaults() {
        let input: ResumeInput = serde_json::from_value(json!({
            "name": "jane.txt",
            "content": "Jane Doe\nReact"
        }))
        .unwrap();
        let doc = ResumeDocument::from(input);
        assert!(!doc.id.is_empty());
        assert_eq!(doc.media_type, "text/plain");
        assert_eq!(doc.size_bytes, "Jane Doe\nReact".len() as u64);
    }

    #[test]
    fn test_resume_input_keeps_explicit_id() {
        let input: ResumeInput = serde_json::from_value(json!({
            "id": "r-1",
            "name": "cv.pdf",
            "content": "text",
            "mediaType": "application/pdf",
            "sizeBytes": 2048
        }))
        .unwrap();
        let doc = ResumeDocument::from(input);
        assert_eq!(doc.id, "r-1");
        assert_eq!(doc.media_type, "application/pdf");
        assert_eq!(doc.size_bytes, 2048);
    }

    #[test]
    fn test_provider_request_wire_shape() {
        let mut doc = ResumeDocument::new("a.txt", "hello");
        doc.id = "r-9".to_string();
        let batch = AnalysisBatch::new("Need Rust", vec![doc]);
        let body = serde_json::to_value(ProviderRequest::from(&batch)).unwrap();
        assert_eq!(body["jobDescription"], "Need Rust");
        assert_eq!(body["resumes"][0]["id"], "r-9");
        assert_eq!(body["resumes"][0]["mediaType"], "text/plain");
        assert!(body["resumes"][0].get("sizeBytes").is_none());
    }
}
