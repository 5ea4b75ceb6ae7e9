//! Fixed reference pools used by the heuristic analyzer.

use std::sync::LazyLock;

use regex::Regex;

/// Skill terms the heuristic analyzer knows how to recognise, in discovery order.
pub const SKILL_VOCABULARY: &[&str] = &[
    "JavaScript",
    "TypeScript",
    "React",
    "Angular",
    "Vue",
    "Node.js",
    "Python",
    "Java",
    "Go",
    "Rust",
    "C++",
    "C#",
    "Ruby",
    "PHP",
    "Kotlin",
    "Swift",
    "SQL",
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "Redis",
    "GraphQL",
    "REST API",
    "AWS",
    "Azure",
    "GCP",
    "Docker",
    "Kubernetes",
    "Terraform",
    "CI/CD",
    "Git",
    "Linux",
    "HTML",
    "CSS",
    "Machine Learning",
    "Data Analysis",
    "TensorFlow",
    "Agile",
    "Scrum",
    "Project Management",
];

pub const PLACEHOLDER_NAMES: &[&str] = &[
    "Alex Morgan",
    "Jordan Lee",
    "Taylor Brooks",
    "Casey Rivera",
    "Morgan Patel",
    "Riley Chen",
    "Avery Johnson",
    "Quinn Martinez",
];

pub const EXPERIENCE_POOL: &[&str] = &[
    "Senior Software Engineer at TechCorp (2020 - Present)",
    "Software Engineer at DataSystems Inc (2018 - 2020)",
    "Full Stack Developer at StartupHub (2017 - 2019)",
    "Backend Developer at CloudWorks (2016 - 2018)",
    "Frontend Engineer at PixelLabs (2019 - 2022)",
    "DevOps Engineer at InfraScale (2021 - Present)",
    "Junior Developer at CodeFactory (2015 - 2017)",
    "Technical Lead at FinServe (2022 - Present)",
];

pub const EDUCATION_POOL: &[&str] = &[
    "B.S. Computer Science, State University",
    "M.S. Software Engineering, Tech Institute",
    "B.E. Information Technology, National College",
    "MBA, Business School",
    "B.S. Mathematics, City University",
    "Certified Cloud Practitioner",
];

pub const FILLER_STRENGTHS: &[&str] = &[
    "Demonstrates commitment to continuous learning",
    "Relevant project experience",
    "Clear and well-structured resume",
];

/// A vocabulary term with its case-insensitive, word-bounded matcher.
pub struct SkillTerm {
    pub name: &'static str,
    matcher: Regex,
}

impl SkillTerm {
    pub fn is_in(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Symbols that may be part of a term (`C++`, `C#`) count as word characters, so
/// `Java` does not fire inside `JavaScript` and `Go` does not fire inside `Google`.
pub static SKILL_TERMS: LazyLock<Vec<SkillTerm>> = LazyLock::new(|| {
    SKILL_VOCABULARY
        .iter()
        .map(|&name| SkillTerm {
            name,
            matcher: Regex::new(&format!(
                r"(?i)(?:^|[^a-z0-9+#]){}(?:$|[^a-z0-9+#])",
                regex::escape(name)
            ))
            .expect("skill vocabulary pattern"),
        })
        .collect()
});

/// Vocabulary terms present in `text`, in vocabulary order.
pub fn terms_in(text: &str) -> Vec<&'static str> {
    SKILL_TERMS
        .iter()
        .filter(|t| t.is_in(text))
        .map(|t| t.name)
        .collect()
}

pub fn mentions(term: &str, text: &str) -> bool {
    SKILL_TERMS
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(term))
        .map(|t| t.is_in(text))
        .unwrap_or_else(|| text.to_lowercase().contains(&term.to_lowercase()))
}
