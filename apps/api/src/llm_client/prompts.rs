// Cross-cutting prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it and composes these in.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT include explanations or apologies.";

/// Keeps the model from inventing facts that are not in the supplied documents.
pub const EVIDENCE_INSTRUCTION: &str = "\
    Base every statement on the supplied documents only. \
    If a resume does not mention something, treat it as absent rather than guessing.";
