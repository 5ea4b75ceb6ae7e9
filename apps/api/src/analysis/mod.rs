// Candidate analysis pipeline.
// Backends (heuristic, webhook, LLM) produce CandidateAnalysis records; the pipeline ranks them.
// Remote output always passes through the normalizer before it reaches the ranker.

pub mod backend;
pub mod export;
pub mod extract;
pub mod handlers;
pub mod heuristic;
pub mod llm_provider;
pub mod normalizer;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod ranker;
pub mod vocabulary;
pub mod webhook;
