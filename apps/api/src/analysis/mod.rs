// LLM-backed analysis steps of the wizard.
// Implements: resume/JD match analysis, H1B eligibility assessment, report tabs.
// All model calls go through llm_client::StructuredCompletion.

pub mod eligibility;
pub mod matching;
pub mod prompts;
pub mod report;
