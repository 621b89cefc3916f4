//! Parley core: cross-cultural and gender-aware message analysis.
//!
//! A request fans out to two sub-analyzers, each making two provider calls; their
//! normalized results are merged into one [`AnalysisResult`]. The fallback cascade in
//! [`Communicator`] guarantees a well-formed result whenever the request is valid.

pub mod config;
pub mod cultural;
pub mod error;
pub mod gender;
pub mod heuristics;
pub mod normalizer;
pub mod observation;
pub mod orchestrator;
pub mod prompts;
pub mod provider;
pub mod synthesizer;
pub mod types;

pub use config::{ParleyConfig, ProviderConfig};
pub use cultural::CulturalAnalyzer;
pub use error::{AnalysisError, ProviderError, ValidationError};
pub use gender::GenderAnalyzer;
pub use normalizer::{normalize, normalize_analysis, try_normalize, Normalize};
pub use observation::{Observation, ObservationRecord, ObservationSink, TracingSink};
pub use orchestrator::Communicator;
pub use prompts::{build_prompt, Prompt, PromptKind};
pub use provider::{ChatCompletionsBackend, CompletionBackend, ProviderGateway};
pub use synthesizer::synthesize;
pub use types::{
    AgentResponse, AnalysisRequest, AnalysisResult, CulturalAnalysis, GenderAnalysis,
    ModelProvider, Suggestion, SuggestionType, UserMessage,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
