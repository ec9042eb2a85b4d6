//! Munger Core Library
//!
//! Shared functionality for the Munger purchase advisor:
//! - Financial profile model and summary calculator
//! - Prompt library with overridable templates
//! - Prompt builder for recommendation, identification and alternative search
//! - Pluggable generative AI backends (Gemini, mock)
//! - Response parsing for loosely structured model replies
//! - Purchase advisor that sequences the model calls
//! - Per-task model configuration

pub mod advisor;
pub mod ai;
pub mod error;
pub mod model_config;
pub mod models;
pub mod prompt_builder;
pub mod prompts;
pub mod summary;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisor::PurchaseAdvisor;
pub use ai::{AIBackend, AIClient, GeminiBackend, GenerationRequest, MockBackend};
pub use error::{Error, Result};
pub use model_config::{ModelConfig, TaskConfig, TaskType};
pub use models::{
    Alternative, Decision, FinancialProfile, FinancialSummary, ImageInput, IncomeFrequency,
    ItemIdentification, ProfileSnapshot, PurchaseRequest, PurchaseTimeframe, Recommendation,
    RiskTolerance,
};
pub use prompt_builder::PromptBuilder;
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
pub use summary::{compute_summary, parse_amount, rate_summary, MetricRating, SummaryRatings};
