//! Purchase advisor
//!
//! Sequences the model calls for one purchase decision:
//!
//! 1. identify the item from its image (only when no name was typed)
//! 2. look for a cheaper alternative (optional)
//! 3. ask for the Buy / Don't Buy verdict
//!
//! Calls are awaited one after another since each step feeds the next. Only
//! input validation returns `Err`; a failed identification ends the flow
//! with an `Error` decision, a failed alternative search is ignored, and a
//! failed recommendation call becomes an `Error` decision carrying the cause.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::ai::parsing::{
    parse_alternative, parse_identification, parse_item_fact, parse_recommendation,
};
use crate::ai::{AIBackend, AIClient, GenerationRequest, QuickIdentification};
use crate::error::{Error, Result};
use crate::model_config::{ModelConfig, TaskType};
use crate::models::{
    Alternative, Decision, ImageInput, ItemIdentification, ProfileSnapshot, PurchaseRequest,
    Recommendation,
};
use crate::prompt_builder::PromptBuilder;

/// Reasoning returned when the item could not be identified from its image
pub const IMAGE_FAILURE_REASONING: &str =
    "Couldn't identify the image. Please enter the item name manually.";

/// Orchestrates the model calls behind a recommendation
///
/// Holds no per-call state, so one advisor can serve many concurrent calls.
#[derive(Clone)]
pub struct PurchaseAdvisor<B = AIClient> {
    backend: B,
    prompts: PromptBuilder,
    models: ModelConfig,
}

impl<B: AIBackend> PurchaseAdvisor<B> {
    pub fn new(backend: B, prompts: PromptBuilder, models: ModelConfig) -> Self {
        Self {
            backend,
            prompts,
            models,
        }
    }

    /// Advisor with prompt and model overrides from the user data directory
    pub fn load(backend: B) -> Result<Self> {
        Ok(Self::new(backend, PromptBuilder::load()?, ModelConfig::load()?))
    }

    /// Advisor with embedded prompts and model settings only
    pub fn embedded(backend: B) -> Result<Self> {
        Ok(Self::new(
            backend,
            PromptBuilder::embedded()?,
            ModelConfig::embedded()?,
        ))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    /// Produce a recommendation for `request`
    ///
    /// `snapshot` adds the user's financial context to the prompt;
    /// `want_alternative` enables the cheaper-alternative search.
    pub async fn recommend(
        &self,
        request: &PurchaseRequest,
        snapshot: Option<&ProfileSnapshot>,
        want_alternative: bool,
    ) -> Result<Recommendation> {
        validate(request)?;

        let typed_name = request.item_name.trim();
        let (item_name, identification) = match (typed_name.is_empty(), request.image.as_ref()) {
            (false, _) => (typed_name.to_string(), None),
            (true, Some(image)) => match self.identify_item(image).await {
                Some(id) => (id.name.clone(), Some(id)),
                None => {
                    return Ok(Recommendation::error(String::new(), IMAGE_FAILURE_REASONING));
                }
            },
            (true, None) => return Err(missing_item_error()),
        };

        info!(item = %item_name, cost = request.item_cost, "Analyzing purchase");

        let alternative = if want_alternative {
            self.find_alternative(&item_name, request.item_cost).await
        } else {
            None
        };

        let effective = PurchaseRequest {
            item_name: item_name.clone(),
            item_cost: request.item_cost,
            purpose: request.purpose.clone(),
            frequency: request.frequency.clone(),
            image: None,
        };
        let prompt =
            self.prompts
                .build_recommendation_prompt(&effective, snapshot, alternative.as_ref());
        let call = self.request(TaskType::Recommendation, prompt);

        let (decision, reasoning) = match self.backend.generate(&call).await {
            Ok(text) => {
                let parsed = parse_recommendation(&text);
                if !parsed.decision.is_verdict() {
                    debug!(reply = %text, "No verdict in recommendation reply");
                }
                (parsed.decision, parsed.reasoning)
            }
            Err(e) => {
                warn!(error = %e, "Recommendation call failed");
                (Decision::Error, format!("Technical error occurred: {}", e))
            }
        };

        info!(item = %item_name, decision = %decision, "Recommendation ready");

        Ok(Recommendation {
            decision,
            reasoning,
            alternative,
            item_name,
            identification,
            analyzed_at: Utc::now(),
        })
    }

    /// Identify an item from its image; `None` on any failure
    pub async fn identify_item(&self, image: &ImageInput) -> Option<ItemIdentification> {
        let prompt = self.prompts.build_image_identification_prompt();
        let call = self
            .request(TaskType::Vision, prompt)
            .with_image(image.clone());

        let text = match self.backend.generate(&call).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Image identification failed");
                return None;
            }
        };

        let identification = parse_identification(&text);
        match identification {
            Some(ref id) => info!(item = %id.name, cost = ?id.cost, "Identified item from image"),
            None => warn!(reply = %text, "Could not read identification reply"),
        }
        identification
    }

    /// Search for a cheaper alternative; `None` when none is found or on any failure
    pub async fn find_alternative(&self, item_name: &str, item_cost: f64) -> Option<Alternative> {
        let prompt = self
            .prompts
            .build_alternative_search_prompt(item_name, item_cost);
        let call = self.request(TaskType::Search, prompt);

        let text = match self.backend.generate(&call).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Alternative search failed");
                return None;
            }
        };

        let alternative = parse_alternative(&text, item_cost);
        match alternative {
            Some(ref alt) => info!(
                name = %alt.name,
                price = alt.price,
                retailer = %alt.retailer,
                "Found cheaper alternative"
            ),
            None => debug!(reply = %text, "No usable alternative in search reply"),
        }
        alternative
    }

    /// Short "Item:/Fact:" identification of an image
    pub async fn quick_identify(&self, image: &ImageInput) -> Result<QuickIdentification> {
        let prompt = self.prompts.build_quick_identify_prompt();
        let call = self
            .request(TaskType::QuickIdentify, prompt)
            .with_image(image.clone());
        let text = self.backend.generate(&call).await?;
        Ok(parse_item_fact(&text))
    }

    /// Free-form chat message
    pub async fn chat(&self, message: &str) -> Result<String> {
        let call = self.request(TaskType::Chat, message);
        self.backend.generate(&call).await
    }

    fn request(&self, task: TaskType, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(task, self.models.task(task), prompt)
    }
}

fn missing_item_error() -> Error {
    Error::Validation("Please enter an item name or provide an image".into())
}

/// Reject requests that cannot be analyzed, before any model call
fn validate(request: &PurchaseRequest) -> Result<()> {
    if !request.item_cost.is_finite() || request.item_cost <= 0.0 {
        return Err(Error::Validation("Please enter the cost of the item".into()));
    }
    if request.item_name.trim().is_empty() && request.image.is_none() {
        return Err(missing_item_error());
    }
    Ok(())
}
