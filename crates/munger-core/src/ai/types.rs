//! AI backend request and response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::{Deserialize, Serialize};

use crate::model_config::{TaskConfig, TaskType};
use crate::models::{Decision, ImageInput};

/// A single model call: prompt text, optional image, and task settings
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub task: TaskType,
    pub prompt: String,
    pub image: Option<ImageInput>,
    pub config: TaskConfig,
}

impl GenerationRequest {
    pub fn new(task: TaskType, config: TaskConfig, prompt: impl Into<String>) -> Self {
        Self {
            task,
            prompt: prompt.into(),
            image: None,
            config,
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }
}

/// Verdict and reasoning read out of a model reply
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionText {
    pub decision: Decision,
    pub reasoning: String,
}

/// Short identification in the "Item:/Fact:" format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickIdentification {
    pub item_name: String,
    pub item_fact: String,
}
