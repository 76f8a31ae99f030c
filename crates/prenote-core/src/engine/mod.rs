//! Generation engine: per-case repair loop and batch orchestration.

pub mod case;
pub mod runner;

pub use runner::CancelFlag;

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::prompt::PromptSet;
use crate::providers::llm::ModelClient;
use crate::validate::OutputValidator;

/// One configured generation pipeline. Cheap to clone; clones share the
/// client and the compiled validator.
#[derive(Clone)]
pub struct Pipeline {
    pub client: Arc<dyn ModelClient>,
    pub validator: Arc<OutputValidator>,
    pub prompts: PromptSet,
    pub config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn ModelClient>,
        validator: Arc<OutputValidator>,
        prompts: PromptSet,
        config: PipelineConfig,
    ) -> Self {
        Self {
            client,
            validator,
            prompts,
            config,
        }
    }
}
