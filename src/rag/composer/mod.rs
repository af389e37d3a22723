
use std::fmt;

use tracing::{debug, warn};

use crate::generation::GenerationBackend;

/// Outcome of answering a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Text produced by the generation backend
    Generated(String),
    /// Backend failed; retrieved context is shown as-is
    SearchOnlyFallback { context: String, question: String },
    /// Backend failed and there was nothing to show
    UnavailableNotice,
}

pub const UNAVAILABLE_NOTICE: &str = "⚠️ **Language model not available** - You can still upload and search documents! The vector search will find relevant information even without the LLM.";

impl Answer {
    #[inline]
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

impl fmt::Display for Answer {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated(text) => f.write_str(text),
            Self::SearchOnlyFallback { context, question } => write!(
                f,
                "🔍 **Retrieved Information:**\n\n{}\n\n💡 **Note:** This is the relevant content found in your documents for the question: '{}'. The language model is not available, so this is a search-only result, not a generated answer.",
                context, question
            ),
            Self::UnavailableNotice => f.write_str(UNAVAILABLE_NOTICE),
        }
    }
}

/// Prompt sent to the backend; the bare question when there is no context
#[inline]
pub fn build_prompt(question: &str, context: &str) -> String {
    if context.is_empty() {
        return question.to_string();
    }

    format!(
        "Context: {}\n\nQuestion: {}\n\nPlease answer the question based on the provided context. If the context doesn't contain relevant information, say so.",
        context, question
    )
}

/// Ask the backend, degrading to a search-only answer on any failure
#[inline]
pub async fn compose(
    backend: Option<&dyn GenerationBackend>,
    question: &str,
    context: &str,
) -> Answer {
    if let Some(backend) = backend {
        let prompt = build_prompt(question, context);
        match backend.generate(&prompt).await {
            Ok(text) => {
                debug!("Generation backend answered with {} bytes", text.len());
                return Answer::Generated(text);
            }
            Err(e) => warn!("Generation backend failed, using fallback: {}", e),
        }
    } else {
        debug!("No generation backend configured, using fallback");
    }

    if context.is_empty() {
        Answer::UnavailableNotice
    } else {
        Answer::SearchOnlyFallback {
            context: context.to_string(),
            question: question.to_string(),
        }
    }
}
