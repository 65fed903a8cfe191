//! Core translation flow: validate the request, pick a model, run exactly
//! one inference call, timestamp the result.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::TranslateError;
use crate::model::{ModelEntry, ModelRegistry};

/// How a request names the model it wants.
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    /// Full checkpoint identifier, e.g. `Helsinki-NLP/opus-mt-de-en`.
    ById(&'a str),
    /// Source and target language codes.
    ByPair { source: &'a str, target: &'a str },
    /// No preference stated; use the service's configured default model.
    Default,
}

/// A finished translation.
#[derive(Debug, Clone)]
pub struct Translation {
    pub translated_text: String,
    pub source_lang: &'static str,
    pub target_lang: &'static str,
    /// Unix timestamp, fractional seconds, taken after inference returned.
    pub time: f64,
}

pub struct TranslationService {
    registry: ModelRegistry,
    default_model: String,
}

impl TranslationService {
    pub fn new(registry: ModelRegistry, default_model: String) -> Self {
        Self {
            registry,
            default_model,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Translate `text` with the selected model.
    ///
    /// Checks run in a fixed order: text presence, then model resolution,
    /// then emptiness. A request that fails any check never reaches the
    /// inference server. The text is handed to the engine exactly as
    /// received; trimming is only used for the emptiness check.
    pub async fn translate(
        &self,
        selector: Selector<'_>,
        text: Option<&str>,
    ) -> Result<Translation, TranslateError> {
        let text = text.ok_or(TranslateError::MissingText)?;
        let entry = self.resolve(selector)?;
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyText);
        }

        let translated_text = entry.engine.translate(text).await?;
        Ok(Translation {
            translated_text,
            source_lang: entry.spec.source,
            target_lang: entry.spec.target,
            time: unix_time(),
        })
    }

    fn resolve(&self, selector: Selector<'_>) -> Result<&ModelEntry, TranslateError> {
        match selector {
            Selector::ById(id) => self.registry.get(id).ok_or(TranslateError::UnknownModel),
            Selector::ByPair { source, target } => self
                .registry
                .get_by_pair(source, target)
                .ok_or_else(|| TranslateError::UnsupportedPair {
                    source_lang: source.to_owned(),
                    target: target.to_owned(),
                }),
            Selector::Default => self
                .registry
                .get(&self.default_model)
                .ok_or(TranslateError::UnknownModel),
        }
    }
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn unix_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}
