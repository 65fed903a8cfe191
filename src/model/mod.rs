//! The OPUS-MT catalog and the registry of models that actually loaded.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use clap::builder::PossibleValuesParser;
use serde::Serialize;

use crate::engine::{EngineClient, TranslationEngine};
use crate::error::Result;

/// One catalog entry: a pretrained OPUS-MT checkpoint and the language pair
/// it translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelSpec {
    pub id: &'static str,
    pub description: &'static str,
    pub source: &'static str,
    pub target: &'static str,
}

/// Every model the gateway knows how to serve. The registry probes each one
/// at startup and keeps only those that respond.
pub const CATALOG: &[ModelSpec] = &[
    ModelSpec {
        id: "Helsinki-NLP/opus-mt-de-en",
        description: "German-English",
        source: "de",
        target: "en",
    },
    ModelSpec {
        id: "Helsinki-NLP/opus-mt-en-de",
        description: "English-German",
        source: "en",
        target: "de",
    },
    ModelSpec {
        id: "Helsinki-NLP/opus-mt-fr-en",
        description: "French-English",
        source: "fr",
        target: "en",
    },
    ModelSpec {
        id: "Helsinki-NLP/opus-mt-ru-en",
        description: "Russian-English",
        source: "ru",
        target: "en",
    },
    ModelSpec {
        id: "Helsinki-NLP/opus-mt-en-ru",
        description: "English-Russian",
        source: "en",
        target: "ru",
    },
];

pub const DEFAULT_MODEL_ID: &str = "Helsinki-NLP/opus-mt-de-en";

/// Build a Clap value parser that restricts input to the known model identifiers.
pub fn model_value_parser() -> PossibleValuesParser {
    let values: Vec<&'static str> = CATALOG.iter().map(|model| model.id).collect();
    PossibleValuesParser::new(values)
}

/// The checkpoint identifier OPUS-MT publishes for a language pair.
pub fn canonical_id(source: &str, target: &str) -> String {
    format!("Helsinki-NLP/opus-mt-{source}-{target}")
}

/// A catalog entry paired with its loaded engine.
#[derive(Clone)]
pub struct ModelEntry {
    pub spec: ModelSpec,
    pub engine: Arc<dyn TranslationEngine>,
}

/// The set of models that survived the startup probe, keyed by identifier.
/// Immutable once built; a model that dies later surfaces as an inference
/// error, not a registry change.
pub struct ModelRegistry {
    entries: HashMap<&'static str, ModelEntry>,
}

impl ModelRegistry {
    /// Probe every catalog model against the inference server and keep the
    /// ones that answer. Probe failures are logged and skipped so one
    /// missing checkpoint never takes the whole gateway down; a duplicate
    /// catalog id is a bug and aborts startup.
    pub async fn load(client: &EngineClient, skip_warmup: bool) -> Result<Self> {
        let mut entries = HashMap::with_capacity(CATALOG.len());
        for spec in CATALOG {
            let engine = match client.engine_for(spec.id) {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::warn!("skipping {}: {err:#}", spec.id);
                    continue;
                }
            };
            if !skip_warmup {
                if let Err(err) = engine.warmup().await {
                    tracing::warn!("skipping {}: warmup failed: {err}", spec.id);
                    continue;
                }
                tracing::info!("loaded {}", spec.id);
            }
            let entry = ModelEntry {
                spec: *spec,
                engine: Arc::new(engine),
            };
            if entries.insert(spec.id, entry).is_some() {
                bail!("duplicate catalog id {}", spec.id);
            }
        }
        tracing::info!("registry ready with {}/{} models", entries.len(), CATALOG.len());
        Ok(Self { entries })
    }

    /// Build a registry from pre-constructed entries.
    pub fn with_entries(list: Vec<ModelEntry>) -> Self {
        let entries = list.into_iter().map(|entry| (entry.spec.id, entry)).collect();
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&ModelEntry> {
        self.entries.get(id)
    }

    pub fn get_by_pair(&self, source: &str, target: &str) -> Option<&ModelEntry> {
        self.get(&canonical_id(source, target))
    }

    /// Loaded entries ordered by identifier.
    pub fn entries(&self) -> Vec<&ModelEntry> {
        let mut list: Vec<&ModelEntry> = self.entries.values().collect();
        list.sort_by_key(|entry| entry.spec.id);
        list
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
