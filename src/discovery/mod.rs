//! Runtime discovery of a model that can generate content
//!
//! Namespaces are walked in their configured order. The first namespace
//! that lists at least one capable model wins, and its best-scored model is
//! returned. Listing failures only skip the namespace.

use crate::api::{ApiError, GenerativeApi, ModelListing, ModelRef};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// A capable model found during discovery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCandidate {
    pub namespace: String,
    pub name: String,
    pub supported_methods: Vec<String>,
}

impl ModelCandidate {
    pub fn from_listing(namespace: &str, listing: &ModelListing) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: listing.name.clone(),
            supported_methods: listing.supported_generation_methods.clone(),
        }
    }

    pub fn score(&self) -> u32 {
        score_model(&self.name)
    }

    pub fn model_ref(&self) -> ModelRef {
        ModelRef::new(self.namespace.clone(), self.name.clone())
    }
}

/// Ranking heuristic: higher is preferred
pub fn score_model(name: &str) -> u32 {
    let name = name.to_lowercase();
    let mut score = 0;
    if name.contains("flash") {
        score += 5;
    }
    if name.contains("1.5") {
        score += 3;
    }
    if name.contains("latest") {
        score += 2;
    }
    if name.contains("8b") {
        score += 1;
    }
    score
}

/// Order candidates best-first; equal scores keep listing order
pub fn rank(candidates: &mut [ModelCandidate]) {
    candidates.sort_by_key(|candidate| std::cmp::Reverse(candidate.score()));
}

/// Result of listing one namespace, for diagnostics
#[derive(Debug)]
pub struct NamespaceSurvey {
    pub namespace: String,
    pub models: Result<Vec<ModelListing>, ApiError>,
}

/// Walks namespaces looking for a usable model
pub struct ModelDiscovery<C: GenerativeApi + ?Sized> {
    client: Arc<C>,
    namespaces: Vec<String>,
}

impl<C: GenerativeApi + ?Sized> ModelDiscovery<C> {
    pub fn new(client: Arc<C>, namespaces: Vec<String>) -> Self {
        Self { client, namespaces }
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Find the best model advertising `capability`, or `None`.
    pub async fn discover(&self, capability: &str) -> Option<ModelCandidate> {
        for namespace in &self.namespaces {
            let listings = match self.client.list_models(namespace).await {
                Ok(listings) => listings,
                Err(e) => {
                    warn!("Model listing failed for {}: {}", namespace, e);
                    continue;
                }
            };

            let mut usable: Vec<ModelCandidate> = listings
                .iter()
                .filter(|listing| listing.supports(capability))
                .map(|listing| ModelCandidate::from_listing(namespace, listing))
                .collect();

            if usable.is_empty() {
                warn!("No model in {} supports {}", namespace, capability);
                continue;
            }

            rank(&mut usable);
            let best = usable.swap_remove(0);
            info!("Discovered {}/{} (score {})", best.namespace, best.name, best.score());
            return Some(best);
        }

        None
    }

    /// List every namespace without stopping at the first usable one
    pub async fn survey(&self) -> Vec<NamespaceSurvey> {
        let mut out = Vec::with_capacity(self.namespaces.len());
        for namespace in &self.namespaces {
            out.push(NamespaceSurvey {
                namespace: namespace.clone(),
                models: self.client.list_models(namespace).await,
            });
        }
        out
    }
}
