use std::collections::HashMap;

use qdrant_client::qdrant::{ScoredPoint, Value};
use serde::{Deserialize, Serialize};

use crate::rules::Region;

/// Payload key holding passage text.
pub const CONTENT_KEY: &str = "page_content";
/// Payload key holding the metadata struct.
pub const METADATA_KEY: &str = "metadata";
/// Filterable payload path of the region code.
pub const REGION_FIELD: &str = "metadata.region";

/// Passage metadata as stored alongside each law excerpt. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassageMetadata {
    pub law_name: String,
    pub region: String,
    pub article_or_section: String,
    pub source: String,
    pub h1: String,
    pub h2: String,
    pub h3: String,
    pub source_path: String,
}

impl PassageMetadata {
    /// Returns `true` if the stored region code is one of `regions`.
    pub fn region_in(&self, regions: &[Region]) -> bool {
        regions.iter().any(|r| r.matches_code(&self.region))
    }

    /// Best available display title: `h3`, `h2`, `h1`, then the law name.
    pub fn title(&self) -> Option<&str> {
        [&self.h3, &self.h2, &self.h1, &self.law_name]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    /// Audit id `"{region}:{law_name}"`, with the colon trimmed when one side is empty.
    ///
    /// `None` when both region and law name are empty.
    pub fn law_id(&self) -> Option<String> {
        if self.region.is_empty() && self.law_name.is_empty() {
            return None;
        }
        let id = format!("{}:{}", self.region, self.law_name);
        Some(id.trim_matches(':').to_string())
    }
}

/// One law excerpt returned by the store. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub content: String,
    pub metadata: PassageMetadata,
}

impl RetrievedPassage {
    pub fn new(content: impl Into<String>, metadata: PassageMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Rebuilds a passage from a Qdrant payload (`page_content` + `metadata` struct).
    pub fn from_payload(payload: &HashMap<String, Value>) -> Self {
        let content = payload
            .get(CONTENT_KEY)
            .and_then(|v| v.as_str())
            .cloned()
            .unwrap_or_default();

        let metadata = payload
            .get(METADATA_KEY)
            .and_then(|v| v.as_struct())
            .map(|s| {
                let field = |key: &str| {
                    s.fields
                        .get(key)
                        .and_then(|v| v.as_str())
                        .cloned()
                        .unwrap_or_default()
                };
                PassageMetadata {
                    law_name: field("law_name"),
                    region: field("region"),
                    article_or_section: field("article_or_section"),
                    source: field("source"),
                    h1: field("h1"),
                    h2: field("h2"),
                    h3: field("h3"),
                    source_path: field("source_path"),
                }
            })
            .unwrap_or_default();

        Self { content, metadata }
    }
}

/// A passage with its store-side relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub passage: RetrievedPassage,
    pub score: f32,
}

impl ScoredPassage {
    pub fn from_scored_point(point: &ScoredPoint) -> Self {
        Self {
            passage: RetrievedPassage::from_payload(&point.payload),
            score: point.score,
        }
    }
}

/// Plain top-k or diversity-aware (MMR) search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Similarity,
    Diverse,
}

impl SearchMode {
    pub fn from_mmr_flag(use_mmr: bool) -> Self {
        if use_mmr {
            SearchMode::Diverse
        } else {
            SearchMode::Similarity
        }
    }
}

/// One store query. `regions` of `None` (or empty) means no filter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub text: String,
    pub vector: Vec<f32>,
    pub k: usize,
    pub mode: SearchMode,
    pub regions: Option<Vec<Region>>,
}

impl SearchRequest {
    /// Region filter, if one applies.
    pub fn region_filter(&self) -> Option<&[Region]> {
        self.regions.as_deref().filter(|r| !r.is_empty())
    }
}
