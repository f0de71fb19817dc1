use parking_lot::{Mutex, RwLock};

use crate::constants::{MMR_LAMBDA, mmr_fetch_k};
use crate::embedding::cosine_similarity;
use crate::vectordb::mmr;
use crate::vectordb::{
    LawStore, PassageMetadata, RetrievedPassage, ScoredPassage, SearchMode, SearchRequest,
    VectorDbError,
};

#[derive(Clone)]
struct MockStoredPassage {
    passage: RetrievedPassage,
    vector: Vec<f32>,
}

/// In-memory law store with cosine scoring, region filtering and MMR.
///
/// Every request is recorded so tests can assert on the retrieval cascade.
#[derive(Default)]
pub struct MockLawStore {
    passages: RwLock<Vec<MockStoredPassage>>,
    requests: Mutex<Vec<SearchRequest>>,
    failing: RwLock<bool>,
}

impl MockLawStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a passage with its stored vector.
    pub fn insert(&self, passage: RetrievedPassage, vector: Vec<f32>) {
        self.passages
            .write()
            .push(MockStoredPassage { passage, vector });
    }

    /// Builder helper: adds a passage for `law_name` in `region`.
    pub fn with_law(self, content: &str, law_name: &str, region: &str, vector: Vec<f32>) -> Self {
        self.insert(
            RetrievedPassage::new(
                content,
                PassageMetadata {
                    law_name: law_name.to_string(),
                    region: region.to_string(),
                    ..Default::default()
                },
            ),
            vector,
        );
        self
    }

    pub fn passage_count(&self) -> usize {
        self.passages.read().len()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }

    /// Makes every subsequent search fail.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.write() = failing;
    }
}

impl LawStore for MockLawStore {
    async fn search(&self, request: SearchRequest) -> Result<Vec<ScoredPassage>, VectorDbError> {
        self.requests.lock().push(request.clone());

        if *self.failing.read() {
            return Err(VectorDbError::SearchFailed {
                collection: "mock".to_string(),
                message: "mock store set to fail".to_string(),
            });
        }

        let passages = self.passages.read();
        let mut scored: Vec<(ScoredPassage, &Vec<f32>)> = passages
            .iter()
            .filter(|p| {
                request
                    .region_filter()
                    .is_none_or(|regions| p.passage.metadata.region_in(regions))
            })
            .map(|p| {
                let score = cosine_similarity(&request.vector, &p.vector);
                (
                    ScoredPassage {
                        passage: p.passage.clone(),
                        score,
                    },
                    &p.vector,
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.score
                .partial_cmp(&a.0.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        match request.mode {
            SearchMode::Similarity => {
                scored.truncate(request.k);
                Ok(scored.into_iter().map(|(p, _)| p).collect())
            }
            SearchMode::Diverse => {
                scored.truncate(mmr_fetch_k(request.k));
                let vectors: Vec<Vec<f32>> = scored.iter().map(|(_, v)| (*v).clone()).collect();
                let picked = mmr::select(&request.vector, &vectors, request.k, MMR_LAMBDA);
                Ok(picked.into_iter().map(|i| scored[i].0.clone()).collect())
            }
        }
    }
}
