use qdrant_client::Qdrant;
use qdrant_client::qdrant::vectors_output::VectorsOptions;
use qdrant_client::qdrant::{
    Condition, Document, Filter, Fusion, PrefetchQueryBuilder, Query, QueryPointsBuilder,
    ScoredPoint,
};
use tracing::{debug, instrument};

use super::error::VectorDbError;
use super::mmr;
use super::model::{REGION_FIELD, ScoredPassage, SearchMode, SearchRequest};
use crate::constants::{MMR_LAMBDA, mmr_fetch_k};
use crate::rules::Region;

/// Named dense vector in the law collection.
pub const DENSE_VECTOR_NAME: &str = "dense";
/// Named sparse (BM25) vector in the law collection.
pub const SPARSE_VECTOR_NAME: &str = "sparse";
/// Server-side document inference model for the sparse leg.
pub const BM25_MODEL: &str = "Qdrant/bm25";

/// Vector store interface used by retrieval.
pub trait LawStore: Send + Sync {
    /// Returns up to `request.k` passages, best first.
    fn search(
        &self,
        request: SearchRequest,
    ) -> impl std::future::Future<Output = Result<Vec<ScoredPassage>, VectorDbError>> + Send;
}

#[derive(Clone)]
/// Hybrid (dense + BM25) law store backed by Qdrant.
pub struct QdrantLawStore {
    client: Qdrant,
    url: String,
    collection: String,
}

impl QdrantLawStore {
    /// Creates a store for `collection` at `url`.
    pub fn new(url: &str, collection: &str) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.to_string(),
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the law collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Fails unless the server answers and the law collection exists.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;

        if !exists {
            return Err(VectorDbError::CollectionNotFound {
                collection: self.collection.clone(),
            });
        }

        Ok(())
    }

    fn search_failed(&self, e: impl std::fmt::Display) -> VectorDbError {
        VectorDbError::SearchFailed {
            collection: self.collection.clone(),
            message: e.to_string(),
        }
    }

    /// Dense and BM25 prefetches fused with reciprocal-rank fusion.
    async fn hybrid_search(
        &self,
        request: &SearchRequest,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredPoint>, VectorDbError> {
        let limit = request.k as u64;

        let mut dense = PrefetchQueryBuilder::default()
            .query(Query::new_nearest(request.vector.clone()))
            .using(DENSE_VECTOR_NAME)
            .limit(limit);
        let mut sparse = PrefetchQueryBuilder::default()
            .query(Query::new_nearest(Document::new(
                request.text.clone(),
                BM25_MODEL,
            )))
            .using(SPARSE_VECTOR_NAME)
            .limit(limit);

        if let Some(filter) = filter {
            dense = dense.filter(filter.clone());
            sparse = sparse.filter(filter);
        }

        let query = QueryPointsBuilder::new(&self.collection)
            .add_prefetch(dense)
            .add_prefetch(sparse)
            .query(Fusion::Rrf)
            .limit(limit)
            .with_payload(true);

        let response = self
            .client
            .query(query)
            .await
            .map_err(|e| self.search_failed(e))?;

        Ok(response.result)
    }

    /// Over-fetches dense candidates with their vectors, then selects `k` by MMR.
    async fn diverse_search(
        &self,
        request: &SearchRequest,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredPoint>, VectorDbError> {
        let fetch_k = mmr_fetch_k(request.k);

        let mut query = QueryPointsBuilder::new(&self.collection)
            .query(Query::new_nearest(request.vector.clone()))
            .using(DENSE_VECTOR_NAME)
            .limit(fetch_k as u64)
            .with_payload(true)
            .with_vectors(true);

        if let Some(filter) = filter {
            query = query.filter(filter);
        }

        let response = self
            .client
            .query(query)
            .await
            .map_err(|e| self.search_failed(e))?;

        let mut points = Vec::with_capacity(response.result.len());
        let mut vectors = Vec::with_capacity(response.result.len());
        for point in response.result {
            if let Some(vector) = dense_vector(&point) {
                vectors.push(vector);
                points.push(point);
            }
        }

        debug!(
            candidates = points.len(),
            fetch_k,
            k = request.k,
            "Selecting diverse passages"
        );

        let picked = mmr::select(&request.vector, &vectors, request.k, MMR_LAMBDA);
        Ok(picked.into_iter().map(|i| points[i].clone()).collect())
    }
}

/// `metadata.region ∈ regions`.
pub fn region_filter(regions: &[Region]) -> Filter {
    let codes: Vec<String> = regions.iter().map(|r| r.as_str().to_string()).collect();
    Filter::must([Condition::matches(REGION_FIELD, codes)])
}

#[allow(deprecated)]
fn dense_vector(point: &ScoredPoint) -> Option<Vec<f32>> {
    match point.vectors.as_ref()?.vectors_options.as_ref()? {
        VectorsOptions::Vector(v) => Some(v.data.clone()),
        VectorsOptions::Vectors(named) => named
            .vectors
            .get(DENSE_VECTOR_NAME)
            .map(|v| v.data.clone()),
    }
}

impl LawStore for QdrantLawStore {
    #[instrument(skip(self, request), fields(collection = %self.collection, k = request.k, mode = ?request.mode))]
    async fn search(&self, request: SearchRequest) -> Result<Vec<ScoredPassage>, VectorDbError> {
        let filter = request.region_filter().map(region_filter);

        let points = match request.mode {
            SearchMode::Similarity => self.hybrid_search(&request, filter).await?,
            SearchMode::Diverse => self.diverse_search(&request, filter).await?,
        };

        Ok(points.iter().map(ScoredPassage::from_scored_point).collect())
    }
}
