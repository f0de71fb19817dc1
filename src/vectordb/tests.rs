use std::collections::HashMap;

use qdrant_client::Payload;
use qdrant_client::qdrant::Value;

use super::*;
use crate::rules::Region;

fn metadata(law_name: &str, region: &str) -> PassageMetadata {
    PassageMetadata {
        law_name: law_name.to_string(),
        region: region.to_string(),
        ..Default::default()
    }
}

fn request(vector: Vec<f32>, k: usize, regions: Option<Vec<Region>>) -> SearchRequest {
    SearchRequest {
        text: "query".to_string(),
        vector,
        k,
        mode: SearchMode::Similarity,
        regions,
    }
}

mod model_tests {
    use super::*;

    #[test]
    fn test_law_id_synthesis() {
        assert_eq!(
            metadata("Utah Social Media Regulation Act", "US-UT").law_id(),
            Some("US-UT:Utah Social Media Regulation Act".to_string())
        );
        assert_eq!(metadata("DSA", "").law_id(), Some("DSA".to_string()));
        assert_eq!(metadata("", "EU").law_id(), Some("EU".to_string()));
        assert_eq!(metadata("", "").law_id(), None);
    }

    #[test]
    fn test_title_prefers_deepest_header() {
        let mut meta = metadata("Digital Services Act", "EU");
        assert_eq!(meta.title(), Some("Digital Services Act"));

        meta.h1 = "Chapter III".to_string();
        assert_eq!(meta.title(), Some("Chapter III"));

        meta.h3 = "Article 28".to_string();
        assert_eq!(meta.title(), Some("Article 28"));

        assert_eq!(PassageMetadata::default().title(), None);
    }

    #[test]
    fn test_region_in() {
        let meta = metadata("SB 976", "US-CA");
        assert!(meta.region_in(&[Region::Us, Region::UsCalifornia]));
        assert!(!meta.region_in(&[Region::Eu]));
        assert!(!meta.region_in(&[]));
    }

    #[test]
    fn test_from_payload_reads_nested_metadata() {
        let payload = Payload::try_from(serde_json::json!({
            "page_content": "Minors may not hold accounts without consent.",
            "metadata": {
                "law_name": "Utah Social Media Regulation Act",
                "region": "US-UT",
                "article_or_section": "13-63-102",
                "h2": "Age verification",
                "chunk_index": 4
            }
        }))
        .unwrap();
        let payload: HashMap<String, Value> = payload.into();

        let passage = RetrievedPassage::from_payload(&payload);
        assert_eq!(
            passage.content,
            "Minors may not hold accounts without consent."
        );
        assert_eq!(passage.metadata.region, "US-UT");
        assert_eq!(passage.metadata.article_or_section, "13-63-102");
        assert_eq!(passage.metadata.h2, "Age verification");
        assert!(passage.metadata.source.is_empty());
    }

    #[test]
    fn test_from_payload_tolerates_missing_fields() {
        let passage = RetrievedPassage::from_payload(&HashMap::new());
        assert_eq!(passage, RetrievedPassage::default());
    }

    #[test]
    fn test_request_region_filter_ignores_empty_list() {
        assert!(request(vec![1.0], 1, None).region_filter().is_none());
        assert!(request(vec![1.0], 1, Some(vec![])).region_filter().is_none());
        assert_eq!(
            request(vec![1.0], 1, Some(vec![Region::Eu])).region_filter(),
            Some(&[Region::Eu][..])
        );
    }

    #[test]
    fn test_search_mode_from_flag() {
        assert_eq!(SearchMode::from_mmr_flag(true), SearchMode::Diverse);
        assert_eq!(SearchMode::from_mmr_flag(false), SearchMode::Similarity);
    }
}

mod mock_tests {
    use super::*;

    fn store() -> MockLawStore {
        MockLawStore::new()
            .with_law("utah text", "Utah Act", "US-UT", vec![1.0, 0.0])
            .with_law("eu text", "DSA", "EU", vec![0.9, 0.1])
            .with_law("ca text", "SB 976", "US-CA", vec![0.0, 1.0])
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = store();
        let results = store.search(request(vec![1.0, 0.0], 2, None)).await.unwrap();

        let names: Vec<_> = results
            .iter()
            .map(|r| r.passage.metadata.law_name.as_str())
            .collect();
        assert_eq!(names, vec!["Utah Act", "DSA"]);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_search_applies_region_filter() {
        let store = store();
        let results = store
            .search(request(
                vec![1.0, 0.0],
                5,
                Some(vec![Region::UsCalifornia, Region::Us]),
            ))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].passage.metadata.law_name, "SB 976");
    }

    #[tokio::test]
    async fn test_diverse_search_avoids_redundant_passage() {
        let store = store();
        let mut req = request(vec![1.0, 0.2], 2, None);
        req.mode = SearchMode::Diverse;

        let results = store.search(req).await.unwrap();
        let names: Vec<_> = results
            .iter()
            .map(|r| r.passage.metadata.law_name.as_str())
            .collect();

        assert_eq!(names.len(), 2);
        assert!(names.contains(&"SB 976"));
    }

    #[tokio::test]
    async fn test_requests_are_recorded() {
        let store = store();
        let _ = store.search(request(vec![1.0, 0.0], 1, None)).await;
        let _ = store
            .search(request(vec![1.0, 0.0], 1, Some(vec![Region::Eu])))
            .await;

        let requests = store.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].regions, Some(vec![Region::Eu]));
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = store();
        store.set_failing(true);

        let err = store
            .search(request(vec![1.0, 0.0], 1, None))
            .await
            .unwrap_err();
        assert!(matches!(err, VectorDbError::SearchFailed { .. }));
    }
}
