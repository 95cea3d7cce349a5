use crate::distance::{cosine, euclidean};
use crate::dts::{SampleProfileIndexer, SAMPLE_TARGET};
use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, VectorStoreError};
use crate::types::{Metadata, Record, SearchHit, SearchMethod, SearchOptions};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;

/// In-memory record collection with cosine, euclidean and DTS search.
///
/// # Sample policy
///
/// The DTS sample set is drawn exactly once per pass through size 5: the `add` that
/// brings the collection to five records draws five samples at random and recomputes
/// every profile. Growing past five never resamples. Shrinking below five only clears
/// the ready flag and keeps the stale samples; DTS searches then rank by raw euclidean
/// distance until an `add` reaches five again. This asymmetry is a deliberate
/// behavior of the store, not a general recommendation.
///
/// [`hydrate`](Self::hydrate) recovers the sample set from persisted profiles, so a
/// reloaded store ranks DTS searches the same way it did before it was saved.
pub struct VectorRecordStore {
    records: Vec<Record>,
    indexer: SampleProfileIndexer,
    embedder: Arc<dyn EmbeddingProvider>,
    rng: Box<dyn RngCore + Send + Sync>,
}

impl VectorRecordStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_rng(embedder, Box::new(StdRng::from_os_rng()))
    }

    pub fn with_seed(embedder: Arc<dyn EmbeddingProvider>, seed: u64) -> Self {
        Self::with_rng(embedder, Box::new(StdRng::seed_from_u64(seed)))
    }

    pub fn with_rng(
        embedder: Arc<dyn EmbeddingProvider>,
        rng: Box<dyn RngCore + Send + Sync>,
    ) -> Self {
        Self {
            records: Vec::new(),
            indexer: SampleProfileIndexer::new(),
            embedder,
            rng,
        }
    }

    /// Embed `content` and append it as a new record.
    pub async fn add(&mut self, content: &str, metadata: Option<Metadata>) -> Result<Record> {
        let embedding = self.embedder.embed(content).await?;
        if let Some(first) = self.records.first() {
            VectorStoreError::check_lengths(first.embedding.len(), embedding.len())?;
        }

        let profile = self.indexer.profile_of(&embedding)?;
        let record = Record {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            embedding,
            metadata: metadata.unwrap_or_default(),
            profile: Some(profile),
        };
        let index = self.records.len();
        self.records.push(record);

        if self.records.len() == SAMPLE_TARGET {
            self.resample()?;
        }

        let stored = self.records[index].clone();
        log::debug!("Added record {} (total: {})", stored.id, self.records.len());
        Ok(stored)
    }

    pub async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        log::debug!(
            "Searching for: '{}' ({:?}, limit: {})",
            query,
            options.method,
            options.effective_limit()
        );
        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(usize, f32)> = match options.method {
            SearchMethod::Cosine => self.score_with(|e| cosine(&query_embedding, e))?,
            SearchMethod::Dts if self.indexer.is_ready() => {
                let query_profile = self.indexer.profile_of(&query_embedding)?;
                self.records
                    .iter()
                    .enumerate()
                    .map(|(i, record)| (i, profile_distance(&query_profile, record)))
                    .collect()
            }
            SearchMethod::Euclidean | SearchMethod::Dts => {
                self.score_with(|e| euclidean(&query_embedding, e))?
            }
        };

        // `sort_by` is stable, so equal scores keep insertion order.
        if options.method.higher_is_better() {
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        } else {
            scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        }

        let results: Vec<SearchHit> = scored
            .into_iter()
            .filter(|(_, score)| options.keeps(*score))
            .take(options.effective_limit())
            .map(|(i, score)| SearchHit {
                record: self.records[i].clone(),
                score,
            })
            .collect();

        log::debug!("Found {} results", results.len());
        Ok(results)
    }

    /// Remove the record with `id`. Unknown ids are ignored.
    pub fn forget(&mut self, id: &str) {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        if self.records.len() < before {
            log::debug!("Forgot record {id} (total: {})", self.records.len());
        }
        if self.records.len() < SAMPLE_TARGET {
            self.indexer.set_ready(false);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.indexer.clear();
        log::debug!("Cleared record store");
    }

    /// Replace the collection with persisted records and re-establish the sample set.
    ///
    /// Five or more records keep the persisted sample set when it can be recovered from
    /// their profiles; otherwise a fresh set is drawn. Fewer than five records use all
    /// of their embeddings as a not-ready sample set.
    pub fn hydrate(&mut self, records: Vec<Record>) -> Result<()> {
        if let Some(first) = records.first() {
            for record in &records[1..] {
                VectorStoreError::check_lengths(first.embedding.len(), record.embedding.len())?;
            }
        }

        self.records = records;
        if self.records.len() >= SAMPLE_TARGET {
            match recover_samples(&self.records) {
                Some(samples) => {
                    self.indexer.set_samples(samples);
                    self.indexer.set_ready(true);
                    self.refresh_profiles()?;
                }
                None => self.resample()?,
            }
        } else if self.records.is_empty() {
            self.indexer.clear();
        } else {
            let samples = self.records.iter().map(|r| r.embedding.clone()).collect();
            self.indexer.set_samples(samples);
            self.indexer.set_ready(false);
            self.refresh_profiles()?;
        }
        log::info!(
            "Hydrated {} records (indexed: {})",
            self.records.len(),
            self.indexer.is_ready()
        );
        Ok(())
    }

    fn resample(&mut self) -> Result<()> {
        let samples = SampleProfileIndexer::draw_samples(
            self.records.iter().map(|r| &r.embedding),
            self.rng.as_mut(),
        );
        self.indexer.set_samples(samples);
        self.indexer.set_ready(true);
        self.refresh_profiles()?;
        log::info!("Resampled DTS index over {} records", self.records.len());
        Ok(())
    }

    fn refresh_profiles(&mut self) -> Result<()> {
        for record in &mut self.records {
            record.profile = Some(self.indexer.profile_of(&record.embedding)?);
        }
        Ok(())
    }

    fn score_with<F>(&self, metric: F) -> Result<Vec<(usize, f32)>>
    where
        F: Fn(&[f32]) -> Result<f32>,
    {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| Ok((i, metric(&record.embedding)?)))
            .collect()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether DTS searches compare profiles rather than raw vectors.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.indexer.is_ready()
    }

    #[must_use]
    pub fn samples(&self) -> &[Vec<f32>] {
        self.indexer.samples()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }
}

/// Rebuild a persisted sample set: sample `i` is the embedding of a record whose
/// profile is zero at slot `i`. `None` when any profile is missing or a slot has no owner.
fn recover_samples(records: &[Record]) -> Option<Vec<Vec<f32>>> {
    let profiles = records
        .iter()
        .map(|r| r.profile.as_deref().filter(|p| p.len() == SAMPLE_TARGET))
        .collect::<Option<Vec<_>>>()?;
    (0..SAMPLE_TARGET)
        .map(|slot| {
            profiles
                .iter()
                .position(|profile| profile[slot] == 0.0)
                .map(|i| records[i].embedding.clone())
        })
        .collect()
}

/// Distance between two profiles; records without a current profile rank last.
fn profile_distance(query_profile: &[f32], record: &Record) -> f32 {
    match record.profile.as_deref() {
        Some(profile) if profile.len() == query_profile.len() => {
            euclidean(query_profile, profile).unwrap_or(f32::INFINITY)
        }
        _ => f32::INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::StubEmbedder;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Embedder with hand-picked vectors so rankings are exact.
    struct FixedEmbedder {
        vectors: HashMap<&'static str, Vec<f32>>,
    }

    impl FixedEmbedder {
        fn new(entries: &[(&'static str, [f32; 2])]) -> Arc<Self> {
            Arc::new(Self {
                vectors: entries.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| VectorStoreError::EmbeddingError(format!("no vector for '{text}'")))
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn stub_store(seed: u64) -> VectorRecordStore {
        VectorRecordStore::with_seed(Arc::new(StubEmbedder::default()), seed)
    }

    fn contents(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.record.content.as_str()).collect()
    }

    #[tokio::test]
    async fn cosine_search_finds_matching_item() {
        let mut store = stub_store(1);
        store.add("the cat", None).await.unwrap();
        store.add("the dog", None).await.unwrap();

        let results = store
            .search("cat", SearchOptions::method(SearchMethod::Cosine).with_limit(1))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.content, "the cat");
    }

    #[tokio::test]
    async fn add_returns_stored_record_with_metadata() {
        let mut store = stub_store(1);
        let mut metadata = Metadata::new();
        metadata.insert("category".to_string(), serde_json::json!("pets"));

        let record = store.add("the cat", Some(metadata.clone())).await.unwrap();
        assert_eq!(record.metadata, metadata);
        assert_eq!(record.embedding.len(), store.dimension());
        assert_eq!(record.profile, Some(Vec::new()));
        assert_eq!(store.get(&record.id), Some(&record));

        let other = store.add("the cat", None).await.unwrap();
        assert_ne!(record.id, other.id);
    }

    #[tokio::test]
    async fn sorting_direction_follows_method() {
        let embedder = FixedEmbedder::new(&[
            ("near", [1.0, 0.1]),
            ("far", [-1.0, 0.5]),
            ("mid", [0.5, 0.8]),
            ("q", [1.0, 0.0]),
        ]);
        let mut store = VectorRecordStore::with_seed(embedder, 3);
        for text in ["far", "mid", "near"] {
            store.add(text, None).await.unwrap();
        }

        let cosine_hits = store
            .search("q", SearchOptions::method(SearchMethod::Cosine))
            .await
            .unwrap();
        assert_eq!(contents(&cosine_hits), vec!["near", "mid", "far"]);
        assert!(cosine_hits.windows(2).all(|w| w[0].score >= w[1].score));

        for method in [SearchMethod::Euclidean, SearchMethod::Dts] {
            let hits = store.search("q", SearchOptions::method(method)).await.unwrap();
            assert_eq!(contents(&hits), vec!["near", "mid", "far"]);
            assert!(hits.windows(2).all(|w| w[0].score <= w[1].score));
        }
    }

    #[tokio::test]
    async fn min_score_filters_in_method_direction() {
        let embedder = FixedEmbedder::new(&[
            ("same", [1.0, 0.0]),
            ("diagonal", [1.0, 1.0]),
            ("opposite", [-3.0, 0.0]),
            ("q", [1.0, 0.0]),
        ]);
        let mut store = VectorRecordStore::with_seed(embedder, 3);
        for text in ["same", "diagonal", "opposite"] {
            store.add(text, None).await.unwrap();
        }

        let cosine_hits = store
            .search(
                "q",
                SearchOptions::method(SearchMethod::Cosine).with_min_score(0.5),
            )
            .await
            .unwrap();
        assert_eq!(contents(&cosine_hits), vec!["same", "diagonal"]);
        assert!(cosine_hits.iter().all(|h| h.score >= 0.5));

        let euclidean_hits = store
            .search(
                "q",
                SearchOptions::method(SearchMethod::Euclidean).with_min_score(2.0),
            )
            .await
            .unwrap();
        assert_eq!(contents(&euclidean_hits), vec!["same", "diagonal"]);
        assert!(euclidean_hits.iter().all(|h| h.score <= 2.0));
    }

    #[tokio::test]
    async fn equal_scores_keep_insertion_order_and_limit_defaults_to_five() {
        let mut store = stub_store(9);
        for _ in 0..7 {
            store.add("same text", None).await.unwrap();
        }
        let ids: Vec<String> = store.records().iter().map(|r| r.id.clone()).collect();

        let hits = store
            .search(
                "same text",
                SearchOptions::method(SearchMethod::Euclidean).with_limit(0),
            )
            .await
            .unwrap();
        let hit_ids: Vec<String> = hits.iter().map(|h| h.record.id.clone()).collect();
        assert_eq!(hit_ids, ids[..5].to_vec());
    }

    #[tokio::test]
    async fn fifth_add_fixes_the_sample_set() {
        let mut store = stub_store(42);
        for i in 1..=4 {
            store.add(&format!("item {i}"), None).await.unwrap();
            assert!(!store.is_ready());
        }

        store.add("item 5", None).await.unwrap();
        assert!(store.is_ready());
        assert_eq!(store.samples().len(), SAMPLE_TARGET);
        assert!(store
            .records()
            .iter()
            .all(|r| r.profile.as_ref().map(Vec::len) == Some(SAMPLE_TARGET)));

        let hits = store
            .search("query", SearchOptions::method(SearchMethod::Dts))
            .await
            .unwrap();
        assert_eq!(hits.len(), 5);
        for hit in &hits {
            assert_eq!(hit.record.profile.as_ref().map(Vec::len), Some(5));
        }
    }

    #[tokio::test]
    async fn growing_past_five_keeps_samples() {
        let mut store = stub_store(42);
        for i in 1..=5 {
            store.add(&format!("item {i}"), None).await.unwrap();
        }
        let samples = store.samples().to_vec();

        let sixth = store.add("item 6", None).await.unwrap();
        assert_eq!(store.samples(), samples.as_slice());
        assert_eq!(sixth.profile.as_ref().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn seeded_stores_draw_identical_samples() {
        let mut a = stub_store(5);
        let mut b = stub_store(5);
        for i in 1..=5 {
            a.add(&format!("item {i}"), None).await.unwrap();
            b.add(&format!("item {i}"), None).await.unwrap();
        }
        assert_eq!(a.samples(), b.samples());
        let profiles_a: Vec<_> = a.records().iter().map(|r| r.profile.clone()).collect();
        let profiles_b: Vec<_> = b.records().iter().map(|r| r.profile.clone()).collect();
        assert_eq!(profiles_a, profiles_b);
    }

    #[tokio::test]
    async fn sampled_record_has_zero_at_its_slot() {
        let mut store = stub_store(11);
        for i in 1..=5 {
            store.add(&format!("item {i}"), None).await.unwrap();
        }
        for (slot, sample) in store.samples().iter().enumerate() {
            let owner = store
                .records()
                .iter()
                .find(|r| &r.embedding == sample)
                .expect("sample drawn from records");
            assert_eq!(owner.profile.as_ref().unwrap()[slot], 0.0);
        }
    }

    #[tokio::test]
    async fn dropping_below_five_falls_back_to_euclidean() {
        let mut store = stub_store(42);
        let mut ids = Vec::new();
        for i in 1..=5 {
            ids.push(store.add(&format!("item {i}"), None).await.unwrap().id);
        }
        let samples = store.samples().to_vec();

        store.forget(&ids[2]);
        assert!(!store.is_ready());
        assert_eq!(store.samples(), samples.as_slice());
        assert!(store
            .records()
            .iter()
            .all(|r| r.profile.as_ref().map(Vec::len) == Some(5)));

        let dts = store
            .search("item 3", SearchOptions::method(SearchMethod::Dts))
            .await
            .unwrap();
        let euclid = store
            .search("item 3", SearchOptions::method(SearchMethod::Euclidean))
            .await
            .unwrap();
        assert_eq!(dts, euclid);
    }

    #[tokio::test]
    async fn returning_to_five_resamples() {
        let mut store = stub_store(42);
        let mut ids = Vec::new();
        for i in 1..=5 {
            ids.push(store.add(&format!("item {i}"), None).await.unwrap().id);
        }
        store.forget(&ids[0]);
        assert!(!store.is_ready());

        store.add("item 6", None).await.unwrap();
        assert!(store.is_ready());
        let embeddings: Vec<&Vec<f32>> = store.records().iter().map(|r| &r.embedding).collect();
        assert!(store.samples().iter().all(|s| embeddings.contains(&s)));
    }

    #[tokio::test]
    async fn dts_ranks_records_without_profile_last() {
        let mut store = stub_store(8);
        for i in 1..=6 {
            store.add(&format!("item {i}"), None).await.unwrap();
        }
        store.records[0].profile = None;
        let orphan = store.records[0].id.clone();

        let hits = store
            .search("item 1", SearchOptions::method(SearchMethod::Dts).with_limit(10))
            .await
            .unwrap();
        let last = hits.last().unwrap();
        assert_eq!(last.record.id, orphan);
        assert!(last.score.is_infinite());
    }

    #[tokio::test]
    async fn forget_unknown_id_is_noop() {
        let mut store = stub_store(1);
        store.add("keep me", None).await.unwrap();
        let before = store.records().to_vec();

        store.forget("does-not-exist");
        assert_eq!(store.records(), before.as_slice());
    }

    #[tokio::test]
    async fn forgotten_record_no_longer_matches() {
        let mut store = stub_store(1);
        let item = store.add("to be forgotten", None).await.unwrap();
        store.forget(&item.id);

        let hits = store.search("forgotten", SearchOptions::default()).await.unwrap();
        assert!(hits.iter().all(|h| h.record.id != item.id));
    }

    #[tokio::test]
    async fn clear_discards_records_and_samples() {
        let mut store = stub_store(1);
        for i in 1..=5 {
            store.add(&format!("item {i}"), None).await.unwrap();
        }
        store.clear();

        assert!(store.is_empty());
        assert!(!store.is_ready());
        assert!(store.samples().is_empty());
        assert!(store
            .search("item", SearchOptions::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn embedding_failures_propagate() {
        let embedder = FixedEmbedder::new(&[("known", [1.0, 0.0])]);
        let mut store = VectorRecordStore::with_seed(embedder, 1);

        assert!(matches!(
            store.add("unknown", None).await,
            Err(VectorStoreError::EmbeddingError(_))
        ));
        assert!(store.is_empty());
        store.add("known", None).await.unwrap();
        assert!(matches!(
            store.search("unknown", SearchOptions::default()).await,
            Err(VectorStoreError::EmbeddingError(_))
        ));
    }

    #[tokio::test]
    async fn add_rejects_mixed_dimensions() {
        let mut store = stub_store(1);
        store.add("first", None).await.unwrap();
        store.embedder = Arc::new(StubEmbedder::new(16));

        assert!(matches!(
            store.add("second", None).await,
            Err(VectorStoreError::DimensionMismatch { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn hydrate_sets_bootstrap_or_indexed_state() {
        let mut source = stub_store(3);
        for i in 1..=6 {
            source.add(&format!("item {i}"), None).await.unwrap();
        }
        let persisted = source.records().to_vec();

        let mut small = stub_store(3);
        small.hydrate(persisted[..3].to_vec()).unwrap();
        assert!(!small.is_ready());
        assert_eq!(small.samples().len(), 3);

        let mut full = stub_store(3);
        full.hydrate(persisted).unwrap();
        assert!(full.is_ready());
        assert_eq!(full.samples().len(), SAMPLE_TARGET);
        assert!(full
            .records()
            .iter()
            .all(|r| r.profile.as_ref().map(Vec::len) == Some(SAMPLE_TARGET)));

        full.hydrate(Vec::new()).unwrap();
        assert!(full.is_empty());
        assert!(full.samples().is_empty());
    }

    #[tokio::test]
    async fn hydrate_recovers_persisted_samples() {
        let mut source = stub_store(3);
        for i in 1..=7 {
            source.add(&format!("item {i}"), None).await.unwrap();
        }

        let mut reloaded = stub_store(99);
        reloaded.hydrate(source.records().to_vec()).unwrap();
        assert!(reloaded.is_ready());
        assert_eq!(reloaded.samples(), source.samples());

        let options = SearchOptions::method(SearchMethod::Dts).with_limit(10);
        let before = source.search("item 4", options).await.unwrap();
        let after = reloaded.search("item 4", options).await.unwrap();
        assert_eq!(contents(&before), contents(&after));
        let scores = |hits: &[SearchHit]| hits.iter().map(|h| h.score).collect::<Vec<_>>();
        assert_eq!(scores(&before), scores(&after));
    }

    #[tokio::test]
    async fn hydrate_redraws_when_a_sample_owner_is_gone() {
        let mut source = stub_store(3);
        for i in 1..=6 {
            source.add(&format!("item {i}"), None).await.unwrap();
        }
        let owner = source
            .records()
            .iter()
            .find(|r| r.embedding == source.samples()[0])
            .map(|r| r.id.clone())
            .unwrap();
        source.forget(&owner);
        assert_eq!(source.len(), 5);

        let mut reloaded = stub_store(8);
        reloaded.hydrate(source.records().to_vec()).unwrap();
        assert!(reloaded.is_ready());
        assert_eq!(reloaded.samples().len(), SAMPLE_TARGET);
        for sample in reloaded.samples() {
            assert!(reloaded.records().iter().any(|r| &r.embedding == sample));
        }
    }

    #[tokio::test]
    async fn hydrate_recomputes_bootstrap_profiles() {
        let mut source = stub_store(3);
        for i in 1..=6 {
            source.add(&format!("item {i}"), None).await.unwrap();
        }

        let mut small = stub_store(3);
        small.hydrate(source.records()[..3].to_vec()).unwrap();
        for (slot, record) in small.records().iter().enumerate() {
            let profile = record.profile.as_ref().unwrap();
            assert_eq!(profile.len(), 3);
            assert_eq!(profile[slot], 0.0);
        }
    }

    #[test]
    fn hydrate_rejects_mixed_dimensions_without_touching_state() {
        let record = |id: &str, embedding: Vec<f32>| Record {
            id: id.to_string(),
            content: id.to_string(),
            embedding,
            metadata: Metadata::new(),
            profile: None,
        };
        let mut store = stub_store(1);
        let result = store.hydrate(vec![
            record("a", vec![1.0, 0.0]),
            record("b", vec![0.0, 1.0, 0.0]),
        ]);

        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch { left: 2, right: 3 })
        ));
        assert!(store.is_empty());
        assert!(!store.is_ready());
    }
}
