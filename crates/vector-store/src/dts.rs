//! Distance-to-samples (DTS) indexing.
//!
//! Every vector is re-expressed as its *profile*: the ordered list of euclidean
//! distances to a small set of reference samples. Comparing two profiles is a cheap
//! stand-in for comparing the raw vectors once the sample set is fixed.

use crate::distance::euclidean;
use crate::error::Result;
use rand::seq::index;
use rand::RngCore;

/// Number of reference samples the index settles on.
pub const SAMPLE_TARGET: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct SampleProfileIndexer {
    samples: Vec<Vec<f32>>,
    ready: bool,
}

impl SampleProfileIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_samples(samples: Vec<Vec<f32>>) -> Self {
        Self {
            samples,
            ready: false,
        }
    }

    /// Replace the sample set. Cached record profiles are not touched.
    pub fn set_samples(&mut self, samples: Vec<Vec<f32>>) {
        self.samples = samples;
    }

    #[must_use]
    pub fn samples(&self) -> &[Vec<f32>] {
        &self.samples
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Drop the sample set and leave the indexed state.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.ready = false;
    }

    /// Distances from `vector` to each sample, in sample order.
    pub fn profile_of(&self, vector: &[f32]) -> Result<Vec<f32>> {
        self.samples
            .iter()
            .map(|sample| euclidean(vector, sample))
            .collect()
    }

    /// Pick up to [`SAMPLE_TARGET`] embeddings uniformly without replacement.
    pub fn draw_samples<'a, I>(embeddings: I, rng: &mut dyn RngCore) -> Vec<Vec<f32>>
    where
        I: IntoIterator<Item = &'a Vec<f32>>,
    {
        let pool: Vec<&Vec<f32>> = embeddings.into_iter().collect();
        let amount = SAMPLE_TARGET.min(pool.len());
        index::sample(rng, pool.len(), amount)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect()
    }
}
