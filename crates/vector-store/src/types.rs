use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Metadata = Map<String, Value>;

/// One stored memory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Cached DTS profile; its length is the sample count active when it was computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: Record,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Cosine,
    Euclidean,
    #[default]
    Dts,
}

impl SearchMethod {
    /// Similarity scores rank high-first; distances rank low-first.
    #[must_use]
    pub const fn higher_is_better(self) -> bool {
        matches!(self, Self::Cosine)
    }
}

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub method: SearchMethod,
    /// Maximum hits; `0` falls back to [`DEFAULT_SEARCH_LIMIT`].
    pub limit: usize,
    /// Lower bound for similarities, upper bound for distances.
    pub min_score: Option<f32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            method: SearchMethod::default(),
            limit: DEFAULT_SEARCH_LIMIT,
            min_score: None,
        }
    }
}

impl SearchOptions {
    #[must_use]
    pub fn method(method: SearchMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub(crate) const fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_SEARCH_LIMIT
        } else {
            self.limit
        }
    }

    pub(crate) fn keeps(&self, score: f32) -> bool {
        match self.min_score {
            None => true,
            Some(bound) if self.method.higher_is_better() => score >= bound,
            Some(bound) => score <= bound,
        }
    }
}
