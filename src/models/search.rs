//! Search request models.

use serde::{Deserialize, Serialize};

/// Largest page arXiv serves for a single query
pub const MAX_RESULTS_LIMIT: usize = 2000;

/// Sort order for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Sort field for search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Relevance,
    LastUpdated,
    Submitted,
}

/// Search parameters for the arXiv query endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Raw arXiv query (`all:transformers`, `ti:attention`, free text)
    pub search_query: String,

    /// Category filters, OR-ed together
    pub categories: Vec<String>,

    /// Author filter
    pub author: Option<String>,

    /// Lower bound on submission date (arXiv date syntax, e.g. `202301010000`)
    pub date_from: Option<String>,

    /// Upper bound on submission date, only used with `date_from`
    pub date_to: Option<String>,

    pub sort_by: SortBy,

    pub sort_order: SortOrder,

    /// Offset of the first result
    pub start: usize,

    /// Page size
    pub max_results: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            categories: Vec::new(),
            author: None,
            date_from: None,
            date_to: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            start: 0,
            max_results: 10,
        }
    }
}

impl SearchParams {
    pub fn new(search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            ..Default::default()
        }
    }

    /// Add a category filter
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Restrict to a submission date range; `to` defaults to open-ended
    pub fn submitted_between(mut self, from: impl Into<String>, to: Option<String>) -> Self {
        self.date_from = Some(from.into());
        self.date_to = to;
        self
    }

    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    pub fn start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Page size clamped to what the API accepts
    pub fn effective_max_results(&self) -> usize {
        self.max_results.clamp(1, MAX_RESULTS_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = SearchParams::new("graph neural networks");
        assert_eq!(params.sort_by, SortBy::Relevance);
        assert_eq!(params.sort_order, SortOrder::Descending);
        assert_eq!(params.max_results, 10);
        assert!(params.categories.is_empty());
    }

    #[test]
    fn test_builder() {
        let params = SearchParams::new("llm")
            .category("cs.AI")
            .category("cs.CL")
            .author("Hinton")
            .submitted_between("202001010000", None)
            .sort_by(SortBy::Submitted)
            .start(20)
            .max_results(50);

        assert_eq!(params.categories, vec!["cs.AI", "cs.CL"]);
        assert_eq!(params.author.as_deref(), Some("Hinton"));
        assert_eq!(params.date_from.as_deref(), Some("202001010000"));
        assert_eq!(params.date_to, None);
        assert_eq!(params.start, 20);
    }

    #[test]
    fn test_effective_max_results() {
        assert_eq!(SearchParams::new("x").max_results(0).effective_max_results(), 1);
        assert_eq!(SearchParams::new("x").max_results(5000).effective_max_results(), 2000);
        assert_eq!(SearchParams::new("x").max_results(25).effective_max_results(), 25);
    }
}
