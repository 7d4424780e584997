//! arXiv source implementation.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::feed::decode_feed;
use crate::models::{ArticleRecord, FeedResult, SearchParams, SortBy, SortOrder};
use crate::sources::{Source, SourceError};
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// Entry ids under this prefix are API error reports, not articles
const ARXIV_ERROR_ID: &str = "arxiv.org/api/errors";

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    api_url: Url,
    retry: RetryConfig,
}

impl ArxivSource {
    /// Create a new arXiv source with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::from_config(&Config::default())
    }

    /// Create from application configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = HttpClient::with_settings(
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
            Duration::from_secs(config.arxiv.timeout_seconds),
        )?
        .with_min_interval(Duration::from_millis(config.arxiv.min_request_interval_ms));

        Ok(Self::with_client(client, &config.arxiv.api_url)?
            .retry_config(RetryConfig::from(&config.retry)))
    }

    /// Create with a custom HTTP client and endpoint (for testing)
    pub fn with_client(client: HttpClient, api_url: &str) -> Result<Self, SourceError> {
        let api_url = Url::parse(api_url)
            .map_err(|e| SourceError::InvalidRequest(format!("Bad API URL {}: {}", api_url, e)))?;
        Ok(Self {
            client,
            api_url,
            retry: RetryConfig::default(),
        })
    }

    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Normalize an arXiv identifier.
    ///
    /// Handles formats like:
    /// - "2301.12345" and "2301.12345v2" (an explicit version is kept)
    /// - "arXiv:2301.12345"
    /// - "https://arxiv.org/abs/2301.12345v1", "https://arxiv.org/pdf/2301.12345.pdf"
    /// - old style "math.GT/0104020"
    pub fn parse_id(id: &str) -> Result<String, SourceError> {
        let trimmed = id.trim();
        let lower = trimmed.to_ascii_lowercase();

        let mut rest = trimmed;
        for marker in ["/abs/", "/pdf/"] {
            if let Some(pos) = lower.find(marker) {
                rest = &trimmed[pos + marker.len()..];
                break;
            }
        }

        if rest
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("arxiv:"))
        {
            rest = &rest[6..];
        }

        let rest = rest.trim_end_matches('/');
        let rest = match rest.len().checked_sub(4) {
            Some(cut) if rest.get(cut..).is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf")) => {
                &rest[..cut]
            }
            _ => rest,
        };

        if is_valid_id(rest) {
            Ok(rest.to_string())
        } else {
            Err(SourceError::InvalidRequest(format!(
                "Invalid arXiv ID: {:?}",
                id
            )))
        }
    }

    /// Like [`parse_id`](Self::parse_id) but without the version suffix, so
    /// every version of an article maps to the same identifier.
    pub fn base_id(id: &str) -> Result<String, SourceError> {
        Self::parse_id(id).map(|parsed| strip_version(&parsed).to_string())
    }

    /// Build the `search_query` value.
    ///
    /// Filters are AND-ed onto the free-text query: categories as `cat:`
    /// (several are OR-ed in a group), the author as `au:`, and the date range
    /// as `submittedDate:[from TO to]`. An empty query with no filters
    /// becomes `all`.
    pub fn build_search_query(params: &SearchParams) -> String {
        let mut parts = Vec::new();

        let query = params.search_query.trim();
        if !query.is_empty() {
            parts.push(query.to_string());
        }

        let categories: Vec<&str> = params
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        match categories.as_slice() {
            [] => {}
            [single] => parts.push(format!("cat:{}", single)),
            many => parts.push(format!(
                "({})",
                many.iter()
                    .map(|c| format!("cat:{}", c))
                    .collect::<Vec<_>>()
                    .join(" OR ")
            )),
        }

        if let Some(author) = params.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            if author.contains(char::is_whitespace) {
                parts.push(format!("au:\"{}\"", author));
            } else {
                parts.push(format!("au:{}", author));
            }
        }

        if let Some(from) = params.date_from.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            let to = params
                .date_to
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("*");
            parts.push(format!("submittedDate:[{} TO {}]", from, to));
        }

        if parts.is_empty() {
            "all".to_string()
        } else {
            parts.join(" AND ")
        }
    }

    /// `sortBy` value; descending order is a `-` prefix on date keys
    pub fn sort_key(sort_by: SortBy, order: SortOrder) -> String {
        let key = match sort_by {
            SortBy::Relevance => return "relevance".to_string(),
            SortBy::LastUpdated => "lastUpdatedDate",
            SortBy::Submitted => "submittedDate",
        };
        match order {
            SortOrder::Descending => format!("-{}", key),
            SortOrder::Ascending => key.to_string(),
        }
    }

    pub fn search_url(&self, params: &SearchParams) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("search_query", &Self::build_search_query(params))
            .append_pair("start", &params.start.to_string())
            .append_pair("max_results", &params.effective_max_results().to_string())
            .append_pair("sortBy", &Self::sort_key(params.sort_by, params.sort_order));
        url
    }

    pub fn recent_url(&self, categories: &[String], max_results: usize) -> Url {
        let query = categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(|c| format!("cat:{}", c))
            .collect::<Vec<_>>()
            .join(" OR ");
        let params = SearchParams::new(query)
            .sort_by(SortBy::LastUpdated)
            .sort_order(SortOrder::Descending)
            .max_results(max_results);
        self.search_url(&params)
    }

    pub fn id_url(&self, id: &str) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut().append_pair("id_list", id);
        url
    }

    /// Fetch a feed with retry, then decode it once.
    async fn fetch_feed(&self, url: Url) -> Result<FeedResult, SourceError> {
        tracing::debug!(%url, "Querying arXiv");

        let client = self.client.clone();
        let body = with_retry(self.retry, || {
            let client = client.clone();
            let url = url.clone();
            async move {
                let response = client
                    .get(url)
                    .header(ACCEPT.as_str(), "application/xml")
                    .send()
                    .await?;

                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse().ok());
                    return Err(SourceError::RateLimit(retry_after));
                }
                if status.is_server_error() {
                    return Err(SourceError::Unavailable(format!(
                        "arXiv API returned status: {}",
                        status
                    )));
                }
                if !status.is_success() {
                    // Bad queries come back as 400 with an Atom error feed
                    let body = response.text().await.unwrap_or_default();
                    if let Some(message) = decode_feed(&body).ok().and_then(|f| api_error(&f)) {
                        return Err(SourceError::InvalidRequest(message));
                    }
                    return Err(SourceError::Api(format!(
                        "arXiv API returned status: {}",
                        status
                    )));
                }

                response
                    .text()
                    .await
                    .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))
            }
        })
        .await?;

        let feed = decode_feed(&body)?;
        if let Some(message) = api_error(&feed) {
            return Err(SourceError::InvalidRequest(message));
        }
        if feed.dropped_count() > 0 {
            tracing::warn!(
                dropped = feed.dropped_count(),
                "arXiv feed contained entries without an id"
            );
        }
        Ok(feed)
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, params: &SearchParams) -> Result<FeedResult, SourceError> {
        self.fetch_feed(self.search_url(params)).await
    }

    async fn get_by_id(&self, id: &str) -> Result<ArticleRecord, SourceError> {
        let id = Self::parse_id(id)?;
        let feed = self.fetch_feed(self.id_url(&id)).await?;

        if feed.entries.len() > 1 {
            tracing::warn!(
                id = %id,
                entries = feed.entries.len(),
                "Lookup by id returned several entries, using the first"
            );
        }

        feed.entries
            .into_iter()
            .next()
            .ok_or(SourceError::NotFound(id))
    }

    async fn recent(
        &self,
        categories: &[String],
        max_results: usize,
    ) -> Result<FeedResult, SourceError> {
        self.fetch_feed(self.recent_url(categories, max_results)).await
    }

    fn validate_id(&self, id: &str) -> Result<(), SourceError> {
        Self::parse_id(id)?;
        Ok(())
    }
}

/// Message of an arXiv error feed, if this is one
fn api_error(feed: &FeedResult) -> Option<String> {
    let [entry] = feed.entries.as_slice() else {
        return None;
    };
    if !entry.id.contains(ARXIV_ERROR_ID) {
        return None;
    }
    Some(if entry.summary.is_empty() {
        entry.title.clone()
    } else {
        entry.summary.clone()
    })
}

fn digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

fn strip_version(s: &str) -> &str {
    match s.rfind('v') {
        Some(pos) if pos > 0 && digits(&s[pos + 1..], 1, 3) => &s[..pos],
        _ => s,
    }
}

/// New style `2301.12345[vN]` or old style `math.GT/0104020[vN]`
fn is_valid_id(id: &str) -> bool {
    let id = strip_version(id);

    if let Some((archive, number)) = id.split_once('/') {
        let (subject, class) = match archive.split_once('.') {
            Some((subject, class)) => (subject, Some(class)),
            None => (archive, None),
        };
        return !subject.is_empty()
            && subject.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-')
            && class.map_or(true, |c| {
                c.len() == 2 && c.bytes().all(|b| b.is_ascii_alphabetic())
            })
            && digits(number, 7, 7);
    }

    match id.split_once('.') {
        Some((yymm, number)) => digits(yymm, 4, 4) && digits(number, 4, 5),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SEARCH_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=transformers</title>
  <opensearch:totalResults>42</opensearch:totalResults>
  <opensearch:startIndex>0</opensearch:startIndex>
  <opensearch:itemsPerPage>2</opensearch:itemsPerPage>
  <entry>
    <id>http://arxiv.org/abs/2301.12345v1</id>
    <title>First Paper</title>
    <summary>First abstract</summary>
    <author><name>A. Author</name></author>
    <category term="cs.AI"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2301.54321v2</id>
    <title>Second Paper</title>
    <summary>Second abstract</summary>
    <category term="cs.LG"/>
  </entry>
</feed>"#;

    const ERROR_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
  </entry>
</feed>"#;

    const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(10),
            ..RetryConfig::default()
        }
    }

    fn source_for(server: &mockito::Server) -> ArxivSource {
        let url = format!("{}/api/query", server.url());
        ArxivSource::with_client(HttpClient::new().unwrap(), &url)
            .unwrap()
            .retry_config(fast_retry())
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(ArxivSource::parse_id("2301.12345").unwrap(), "2301.12345");
        assert_eq!(ArxivSource::parse_id("2301.12345v2").unwrap(), "2301.12345v2");
        assert_eq!(ArxivSource::parse_id("arXiv:2301.12345").unwrap(), "2301.12345");
        assert_eq!(
            ArxivSource::parse_id("https://arxiv.org/abs/2301.12345v1").unwrap(),
            "2301.12345v1"
        );
        assert_eq!(
            ArxivSource::parse_id("https://arxiv.org/pdf/2301.12345v1.pdf").unwrap(),
            "2301.12345v1"
        );
        assert_eq!(
            ArxivSource::parse_id("HTTPS://ARXIV.ORG/ABS/2301.12345").unwrap(),
            "2301.12345"
        );
        assert_eq!(
            ArxivSource::parse_id(" math.GT/0104020 ").unwrap(),
            "math.GT/0104020"
        );
        assert_eq!(ArxivSource::parse_id("hep-th/9901001v3").unwrap(), "hep-th/9901001v3");
    }

    #[test]
    fn test_parse_id_errors() {
        assert!(ArxivSource::parse_id("").is_err());
        assert!(ArxivSource::parse_id("   ").is_err());
        assert!(ArxivSource::parse_id("not-an-id").is_err());
        assert!(ArxivSource::parse_id("2301.123").is_err());
        assert!(ArxivSource::parse_id("math/01").is_err());
    }

    #[test]
    fn test_base_id_drops_version() {
        assert_eq!(ArxivSource::base_id("2301.12345v3").unwrap(), "2301.12345");
        assert_eq!(ArxivSource::base_id("2301.12345").unwrap(), "2301.12345");
        assert_eq!(
            ArxivSource::base_id("http://arxiv.org/abs/2301.12345v3").unwrap(),
            "2301.12345"
        );
        assert_eq!(ArxivSource::base_id("hep-th/9901001v2").unwrap(), "hep-th/9901001");
        assert!(ArxivSource::base_id("not-an-id").is_err());
    }

    #[test]
    fn test_build_search_query() {
        let params = SearchParams::new("transformers")
            .category("cs.AI")
            .author("Hinton");
        assert_eq!(
            ArxivSource::build_search_query(&params),
            "transformers AND cat:cs.AI AND au:Hinton"
        );
    }

    #[test]
    fn test_build_search_query_multiple_categories_and_dates() {
        let params = SearchParams::new("all:diffusion")
            .category("cs.CV")
            .category("cs.LG")
            .author("Geoffrey Hinton")
            .submitted_between("202301010000", Some("202312312359".to_string()));
        assert_eq!(
            ArxivSource::build_search_query(&params),
            "all:diffusion AND (cat:cs.CV OR cat:cs.LG) AND au:\"Geoffrey Hinton\" \
             AND submittedDate:[202301010000 TO 202312312359]"
        );

        let open_ended = SearchParams::new("x").submitted_between("2023", None);
        assert_eq!(
            ArxivSource::build_search_query(&open_ended),
            "x AND submittedDate:[2023 TO *]"
        );
    }

    #[test]
    fn test_build_search_query_empty() {
        assert_eq!(ArxivSource::build_search_query(&SearchParams::new("  ")), "all");
        assert_eq!(
            ArxivSource::build_search_query(&SearchParams::new("").category("cs.AI")),
            "cat:cs.AI"
        );
    }

    #[test]
    fn test_sort_key() {
        assert_eq!(
            ArxivSource::sort_key(SortBy::Relevance, SortOrder::Descending),
            "relevance"
        );
        assert_eq!(
            ArxivSource::sort_key(SortBy::LastUpdated, SortOrder::Descending),
            "-lastUpdatedDate"
        );
        assert_eq!(
            ArxivSource::sort_key(SortBy::Submitted, SortOrder::Ascending),
            "submittedDate"
        );
    }

    #[test]
    fn test_search_url() {
        let source = ArxivSource::with_client(HttpClient::new().unwrap(), ARXIV_API_URL).unwrap();
        let params = SearchParams::new("llm")
            .category("cs.CL")
            .start(10)
            .max_results(5)
            .sort_by(SortBy::Submitted);
        let url = source.search_url(&params);

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("search_query".to_string(), "llm AND cat:cs.CL".to_string()),
                ("start".to_string(), "10".to_string()),
                ("max_results".to_string(), "5".to_string()),
                ("sortBy".to_string(), "-submittedDate".to_string()),
            ]
        );
    }

    #[test]
    fn test_recent_url() {
        let source = ArxivSource::with_client(HttpClient::new().unwrap(), ARXIV_API_URL).unwrap();
        let url = source.recent_url(&["cs.AI".to_string(), "cs.LG".to_string()], 7);
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["search_query"], "cat:cs.AI OR cat:cs.LG");
        assert_eq!(query["sortBy"], "-lastUpdatedDate");
        assert_eq!(query["max_results"], "7");

        let all = source.recent_url(&[], 10);
        let query: std::collections::HashMap<_, _> = all.query_pairs().into_owned().collect();
        assert_eq!(query["search_query"], "all");
    }

    #[tokio::test]
    async fn test_search_decodes_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "transformers AND cat:cs.AI".into()),
                Matcher::UrlEncoded("sortBy".into(), "relevance".into()),
                Matcher::UrlEncoded("start".into(), "0".into()),
            ]))
            .match_header("accept", "application/xml")
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(SEARCH_FEED)
            .create_async()
            .await;

        let source = source_for(&server);
        let feed = source
            .search(&SearchParams::new("transformers").category("cs.AI"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.total_results, 42);
        assert_eq!(feed.entries[0].title, "First Paper");
        assert_eq!(feed.entries[1].arxiv_id(), "2301.54321v2");
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::UrlEncoded("id_list".into(), "2301.12345".into()))
            .with_status(200)
            .with_body(SEARCH_FEED)
            .create_async()
            .await;

        let source = source_for(&server);
        let article = source.get_by_id("arXiv:2301.12345").await.unwrap();

        mock.assert_async().await;
        assert_eq!(article.title, "First Paper");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#)
            .create_async()
            .await;

        let source = source_for(&server);
        let result = source.get_by_id("2301.99999").await;
        assert!(matches!(result, Err(SourceError::NotFound(id)) if id == "2301.99999"));
    }

    #[tokio::test]
    async fn test_get_by_id_rejects_bad_id_without_request() {
        let server = mockito::Server::new_async().await;
        let source = source_for(&server);
        let result = source.get_by_id("definitely not an id").await;
        assert!(matches!(result, Err(SourceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_error_feed_becomes_invalid_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(ERROR_FEED)
            .expect(1)
            .create_async()
            .await;

        let source = source_for(&server);
        let result = source.search(&SearchParams::new("x")).await;

        mock.assert_async().await;
        assert!(
            matches!(result, Err(SourceError::InvalidRequest(msg)) if msg == "incorrect id format for 1234")
        );
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let source = source_for(&server);
        let result = source.search(&SearchParams::new("x")).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not xml at all")
            .expect(1)
            .create_async()
            .await;

        let source = source_for(&server);
        let result = source.search(&SearchParams::new("x")).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(SourceError::Feed(_))));
    }
}
