//! The suggest pipeline: expand, render, search.

use std::time::Duration;

use magpie_config::{Config, ConfigError, Settings};
use magpie_index::{
    CancelFlag, Deadline, IndexError, SearchError, SearchExecutor, SearchResult,
};
use magpie_query::{BooleanQueryRenderer, QueryExpander};
use thiserror::Error;
use tracing::debug;

use crate::request::{SuggestParams, ValidationError};

/// Errors returned by [`SuggestService`].
///
/// `Display` gives the message meant for the caller. Datastore details are
/// kept in the variant for logging but never shown.
#[derive(Debug, Error)]
pub enum SuggestError {
    /// Configuration or dictionaries could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The search index could not be opened.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The caller has to fix the request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The index failed while searching.
    #[error("failed to fulfill search request")]
    Datastore(String),

    /// The search ran past its deadline.
    #[error(
        "failed to fulfill search request: querying took too long (timeout encountered). \
         Simplify your request and try again, or contact support"
    )]
    Timeout,

    /// The caller went away before the search finished.
    #[error("search request was cancelled")]
    Cancelled,
}

impl SuggestError {
    /// True when the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<SearchError> for SuggestError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(message) => Self::Validation(ValidationError::single(message)),
            SearchError::Datastore(detail) => Self::Datastore(detail),
            SearchError::Timeout { .. } => Self::Timeout,
            SearchError::Cancelled => Self::Cancelled,
        }
    }
}

/// The outcome of one suggest request.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// The match expression that was searched.
    pub expression: String,
    /// Matching features, best first.
    pub rows: Vec<SearchResult>,
}

/// Answers suggest requests.
///
/// Built once at startup and then only read, so one instance can serve
/// concurrent requests.
pub struct SuggestService {
    /// Query expansion with the loaded dictionaries.
    expander: QueryExpander,
    /// The opened index.
    executor: SearchExecutor,
    /// Request limits.
    settings: Settings,
    /// Upper bound for each search.
    query_timeout: Duration,
}

impl SuggestService {
    /// Assembles a service from parts that are already loaded.
    pub fn new(
        expander: QueryExpander,
        executor: SearchExecutor,
        settings: Settings,
        query_timeout: Duration,
    ) -> Self {
        Self {
            expander,
            executor,
            settings,
            query_timeout,
        }
    }

    /// Loads dictionaries and opens the index named by `config`.
    ///
    /// Fails if either dictionary is malformed or expands past the variant cap.
    pub fn from_config(config: &Config) -> Result<Self, SuggestError> {
        let expander =
            QueryExpander::from_config(&config.dictionaries, &config.search)?;
        let executor = SearchExecutor::open(&config.index.path, &config.search)?;
        Ok(Self::new(
            expander,
            executor,
            config.settings.clone(),
            config.search.query_timeout(),
        ))
    }

    /// The query expander in use.
    pub fn expander(&self) -> &QueryExpander {
        &self.expander
    }

    /// The search executor in use.
    pub fn executor(&self) -> &SearchExecutor {
        &self.executor
    }

    /// Validates raw request parameters against the configured limits.
    pub fn params<I, K, V>(&self, pairs: I) -> Result<SuggestParams, SuggestError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(SuggestParams::from_pairs(pairs, &self.settings)?)
    }

    /// Runs a validated request.
    ///
    /// The deadline covers expansion and rendering as well as the search.
    /// The request stops with [`SuggestError::Cancelled`] once `cancel` is set.
    pub fn suggest(
        &self,
        params: &SuggestParams,
        cancel: &CancelFlag,
    ) -> Result<Suggestion, SuggestError> {
        let deadline = Deadline::capped(None, self.query_timeout, cancel.clone());

        let expanded = self.expander.expand(&params.query);
        deadline.check()?;
        let expression = BooleanQueryRenderer::render(&expanded);
        deadline.check()?;
        debug!(
            query = %params.query,
            combinations = expanded.combinations(),
            "expanded query"
        );

        let rows = self.executor.search_within(
            &expression,
            &params.collections,
            params.limit,
            params.srid,
            params.bbox.as_ref(),
            &deadline,
        )?;
        Ok(Suggestion { expression, rows })
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path, time::Instant};

    use magpie_index::{BBox, FeatureDocument, IndexWriter, Srid};
    use tempfile::TempDir;

    use super::*;

    fn feature(id: &str, collection: &str, display_name: &str, suggest: &str) -> FeatureDocument {
        FeatureDocument {
            feature_id: id.to_string(),
            collection_id: collection.to_string(),
            collection_version: 1,
            display_name: display_name.to_string(),
            suggest: suggest.to_string(),
            geometry_type: "Point".to_string(),
            bbox: BBox {
                min_x: 4.8952,
                min_y: 52.3731,
                max_x: 4.8954,
                max_y: 52.3733,
            },
        }
    }

    fn setup(dir: &Path) -> Config {
        fs::write(dir.join("rewrites.csv"), "gravenhage,den haag\n").unwrap();
        fs::write(dir.join("synonyms.csv"), "eerste,1ste\n").unwrap();
        fs::write(
            dir.join("magpie.toml"),
            "[dictionaries]\nrewrites = \"rewrites.csv\"\nsynonyms = \"synonyms.csv\"\n",
        )
        .unwrap();
        let config = Config::load_from_file(&dir.join("magpie.toml")).unwrap();

        let mut writer = IndexWriter::open(&config.index.path, &config.search.stemmer).unwrap();
        writer
            .add_documents(&[
                feature("1", "addresses", "Spui 1, 's-Gravenhage", "spui 1 2511bl gravenhage"),
                feature("r1", "roads", "Eerste Laan", "eerste laan amsterdam"),
                feature("r2", "roads", "1ste Laan", "1ste laan utrecht"),
            ])
            .unwrap();
        writer.commit().unwrap();
        config
    }

    #[test]
    fn rewrites_before_searching() {
        let temp = TempDir::new().unwrap();
        let service = SuggestService::from_config(&setup(temp.path())).unwrap();

        let params = service
            .params([("q", "Spui 1 den Haag"), ("addresses[version]", "1")])
            .unwrap();
        let suggestion = service.suggest(&params, &CancelFlag::new()).unwrap();
        assert_eq!(suggestion.expression, "(spui & 1 & gravenhage)");
        assert_eq!(suggestion.rows.len(), 1);
        assert_eq!(suggestion.rows[0].feature_id, "1");
    }

    #[test]
    fn synonyms_widen_results() {
        let temp = TempDir::new().unwrap();
        let service = SuggestService::from_config(&setup(temp.path())).unwrap();

        let params = service
            .params([("q", "eerste laan"), ("roads[version]", "1")])
            .unwrap();
        let rows = service.suggest(&params, &CancelFlag::new()).unwrap().rows;
        let mut ids: Vec<_> = rows.iter().map(|r| r.feature_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn reprojects_into_requested_crs() {
        let temp = TempDir::new().unwrap();
        let service = SuggestService::from_config(&setup(temp.path())).unwrap();

        let params = service
            .params([
                ("q", "spui"),
                ("addresses[version]", "1"),
                ("crs", "http://www.opengis.net/def/crs/EPSG/0/28992"),
            ])
            .unwrap();
        assert_eq!(params.srid, Srid::RdNew);
        let rows = service.suggest(&params, &CancelFlag::new()).unwrap().rows;
        assert!(rows[0].bbox.min_x > 100_000.0);
    }

    #[test]
    fn bbox_and_relevance_reach_the_search() {
        let temp = TempDir::new().unwrap();
        let service = SuggestService::from_config(&setup(temp.path())).unwrap();

        // Every test feature lies in Amsterdam.
        let params = service
            .params([
                ("q", "laan"),
                ("roads[version]", "1"),
                ("roads[relevance]", "1"),
                ("bbox", "4.0,51.0,4.5,51.5"),
            ])
            .unwrap();
        assert!(service.suggest(&params, &CancelFlag::new()).unwrap().rows.is_empty());

        let params = service
            .params([
                ("q", "laan"),
                ("roads[version]", "1"),
                ("roads[relevance]", "1"),
                ("bbox", "4.8,52.3,5.0,52.4"),
            ])
            .unwrap();
        let full = service.suggest(&params, &CancelFlag::new()).unwrap().rows;
        assert_eq!(full.len(), 2);

        let params = service
            .params([("q", "laan"), ("roads[version]", "1")])
            .unwrap();
        let halved = service.suggest(&params, &CancelFlag::new()).unwrap().rows;
        assert!((halved[0].rank * 2.0 - full[0].rank).abs() < 1e-4);
    }

    #[test]
    fn deadline_covers_expansion() {
        let temp = TempDir::new().unwrap();
        let mut config = setup(temp.path());
        fs::write(temp.path().join("synonyms.csv"), "ae,a\n").unwrap();
        config.search.query_timeout_ms = 1;
        config.search.max_combinations = 100_000;
        let service = SuggestService::from_config(&config).unwrap();

        let query = (0..7)
            .map(|i| format!("{}{i}", "ae".repeat(10)))
            .collect::<Vec<_>>()
            .join(" ");
        let params = service
            .params([("q", query.as_str()), ("roads[version]", "1")])
            .unwrap();
        let started = Instant::now();
        let err = service.suggest(&params, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, SuggestError::Timeout), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn exploding_query_stays_within_combination_cap() {
        let temp = TempDir::new().unwrap();
        let mut config = setup(temp.path());
        fs::write(temp.path().join("synonyms.csv"), "ae,a\n").unwrap();
        config.search.max_combinations = 64;
        let service = SuggestService::from_config(&config).unwrap();

        let query = (0..7)
            .map(|i| format!("{}{i}", "ae".repeat(10)))
            .collect::<Vec<_>>()
            .join(" ");
        let params = service
            .params([("q", query.as_str()), ("roads[version]", "1")])
            .unwrap();
        let suggestion = service.suggest(&params, &CancelFlag::new()).unwrap();
        assert!(suggestion.rows.is_empty());
        let conjunctions = suggestion.expression.matches(" | ").count() + 1;
        assert!(conjunctions <= 64, "{conjunctions}");
    }

    #[test]
    fn huge_timeout_is_accepted() {
        let temp = TempDir::new().unwrap();
        let mut config = setup(temp.path());
        config.search.query_timeout_ms = u64::MAX;
        let service = SuggestService::from_config(&config).unwrap();

        let params = service
            .params([("q", "spui"), ("addresses[version]", "1")])
            .unwrap();
        let rows = service.suggest(&params, &CancelFlag::new()).unwrap().rows;
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn cancelled_request_yields_no_rows() {
        let temp = TempDir::new().unwrap();
        let service = SuggestService::from_config(&setup(temp.path())).unwrap();

        let params = service
            .params([("q", "spui"), ("addresses[version]", "1")])
            .unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = service.suggest(&params, &cancel).unwrap_err();
        assert!(matches!(err, SuggestError::Cancelled));
        assert!(!err.is_client_error());
    }

    #[test]
    fn validation_errors_are_client_errors() {
        let temp = TempDir::new().unwrap();
        let service = SuggestService::from_config(&setup(temp.path())).unwrap();

        let err = service.params([("q", "spui")]).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().starts_with("no collection(s) specified"));
    }

    #[test]
    fn caller_messages_hide_datastore_detail() {
        let err = SuggestError::from(SearchError::Datastore("segment 3 corrupt".into()));
        assert_eq!(err.to_string(), "failed to fulfill search request");

        let err = SuggestError::from(SearchError::Timeout {
            timeout: Duration::from_millis(10),
        });
        assert!(err.to_string().contains("querying took too long (timeout encountered)"));
    }

    #[test]
    fn malformed_dictionary_fails_startup() {
        let temp = TempDir::new().unwrap();
        let mut config = setup(temp.path());
        fs::write(temp.path().join("synonyms.csv"), ",orphan\n").unwrap();
        config.dictionaries.synonyms = Some(temp.path().join("synonyms.csv"));

        let err = SuggestService::from_config(&config).err().unwrap();
        assert!(matches!(err, SuggestError::Config(_)));
    }

    #[test]
    fn service_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SuggestService>();
    }
}
