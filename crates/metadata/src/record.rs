//! Lazily-fetched movie record.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::normalize::{normalize_fields, parse_object};
use crate::transport::{HttpTransport, Transport};
use crate::{DownloadSelector, FieldMap, FieldValue, LookupError, RecordError, RequestConfig};

/// Everything produced by one successful fetch. Replaced as a unit.
#[derive(Debug, Clone)]
struct Fetched {
    info: FieldMap,
    downloads: BTreeMap<String, Bytes>,
    raw_body: Bytes,
}

/// A movie looked up by title, fetched on first access.
///
/// The first call to [`field`](Self::field), [`info`](Self::info) or one of the
/// typed accessors performs the lookup; later calls reuse the cached result
/// until [`fetch`](Self::fetch) is called again. A failed fetch leaves any
/// previous result in place.
pub struct MovieRecord<T = HttpTransport> {
    query: String,
    config: RequestConfig,
    selector: DownloadSelector,
    transport: T,
    state: Option<Fetched>,
}

impl MovieRecord<HttpTransport> {
    pub fn new(query: impl Into<String>) -> Result<Self, RecordError> {
        Self::with_options(query, None, DownloadSelector::None)
    }

    pub fn with_options(
        query: impl Into<String>,
        config: Option<RequestConfig>,
        selector: DownloadSelector,
    ) -> Result<Self, RecordError> {
        Self::with_transport(query, config, selector, HttpTransport::new())
    }
}

impl<T: Transport> MovieRecord<T> {
    pub fn with_transport(
        query: impl Into<String>,
        config: Option<RequestConfig>,
        selector: DownloadSelector,
        transport: T,
    ) -> Result<Self, RecordError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(RecordError::InvalidArgument(
                "query must not be empty".into(),
            ));
        }
        selector.validate()?;

        Ok(Self {
            query,
            config: config.unwrap_or_default(),
            selector,
            transport,
            state: None,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn selector(&self) -> &DownloadSelector {
        &self.selector
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_fetched(&self) -> bool {
        self.state.is_some()
    }

    /// Look the movie up now, replacing any cached result on success.
    pub fn fetch(&mut self) -> Result<&FieldMap, RecordError> {
        let fetched = self.load()?;
        Ok(&self.state.insert(fetched).info)
    }

    /// The normalized mapping, fetching it first if needed.
    pub fn info(&mut self) -> Result<&FieldMap, RecordError> {
        Ok(&self.ensure_fetched()?.info)
    }

    /// The cached mapping, without ever touching the network.
    pub fn cached(&self) -> Option<&FieldMap> {
        self.state.as_ref().map(|s| &s.info)
    }

    /// Case-insensitive field lookup, fetching first if needed.
    pub fn field(&mut self, name: &str) -> Result<&FieldValue, RecordError> {
        let key = name.to_lowercase();
        let state = self.ensure_fetched()?;
        match state.info.get(&key) {
            Some(value) => Ok(value),
            None => Err(RecordError::FieldNotFound(key)),
        }
    }

    pub fn text(&mut self, name: &str) -> Result<&str, RecordError> {
        self.field(name)?
            .as_str()
            .ok_or_else(|| wrong_type(name, "text"))
    }

    pub fn list(&mut self, name: &str) -> Result<&[String], RecordError> {
        self.field(name)?
            .as_list()
            .ok_or_else(|| wrong_type(name, "a list"))
    }

    pub fn integer(&mut self, name: &str) -> Result<i64, RecordError> {
        self.field(name)?
            .as_i64()
            .ok_or_else(|| wrong_type(name, "an integer"))
    }

    pub fn float(&mut self, name: &str) -> Result<f64, RecordError> {
        self.field(name)?
            .as_f64()
            .ok_or_else(|| wrong_type(name, "a number"))
    }

    /// Downloaded content for `name`, if it was selected, was a URL, and
    /// the download succeeded.
    pub fn download(&self, name: &str) -> Option<&Bytes> {
        self.state
            .as_ref()
            .and_then(|s| s.downloads.get(&name.to_lowercase()))
    }

    pub fn downloads(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.state
            .iter()
            .flat_map(|s| s.downloads.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Body of the last successful primary response.
    pub fn raw_body(&self) -> Option<&[u8]> {
        self.state.as_ref().map(|s| &s.raw_body[..])
    }

    fn ensure_fetched(&mut self) -> Result<&Fetched, RecordError> {
        let fetched = match self.state.take() {
            Some(fetched) => fetched,
            None => self.load()?,
        };
        Ok(&*self.state.insert(fetched))
    }

    fn load(&self) -> Result<Fetched, RecordError> {
        let params = self.config.query_params(&self.query);
        debug!(url = %self.config.url, query = %self.query, "movie lookup");

        let body = self
            .transport
            .get(&self.config.url, &params, self.config.timeout)
            .map_err(LookupError::from)?;

        let raw = parse_object(&body)?;
        let info = normalize_fields(&raw)?;
        let downloads = self.download_selected(&raw);

        debug!(
            query = %self.query,
            fields = info.len(),
            downloads = downloads.len(),
            "movie lookup complete"
        );

        Ok(Fetched {
            info,
            downloads,
            raw_body: body,
        })
    }

    fn download_selected(&self, raw: &Map<String, Value>) -> BTreeMap<String, Bytes> {
        let mut downloads = BTreeMap::new();
        if self.selector.is_none() {
            return downloads;
        }

        for (key, value) in raw {
            let key = key.to_lowercase();
            if !self.selector.selects(&key) {
                continue;
            }
            let Some(url) = value.as_str().filter(|v| is_url(v)) else {
                continue;
            };

            match self.transport.get(url.trim(), &[], self.config.timeout) {
                Ok(content) => {
                    debug!(field = %key, bytes = content.len(), "downloaded field");
                    downloads.insert(key, content);
                }
                Err(e) => {
                    warn!(field = %key, url = %url, error = %e, "download failed, skipping");
                }
            }
        }

        downloads
    }
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn wrong_type(field: &str, expected: &'static str) -> RecordError {
    RecordError::WrongType {
        field: field.to_lowercase(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;

    use super::*;
    use crate::TransportError;

    const API: &str = "http://api.test/";

    /// Serves queued primary responses and fixed download responses,
    /// recording every URL requested.
    #[derive(Default)]
    struct StubTransport {
        primary: RefCell<VecDeque<Result<&'static str, TransportError>>>,
        files: HashMap<&'static str, &'static [u8]>,
        calls: RefCell<Vec<String>>,
    }

    impl StubTransport {
        fn respond(self, body: &'static str) -> Self {
            self.primary.borrow_mut().push_back(Ok(body));
            self
        }

        fn fail(self, err: TransportError) -> Self {
            self.primary.borrow_mut().push_back(Err(err));
            self
        }

        fn file(mut self, url: &'static str, content: &'static [u8]) -> Self {
            self.files.insert(url, content);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn primary_calls(&self) -> usize {
            self.calls.borrow().iter().filter(|u| *u == API).count()
        }
    }

    impl Transport for StubTransport {
        fn get(
            &self,
            url: &str,
            _params: &[(String, String)],
            _timeout: Duration,
        ) -> Result<Bytes, TransportError> {
            self.calls.borrow_mut().push(url.to_string());
            if url == API {
                return match self.primary.borrow_mut().pop_front() {
                    Some(Ok(body)) => Ok(Bytes::from_static(body.as_bytes())),
                    Some(Err(e)) => Err(e),
                    None => Err(TransportError::Connect("no response queued".into())),
                };
            }
            match self.files.get(url) {
                Some(content) => Ok(Bytes::from_static(*content)),
                None => Err(TransportError::Status(404)),
            }
        }
    }

    const TRUE_LIES: &str = r#"{"Response":"True","Title":"True Lies","Year":"1994","Genre":"Action, Thriller","imdbRating":"7.2","Poster":"http://example.com/p.jpg"}"#;

    fn record(
        transport: StubTransport,
        selector: DownloadSelector,
    ) -> MovieRecord<StubTransport> {
        MovieRecord::with_transport(
            "true lies",
            Some(RequestConfig::default().with_url(API)),
            selector,
            transport,
        )
        .unwrap()
    }

    #[test]
    fn construction_does_no_network_access() {
        let rec = record(StubTransport::default(), DownloadSelector::All);
        assert!(!rec.is_fetched());
        assert!(rec.transport().calls().is_empty());
        assert!(rec.cached().is_none());
    }

    #[test]
    fn blank_query_is_invalid() {
        let err = MovieRecord::with_transport(
            "  ",
            None,
            DownloadSelector::None,
            StubTransport::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, RecordError::InvalidArgument(_)));
    }

    #[test]
    fn bad_selector_is_rejected_without_network() {
        let transport = StubTransport::default();
        let err = MovieRecord::with_transport(
            "true lies",
            None,
            DownloadSelector::Many(vec!["poster".into(), String::new()]),
            &transport,
        )
        .err()
        .unwrap();
        assert!(matches!(err, RecordError::InvalidArgument(_)));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn fetch_normalizes_response() {
        let mut rec = record(StubTransport::default().respond(TRUE_LIES), DownloadSelector::None);
        let info = rec.fetch().unwrap();

        assert_eq!(info.get("title"), Some(&FieldValue::Text("True Lies".into())));
        assert_eq!(info.get("year"), Some(&FieldValue::Integer(1994)));
        assert_eq!(
            info.get("genre"),
            Some(&FieldValue::List(vec!["Action".into(), "Thriller".into()]))
        );
        assert_eq!(info.get("imdbrating"), Some(&FieldValue::Float(7.2)));
        assert_eq!(info.get("response"), Some(&FieldValue::Text("True".into())));
        assert_eq!(rec.raw_body(), Some(TRUE_LIES.as_bytes()));
    }

    #[test]
    fn first_access_fetches_exactly_once() {
        let mut rec = record(StubTransport::default().respond(TRUE_LIES), DownloadSelector::None);

        assert_eq!(rec.text("Title").unwrap(), "True Lies");
        assert_eq!(rec.transport().primary_calls(), 1);

        assert_eq!(rec.integer("YEAR").unwrap(), 1994);
        assert_eq!(rec.list("genre").unwrap(), ["Action", "Thriller"]);
        assert!((rec.float("imdbRating").unwrap() - 7.2).abs() < f64::EPSILON);
        assert_eq!(rec.transport().primary_calls(), 1);
    }

    #[test]
    fn missing_field_is_field_not_found() {
        let mut rec = record(StubTransport::default().respond(TRUE_LIES), DownloadSelector::None);
        let err = rec.field("Metascore").unwrap_err();
        assert!(matches!(err, RecordError::FieldNotFound(ref f) if f == "metascore"));
    }

    #[test]
    fn wrong_shape_is_reported() {
        let mut rec = record(StubTransport::default().respond(TRUE_LIES), DownloadSelector::None);
        let err = rec.integer("title").unwrap_err();
        assert!(matches!(
            err,
            RecordError::WrongType { ref field, .. } if field == "title"
        ));
    }

    #[test]
    fn remote_failure_leaves_record_unfetched() {
        let mut rec = record(
            StubTransport::default().respond(r#"{"Response":"False","Error":"Movie not found!"}"#),
            DownloadSelector::None,
        );
        let err = rec.fetch().unwrap_err();
        assert!(matches!(
            err,
            RecordError::Lookup(LookupError::Remote(ref m)) if m == "Movie not found!"
        ));
        assert!(!rec.is_fetched());
    }

    #[test]
    fn lazy_access_surfaces_lookup_error() {
        let mut rec = record(
            StubTransport::default().fail(TransportError::Timeout("15s".into())),
            DownloadSelector::None,
        );
        let err = rec.field("title").unwrap_err();
        assert!(matches!(
            err,
            RecordError::Lookup(LookupError::Transport(TransportError::Timeout(_)))
        ));
        assert!(rec.cached().is_none());
    }

    #[test]
    fn failed_refetch_keeps_previous_result() {
        let mut rec = record(
            StubTransport::default()
                .respond(TRUE_LIES)
                .fail(TransportError::Connect("refused".into())),
            DownloadSelector::None,
        );
        rec.fetch().unwrap();
        let before = rec.cached().cloned();

        let err = rec.fetch().unwrap_err();
        assert!(matches!(err, RecordError::Lookup(_)));
        assert_eq!(rec.cached().cloned(), before);
        assert_eq!(rec.text("title").unwrap(), "True Lies");
    }

    #[test]
    fn refetch_replaces_result_wholesale() {
        let mut rec = record(
            StubTransport::default()
                .respond(TRUE_LIES)
                .respond(r#"{"Response":"True","Title":"Heat"}"#),
            DownloadSelector::None,
        );
        rec.fetch().unwrap();
        rec.fetch().unwrap();

        assert_eq!(rec.text("title").unwrap(), "Heat");
        assert!(matches!(rec.field("year"), Err(RecordError::FieldNotFound(_))));
        assert_eq!(rec.transport().primary_calls(), 2);
    }

    #[test]
    fn selected_url_field_is_downloaded() {
        let transport = StubTransport::default()
            .respond(TRUE_LIES)
            .file("http://example.com/p.jpg", b"\xff\xd8jpeg");
        let mut rec = record(transport, DownloadSelector::Many(vec!["poster".into()]));
        rec.fetch().unwrap();

        assert_eq!(rec.download("Poster").map(|b| &b[..]), Some(&b"\xff\xd8jpeg"[..]));
        assert_eq!(rec.downloads().count(), 1);
    }

    #[test]
    fn failed_download_is_omitted() {
        let mut rec = record(
            StubTransport::default().respond(TRUE_LIES),
            DownloadSelector::Many(vec!["poster".into()]),
        );
        rec.fetch().unwrap();

        assert!(rec.download("poster").is_none());
        assert_eq!(rec.downloads().count(), 0);
        assert_eq!(
            rec.transport().calls(),
            vec![API.to_string(), "http://example.com/p.jpg".to_string()]
        );
    }

    #[test]
    fn non_url_and_unselected_fields_are_not_downloaded() {
        let mut rec = record(
            StubTransport::default().respond(TRUE_LIES),
            DownloadSelector::Many(vec!["title".into()]),
        );
        rec.fetch().unwrap();

        assert_eq!(rec.downloads().count(), 0);
        assert_eq!(rec.transport().calls(), vec![API.to_string()]);
    }

    #[test]
    fn select_all_downloads_every_url_field() {
        let transport = StubTransport::default()
            .respond(
                r#"{"Response":"True","Poster":"http://example.com/p.jpg","Website":"https://example.com/"}"#,
            )
            .file("http://example.com/p.jpg", b"poster")
            .file("https://example.com/", b"<html>");
        let mut rec = record(transport, DownloadSelector::All);
        rec.fetch().unwrap();

        let names: Vec<&str> = rec.downloads().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["poster", "website"]);
    }
}
