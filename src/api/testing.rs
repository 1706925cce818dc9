//! In-process stand-ins for the content API used by tests

use async_trait::async_trait;
use axum::{
    extract::{Query as QueryParams, State},
    routing::get,
    Json, Router,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::client::{ApiError, ContentSource};
use super::document::SearchResponse;
use super::query::Query;

/// A full `post` document with one content section
pub fn post_document(uid: &str, published: &str) -> Value {
    json!({
        "id": format!("id-{}", uid),
        "uid": uid,
        "type": "post",
        "first_publication_date": published,
        "last_publication_date": published,
        "data": {
            "title": format!("Title of {}", uid),
            "subtitle": format!("Subtitle of {}", uid),
            "author": "Joseph Oliveira",
            "banner": { "url": format!("https://images.example.com/{}.png", uid) },
            "content": [{
                "heading": "Proin et varius",
                "body": [{ "type": "paragraph", "text": "Nullam dolor sapien, vulputate eu diam at.", "spans": [] }]
            }]
        }
    })
}

struct FakeState {
    endpoint: String,
    documents: Vec<Value>,
    hits: Arc<AtomicUsize>,
}

/// A content API served by axum on an ephemeral localhost port.
///
/// Documents carrying `"draft": true` are only visible under the
/// `preview` ref.
pub struct FakeApi {
    pub endpoint: String,
    pub hits: Arc<AtomicUsize>,
}

impl FakeApi {
    pub async fn spawn(documents: Vec<Value>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = format!("http://{}/api/v2", addr);
        let hits = Arc::new(AtomicUsize::new(0));

        let state = Arc::new(FakeState {
            endpoint: endpoint.clone(),
            documents,
            hits: hits.clone(),
        });

        let app = Router::new()
            .route("/api/v2", get(api_root))
            .route("/api/v2/documents/search", get(search))
            .with_state(state);

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { endpoint, hits }
    }

    pub fn search_hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn api_root() -> Json<Value> {
    Json(json!({
        "refs": [
            { "id": "master", "ref": "master", "label": "Master", "isMasterRef": true },
            { "id": "preview", "ref": "preview", "label": "Draft", "isMasterRef": false }
        ]
    }))
}

async fn search(
    State(state): State<Arc<FakeState>>,
    QueryParams(params): QueryParams<HashMap<String, String>>,
) -> Json<Value> {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let reference = params.get("ref").cloned().unwrap_or_default();
    let q = params.get("q").cloned().unwrap_or_default();

    let mut docs: Vec<&Value> = state
        .documents
        .iter()
        .filter(|d| reference == "preview" || !d["draft"].as_bool().unwrap_or(false))
        .collect();

    if let Some(uid) = requested_value(&q, ".uid") {
        docs.retain(|d| d["uid"] == uid.as_str());
    }
    if let Some(id) = requested_value(&q, "document.id") {
        docs.retain(|d| d["id"] == id.as_str());
    }

    if let Some(orderings) = params.get("orderings") {
        if orderings.contains("first_publication_date") {
            docs.sort_by(|a, b| {
                a["first_publication_date"]
                    .as_str()
                    .cmp(&b["first_publication_date"].as_str())
            });
            if orderings.contains("desc") {
                docs.reverse();
            }
        }
    }

    if let Some(after) = params.get("after") {
        if let Some(pos) = docs.iter().position(|d| d["id"] == after.as_str()) {
            docs = docs.split_off(pos + 1);
        }
    }

    let page_size: usize = params
        .get("pageSize")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let page: usize = params
        .get("page")
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let total_pages = docs.len().div_ceil(page_size).max(1);
    let results: Vec<Value> = docs
        .iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|d| (*d).clone())
        .collect();

    let next_page = (page < total_pages).then(|| {
        let mut url = format!(
            "{}/documents/search?ref={}&q={}&pageSize={}&page={}",
            state.endpoint,
            reference,
            utf8_percent_encode(&q, NON_ALPHANUMERIC),
            page_size,
            page + 1
        );
        if let Some(orderings) = params.get("orderings") {
            url.push_str("&orderings=");
            url.push_str(&utf8_percent_encode(orderings, NON_ALPHANUMERIC).to_string());
        }
        url
    });

    Json(json!({
        "page": page,
        "results_per_page": page_size,
        "total_results_size": docs.len(),
        "total_pages": total_pages,
        "next_page": next_page,
        "prev_page": null,
        "results": results,
    }))
}

/// Value of the `at` predicate whose path ends with `path`
fn requested_value(q: &str, path: &str) -> Option<String> {
    let needle = format!("{}, \"", path);
    let start = q.find(&needle)? + needle.len();
    let rest = &q[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// In-memory source keyed by cursor URL
pub struct PagedSource {
    pub first: SearchResponse,
    pub pages: HashMap<String, SearchResponse>,
    pub calls: AtomicUsize,
    /// When set, every `fetch_page` waits for a permit
    pub gate: Option<Arc<Semaphore>>,
}

impl PagedSource {
    pub fn new(first: SearchResponse) -> Self {
        Self {
            first,
            pages: HashMap::new(),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn with_page(mut self, url: &str, page: SearchResponse) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for PagedSource {
    async fn query(&self, _query: &Query) -> Result<SearchResponse, ApiError> {
        Ok(self.first.clone())
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        self.pages.get(url).cloned().ok_or_else(|| ApiError::Status {
            url: url.to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        })
    }
}

/// A page of `post` documents with the given cursor
pub fn page_of(uids: &[&str], next_page: Option<&str>) -> SearchResponse {
    let results = uids
        .iter()
        .map(|uid| serde_json::from_value(post_document(uid, "2021-03-15T19:25:28+0000")).unwrap())
        .collect();
    SearchResponse {
        page: 1,
        results_per_page: uids.len() as u32,
        next_page: next_page.map(str::to_string),
        results,
        ..Default::default()
    }
}
