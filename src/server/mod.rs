//! Blog server with incremental regeneration and preview mode
//!
//! Listing and post pages are rendered on first request and kept in a
//! `RenderCache` for `revalidate_secs`. After that the next request renders
//! again; if that fails, the stale copy is served. Requests carrying the
//! preview cookie always render against the preview ref and skip the cache.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{
        header::{COOKIE, REFERER, SET_COOKIE},
        HeaderMap, Request, StatusCode,
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::{Lookup, RenderCache};
use crate::config::SiteConfig;
use crate::generator::Generator;
use crate::helpers::{listing_path, post_path, url_for};
use crate::Blog;

/// Cookie holding the preview ref
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Server state
struct ServerState {
    config: SiteConfig,
    generator: Generator,
    cache: RenderCache,
    static_dir: PathBuf,
    home: String,
}

impl ServerState {
    fn not_found(&self, preview: bool) -> Response {
        match self.generator.pages().not_found(preview) {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => render_error(e),
        }
    }

    /// Placeholder that retries while the content API is unreachable
    fn unavailable(&self, path: &str) -> Response {
        match self.generator.pages().loading(path) {
            Ok(html) => (StatusCode::SERVICE_UNAVAILABLE, Html(html)).into_response(),
            Err(e) => render_error(e),
        }
    }
}

fn render_error(e: anyhow::Error) -> Response {
    tracing::error!("Template error: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Build the application router
pub fn router(blog: &Blog, generator: Generator) -> Router {
    let state = Arc::new(ServerState {
        config: blog.config.clone(),
        generator,
        cache: RenderCache::new(Duration::from_secs(blog.config.revalidate_secs)),
        static_dir: blog.static_dir.clone(),
        home: url_for(&blog.config, ""),
    });

    let listing = format!("/{}/:page", blog.config.pagination_dir.trim_matches('/'));

    let app = Router::new()
        .route("/", get(home_handler))
        .route(&listing, get(listing_handler))
        .route(&format!("{}/", listing), get(listing_handler))
        .route("/post/:uid", get(post_handler))
        .route("/post/:uid/", get(post_handler))
        .route("/api/preview", get(enter_preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let root = blog.config.root.trim_end_matches('/');
    if root.is_empty() {
        app
    } else {
        Router::new().nest(root, app)
    }
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let generator = Generator::new(blog, blog.client()?)?;
    let app = router(blog, generator);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}{}", ip, port, url_for(&blog.config, ""));
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Preview ref from the request cookies
fn preview_ref(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == PREVIEW_COOKIE)
        .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
        .filter(|reference| !reference.is_empty())
}

/// Serve a rendered page, going through the cache unless in preview.
/// `key` names the cache slot, `path` is the site path of the page.
async fn serve_page<F>(
    state: &ServerState,
    key: &str,
    path: &str,
    preview: bool,
    render: F,
) -> Response
where
    F: Future<Output = Result<Option<String>>>,
{
    if preview {
        return match render.await {
            Ok(Some(html)) => Html(html).into_response(),
            Ok(None) => state.not_found(true),
            Err(e) => {
                tracing::error!("Failed to render preview of {}: {:#}", key, e);
                state.unavailable(path)
            }
        };
    }

    let stale = match state.cache.lookup(key) {
        Lookup::Fresh(html) => return Html(html).into_response(),
        Lookup::Stale(html) => Some(html),
        Lookup::Missing => None,
    };

    match render.await {
        Ok(Some(html)) => {
            state.cache.store(key, html.clone());
            Html(html).into_response()
        }
        Ok(None) => {
            state.cache.invalidate(key);
            state.not_found(false)
        }
        Err(e) => match stale {
            Some(html) => {
                tracing::warn!("Serving stale {} after failed re-render: {:#}", key, e);
                Html(html).into_response()
            }
            None => {
                tracing::error!("Failed to render {}: {:#}", key, e);
                state.unavailable(path)
            }
        },
    }
}

async fn home_handler(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let reference = preview_ref(&headers);
    let preview = reference.is_some();
    let render = state.generator.render_listing(1, reference);
    serve_page(&state, "listing:1", "", preview, render).await
}

async fn listing_handler(
    State(state): State<Arc<ServerState>>,
    Path(page): Path<String>,
    headers: HeaderMap,
) -> Response {
    let reference = preview_ref(&headers);
    let preview = reference.is_some();
    let page = match page.parse::<usize>() {
        Ok(page) if page >= 1 => page,
        _ => return state.not_found(preview),
    };

    let key = format!("listing:{}", page);
    let path = listing_path(&state.config, page);
    let render = state.generator.render_listing(page, reference);
    serve_page(&state, &key, &path, preview, render).await
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Response {
    let reference = preview_ref(&headers);
    let preview = reference.is_some();

    let key = format!("post:{}", uid);
    let path = post_path(&uid);
    let render = state.generator.render_post(&uid, reference);
    serve_page(&state, &key, &path, preview, render).await
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: String,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Enter preview mode: remember the ref and go to the previewed document
async fn enter_preview_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<PreviewParams>,
) -> Response {
    if params.token.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing preview token").into_response();
    }

    let location = match &params.document_id {
        Some(id) => match state
            .generator
            .document_path(id, Some(params.token.clone()))
            .await
        {
            Ok(Some(path)) => path,
            Ok(None) => state.home.clone(),
            Err(e) => {
                tracing::warn!("Failed to resolve preview document {}: {:#}", id, e);
                state.home.clone()
            }
        },
        None => state.home.clone(),
    };

    tracing::info!("Entering preview, redirecting to {}", location);
    let cookie = format!(
        "{}={}; Path=/; SameSite=Lax",
        PREVIEW_COOKIE,
        utf8_percent_encode(&params.token, NON_ALPHANUMERIC)
    );
    ([(SET_COOKIE, cookie)], Redirect::temporary(&location)).into_response()
}

/// Leave preview mode and go back where the reader came from
async fn exit_preview_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Response {
    let location = headers
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|referer| !referer.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| state.home.clone());

    let cookie = format!("{}=; Path=/; Max-Age=0", PREVIEW_COOKIE);
    ([(SET_COOKIE, cookie)], Redirect::temporary(&location)).into_response()
}

/// Static assets, or the 404 page
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let preview = preview_ref(request.headers()).is_some();

    let mut service = ServeDir::new(&state.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => state.not_found(preview),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{page_of, post_document, FakeApi, PagedSource};
    use crate::api::{ApiError, ContentClient, ContentSource, SearchResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn spawn(blog: &Blog, source: Arc<dyn ContentSource>) -> String {
        let generator = Generator::new(blog, source).unwrap();
        let app = router(blog, generator);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    fn http() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    struct Site {
        _dir: tempfile::TempDir,
        api: FakeApi,
        url: String,
    }

    async fn site_with(docs: Vec<serde_json::Value>) -> Site {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("static/images")).unwrap();
        std::fs::write(dir.path().join("static/images/logo.svg"), "<svg/>").unwrap();

        let api = FakeApi::spawn(docs).await;
        let mut config = SiteConfig::default();
        config.api.endpoint = api.endpoint.clone();
        let blog = Blog::with_config(dir.path().to_path_buf(), config).unwrap();
        let client = ContentClient::new(&blog.config.api).unwrap();
        let url = spawn(&blog, Arc::new(client)).await;
        Site {
            _dir: dir,
            api,
            url,
        }
    }

    #[test]
    fn test_preview_ref_from_cookies() {
        let mut headers = HeaderMap::new();
        assert_eq!(preview_ref(&headers), None);

        headers.insert(
            COOKIE,
            "theme=dark; io.prismic.preview=YF%2Dpreview%7E1; other=x"
                .parse()
                .unwrap(),
        );
        assert_eq!(preview_ref(&headers).as_deref(), Some("YF-preview~1"));
    }

    #[tokio::test]
    async fn test_home_without_cursor_has_no_load_more() {
        let site = site_with(vec![
            post_document("first", "2021-03-01T10:00:00+0000"),
            post_document("second", "2021-03-02T10:00:00+0000"),
        ])
        .await;

        let response = http().get(format!("{}/", site.url)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = response.text().await.unwrap();
        assert!(html.contains("Title of second"));
        assert!(html.contains("Title of first"));
        assert!(!html.contains("load-more"));
    }

    #[tokio::test]
    async fn test_listing_pages_and_cache() {
        let site = site_with(vec![
            post_document("first", "2021-03-01T10:00:00+0000"),
            post_document("second", "2021-03-02T10:00:00+0000"),
            post_document("third", "2021-03-03T10:00:00+0000"),
        ])
        .await;

        let home = http()
            .get(format!("{}/", site.url))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(home.contains(r#"href="/page/2/""#));

        let hits = site.api.search_hits();
        let again = http()
            .get(format!("{}/", site.url))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(again, home);
        assert_eq!(site.api.search_hits(), hits);

        let page2 = http()
            .get(format!("{}/page/2/", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(page2.status(), StatusCode::OK);
        assert!(page2.text().await.unwrap().contains("Title of first"));

        let page9 = http()
            .get(format!("{}/page/9/", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(page9.status(), StatusCode::NOT_FOUND);

        let bogus = http()
            .get(format!("{}/page/abc/", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(bogus.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_post_page_and_unknown_uid() {
        let site = site_with(vec![post_document("hooks", "2021-03-01T10:00:00+0000")]).await;

        let post = http()
            .get(format!("{}/post/hooks/", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(post.status(), StatusCode::OK);
        let html = post.text().await.unwrap();
        assert!(html.contains("<h1>Title of hooks</h1>"));
        assert!(html.contains("01 mar 2021"));

        let missing = http()
            .get(format!("{}/post/nope/", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert!(missing.text().await.unwrap().contains("Página não encontrada"));
    }

    #[tokio::test]
    async fn test_static_assets() {
        let site = site_with(vec![]).await;

        let logo = http()
            .get(format!("{}/images/logo.svg", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(logo.status(), StatusCode::OK);
        assert_eq!(logo.text().await.unwrap(), "<svg/>");

        let missing = http()
            .get(format!("{}/images/none.png", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preview_flow() {
        let mut draft = post_document("draft", "2021-03-05T10:00:00+0000");
        draft["draft"] = serde_json::Value::Bool(true);
        let site = site_with(vec![draft]).await;

        let enter = http()
            .get(format!(
                "{}/api/preview?token=preview&documentId=id-draft",
                site.url
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(enter.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(enter.headers()["location"], "/post/draft/");
        let cookie = enter.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("io.prismic.preview=preview;"));

        let hidden = http()
            .get(format!("{}/post/draft/", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

        let previewed = http()
            .get(format!("{}/post/draft/", site.url))
            .header(COOKIE, "io.prismic.preview=preview")
            .send()
            .await
            .unwrap();
        assert_eq!(previewed.status(), StatusCode::OK);
        let html = previewed.text().await.unwrap();
        assert!(html.contains("Title of draft"));
        assert!(html.contains("Sair do modo Preview"));
    }

    #[tokio::test]
    async fn test_exit_preview() {
        let site = site_with(vec![]).await;

        let back = http()
            .get(format!("{}/api/exit-preview", site.url))
            .header(REFERER, "http://localhost:4000/post/hooks/")
            .send()
            .await
            .unwrap();
        assert_eq!(back.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(back.headers()["location"], "http://localhost:4000/post/hooks/");
        assert!(back.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));

        let home = http()
            .get(format!("{}/api/exit-preview", site.url))
            .send()
            .await
            .unwrap();
        assert_eq!(home.headers()["location"], "/");
    }

    /// A source whose first page can be switched off
    struct Flaky {
        inner: PagedSource,
        down: AtomicBool,
    }

    #[async_trait]
    impl ContentSource for Flaky {
        async fn query(&self, query: &crate::api::Query) -> Result<SearchResponse, ApiError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(ApiError::NoMasterRef);
            }
            self.inner.query(query).await
        }

        async fn fetch_page(&self, url: &str) -> Result<SearchResponse, ApiError> {
            self.inner.fetch_page(url).await
        }
    }

    #[tokio::test]
    async fn test_stale_page_served_when_rerender_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.revalidate_secs = 0;
        let blog = Blog::with_config(dir.path().to_path_buf(), config).unwrap();

        let source = Arc::new(Flaky {
            inner: PagedSource::new(page_of(&["a"], None)),
            down: AtomicBool::new(false),
        });
        let url = spawn(&blog, source.clone()).await;

        let first = http().get(format!("{}/", url)).send().await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let first = first.text().await.unwrap();

        source.down.store(true, Ordering::SeqCst);
        let stale = http().get(format!("{}/", url)).send().await.unwrap();
        assert_eq!(stale.status(), StatusCode::OK);
        assert_eq!(stale.text().await.unwrap(), first);

        let uncached = http().get(format!("{}/post/a/", url)).send().await.unwrap();
        assert_eq!(uncached.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(uncached.text().await.unwrap().contains("Carregando..."));
    }

    #[tokio::test]
    async fn test_loading_page_escapes_requested_uid() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default()).unwrap();

        let source = Arc::new(Flaky {
            inner: PagedSource::new(page_of(&["a"], None)),
            down: AtomicBool::new(true),
        });
        let url = spawn(&blog, source).await;

        let response = http()
            .get(format!(
                "{}/post/%22%3E%3Cscript%3Ealert(1)%3C%2Fscript%3E/",
                url
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let html = response.text().await.unwrap();
        assert!(!html.contains("<script>alert(1)"));
        assert!(!html.contains("post:"));
        assert!(html.contains("/post/&quot;&gt;&lt;script&gt;alert(1)&lt;/script&gt;/"));

        let listing = http().get(format!("{}/page/3/", url)).send().await.unwrap();
        assert_eq!(listing.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(listing
            .text()
            .await
            .unwrap()
            .contains(r#"<link rel="canonical" href="http://localhost:4000/page/3/">"#));
    }
}
