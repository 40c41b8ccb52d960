//! HTTP adapter for the dashboard.
//!
//! Routes:
//!   GET /                   dashboard page for the query's filters
//!   GET /api/panels/{id}    panel aggregate as JSON
//!   GET /panels/{id}.svg    rendered panel

use super::page::render_page;
use super::{default_filters, parse_filters, Panel, PanelLimits};
use crate::dataset::Snapshot;
use crate::models::Filters;
use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Shared, read-only state handed to every request.
#[derive(Debug)]
pub struct AppState {
    pub snapshot: Arc<Snapshot>,
    pub limits: PanelLimits,
    defaults: Filters,
}

impl AppState {
    pub fn new(snapshot: Arc<Snapshot>, limits: PanelLimits) -> Self {
        let defaults = default_filters(&snapshot);
        Self {
            snapshot,
            limits,
            defaults,
        }
    }
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn text(status: StatusCode, message: String) -> Response<Full<Bytes>> {
    respond(status, "text/plain; charset=utf-8", message)
}

fn render_error(panel: Panel, err: anyhow::Error) -> Response<Full<Bytes>> {
    error!("Failed to render {}: {:#}", panel, err);
    text(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("failed to render {}", panel),
    )
}

/// Answer one request.
pub fn route(
    state: &AppState,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    if *method != Method::GET {
        return text(StatusCode::METHOD_NOT_ALLOWED, "only GET is supported".to_string());
    }

    enum Target {
        Page,
        Json(Panel),
        Svg(Panel),
    }

    let target = if path == "/" {
        Some(Target::Page)
    } else if let Some(id) = path.strip_prefix("/api/panels/") {
        id.parse().ok().map(Target::Json)
    } else if let Some(id) = path
        .strip_prefix("/panels/")
        .and_then(|rest| rest.strip_suffix(".svg"))
    {
        id.parse().ok().map(Target::Svg)
    } else {
        None
    };

    let Some(target) = target else {
        return text(StatusCode::NOT_FOUND, format!("no route for {}", path));
    };

    let filters = match parse_filters(query, &state.defaults) {
        Ok(filters) => filters,
        Err(err) => {
            warn!("Rejected filters {:?}: {}", query, err);
            return text(StatusCode::BAD_REQUEST, err.to_string());
        }
    };
    let snapshot = state.snapshot.as_ref();

    match target {
        Target::Page => {
            let mut panels = Vec::with_capacity(Panel::ALL.len());
            for panel in Panel::ALL {
                let data = panel.compute_with(snapshot, &filters, &state.limits);
                match panel.render(&data) {
                    Ok(svg) => panels.push((panel, svg)),
                    Err(err) => return render_error(panel, err),
                }
            }
            let span = snapshot.year_span();
            respond(
                StatusCode::OK,
                "text/html; charset=utf-8",
                render_page(span.as_ref(), &filters, &panels),
            )
        }
        Target::Json(panel) => {
            let data = panel.compute_with(snapshot, &filters, &state.limits);
            let body = json!({
                "id": panel.id(),
                "title": panel.title(),
                "filters": {
                    "years": [filters.years.start(), filters.years.end()],
                    "ratings": [filters.ratings.start(), filters.ratings.end()],
                },
                "panel": data,
            });
            respond(StatusCode::OK, "application/json", body.to_string())
        }
        Target::Svg(panel) => {
            let data = panel.compute_with(snapshot, &filters, &state.limits);
            match panel.render(&data) {
                Ok(svg) => respond(StatusCode::OK, "image/svg+xml", svg),
                Err(err) => render_error(panel, err),
            }
        }
    }
}

async fn handle(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    debug!("{} {}", method, req.uri());

    // Panels are computed on the blocking pool.
    let response =
        tokio::task::spawn_blocking(move || route(&state, &method, &path, query.as_deref()))
            .await
            .unwrap_or_else(|err| {
                error!("Request task failed: {}", err);
                text(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            });

    Ok(response)
}

/// Accept connections on `listener` until the task is dropped.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                // EMFILE and aborted handshakes are transient.
                warn!("Failed to accept connection: {}", err);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle(state.clone(), req));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection from {} ended with error: {}", peer, err);
            }
        });
    }
}

/// Bind `addr` and serve the dashboard until Ctrl-C.
pub async fn run(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);

    tokio::select! {
        result = serve(listener, state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down dashboard");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::counts::parse_count_line;
    use crate::dataset::reviews::parse_review_line;
    use crate::dataset::TimeZoneMode;

    fn state() -> Arc<AppState> {
        let mut counts: Vec<_> = [
            "2015-01-positive-5-B001\t10",
            "2016-02-negative-1-B002\t4",
        ]
        .iter()
        .map(|l| parse_count_line(l).unwrap())
        .collect();
        counts[0].title = Some("Game A".to_string());

        let reviews = vec![parse_review_line(
            r#"{"rating": 1, "title": "Bad", "text": "xbox controller broke", "sentiment": "negative", "timestamp": 1579046400000}"#,
            TimeZoneMode::Utc,
        )
        .unwrap()];

        Arc::new(AppState::new(
            Arc::new(Snapshot::new(counts, reviews)),
            PanelLimits::default(),
        ))
    }

    async fn start() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, state()));
        format!("http://{}", addr)
    }

    #[test]
    fn test_route_statuses() {
        let state = state();
        let get = Method::GET;

        assert_eq!(route(&state, &get, "/", None).status(), StatusCode::OK);
        assert_eq!(route(&state, &get, "/nope", None).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            route(&state, &get, "/api/panels/unknown-chart", None).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            route(&state, &get, "/panels/rating-pie-chart", None).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            route(&state, &get, "/", Some("rating_min=9")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            route(&state, &Method::POST, "/", None).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_dashboard_page() {
        let base = start().await;
        let response = reqwest::get(format!("{}/?year_min=2015&year_max=2016", base))
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body = response.text().await.unwrap();
        for panel in Panel::ALL {
            assert!(body.contains(&format!("id=\"{}\"", panel.id())));
        }
        assert!(body.contains("<svg"));
    }

    #[tokio::test]
    async fn test_serve_survives_dropped_connections() {
        let base = start().await;
        let addr = base.trim_start_matches("http://").to_string();
        for _ in 0..3 {
            let stream = tokio::net::TcpStream::connect(&addr).await.unwrap();
            drop(stream);
        }

        let response = reqwest::get(format!("{}/api/panels/rating-pie-chart", base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_panel_json() {
        let base = start().await;
        let value: serde_json::Value =
            reqwest::get(format!("{}/api/panels/rating-pie-chart?year_min=2016", base))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();

        assert_eq!(value["id"], "rating-pie-chart");
        assert_eq!(value["filters"]["years"], json!([2016, 2016]));
        assert_eq!(value["panel"]["kind"], "distribution");
        assert_eq!(value["panel"]["data"]["total"], 4);
        assert_eq!(value["panel"]["data"]["slices"][0]["label"], "1");
    }

    #[tokio::test]
    async fn test_panel_svg_and_errors() {
        let base = start().await;

        let response = reqwest::get(format!("{}/panels/top-products-chart.svg", base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "image/svg+xml"
        );
        assert!(response.text().await.unwrap().contains("Game A"));

        let missing = reqwest::get(format!("{}/panels/nope.svg", base)).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        let bad = reqwest::get(format!("{}/api/panels/wordcloud-image?rating_min=x", base))
            .await
            .unwrap();
        assert_eq!(bad.status(), reqwest::StatusCode::BAD_REQUEST);
    }
}
