use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use tracing::{debug, info};

use crate::router::{RequestRouter, RouteOutcome};

/// Every path lands in the same handler; routing is done by [`RequestRouter`].
pub fn app(router: Arc<RequestRouter>) -> Router {
    Router::new().fallback(handle_request).with_state(router)
}

async fn handle_request(
    State(router): State<Arc<RequestRouter>>,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let path = uri.path().trim_start_matches('/');

    let outcome = router.route(path, &query, &body).await;

    debug!(
        "Ending request. Total time: {:.6} seconds",
        started.elapsed().as_secs_f64()
    );

    match outcome {
        RouteOutcome::Handled => StatusCode::OK.into_response(),
        RouteOutcome::Redirect(location) => {
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
    }
}

pub async fn serve(listen: &str, router: Arc<RequestRouter>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind to {}", listen))?;

    info!("Listening for webhooks on {}", listen);

    axum::serve(listener, app(router))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::bots::unreal4u::Unreal4uBot;
    use crate::bots::uptime_monitor::UptimeMonitorBot;
    use crate::config::{BotConfig, BotKind};
    use crate::media::MediaArchive;
    use crate::platform::fake::FakeTransport;
    use crate::registry::BotRegistry;
    use crate::storage::monitor::MonitorStore;
    use crate::storage::Database;

    fn test_app(transport: Arc<FakeTransport>, media: &tempfile::TempDir) -> Router {
        let db = Database::open_in_memory().unwrap();
        let registry = BotRegistry::from_config(&[BotConfig {
            path: "hook/u4u".to_string(),
            name: "unreal4uBot".to_string(),
            kind: BotKind::Unreal4u,
            token: "1:u4u".to_string(),
        }]);
        let router = RequestRouter::new(
            registry,
            transport,
            Unreal4uBot::new(MediaArchive::new(media.path().to_path_buf(), "http://m")),
            UptimeMonitorBot::new(MonitorStore::new(db.connection()), "", "UptimeMonitorBot"),
            "UptimeMonitorBot",
            "https://github.com/unreal4u?tab=repositories",
        );
        app(Arc::new(router))
    }

    #[tokio::test]
    async fn test_bot_path_returns_empty_ok() {
        let media = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::default());
        let app = test_app(transport.clone(), &media);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/hook/u4u")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"callback_query":{"id":"c","data":"d","message":{"chat":{"id":3}}}}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert_eq!(transport.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_path_redirects_with_302() {
        let media = tempfile::tempdir().unwrap();
        let app = test_app(Arc::new(FakeTransport::default()), &media);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/randompath?x=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://github.com/unreal4u?tab=repositories"
        );
    }

    #[tokio::test]
    async fn test_blacklisted_chat_returns_ok() {
        let media = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::blacklisting(3));
        let app = test_app(transport.clone(), &media);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/hook/u4u")
                    .body(Body::from(
                        r#"{"callback_query":{"id":"c","data":"d","message":{"chat":{"id":3}}}}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(transport.delivered().is_empty());
    }
}
