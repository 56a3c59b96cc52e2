use std::io;
use std::sync::Arc;

use ntex::http::header::AUTHORIZATION;
use ntex::http::Method;
use ntex::util::BytesMut;
use ntex::web;
use ntex::web::HttpRequest;
use serde_json::json;
use spdlog::{info, warn};
use uuid::Uuid;

use crate::config::{Config, Credentials};
use crate::filename::FilenameDeriver;
use crate::identity::{GoogleVerifier, TokenVerifier};
use crate::publisher::{PublishError, Publisher};
use crate::store::{ContentStore, GithubContents};
use crate::submission::PostSubmission;

pub type GithubPublisher = Publisher<GoogleVerifier, GithubContents>;

/// Largest request body accepted by `POST /api/post`, in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyLimit(pub usize);

/// Reads the whole body, failing as soon as it grows past `limit`.
async fn collect_body(payload: &mut web::types::Payload, limit: BodyLimit) -> Result<BytesMut, PublishError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.recv().await {
        let chunk = chunk.map_err(|e| PublishError::InvalidBody(e.to_string()))?;
        if body.len() + chunk.len() > limit.0 {
            return Err(PublishError::BodyTooLarge(limit.0));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Token from `Authorization: Bearer <token>`. A header without the scheme is taken as the token itself.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub fn error_response(err: &PublishError) -> web::HttpResponse {
    match err {
        PublishError::Unauthorized => web::HttpResponse::Unauthorized()
            .json(&json!({ "error": "Missing token" })),
        PublishError::Forbidden => web::HttpResponse::Forbidden()
            .json(&json!({ "error": "Invalid token" })),
        PublishError::BadRequest { missing, invalid } => web::HttpResponse::BadRequest()
            .json(&json!({ "error": "Missing required fields", "fields": missing, "invalid": invalid })),
        PublishError::InvalidBody(detail) => web::HttpResponse::BadRequest()
            .json(&json!({ "error": "Invalid request body", "detail": detail })),
        PublishError::BodyTooLarge(limit) => web::HttpResponse::PayloadTooLarge()
            .json(&json!({ "error": "Request body too large", "limit": limit })),
        PublishError::UpstreamError(detail) => web::HttpResponse::InternalServerError()
            .json(&json!({ "error": "Failed to upload", "detail": detail })),
    }
}

async fn publish_post<V, S>(
    req: HttpRequest,
    mut payload: web::types::Payload,
    limit: web::types::State<BodyLimit>,
    state: web::types::State<Arc<Publisher<V, S>>>) -> web::HttpResponse
    where
        V: TokenVerifier + 'static,
        S: ContentStore + 'static,
{
    let request_id = Uuid::new_v4();
    let token = bearer_token(&req);

    // Authentication comes before looking at the body
    if let Err(e) = state.authenticate(&request_id, token.as_deref()).await {
        return error_response(&e);
    }

    let body = match collect_body(&mut payload, *limit).await {
        Ok(body) => body,
        Err(e) => {
            warn!("[{}] request body rejected: {}", request_id, e);
            return error_response(&e);
        }
    };

    let submission = match PostSubmission::from_json(&body) {
        Ok(submission) => submission,
        Err(e) => {
            warn!("[{}] unreadable request body: {}", request_id, e);
            return error_response(&PublishError::InvalidBody(e.to_string()));
        }
    };

    match state.publish_verified(&request_id, &submission).await {
        Ok(published) => web::HttpResponse::Ok().json(&published),
        Err(e) => error_response(&e),
    }
}

async fn preflight() -> web::HttpResponse {
    web::HttpResponse::NoContent()
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Authorization, Content-Type")
        .header("Access-Control-Max-Age", "86400")
        .finish()
}

#[web::get("/health")]
async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&json!({ "status": "ok" }))
}

/// Routes of the service. The publisher and the `BodyLimit` must already be registered as application state.
pub fn configure_api<V, S>(cfg: &mut web::ServiceConfig)
    where
        V: TokenVerifier + 'static,
        S: ContentStore + 'static,
{
    cfg.service(health)
        .service(web::resource("/api/post")
            .route(web::post().to(publish_post::<V, S>))
            .route(web::method(Method::OPTIONS).to(preflight)));
}

pub fn cors_headers() -> web::middleware::DefaultHeaders {
    web::middleware::DefaultHeaders::new()
        .header("Access-Control-Allow-Origin", "*")
}

pub fn build_publisher(config: &Config, credentials: &Credentials) -> io::Result<GithubPublisher> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent())
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Error creating HTTP client: {}", e)))?;

    let verifier = GoogleVerifier::new(client.clone(), &credentials.google_client_id, config.tokeninfo_url());
    let store = GithubContents::new(client, config.api_url(), &credentials.github_repo,
                                    &credentials.branch, &credentials.github_token, config.user_agent());
    let deriver = FilenameDeriver::new(config.category_slugs(), config.deriver_options()?);

    Ok(Publisher::new(verifier, store, deriver, config.publish_options()))
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let credentials = config.credentials()?;
    let publisher = build_publisher(&config, &credentials)?;

    info!("Publishing into {} on branch {}", credentials.github_repo, credentials.branch);
    info!("{} category labels mapped, fallback slug {}",
          publisher.deriver().categories().len(), publisher.deriver().categories().default_slug());

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    let body_limit = BodyLimit(config.server.max_body_bytes);
    let publisher = Arc::new(publisher);

    web::HttpServer::new(move || {
        web::App::new()
            .state(publisher.clone())
            .state(body_limit)
            .configure(configure_api::<GoogleVerifier, GithubContents>)
            .wrap(cors_headers())
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}
