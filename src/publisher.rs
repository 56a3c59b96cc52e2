use std::fmt::{Display, Formatter};

use spdlog::{debug, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::filename::FilenameDeriver;
use crate::identity::{Identity, TokenVerifier};
use crate::store::{ContentStore, FileWrite, Probe};
use crate::submission::PostSubmission;

#[derive(Debug, Error, PartialEq)]
pub enum PublishError {
    #[error("missing token")]
    Unauthorized,
    #[error("invalid token")]
    Forbidden,
    #[error("bad request: missing {missing:?}, invalid {invalid:?}")]
    BadRequest {
        missing: Vec<&'static str>,
        invalid: Vec<&'static str>,
    },
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("request body larger than {0} bytes")]
    BodyTooLarge(usize),
    #[error("upload failed: {0}")]
    UpstreamError(String),
}

/// Steps a request walks through. Used for logging only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Received,
    Authenticating,
    Validating,
    ProbePending,
    Writing,
    Succeeded,
    Failed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Authenticating => "authenticating",
            Stage::Validating => "validating",
            Stage::ProbePending => "probe-pending",
            Stage::Writing => "writing",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Published {
    pub success: bool,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublishOptions {
    /// Keep going as if the file did not exist when the existence probe fails.
    /// An existing file then gets a write without `sha`, which the store rejects.
    pub probe_errors_as_absent: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            probe_errors_as_absent: true,
        }
    }
}

/// Turns an authenticated submission into one create-or-update of a markdown file.
pub struct Publisher<V, S> {
    verifier: V,
    store: S,
    deriver: FilenameDeriver,
    options: PublishOptions,
}

impl<V: TokenVerifier, S: ContentStore> Publisher<V, S> {
    pub fn new(verifier: V, store: S, deriver: FilenameDeriver, options: PublishOptions) -> Self {
        Self {
            verifier,
            store,
            deriver,
            options,
        }
    }

    pub fn deriver(&self) -> &FilenameDeriver {
        &self.deriver
    }

    pub async fn publish(&self, submission: &PostSubmission, auth_token: Option<&str>) -> Result<Published, PublishError> {
        let request_id = Uuid::new_v4();
        debug!("[{}] {}", request_id, Stage::Received);

        self.authenticate(&request_id, auth_token).await?;
        self.publish_verified(&request_id, submission).await
    }

    pub async fn authenticate(&self, request_id: &Uuid, auth_token: Option<&str>) -> Result<Identity, PublishError> {
        debug!("[{}] {}", request_id, Stage::Authenticating);

        let token = match auth_token.map(|t| t.trim()) {
            Some(t) if !t.is_empty() => t,
            _ => {
                info!("[{}] {}: no bearer token", request_id, Stage::Failed);
                return Err(PublishError::Unauthorized);
            }
        };

        match self.verifier.verify(token).await {
            Ok(identity) => {
                debug!("[{}] token accepted for {}", request_id, identity.email.as_deref().unwrap_or(&identity.subject));
                Ok(identity)
            }
            Err(e) => {
                warn!("[{}] {}: token verification failed: {}", request_id, Stage::Failed, e);
                Err(PublishError::Forbidden)
            }
        }
    }

    /// Everything after authentication: validate, derive the path, probe, write.
    pub async fn publish_verified(&self, request_id: &Uuid, submission: &PostSubmission) -> Result<Published, PublishError> {
        debug!("[{}] {}", request_id, Stage::Validating);

        let post = match submission.validate() {
            Ok(post) => post,
            Err(missing) => {
                info!("[{}] {}: missing fields {:?}", request_id, Stage::Failed, missing);
                return Err(PublishError::BadRequest { missing, invalid: vec![] });
            }
        };

        if self.deriver.file_stem(post.date).is_none() {
            info!("[{}] {}: unreadable date {}", request_id, Stage::Failed, post.date);
            return Err(PublishError::BadRequest { missing: vec![], invalid: vec!["date"] });
        }

        let path = self.deriver.derive(post.date, Some(post.category));
        debug!("[{}] {} {} (tags={:?}, location={:?})", request_id, Stage::ProbePending, path,
               submission.tags(), submission.location());

        let sha = match self.store.probe(&path).await {
            Ok(Probe::Exists { sha }) => Some(sha),
            Ok(Probe::Absent) => None,
            Err(e) if self.options.probe_errors_as_absent => {
                warn!("[{}] probe of {} failed, writing as a new file: {}", request_id, path, e);
                None
            }
            Err(e) => {
                warn!("[{}] {}: probe of {} failed: {}", request_id, Stage::Failed, path, e);
                return Err(PublishError::UpstreamError(e.detail()));
            }
        };

        debug!("[{}] {} {} ({})", request_id, Stage::Writing, path, if sha.is_some() { "update" } else { "create" });
        let file = FileWrite {
            path,
            message: format!("Add post {}", post.title),
            content: post.content.trim().to_string(),
            sha,
        };

        match self.store.write(&file).await {
            Ok(receipt) => {
                info!("[{}] {}: {} written", request_id, Stage::Succeeded, file.path);
                Ok(Published {
                    success: true,
                    url: receipt.html_url.unwrap_or_default(),
                })
            }
            Err(e) => {
                warn!("[{}] {}: writing {} failed: {}", request_id, Stage::Failed, file.path, e);
                Err(PublishError::UpstreamError(e.detail()))
            }
        }
    }
}
