use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filename::DerivedPath;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "lifelog-uploader";
const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Transport(String),
    /// Raw body of the store's error response.
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    #[error("unreadable store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn detail(&self) -> String {
        match self {
            StoreError::Rejected { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// What the store holds at a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe {
    Exists { sha: String },
    Absent,
}

impl Probe {
    pub fn sha(&self) -> Option<&str> {
        match self {
            Probe::Exists { sha } => Some(sha),
            Probe::Absent => None,
        }
    }
}

/// A single create-or-update of one file. `sha` must be the current revision when
/// the file already exists.
#[derive(Debug, Clone, PartialEq)]
pub struct FileWrite {
    pub path: DerivedPath,
    pub message: String,
    pub content: String,
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReceipt {
    pub html_url: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait ContentStore {
    /// `Absent` only when the store says the file does not exist. Transport failures and
    /// other unexpected answers are errors and the caller decides what they mean.
    async fn probe(&self, path: &DerivedPath) -> Result<Probe, StoreError>;

    async fn write(&self, file: &FileWrite) -> Result<WriteReceipt, StoreError>;
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PutContents<'a> {
    pub message: &'a str,
    pub content: String,
    pub branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: Option<PutResponseContent>,
}

#[derive(Debug, Deserialize)]
struct PutResponseContent {
    html_url: Option<String>,
}

pub fn encode_content(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

pub fn parse_probe_body(body: &str) -> Result<Probe, StoreError> {
    let file: ContentsFile = serde_json::from_str(body)
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(Probe::Exists { sha: file.sha })
}

pub fn parse_write_body(body: &str) -> Result<WriteReceipt, StoreError> {
    let res: PutResponse = serde_json::from_str(body)
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(WriteReceipt {
        html_url: res.content.and_then(|c| c.html_url),
    })
}

/// GitHub Contents API (`/repos/{owner}/{repo}/contents/{path}`) on a single branch.
pub struct GithubContents {
    client: reqwest::Client,
    api_url: String,
    repo: String,
    branch: String,
    token: String,
    user_agent: String,
}

impl GithubContents {
    pub fn new(client: reqwest::Client, api_url: &str, repo: &str, branch: &str, token: &str, user_agent: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo: repo.trim_matches('/').to_string(),
            branch: branch.to_string(),
            token: token.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn contents_url(&self, path: &DerivedPath) -> String {
        format!("{}/repos/{}/contents/{}", self.api_url, self.repo, path)
    }

    pub fn put_body<'a>(&'a self, file: &'a FileWrite) -> PutContents<'a> {
        PutContents {
            message: &file.message,
            content: encode_content(&file.content),
            branch: &self.branch,
            sha: file.sha.as_deref(),
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, GITHUB_JSON)
            .header(USER_AGENT, &self.user_agent)
    }
}

impl ContentStore for GithubContents {
    async fn probe(&self, path: &DerivedPath) -> Result<Probe, StoreError> {
        let url = self.contents_url(path);
        let res = self.request(self.client.get(&url))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| StoreError::Transport(e.to_string()))?;

        match status {
            StatusCode::NOT_FOUND => Ok(Probe::Absent),
            s if s.is_success() => parse_probe_body(&body),
            s => Err(StoreError::Rejected { status: s.as_u16(), detail: body }),
        }
    }

    async fn write(&self, file: &FileWrite) -> Result<WriteReceipt, StoreError> {
        let url = self.contents_url(&file.path);
        let res = self.request(self.client.put(&url))
            .json(&self.put_body(file))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| StoreError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(StoreError::Rejected { status: status.as_u16(), detail: body });
        }

        parse_write_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::filename::{DeriverOptions, FilenameDeriver};
    use crate::category::CategorySlugs;
    use crate::test_data::{CONTENTS_CONFLICT_RESPONSE, CONTENTS_GET_RESPONSE, CONTENTS_PUT_RESPONSE, LUNCH_HTML_URL,
                           LUNCH_PATH};
    use crate::test_server;

    use super::*;

    fn store() -> GithubContents {
        GithubContents::new(reqwest::Client::new(), "https://api.github.com/", "owner/lifelog-blog",
                            "main", "ghp_secret", DEFAULT_USER_AGENT)
    }

    fn lunch_path() -> DerivedPath {
        FilenameDeriver::new(CategorySlugs::builtin(), DeriverOptions::default())
            .derive("2025-08-19T13:30:00+09:00", Some("食事"))
    }

    fn lunch_write(sha: Option<&str>) -> FileWrite {
        FileWrite {
            path: lunch_path(),
            message: "Add post Lunch".to_string(),
            content: "---\ntitle: 昼ごはん\n---\nラーメン 🍜".to_string(),
            sha: sha.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_contents_url() {
        assert_eq!(lunch_path().as_str(), LUNCH_PATH);
        assert_eq!(store().contents_url(&lunch_path()),
                   "https://api.github.com/repos/owner/lifelog-blog/contents/content/posts/meals/20250819-1330.md");
    }

    #[test]
    fn test_encode_content_is_utf8() {
        let encoded = encode_content("ラーメン 🍜");
        assert_eq!(encoded, "44Op44O844Oh44OzIPCfjZw=");
        assert_eq!(STANDARD.decode(encoded).unwrap(), "ラーメン 🍜".as_bytes());
    }

    #[test]
    fn test_put_body_for_create() {
        let store = store();
        let file = lunch_write(None);
        let body = serde_json::to_value(store.put_body(&file)).unwrap();

        assert_eq!(body["message"], "Add post Lunch");
        assert_eq!(body["branch"], "main");
        assert_eq!(body["content"], encode_content(&file.content));
        assert!(body.get("sha").is_none());
    }

    #[test]
    fn test_put_body_for_update() {
        let store = store();
        let file = lunch_write(Some("3d21ec53a331a6f037a91c368710b99387d012c1"));
        let body = serde_json::to_value(store.put_body(&file)).unwrap();

        assert_eq!(body, json!({
            "message": "Add post Lunch",
            "content": encode_content(&file.content),
            "branch": "main",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
        }));
    }

    #[test]
    fn test_parse_probe_body() {
        let probe = parse_probe_body(CONTENTS_GET_RESPONSE).unwrap();
        assert_eq!(probe.sha(), Some("3d21ec53a331a6f037a91c368710b99387d012c1"));
        assert!(matches!(parse_probe_body("[]"), Err(StoreError::Decode(_))));
        assert_eq!(Probe::Absent.sha(), None);
    }

    #[test]
    fn test_parse_write_body() {
        let receipt = parse_write_body(CONTENTS_PUT_RESPONSE).unwrap();
        assert_eq!(receipt.html_url.as_deref(), Some(LUNCH_HTML_URL));

        let receipt = parse_write_body(r#"{"commit": {"sha": "abc"}}"#).unwrap();
        assert_eq!(receipt.html_url, None);
    }

    #[test]
    fn test_rejected_detail_is_raw() {
        let err = StoreError::Rejected { status: 409, detail: "{\"message\":\"conflict\"}".to_string() };
        assert_eq!(err.detail(), "{\"message\":\"conflict\"}");
        assert_eq!(StoreError::Transport("connection reset".to_string()).detail(), "connection reset");
    }

    fn served_store(srv: &ntex::web::test::TestServer) -> GithubContents {
        GithubContents::new(reqwest::Client::new(), &srv.url("/"), "owner/lifelog-blog",
                            "drafts", "ghp_secret", DEFAULT_USER_AGENT)
    }

    #[ntex::test]
    async fn test_existing_file_on_branch() {
        let (srv, stub) = test_server::start(&[("GET", 200, CONTENTS_GET_RESPONSE)]).await;

        let probe = served_store(&srv).probe(&lunch_path()).await.unwrap();
        assert_eq!(probe, Probe::Exists { sha: "3d21ec53a331a6f037a91c368710b99387d012c1".to_string() });

        let recorded = stub.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, "GET");
        assert_eq!(recorded[0].path, format!("/repos/owner/lifelog-blog/contents/{}", LUNCH_PATH));
        assert_eq!(recorded[0].query, "ref=drafts");
        assert_eq!(recorded[0].headers["authorization"], "Bearer ghp_secret");
        assert_eq!(recorded[0].headers["accept"], GITHUB_JSON);
        assert_eq!(recorded[0].headers["user-agent"], DEFAULT_USER_AGENT);
    }

    #[ntex::test]
    async fn test_missing_file_is_absent() {
        let (srv, _stub) = test_server::start(&[("GET", 404, r#"{"message":"Not Found"}"#)]).await;
        assert_eq!(served_store(&srv).probe(&lunch_path()).await.unwrap(), Probe::Absent);
    }

    #[ntex::test]
    async fn test_lookup_failure_is_an_error() {
        let (srv, _stub) = test_server::start(&[("GET", 500, r#"{"message":"Server Error"}"#)]).await;
        match served_store(&srv).probe(&lunch_path()).await {
            Err(StoreError::Rejected { status, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(detail, r#"{"message":"Server Error"}"#);
            }
            other => panic!("unexpected result {:?}", other),
        }

        let (srv, _stub) = test_server::start(&[("GET", 200, "<html>")]).await;
        assert!(matches!(served_store(&srv).probe(&lunch_path()).await, Err(StoreError::Decode(_))));

        let unreachable = GithubContents::new(reqwest::Client::new(), "http://127.0.0.1:1", "owner/lifelog-blog",
                                              "main", "ghp_secret", DEFAULT_USER_AGENT);
        assert!(matches!(unreachable.probe(&lunch_path()).await, Err(StoreError::Transport(_))));
    }

    #[ntex::test]
    async fn test_write_creates_file() {
        let (srv, stub) = test_server::start(&[("PUT", 201, CONTENTS_PUT_RESPONSE)]).await;
        let file = lunch_write(Some("3d21ec53a331a6f037a91c368710b99387d012c1"));

        let receipt = served_store(&srv).write(&file).await.unwrap();
        assert_eq!(receipt.html_url.as_deref(), Some(LUNCH_HTML_URL));

        let recorded = stub.recorded();
        assert_eq!(recorded[0].method, "PUT");
        assert_eq!(recorded[0].path, format!("/repos/owner/lifelog-blog/contents/{}", LUNCH_PATH));
        assert_eq!(recorded[0].headers["authorization"], "Bearer ghp_secret");
        assert_eq!(recorded[0].headers["user-agent"], DEFAULT_USER_AGENT);

        let sent: serde_json::Value = serde_json::from_str(&recorded[0].body).unwrap();
        assert_eq!(sent, json!({
            "message": "Add post Lunch",
            "content": encode_content(&file.content),
            "branch": "drafts",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
        }));
    }

    #[ntex::test]
    async fn test_write_rejected_keeps_raw_body() {
        let (srv, _stub) = test_server::start(&[("PUT", 409, CONTENTS_CONFLICT_RESPONSE)]).await;

        let err = served_store(&srv).write(&lunch_write(None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 409, .. }));
        assert_eq!(err.detail(), CONTENTS_CONFLICT_RESPONSE);
    }
}
