use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token info request failed: {0}")]
    Transport(String),
    #[error("token rejected by identity provider ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("unreadable token info: {0}")]
    Decode(String),
    #[error("token audience {0} does not match the configured client id")]
    WrongAudience(String),
    #[error("unexpected token issuer {0}")]
    WrongIssuer(String),
    #[error("token expired at {0}")]
    Expired(i64),
}

/// Who signed in. Only used for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
}

#[allow(async_fn_in_trait)]
pub trait TokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}

/// Response of Google's token info endpoint. Numbers come as strings.
#[derive(Debug, Deserialize)]
pub struct TokenInfo {
    pub aud: String,
    pub iss: String,
    pub exp: String,
    pub sub: String,
    pub email: Option<String>,
}

pub fn check_claims(info: &TokenInfo, client_id: &str, now: i64) -> Result<Identity, VerifyError> {
    if info.aud != client_id {
        return Err(VerifyError::WrongAudience(info.aud.clone()));
    }

    if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
        return Err(VerifyError::WrongIssuer(info.iss.clone()));
    }

    let exp: i64 = info.exp.parse()
        .map_err(|_| VerifyError::Decode(format!("invalid exp {}", info.exp)))?;
    if exp <= now {
        return Err(VerifyError::Expired(exp));
    }

    Ok(Identity {
        subject: info.sub.clone(),
        email: info.email.clone(),
    })
}

/// Verifies Google ID tokens through the token info endpoint, which checks the signature
/// and expiry. Audience and issuer are checked here against the configured client id.
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: String,
    tokeninfo_url: String,
}

impl GoogleVerifier {
    pub fn new(client: reqwest::Client, client_id: &str, tokeninfo_url: &str) -> Self {
        Self {
            client,
            client_id: client_id.to_string(),
            tokeninfo_url: tokeninfo_url.to_string(),
        }
    }
}

impl TokenVerifier for GoogleVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let res = self.client.get(&self.tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(VerifyError::Rejected { status: status.as_u16(), detail });
        }

        let info: TokenInfo = res.json()
            .await
            .map_err(|e| VerifyError::Decode(e.to_string()))?;

        check_claims(&info, &self.client_id, Utc::now().timestamp())
    }
}
