use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::{CONTENT_TYPE, ETAG, IF_MATCH};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{PublishOptions, RemoteConfigClient, RemoteConfigError, ServiceAccount, Template};

const DEFAULT_BASE_URL: &str = "https://firebaseremoteconfig.googleapis.com/v1";
const REMOTE_CONFIG_SCOPE: &str = "https://www.googleapis.com/auth/firebase.remoteconfig";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion (the maximum Google accepts).
const ASSERTION_TTL_SECS: i64 = 3600;
/// Refresh cached access tokens this long before they expire.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Remote Config REST client authenticated with a service account.
pub struct FirebaseClient {
    http: reqwest::Client,
    account: ServiceAccount,
    base_url: String,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl FirebaseClient {
    pub fn new(account: ServiceAccount, timeout: Duration) -> Result<Self, RemoteConfigError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            account,
            base_url: DEFAULT_BASE_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point the client at a different Remote Config endpoint (emulators, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.account.project_id
    }

    fn template_url(&self) -> String {
        format!(
            "{}/projects/{}/remoteConfig",
            self.base_url, self.account.project_id
        )
    }

    async fn access_token(&self) -> Result<String, RemoteConfigError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            let refresh_at = token.expires_at - chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
            if Utc::now() < refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken, RemoteConfigError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: REMOTE_CONFIG_SCOPE,
            aud: &self.account.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_TTL_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.account.private_key.as_bytes())
            .map_err(|e| RemoteConfigError::Auth(format!("invalid private key: {e}")))?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| RemoteConfigError::Auth(format!("cannot sign assertion: {e}")))?;

        tracing::debug!(
            project_id = %self.account.project_id,
            "requesting access token"
        );

        let resp = self
            .http
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(RemoteConfigError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + chrono::Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl RemoteConfigClient for FirebaseClient {
    async fn get_template(&self) -> Result<Template, RemoteConfigError> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .get(self.template_url())
            .bearer_auth(token)
            .send()
            .await?;

        read_template(resp).await
    }

    async fn publish_template(
        &self,
        template: &Template,
        options: PublishOptions,
    ) -> Result<Template, RemoteConfigError> {
        let if_match = if options.force {
            "*"
        } else {
            template.etag.as_str()
        };

        // The service assigns versions itself and rejects bodies that carry one.
        let mut body = template.clone();
        body.version = None;
        let payload = serde_json::to_vec(&body)?;

        let token = self.access_token().await?;
        let resp = self
            .http
            .put(self.template_url())
            .bearer_auth(token)
            .header(IF_MATCH, if_match)
            .header(CONTENT_TYPE, "application/json; UTF-8")
            .body(payload)
            .send()
            .await?;

        read_template(resp).await
    }
}

async fn read_template(resp: reqwest::Response) -> Result<Template, RemoteConfigError> {
    let status = resp.status();
    let etag = resp
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(RemoteConfigError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let mut template: Template = serde_json::from_str(&body)?;
    template.etag = etag.ok_or(RemoteConfigError::MissingEtag)?;
    Ok(template)
}
