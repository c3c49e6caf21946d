use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    config::ServiceAccountKey,
    errors::{AppError, AppResult},
};

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Claims of the self-signed JWT a service account trades for an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
}

impl AssertionClaims {
    pub fn new(client_email: &str, token_uri: &str, lifetime_minutes: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::minutes(lifetime_minutes);

        Self {
            iss: client_email.to_string(),
            scope: SHEETS_SCOPE.to_string(),
            aud: token_uri.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

/// Hands out bearer tokens for the Sheets API, refreshing them shortly before they expire.
pub struct ServiceAccountAuth {
    client_email: String,
    token_uri: String,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    const ASSERTION_LIFETIME_MINUTES: i64 = 60;
    const REFRESH_MARGIN_SECONDS: i64 = 60;

    pub fn new(key: &ServiceAccountKey, http: reqwest::Client) -> AppResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())?;

        Ok(Self {
            client_email: key.client_email.clone(),
            token_uri: key.token_uri.clone(),
            encoding_key,
            http,
            cached: RwLock::new(None),
        })
    }

    pub fn create_assertion(&self) -> AppResult<String> {
        let claims = AssertionClaims::new(
            &self.client_email,
            &self.token_uri,
            Self::ASSERTION_LIFETIME_MINUTES,
        );

        Ok(encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    pub async fn access_token(&self) -> AppResult<String> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.expires_at - Duration::seconds(Self::REFRESH_MARGIN_SECONDS) > Utc::now() {
                return Ok(token.value.expose_secret().to_string());
            }
        }

        let mut cached = self.cached.write().await;
        let assertion = self.create_assertion()?;

        log::debug!("Requesting Sheets access token for {}", self.client_email);

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::AuthError(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AuthError(format!(
                "Token endpoint answered {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::AuthError(format!("Invalid token response: {}", e)))?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: SecretString::from(token.access_token),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });

        Ok(value)
    }
}
