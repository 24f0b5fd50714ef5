use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

/// Google sign-in is advertised only when both client id and secret are set.
/// The secret itself stays with the OAuth framework and is not kept here.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub from: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Only `json` (any case) switches to JSON lines.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.trim().eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Signs verification tokens. Credential sign-in of unverified users fails without it.
    pub auth_secret: Option<String>,
    pub google: Option<GoogleConfig>,
    pub email: EmailConfig,
    /// Origin used in verification links, always carrying a scheme.
    pub base_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let listen_addr = listen_addr(
            &std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            &std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into()),
        )?;
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let google = match (
            non_empty_var("AUTH_GOOGLE_ID"),
            non_empty_var("AUTH_GOOGLE_SECRET"),
        ) {
            (Some(client_id), Some(_secret)) => Some(GoogleConfig { client_id }),
            _ => None,
        };

        let email = EmailConfig {
            resend_api_key: non_empty_var("RESEND_API_KEY"),
            resend_api_url: std::env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".into()),
            from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| "verify-email@localhost".into()),
        };

        let base_url =
            normalize_base_url(&std::env::var("BASE_URL").unwrap_or_else(|_| "localhost:3000".into()));

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections,
            auth_secret: non_empty_var("AUTH_SECRET"),
            google,
            email,
            base_url,
        })
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/verify-email/{}", self.base_url, token)
    }
}

pub(crate) fn listen_addr(host: &str, port: &str) -> anyhow::Result<SocketAddr> {
    let port: u16 = port
        .trim()
        .parse()
        .with_context(|| format!("APP_PORT is not a port: {port:?}"))?;
    let addr = format!("{}:{}", host.trim(), port);
    addr.parse::<SocketAddr>()
        .with_context(|| format!("APP_HOST is not an IP address: {host:?}"))
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Bare hosts such as `example.com` get an `http://` prefix; trailing slashes are dropped.
pub(crate) fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
