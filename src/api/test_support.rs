//! Test harness shared by router-level tests: an app over the in-memory store
//! and a tiny cookie-jar client.

use crate::api::{
    app,
    handlers::auth::{AuthConfig, AuthState},
};
use crate::store::{MemoryStore, TaskStore, UserStore};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

pub(crate) const FRONTEND: &str = "http://localhost:3000";

pub(crate) fn auth_state() -> Arc<AuthState> {
    Arc::new(AuthState::new(
        AuthConfig::new(FRONTEND.to_string()).with_bcrypt_cost(4),
        &SecretString::from("jwt-secret-jwt-secret-jwt-secret"),
        &SecretString::from("csrf-key-csrf-key-csrf-key-csrf-"),
    ))
}

pub(crate) fn test_app(auth_state: Arc<AuthState>) -> Result<Router> {
    let store = Arc::new(MemoryStore::new());
    let users: Arc<dyn UserStore> = store.clone();
    let tasks: Arc<dyn TaskStore> = store;
    app(auth_state, users, tasks)
}

pub(crate) struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(&format!("{name}=")))
            .map(str::to_string)
    }
}

/// Minimal browser: keeps a cookie jar and optionally echoes a CSRF token.
pub(crate) struct Browser {
    app: Router,
    pub cookies: BTreeMap<String, String>,
    pub csrf_token: Option<String>,
}

impl Browser {
    pub fn new(app: Router) -> Self {
        Self {
            app,
            cookies: BTreeMap::new(),
            csrf_token: None,
        }
    }

    pub async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> Result<Reply> {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(token) = &self.csrf_token {
            builder = builder.header("csrf-token", token);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        for value in headers.get_all(SET_COOKIE) {
            let pair = value.to_str()?.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        Ok(Reply {
            status,
            headers,
            body,
        })
    }

    pub async fn fetch_csrf(&mut self) -> Result<()> {
        let reply = self.send(Method::GET, "/auth/csrf", None).await?;
        assert_eq!(reply.status, StatusCode::OK);
        let token = reply.body["csrfToken"]
            .as_str()
            .context("missing csrfToken")?
            .to_string();
        self.csrf_token = Some(token);
        Ok(())
    }

    pub async fn signup(&mut self, email: &str, password: &str) -> Result<Reply> {
        self.send(
            Method::POST,
            "/auth/signup",
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Reply> {
        self.send(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Seed CSRF, sign up and log in.
    pub async fn logged_in(app: Router, email: &str) -> Result<Self> {
        let mut browser = Self::new(app);
        browser.fetch_csrf().await?;
        let reply = browser.signup(email, "password").await?;
        assert_eq!(reply.status, StatusCode::CREATED);
        let reply = browser.login(email, "password").await?;
        assert_eq!(reply.status, StatusCode::OK);
        Ok(browser)
    }
}

pub(crate) fn jwt_payload(token: &str) -> Result<Value> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| anyhow!("token has no payload"))?;
    let bytes = Base64UrlUnpadded::decode_vec(payload).map_err(|err| anyhow!("{err}"))?;
    Ok(serde_json::from_slice(&bytes)?)
}
