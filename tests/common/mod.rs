//! Shared utilities for integration tests: in-memory backends, a
//! channel-backed log sink, a recording mail transport, and a mock
//! managed-backend server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use snippit::backend::{
    BackendError, IdentityProvider, ListQuery, NewSnippet, Session, Snippet, SnippetPage,
    SnippetPatch, SnippetStore, User,
};
use snippit::notify::{CronNotifier, Mail, MailTransport, NotifyError};
use snippit::request_log::{LogRecord, LogSink, SinkError};
use snippit::{AppConfig, AppState, HttpServer, RequestLogger};

pub const RECIPIENT: &str = "ops@example.com";

fn rejected(status: u16, message: &str) -> BackendError {
    BackendError::Rejected {
        status,
        message: message.to_string(),
        details: None,
        hint: None,
        code: None,
    }
}

/// Identity provider keeping accounts and live sessions in memory.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, (String, User)>>,
    sessions: Mutex<HashMap<String, User>>,
    pub resets: Mutex<Vec<(String, String)>>,
    pub unreachable: AtomicBool,
    pub not_configured: AtomicBool,
}

impl MemoryIdentity {
    /// Register an account and open a session for it; returns the token.
    pub fn login_as(&self, email: &str) -> (User, String) {
        let user = User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            created_at: Some(Utc::now()),
        };
        let token = format!("token-{}", user.id);
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), ("password".to_string(), user.clone()));
        self.sessions.lock().unwrap().insert(token.clone(), user.clone());
        (user, token)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, BackendError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(rejected(422, "User already registered"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            created_at: Some(Utc::now()),
        };
        accounts.insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let user = match self.accounts.lock().unwrap().get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(rejected(400, "Invalid login credentials")),
        };
        let token = format!("token-{}", Uuid::new_v4());
        self.sessions.lock().unwrap().insert(token.clone(), user.clone());
        Ok(Session {
            access_token: token,
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            token_type: "bearer".to_string(),
            user,
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        Ok(self.sessions.lock().unwrap().get(access_token).cloned())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        match self.sessions.lock().unwrap().remove(access_token) {
            Some(_) => Ok(()),
            None => Err(rejected(401, "invalid JWT")),
        }
    }

    async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        self.resets
            .lock()
            .unwrap()
            .push((email.to_string(), redirect_to.to_string()));
        Ok(())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        if self.not_configured.load(Ordering::SeqCst) {
            return Err(BackendError::NotConfigured);
        }
        if self.unreachable.load(Ordering::SeqCst) {
            Err(BackendError::Unexpected("connection refused"))
        } else {
            Ok(())
        }
    }
}

/// Owner-scoped snippet table in memory.
#[derive(Default)]
pub struct MemorySnippets {
    rows: Mutex<Vec<Snippet>>,
}

impl MemorySnippets {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SnippetStore for MemorySnippets {
    async fn list(&self, _: &str, owner: Uuid, query: &ListQuery) -> Result<SnippetPage, BackendError> {
        let rows = self.rows.lock().unwrap();
        let needle = query.search.as_deref().map(str::to_lowercase);

        let mut matched: Vec<Snippet> = rows
            .iter()
            .filter(|s| s.owner_id == owner)
            .filter(|s| !query.favorites_only || s.is_favorite)
            .filter(|s| query.language.as_deref().map_or(true, |l| s.language == l))
            .filter(|s| {
                needle.as_deref().map_or(true, |n| {
                    s.title.to_lowercase().contains(n) || s.code.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let total = matched.len() as u64;
        let snippets = matched
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .collect();
        Ok(SnippetPage { snippets, total })
    }

    async fn create(&self, _: &str, snippet: &NewSnippet) -> Result<Snippet, BackendError> {
        let now = Utc::now();
        let row = Snippet {
            id: Uuid::new_v4(),
            owner_id: snippet.owner_id,
            title: snippet.title.clone(),
            language: snippet.language.clone(),
            code: snippet.code.clone(),
            is_favorite: snippet.is_favorite,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        _: &str,
        owner: Uuid,
        id: Uuid,
        patch: &SnippetPatch,
    ) -> Result<Option<Snippet>, BackendError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|s| s.id == id && s.owner_id == owner) else {
            return Ok(None);
        };
        if let Some(title) = &patch.title {
            row.title = title.clone();
        }
        if let Some(language) = &patch.language {
            row.language = language.clone();
        }
        if let Some(code) = &patch.code {
            row.code = code.clone();
        }
        if let Some(is_favorite) = patch.is_favorite {
            row.is_favorite = is_favorite;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, _: &str, owner: Uuid, id: Uuid) -> Result<(), BackendError> {
        self.rows
            .lock()
            .unwrap()
            .retain(|s| !(s.id == id && s.owner_id == owner));
        Ok(())
    }
}

/// Forwards every record to a channel.
pub struct ChannelSink(pub mpsc::UnboundedSender<LogRecord>);

#[async_trait]
impl LogSink for ChannelSink {
    async fn insert(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.0.send(record.clone()).map_err(|_| SinkError::Closed)
    }
}

/// Records sent mail.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<Mail>>,
}

impl Outbox {
    /// Wait until at least `count` messages have been sent.
    pub async fn wait_for(&self, count: usize) -> Vec<Mail> {
        for _ in 0..100 {
            {
                let sent = self.sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} notifications");
    }
}

#[async_trait]
impl MailTransport for Outbox {
    async fn send(&self, mail: Mail) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// The full router over in-memory backends.
pub struct TestApp {
    pub router: Router,
    pub logs: mpsc::UnboundedReceiver<LogRecord>,
    pub identity: Arc<MemoryIdentity>,
    pub snippets: Arc<MemorySnippets>,
    pub outbox: Arc<Outbox>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let identity = Arc::new(MemoryIdentity::default());
        let snippets = Arc::new(MemorySnippets::default());
        let outbox = Arc::new(Outbox::default());
        let (tx, logs) = mpsc::unbounded_channel();

        let notifier = CronNotifier::new(
            Some(outbox.clone() as Arc<dyn MailTransport>),
            Some(RECIPIENT.to_string()),
            config.environment.clone(),
        );
        let logger = RequestLogger::new(Arc::new(ChannelSink(tx)), config.limits.max_body_size);
        let state = AppState::new(Arc::new(config), identity.clone(), snippets.clone(), notifier);

        Self {
            router: HttpServer::with_state(state, logger).router(),
            logs,
            identity,
            snippets,
            outbox,
        }
    }

    /// Send one request through the router; returns status, headers and JSON body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    /// Next log record, failing the test if none arrives promptly.
    pub async fn next_log(&mut self) -> LogRecord {
        tokio::time::timeout(Duration::from_secs(2), self.logs.recv())
            .await
            .expect("log record not dispatched")
            .expect("log channel closed")
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// What the mock backend saw for one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Start a mock managed backend on an ephemeral port. Log inserts answer
/// 201, the auth health probe answers 200, everything is captured.
pub async fn start_mock_backend() -> (SocketAddr, mpsc::UnboundedReceiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let tx = tx.clone();
        async move {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
            let _ = tx.send(Captured {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
                headers: parts.headers,
                body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
            });
            match parts.uri.path() {
                "/rest/v1/request_logs" => StatusCode::CREATED,
                "/auth/v1/health" => StatusCode::OK,
                _ => StatusCode::NOT_FOUND,
            }
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, rx)
}
