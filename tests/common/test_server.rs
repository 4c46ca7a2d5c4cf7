use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use uuid::Uuid;

use coursework::auth::{hash_password, issue_token};
use coursework::checkout::OfflineGateway;
use coursework::config::DB_FILE_NAME;
use coursework::error::Result;
use coursework::notify::{
    MailMessage, Mailer, NotificationDispatcher, NotificationQueue, spawn_worker,
};
use coursework::server::{AppState, create_router};
use coursework::store::{SqliteStore, Store};
use coursework::types::{Capability, User};

pub const TEST_PASSWORD: &str = "correct-horse";

/// Keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// An in-process server on an ephemeral port, backed by a temp database,
/// the offline payment gateway and a recording mailer.
pub struct TestServer {
    _temp_dir: TempDir,
    pub base_url: String,
    pub admin_token: String,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<RecordingMailer>,
    client: reqwest::Client,
    server: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join(DB_FILE_NAME)).expect("open store");
        store.initialize().expect("initialize store");
        let store: Arc<dyn Store> = Arc::new(store);

        let (_, admin_token) =
            issue_token(store.as_ref(), true, None, None).expect("create admin token");

        let mailer = Arc::new(RecordingMailer::default());
        let (queue, rx) = NotificationQueue::new(64);
        let dispatcher = NotificationDispatcher::new(
            store.clone(),
            mailer.clone(),
            "noreply@coursework.test".to_string(),
        );
        spawn_worker(rx, Arc::new(dispatcher));

        let state = Arc::new(AppState::new(
            store.clone(),
            Arc::new(OfflineGateway::new()),
            queue,
        ));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            _temp_dir: temp_dir,
            base_url: format!("http://127.0.0.1:{port}"),
            admin_token,
            store,
            mailer,
            client: reqwest::Client::new(),
            server,
        }
    }

    /// Creates an active user with a password and a non-expiring token.
    pub fn create_user(&self, email: &str, capabilities: Capability) -> TestUser {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            phone: None,
            city: None,
            password_hash: Some(hash_password(TEST_PASSWORD).expect("hash password")),
            capabilities,
            is_active: true,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        self.store.create_user(&user).expect("create user");

        let (_, token) = issue_token(self.store.as_ref(), false, Some(user.id.clone()), None)
            .expect("create token");

        TestUser {
            id: user.id,
            email: user.email,
            token,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await.expect("send request");
        let status = resp.status();
        let text = resp.text().await.expect("read body");
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        (status, value)
    }

    pub async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(token), Some(body))
            .await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, path, Some(token), Some(body))
            .await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, path, Some(token), Some(body))
            .await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, path, Some(token), None).await
    }

    /// Waits until the mailer has seen at least `count` messages.
    pub async fn wait_for_mail(&self, count: usize) -> Vec<MailMessage> {
        for _ in 0..100 {
            let sent = self.mailer.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "expected {count} messages, got {}",
            self.mailer.sent().len()
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}
