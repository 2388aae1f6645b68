#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use task_service::config::AppConfig;
use task_service::database::{MemoryTaskRepository, TaskRepository};
use task_service::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST /api/tasks as `user_id`
    pub async fn create_task(&self, user_id: i64, body: Value) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url("/api/tasks"))
            .bearer_auth(token(user_id))
            .json(&body)
            .send()
            .await?)
    }

    /// Create a task and return its id, failing the test on anything but 201
    pub async fn create_task_id(&self, user_id: i64, title: &str) -> Result<i64> {
        let res = self
            .create_task(user_id, json!({ "title": title, "description": "details" }))
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        let body = res.json::<Value>().await?;
        body["taskId"].as_i64().context("taskId missing")
    }

    pub async fn list_tasks(&self, user_id: i64) -> Result<Vec<Value>> {
        let res = self
            .client
            .get(self.url("/api/tasks"))
            .bearer_auth(token(user_id))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "list failed: {}", res.status());
        let body = res.json::<Value>().await?;
        body.as_array().cloned().context("list body is not an array")
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::from_vars(|name| match name {
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        _ => None,
    })
    .expect("test config")
}

/// Server backed by a fresh in-memory store with default limits
pub async fn spawn_server() -> Result<TestServer> {
    spawn_with(test_config(), Arc::new(MemoryTaskRepository::new())).await
}

pub async fn spawn_with(config: AppConfig, tasks: Arc<dyn TaskRepository>) -> Result<TestServer> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let state = AppState::new(config, tasks);
    tokio::spawn(task_service::serve(listener, state, std::future::pending()));

    let server = TestServer {
        port,
        base_url,
        client: reqwest::Client::new(),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

pub fn token(user_id: i64) -> String {
    sign(json!({ "userId": user_id, "exp": chrono_exp(3600) }), TEST_SECRET)
}

pub fn expired_token(user_id: i64) -> String {
    sign(json!({ "userId": user_id, "exp": chrono_exp(-60) }), TEST_SECRET)
}

pub fn sign(claims: Value, secret: &str) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("sign token")
}

fn chrono_exp(offset_secs: i64) -> i64 {
    chrono::Utc::now().timestamp() + offset_secs
}
