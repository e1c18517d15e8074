#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

use policy_desk::app::{app, AppState};
use policy_desk::config::AppConfig;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub root: PathBuf,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start the full router on a free port inside the current test runtime,
    /// backed by a fresh SQLite file and upload directory.
    pub async fn start(label: &str) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let root = std::env::temp_dir().join(format!("policy-desk-it-{}-{}-{}", label, std::process::id(), port));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join("public"))?;
        std::fs::write(root.join("public/index.html"), "<!doctype html><title>Policy desk</title>")?;

        let mut config = AppConfig::development();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = port;
        config.database.url = format!("sqlite://{}", root.join("data.db").display());
        config.storage.upload_dir = root.join("uploads");
        config.storage.public_dir = root.join("public");
        config.api.max_request_size_bytes = 64 * 1024;
        config.api.enable_request_logging = false;

        let state = AppState::from_config(&config).await?;
        let router = app(state, &config);
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            port,
            base_url,
            root,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
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

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    /// POST a JSON body and return the `id` of the created record
    pub async fn create(&self, path: &str, body: serde_json::Value) -> Result<i64> {
        let res = self.client.post(self.url(path)).json(&body).send().await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "POST {} returned {}", path, res.status());
        let body = res.json::<serde_json::Value>().await?;
        body["id"].as_i64().context("response without id")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
