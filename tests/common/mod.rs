#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pharma_admin::auth::{generate_jwt, Claims, Role};
use reqwest::StatusCode;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";

pub mod store;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Nothing listens on port 1: the server starts, but every query reports the database unavailable
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pharma-admin"));
        cmd.env("PHARMA_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("DATABASE_URL", "postgres://postgres@127.0.0.1:1/pharma_admin_test")
            .env("DATABASE_CONNECTION_TIMEOUT", "1")
            .env("DATABASE_RUN_MIGRATIONS", "false")
            .env("JWT_SECRET", JWT_SECRET)
            .env_remove("SHOPIFY_STORE_URL")
            .env_remove("SHOPIFY_ACCESS_TOKEN")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

pub fn super_admin_token() -> String {
    token(Role::SuperAdmin, None, None)
}

pub fn kam_token() -> String {
    token(Role::Kam, Some(Uuid::new_v4()), Some(Uuid::new_v4()))
}

pub fn token(role: Role, district_id: Option<Uuid>, team_id: Option<Uuid>) -> String {
    let claims = Claims::new(Uuid::new_v4(), "tester@example.com".to_string(), role, district_id, team_id, 1);
    generate_jwt(&claims, JWT_SECRET).expect("failed to sign test token")
}
