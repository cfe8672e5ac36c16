#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc, unreachable_pub)]
use contact_server::AppBuilder;
use contact_server::api::{self, MgmtState};
use contact_server::config::{
    Config, CorruptDataPolicy, HealthConfig, LogFormat, ServerConfig, StorageConfig, TelemetryConfig,
    ValidationConfig,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("contact_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config(data_file: &Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 1,
            static_dir: None,
        },
        storage: StorageConfig { data_file: data_file.to_path_buf(), corrupt_data: CorruptDataPolicy::Fail },
        validation: ValidationConfig { strict: false },
        health: HealthConfig { storage_timeout_ms: 1000 },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub config: Config,
    pub shutdown_tx: watch::Sender<bool>,
    data_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawns both routers against a fresh data directory after letting the caller adjust
    /// the configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut Config)) -> Self {
        setup_tracing();

        let data_dir = tempfile::tempdir().unwrap();
        let mut config = get_test_config(&data_dir.path().join("submissions.json"));
        configure(&mut config);

        let app = AppBuilder::new(config.clone()).build();
        let app_router = api::app_router(&config, app.services);
        let mgmt_router = api::mgmt_router(MgmtState { health_service: app.health_service });

        let api_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", api_listener.local_addr().unwrap());
        let mgmt_url = format!("http://{}", mgmt_listener.local_addr().unwrap());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut api_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            axum::serve(api_listener, app_router)
                .with_graceful_shutdown(async move {
                    let _ = api_rx.wait_for(|&s| s).await;
                })
                .await
                .unwrap();
        });

        let mut mgmt_rx = shutdown_rx;
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt_router)
                .with_graceful_shutdown(async move {
                    let _ = mgmt_rx.wait_for(|&s| s).await;
                })
                .await
                .unwrap();
        });

        Self { server_url, mgmt_url, client: reqwest::Client::new(), config, shutdown_tx, data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    pub fn data_file(&self) -> PathBuf {
        self.config.storage.data_file.clone()
    }

    pub async fn submit(&self, body: &Value) -> reqwest::Response {
        self.client.post(format!("{}/submit", self.server_url)).json(body).send().await.unwrap()
    }

    pub async fn list(&self) -> reqwest::Response {
        self.client.get(format!("{}/submissions", self.server_url)).send().await.unwrap()
    }

    /// Lists submissions and returns the `data` array, asserting the response is well formed.
    pub async fn list_data(&self) -> Vec<Value> {
        let resp = self.list().await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);

        let data = body["data"].as_array().unwrap().clone();
        assert_eq!(body["count"], json!(data.len()));
        data
    }
}

pub fn ann() -> Value {
    json!({ "name": "Ann", "email": "ann@example.com", "message": "Hello there, this works." })
}
