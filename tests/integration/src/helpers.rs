//! Test helpers for integration tests
//!
//! Provides utilities for spawning a gateway on an ephemeral port, driving it
//! with WebSocket clients and polling its internal stats.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chat_common::AppConfig;
use chat_gateway::{create_app, create_gateway_state, run_server, InMemoryUserDirectory};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// How long a client waits for an expected frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub directory: Arc<InMemoryUserDirectory>,
    _server: JoinHandle<()>,
    _pump: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_config(AppConfig::local(0)).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let directory = Arc::new(InMemoryUserDirectory::new());
        let (state, pump) = create_gateway_state(config, directory.clone());
        let pump = pump.start();

        let app = create_app(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server = tokio::spawn(async move {
            run_server(listener, app, std::future::pending()).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            directory,
            _server: server,
            _pump: pump,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket gateway URL
    pub fn ws_url(&self) -> String {
        format!("ws://{}/gateway", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Open a WebSocket client
    pub async fn connect(&self) -> Result<WsClient> {
        let (stream, _) = tokio_tungstenite::connect_async(self.ws_url())
            .await
            .context("WebSocket connect failed")?;
        Ok(WsClient { stream })
    }

    /// Fetch `/internal/stats`
    pub async fn stats(&self) -> Result<Value> {
        let response = self.get("/internal/stats").await?;
        assert_json(response, StatusCode::OK).await
    }

    /// Poll `/internal/stats` until `predicate` holds
    pub async fn wait_for_stats<F>(&self, predicate: F) -> Result<Value>
    where
        F: Fn(&Value) -> bool,
    {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let stats = self.stats().await?;
            if predicate(&stats) {
                return Ok(stats);
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("Stats never reached expected state: {stats}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// A WebSocket client speaking the gateway's JSON envelope
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Send one event envelope
    pub async fn send(&mut self, frame: &Value) -> Result<()> {
        self.stream.send(Message::Text(frame.to_string())).await?;
        Ok(())
    }

    /// Send a raw frame
    pub async fn send_raw(&mut self, message: Message) -> Result<()> {
        self.stream.send(message).await?;
        Ok(())
    }

    /// Next event envelope, or `None` if nothing arrives within `wait`
    pub async fn next_event(&mut self, wait: Duration) -> Result<Option<Value>> {
        loop {
            let message = match tokio::time::timeout(wait, self.stream.next()).await {
                Err(_) => return Ok(None),
                Ok(None) => anyhow::bail!("WebSocket closed"),
                Ok(Some(message)) => message?,
            };

            match message {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => anyhow::bail!("WebSocket closed by server"),
                _ => continue,
            }
        }
    }

    /// Wait for the next event named `name`, skipping others
    pub async fn expect_event(&mut self, name: &str) -> Result<Value> {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match self.next_event(remaining).await? {
                Some(event) if event["event"] == name => return Ok(event["data"].clone()),
                Some(_) => continue,
                None => anyhow::bail!("Timed out waiting for {name}"),
            }
        }
    }

    /// Assert that no event named `name` arrives within `wait`
    pub async fn expect_no_event(&mut self, name: &str, wait: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            match self.next_event(remaining).await? {
                Some(event) if event["event"] == name => {
                    anyhow::bail!("Unexpected {name}: {event}")
                }
                Some(_) => continue,
                None => return Ok(()),
            }
        }
    }

    /// Authenticate and wait for the resulting presence broadcast
    ///
    /// Only valid when `user_id` is not already online.
    pub async fn auth(&mut self, user_id: &str) -> Result<()> {
        self.send(&crate::auth_frame(user_id)).await?;
        loop {
            let data = self.expect_event("presence:update").await?;
            if data["userId"] == user_id && data["isOnline"] == true {
                return Ok(());
            }
        }
    }

    /// Close the connection
    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
