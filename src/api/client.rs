//! HTTP client for the dashboard REST API.
//!
//! This module provides the [`ApiClient`] struct which handles all HTTP
//! communication with the dashboard backend: orders CRUD, rake queries and
//! allocation, inventory snapshots, dashboard metrics, and simulation
//! controls.

use anyhow::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::types::{ApiResponse, SimulationRake};
use crate::constants;

/// API client for the dashboard server.
///
/// Encapsulates HTTP client configuration and provides methods for all
/// server communication operations. Stateless: each call stands alone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    api_url: String,
}

impl ApiClient {
    /// Creates a new API client targeting `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(constants::HTTP_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Creates an API client with a pre-configured HTTP client.
    ///
    /// Useful for testing or when custom client configuration is needed.
    pub fn with_client(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Returns the API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        let response = self
            .client
            .get(format!("{}{}", self.api_url, path))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("GET {path} failed: {}", response.status());
        }
        Ok(response.json().await?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse<T>> {
        let mut request = self.client.post(format!("{}{}", self.api_url, path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        if !response.status().is_success() {
            anyhow::bail!("POST {path} failed: {}", response.status());
        }
        Ok(response.json().await?)
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Fetch the rakes currently moving in the simulation.
    pub async fn get_active_rakes(&self) -> Result<ApiResponse<Vec<SimulationRake>>> {
        self.get("/simulation/active-rakes").await
    }

    /// Start the simulation at the given speed multiplier.
    pub async fn start_simulation(&self, speed: f64) -> Result<ApiResponse<Value>> {
        self.post("/simulation/start", Some(&json!({ "speed": speed })))
            .await
    }

    /// Pause the running simulation.
    pub async fn pause_simulation(&self) -> Result<ApiResponse<Value>> {
        self.post("/simulation/pause", None).await
    }

    /// Stop the simulation.
    pub async fn stop_simulation(&self) -> Result<ApiResponse<Value>> {
        self.post("/simulation/stop", None).await
    }

    /// Change the speed multiplier of a running simulation.
    pub async fn set_simulation_speed(&self, speed: f64) -> Result<ApiResponse<Value>> {
        self.post("/simulation/speed", Some(&json!({ "speed": speed })))
            .await
    }

    // ------------------------------------------------------------------
    // Dashboard & inventory
    // ------------------------------------------------------------------

    /// Fetch the aggregate dashboard metrics.
    pub async fn get_dashboard_metrics(&self) -> Result<ApiResponse<Value>> {
        self.get("/dashboard/metrics").await
    }

    // ------------------------------------------------------------------
    // Static data
    // ------------------------------------------------------------------

    /// List the static data files the server can serve.
    pub async fn list_static_files(&self) -> Result<ApiResponse<Vec<String>>> {
        self.get("/static-data/files").await
    }

    /// Fetch rows from one static data file, optionally capped at `limit`.
    pub async fn get_static_file(
        &self,
        file: &str,
        limit: Option<usize>,
    ) -> Result<ApiResponse<Value>> {
        let path = match limit {
            Some(limit) => format!("/static-data/{file}?limit={limit}"),
            None => format!("/static-data/{file}"),
        };
        self.get(&path).await
    }

    /// Fetch the summary of one static data file.
    pub async fn get_static_file_summary(&self, file: &str) -> Result<ApiResponse<Value>> {
        self.get(&format!("/static-data/summary/{file}")).await
    }

    /// Fetch the current production inventory snapshot.
    pub async fn get_production_inventory(&self) -> Result<ApiResponse<Value>> {
        self.get("/static-data/production-inventory/current").await
    }

    /// Fetch the current customer orders snapshot.
    pub async fn get_current_customer_orders(&self) -> Result<ApiResponse<Value>> {
        self.get("/static-data/customer-orders/current").await
    }

    /// Fetch the current rake status snapshot.
    pub async fn get_current_rake_status(&self) -> Result<ApiResponse<Value>> {
        self.get("/static-data/rake-status/current").await
    }

    /// Fetch route and transport cost information.
    pub async fn get_route_transport_info(&self) -> Result<ApiResponse<Value>> {
        self.get("/route-transport-info").await
    }

    // ------------------------------------------------------------------
    // Database management
    // ------------------------------------------------------------------

    /// (Re)seed the server database from its static data files.
    pub async fn seed_database(&self) -> Result<ApiResponse<Value>> {
        self.post("/database/seed", None).await
    }

    /// Fetch database row counts and related stats.
    pub async fn get_database_stats(&self) -> Result<ApiResponse<Value>> {
        self.get("/database/stats").await
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// List all customer orders.
    pub async fn list_orders(&self) -> Result<ApiResponse<Vec<Value>>> {
        self.get("/orders").await
    }

    /// Fetch one order by id.
    pub async fn get_order(&self, id: &str) -> Result<ApiResponse<Value>> {
        self.get(&format!("/orders/{id}")).await
    }

    /// Create a new order. The server owns the order shape.
    pub async fn create_order(&self, order: &Value) -> Result<ApiResponse<Value>> {
        self.post("/orders/add", Some(order)).await
    }

    /// Update an existing order.
    pub async fn update_order(&self, id: &str, order: &Value) -> Result<ApiResponse<Value>> {
        let path = format!("/orders/{id}");
        let response = self
            .client
            .put(format!("{}{}", self.api_url, path))
            .json(order)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("PUT {path} failed: {}", response.status());
        }
        Ok(response.json().await?)
    }

    /// Delete an order.
    pub async fn delete_order(&self, id: &str) -> Result<ApiResponse<Value>> {
        let path = format!("/orders/{id}");
        let response = self
            .client
            .delete(format!("{}{}", self.api_url, path))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("DELETE {path} failed: {}", response.status());
        }
        Ok(response.json().await?)
    }

    // ------------------------------------------------------------------
    // Rakes
    // ------------------------------------------------------------------

    /// List all rakes and their status.
    pub async fn list_rakes(&self) -> Result<ApiResponse<Vec<Value>>> {
        self.get("/rakes").await
    }

    /// Submit a rake allocation plan.
    pub async fn allocate_rakes(&self, allocation: &Value) -> Result<ApiResponse<Value>> {
        self.post("/rakes/allocate", Some(allocation)).await
    }
}
