use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::models::{
    CheckDuplicatesRequest, DuplicateCheck, Invoice, Product, SaveInvoiceRequest, ValidateInvoiceRequest,
    ValidationResult,
};

/// The backend the screens talk to. Every call may fail; callers never retry.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn check_duplicates(&self, image_base64: &str) -> Result<DuplicateCheck, GatewayError>;

    async fn validate_invoice(&self, request: &ValidateInvoiceRequest) -> Result<ValidationResult, GatewayError>;

    async fn save_invoice(&self, request: &SaveInvoiceRequest) -> Result<Invoice, GatewayError>;

    async fn get_inventory(&self, search: Option<&str>) -> Result<Vec<Product>, GatewayError>;

    async fn get_recent_invoices(&self) -> Result<Vec<Invoice>, GatewayError>;
}

/// JSON-over-HTTP gateway client.
#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = Client::builder().timeout(timeout).default_headers(headers).build()?;
        Ok(HttpGateway {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T, GatewayError> {
        let url = self.url(endpoint);
        debug!("GET {}", url);
        let response = self.http.get(&url).query(query).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<T, GatewayError> {
        let url = self.url(endpoint);
        debug!("POST {}", url);
        let response = self.http.post(&url).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        warn!("Gateway answered {} {}", status.as_u16(), status_text);
        return Err(GatewayError::Status {
            status: status.as_u16(),
            status_text,
        });
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn check_duplicates(&self, image_base64: &str) -> Result<DuplicateCheck, GatewayError> {
        let request = CheckDuplicatesRequest {
            image_base64: image_base64.to_string(),
        };
        self.post("/invoices/check-duplicates", &request).await
    }

    async fn validate_invoice(&self, request: &ValidateInvoiceRequest) -> Result<ValidationResult, GatewayError> {
        self.post("/invoices/validate", request).await
    }

    async fn save_invoice(&self, request: &SaveInvoiceRequest) -> Result<Invoice, GatewayError> {
        self.post("/invoices", request).await
    }

    async fn get_inventory(&self, search: Option<&str>) -> Result<Vec<Product>, GatewayError> {
        match search.filter(|q| !q.is_empty()) {
            Some(query) => self.get("/inventory", &[("search", query)]).await,
            None => self.get("/inventory", &[]).await,
        }
    }

    async fn get_recent_invoices(&self) -> Result<Vec<Invoice>, GatewayError> {
        self.get("/invoices/recent", &[]).await
    }
}
