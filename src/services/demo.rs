//! In-memory gateway for running without a backend.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::sync::Mutex;
use tracing::info;

use crate::error::GatewayError;
use crate::models::{
    DuplicateCheck, Invoice, Product, SaveInvoiceRequest, ValidateInvoiceRequest, ValidationResult,
};
use crate::services::gateway::Gateway;
use crate::utils::now_rfc3339;

pub struct DemoGateway {
    products: Vec<Product>,
    invoices: Mutex<Vec<Invoice>>,
}

impl DemoGateway {
    pub fn new() -> Self {
        DemoGateway {
            products: demo_products(),
            invoices: Mutex::new(demo_invoices()),
        }
    }
}

impl Default for DemoGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for DemoGateway {
    async fn check_duplicates(&self, _image_base64: &str) -> Result<DuplicateCheck, GatewayError> {
        Ok(DuplicateCheck::none())
    }

    async fn validate_invoice(&self, _request: &ValidateInvoiceRequest) -> Result<ValidationResult, GatewayError> {
        Ok(ValidationResult {
            is_valid: true,
            question: None,
        })
    }

    async fn save_invoice(&self, request: &SaveInvoiceRequest) -> Result<Invoice, GatewayError> {
        let invoice = Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            vendor: request.vendor.clone(),
            date: request.date.clone(),
            total: request.total,
            image_url: "placeholder.jpg".to_string(),
            duplicate_of_id: request.duplicate_of_id.clone(),
            created_at: now_rfc3339(),
        };
        let mut invoices = self.invoices.lock().unwrap_or_else(|e| e.into_inner());
        invoices.push(invoice.clone());
        info!(id = %invoice.id, vendor = %invoice.vendor, "Demo invoice saved");
        Ok(invoice)
    }

    async fn get_inventory(&self, search: Option<&str>) -> Result<Vec<Product>, GatewayError> {
        let products = match search.filter(|q| !q.is_empty()) {
            Some(query) => self.products.iter().filter(|p| p.matches(query)).cloned().collect(),
            None => self.products.clone(),
        };
        Ok(products)
    }

    async fn get_recent_invoices(&self) -> Result<Vec<Invoice>, GatewayError> {
        let mut invoices = self.invoices.lock().unwrap_or_else(|e| e.into_inner()).clone();
        invoices.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
        Ok(invoices)
    }
}

// Unparseable timestamps sort last.
fn created_at(invoice: &Invoice) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&invoice.created_at).ok()
}

fn product(id: &str, name: &str, sku: &str, qty: u32, threshold: u32) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        sku: sku.to_string(),
        qty,
        low_stock_threshold: Some(threshold),
    }
}

fn invoice(id: &str, vendor: &str, date: &str, total: f64, created_at: &str, duplicate_of_id: Option<&str>) -> Invoice {
    Invoice {
        id: id.to_string(),
        vendor: vendor.to_string(),
        date: date.to_string(),
        total,
        image_url: format!("demo-image-{}.jpg", id),
        duplicate_of_id: duplicate_of_id.map(str::to_string),
        created_at: created_at.to_string(),
    }
}

pub fn demo_products() -> Vec<Product> {
    vec![
        product("1", "Office Chair", "CHAIR-001", 15, 5),
        product("2", "Desk Lamp", "LAMP-002", 3, 10),
        product("3", "Notebook Set", "NOTE-003", 25, 15),
        product("4", "Pen Set", "PEN-004", 8, 20),
        product("5", "Monitor Stand", "STAND-005", 12, 8),
    ]
}

pub fn demo_invoices() -> Vec<Invoice> {
    vec![
        invoice("1", "Office Supplies Co.", "2024-01-15", 125.50, "2024-01-15T10:30:00Z", None),
        invoice("2", "Tech Solutions Inc.", "2024-01-14", 89.99, "2024-01-14T14:20:00Z", None),
        invoice("3", "Office Supplies Co.", "2024-01-13", 45.75, "2024-01-13T09:15:00Z", Some("1")),
    ]
}
