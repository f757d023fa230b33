//! Scripted in-memory gateway for controller tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::error::GatewayError;
use crate::models::{
    DuplicateCheck, Invoice, Product, SaveInvoiceRequest, ValidateInvoiceRequest, ValidationResult,
};
use crate::services::gateway::Gateway;
use crate::services::notify::{Notice, Notifier};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CheckDuplicates(String),
    Validate(ValidateInvoiceRequest),
    Save(SaveInvoiceRequest),
    Inventory(Option<String>),
    Recent,
}

pub struct ScriptedGateway {
    duplicate_check: Mutex<DuplicateCheck>,
    validation: Mutex<ValidationResult>,
    inventory: Mutex<Vec<Product>>,
    recent: Mutex<Vec<Invoice>>,
    failing: Mutex<HashSet<&'static str>>,
    gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        ScriptedGateway {
            duplicate_check: Mutex::new(DuplicateCheck::none()),
            validation: Mutex::new(ValidationResult {
                is_valid: true,
                question: None,
            }),
            inventory: Mutex::new(Vec::new()),
            recent: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            gate: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call waits for a `notify_one` on `gate` before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_duplicate_check(&self, check: DuplicateCheck) {
        *self.duplicate_check.lock().unwrap() = check;
    }

    pub fn set_validation(&self, result: ValidationResult) {
        *self.validation.lock().unwrap() = result;
    }

    pub fn set_inventory(&self, products: Vec<Product>) {
        *self.inventory.lock().unwrap() = products;
    }

    pub fn set_recent(&self, invoices: Vec<Invoice>) {
        *self.recent.lock().unwrap() = invoices;
    }

    /// Make `op` ("check", "validate", "save", "inventory", "recent") answer 500.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, op: &'static str, call: Call) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(call);
        tokio::task::yield_now().await;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(GatewayError::Status {
                status: 500,
                status_text: "Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn check_duplicates(&self, image_base64: &str) -> Result<DuplicateCheck, GatewayError> {
        self.enter("check", Call::CheckDuplicates(image_base64.to_string())).await?;
        Ok(self.duplicate_check.lock().unwrap().clone())
    }

    async fn validate_invoice(&self, request: &ValidateInvoiceRequest) -> Result<ValidationResult, GatewayError> {
        self.enter("validate", Call::Validate(request.clone())).await?;
        Ok(self.validation.lock().unwrap().clone())
    }

    async fn save_invoice(&self, request: &SaveInvoiceRequest) -> Result<Invoice, GatewayError> {
        self.enter("save", Call::Save(request.clone())).await?;
        Ok(Invoice {
            id: "saved-1".to_string(),
            vendor: request.vendor.clone(),
            date: request.date.clone(),
            total: request.total,
            image_url: "placeholder.jpg".to_string(),
            duplicate_of_id: request.duplicate_of_id.clone(),
            created_at: "2024-06-01T12:00:00Z".to_string(),
        })
    }

    async fn get_inventory(&self, search: Option<&str>) -> Result<Vec<Product>, GatewayError> {
        self.enter("inventory", Call::Inventory(search.map(str::to_string))).await?;
        Ok(self.inventory.lock().unwrap().clone())
    }

    async fn get_recent_invoices(&self) -> Result<Vec<Invoice>, GatewayError> {
        self.enter("recent", Call::Recent).await?;
        Ok(self.recent.lock().unwrap().clone())
    }
}

pub fn notifier() -> (Notifier, tokio::sync::mpsc::UnboundedReceiver<Notice>) {
    Notifier::channel()
}

pub fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

pub fn product(id: &str, name: &str, sku: &str, qty: u32, threshold: Option<u32>) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        sku: sku.to_string(),
        qty,
        low_stock_threshold: threshold,
    }
}

pub fn invoice(id: &str, vendor: &str, total: f64) -> Invoice {
    Invoice {
        id: id.to_string(),
        vendor: vendor.to_string(),
        date: "2024-01-15".to_string(),
        total,
        image_url: format!("{}.jpg", id),
        duplicate_of_id: None,
        created_at: "2024-01-15T10:30:00Z".to_string(),
    }
}
