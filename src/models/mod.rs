use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<u32>,
}

impl Product {
    /// At or below the reorder threshold. Products without a threshold never are.
    pub fn is_low_stock(&self) -> bool {
        self.low_stock_threshold
            .map(|threshold| self.qty <= threshold)
            .unwrap_or(false)
    }

    /// Case-insensitive substring match against name or SKU.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.sku.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub vendor: String,
    pub date: String,
    pub total: f64,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of_id: Option<String>,
    pub created_at: String,
}

impl Invoice {
    pub fn is_duplicate(&self) -> bool {
        self.duplicate_of_id.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub qty: u32,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    #[serde(default)]
    pub similar_invoices: Vec<Invoice>,
    pub confidence: f64,
}

impl DuplicateCheck {
    pub fn none() -> Self {
        DuplicateCheck {
            is_duplicate: false,
            similar_invoices: Vec::new(),
            confidence: 0.0,
        }
    }

    /// The invoice a save should be linked to, if this check flagged a duplicate.
    pub fn duplicate_of_id(&self) -> Option<String> {
        if !self.is_duplicate {
            return None;
        }
        self.similar_invoices.first().map(|invoice| invoice.id.clone())
    }

    pub fn closest_match(&self) -> Option<&Invoice> {
        self.similar_invoices.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    pub vendor: String,
    pub date: String,
    pub total: f64,
}

impl ExtractedData {
    /// Placeholder used until extraction exists: no vendor, today's date, zero total.
    pub fn blank(today: impl Into<String>) -> Self {
        ExtractedData {
            vendor: String::new(),
            date: today.into(),
            total: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub image_base64: String,
    pub duplicate_check: DuplicateCheck,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ExtractedData>,
}

impl ScanResult {
    pub fn new(image_base64: impl Into<String>, duplicate_check: DuplicateCheck, today: &str) -> Self {
        ScanResult {
            image_base64: image_base64.into(),
            duplicate_check,
            extracted_data: Some(ExtractedData::blank(today)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckDuplicatesRequest {
    pub image_base64: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateInvoiceRequest {
    pub vendor: String,
    pub date: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveInvoiceRequest {
    pub vendor: String,
    pub date: String,
    pub total: f64,
    pub image_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_of_id: Option<String>,
}
