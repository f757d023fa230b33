//! Review screen: edit the extracted fields, validate, save.

use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

use crate::models::{Invoice, SaveInvoiceRequest, ScanResult, ValidateInvoiceRequest, ValidationResult};
use crate::screens::{FlowCell, FlowState};
use crate::services::gateway::Gateway;
use crate::services::notify::{Notice, Notifier};
use crate::services::state::AppState;
use crate::utils::{format_money, parse_decimal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOp {
    Validating,
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerResolution {
    MarkedDuplicate,
    ContinuedAnyway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerState {
    Hidden,
    Shown,
    Dismissed(BannerResolution),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewForm {
    pub vendor: String,
    pub date: String,
    pub total: String,
}

impl ReviewForm {
    pub fn from_scan(scan: &ScanResult) -> Self {
        match &scan.extracted_data {
            Some(data) => ReviewForm {
                vendor: data.vendor.clone(),
                date: data.date.clone(),
                total: data.total.to_string(),
            },
            None => ReviewForm::default(),
        }
    }

    /// Trimmed vendor and date plus the parsed total, or why they can't be sent.
    pub fn checked(&self) -> Result<(String, String, f64), FormIssue> {
        let vendor = self.vendor.trim();
        let date = self.date.trim();
        let total = self.total.trim();
        if vendor.is_empty() || date.is_empty() || total.is_empty() {
            return Err(FormIssue::MissingFields);
        }
        let total = parse_decimal(total).map_err(|_| FormIssue::InvalidTotal)?;
        if !total.is_finite() || total < 0.0 {
            return Err(FormIssue::InvalidTotal);
        }
        Ok((vendor.to_string(), date.to_string(), total))
    }
}

/// Input problems caught before any gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormIssue {
    MissingFields,
    InvalidTotal,
}

impl FormIssue {
    pub fn message(&self) -> &'static str {
        match self {
            FormIssue::MissingFields => "Please fill in all fields",
            FormIssue::InvalidTotal => "Total must be a non-negative number",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidateOutcome {
    Validated(ValidationResult),
    Blocked(FormIssue),
    Ignored,
    Failed(String),
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Invoice),
    Blocked(FormIssue),
    Ignored,
    Failed(String),
    Discarded,
}

pub struct ReviewScreen {
    scan: ScanResult,
    gateway: Arc<dyn Gateway>,
    notifier: Notifier,
    cell: FlowCell<ReviewOp>,
    form: Mutex<ReviewForm>,
    validation: Mutex<Option<ValidationResult>>,
    banner: Mutex<BannerState>,
}

impl ReviewScreen {
    pub fn new(scan: ScanResult, state: &AppState) -> Self {
        Self::with_parts(scan, state.gateway.clone(), state.notifier.clone())
    }

    pub fn with_parts(scan: ScanResult, gateway: Arc<dyn Gateway>, notifier: Notifier) -> Self {
        let form = ReviewForm::from_scan(&scan);
        let banner = if scan.duplicate_check.is_duplicate {
            BannerState::Shown
        } else {
            BannerState::Hidden
        };
        ReviewScreen {
            scan,
            gateway,
            notifier,
            cell: FlowCell::new(),
            form: Mutex::new(form),
            validation: Mutex::new(None),
            banner: Mutex::new(banner),
        }
    }

    pub fn scan(&self) -> &ScanResult {
        &self.scan
    }

    pub fn form(&self) -> ReviewForm {
        self.form.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_vendor(&self, value: impl Into<String>) {
        self.form.lock().unwrap_or_else(|e| e.into_inner()).vendor = value.into();
    }

    pub fn set_date(&self, value: impl Into<String>) {
        self.form.lock().unwrap_or_else(|e| e.into_inner()).date = value.into();
    }

    pub fn set_total(&self, value: impl Into<String>) {
        self.form.lock().unwrap_or_else(|e| e.into_inner()).total = value.into();
    }

    pub fn validation(&self) -> Option<ValidationResult> {
        self.validation.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Line shown under the form for the last validation, if any.
    pub fn validation_message(&self) -> Option<String> {
        let result = self.validation()?;
        if result.is_valid {
            return Some("All fields look good!".to_string());
        }
        result.question.map(|question| format!("? {}", question))
    }

    pub fn state(&self) -> FlowState<ReviewOp> {
        self.cell.state()
    }

    pub fn banner(&self) -> BannerState {
        *self.banner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn banner_visible(&self) -> bool {
        self.banner() == BannerState::Shown
    }

    /// "Similar to: <vendor> - $<total>" for the closest earlier invoice.
    pub fn similar_summary(&self) -> Option<String> {
        self.scan
            .duplicate_check
            .closest_match()
            .map(|invoice| format!("Similar to: {} - {}", invoice.vendor, format_money(invoice.total)))
    }

    /// Dismiss the banner; the save still links to the earlier invoice.
    pub fn mark_as_duplicate(&self) -> bool {
        self.dismiss_banner(BannerResolution::MarkedDuplicate)
    }

    /// Dismiss the banner without changing what gets saved.
    pub fn continue_anyway(&self) -> bool {
        self.dismiss_banner(BannerResolution::ContinuedAnyway)
    }

    fn dismiss_banner(&self, resolution: BannerResolution) -> bool {
        let mut banner = self.banner.lock().unwrap_or_else(|e| e.into_inner());
        if *banner != BannerState::Shown {
            return false;
        }
        *banner = BannerState::Dismissed(resolution);
        true
    }

    pub fn unmount(&self) {
        self.cell.unmount();
    }

    pub async fn validate(&self) -> ValidateOutcome {
        if self.cell.is_busy() {
            return ValidateOutcome::Ignored;
        }
        let (vendor, date, total) = match self.form().checked() {
            Ok(fields) => fields,
            Err(issue) => {
                self.notifier.emit(Notice::prompt("Error", issue.message()));
                return ValidateOutcome::Blocked(issue);
            }
        };
        if !self.cell.try_begin(ReviewOp::Validating) {
            return ValidateOutcome::Ignored;
        }

        let request = ValidateInvoiceRequest { vendor, date, total };
        let result = self.gateway.validate_invoice(&request).await;
        if !self.cell.is_mounted() {
            return ValidateOutcome::Discarded;
        }
        match result {
            Ok(result) => {
                debug!(valid = result.is_valid, "Validation answered");
                *self.validation.lock().unwrap_or_else(|e| e.into_inner()) = Some(result.clone());
                self.cell.reset();
                ValidateOutcome::Validated(result)
            }
            Err(err) => {
                error!("Error validating invoice: {}", err);
                self.notifier.emit(Notice::error("Failed to validate invoice"));
                self.cell.fail(err.to_string());
                ValidateOutcome::Failed(err.to_string())
            }
        }
    }

    pub async fn save(&self) -> SaveOutcome {
        if self.cell.is_busy() {
            return SaveOutcome::Ignored;
        }
        let (vendor, date, total) = match self.form().checked() {
            Ok(fields) => fields,
            Err(issue) => {
                self.notifier.emit(Notice::prompt("Error", issue.message()));
                return SaveOutcome::Blocked(issue);
            }
        };
        if !self.cell.try_begin(ReviewOp::Saving) {
            return SaveOutcome::Ignored;
        }

        let request = SaveInvoiceRequest {
            vendor,
            date,
            total,
            image_base64: self.scan.image_base64.clone(),
            duplicate_of_id: self.scan.duplicate_check.duplicate_of_id(),
        };
        let result = self.gateway.save_invoice(&request).await;
        if !self.cell.is_mounted() {
            return SaveOutcome::Discarded;
        }
        match result {
            Ok(invoice) => {
                info!(id = %invoice.id, duplicate_of = ?invoice.duplicate_of_id, "Invoice saved");
                self.notifier.emit(Notice::success("Invoice saved successfully"));
                self.cell.succeed();
                SaveOutcome::Saved(invoice)
            }
            Err(err) => {
                error!("Error saving invoice: {}", err);
                self.notifier.emit(Notice::error("Failed to save invoice"));
                self.cell.fail(err.to_string());
                SaveOutcome::Failed(err.to_string())
            }
        }
    }
}
