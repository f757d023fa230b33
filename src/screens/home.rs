use std::sync::{Arc, Mutex};
use tracing::error;

use crate::models::Invoice;
use crate::screens::{FlowCell, FlowState, LoadOutcome};
use crate::services::gateway::Gateway;
use crate::services::notify::{Notice, Notifier};
use crate::services::state::AppState;
use crate::utils::format_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeOp {
    Loading,
    Refreshing,
}

pub fn invoice_details(invoice: &Invoice) -> String {
    format!(
        "Vendor: {}\nDate: {}\nTotal: {}",
        invoice.vendor,
        invoice.date,
        format_money(invoice.total)
    )
}

pub struct HomeScreen {
    gateway: Arc<dyn Gateway>,
    notifier: Notifier,
    cell: FlowCell<HomeOp>,
    invoices: Mutex<Vec<Invoice>>,
}

impl HomeScreen {
    pub fn new(state: &AppState) -> Self {
        Self::with_parts(state.gateway.clone(), state.notifier.clone())
    }

    pub fn with_parts(gateway: Arc<dyn Gateway>, notifier: Notifier) -> Self {
        HomeScreen {
            gateway,
            notifier,
            cell: FlowCell::new(),
            invoices: Mutex::new(Vec::new()),
        }
    }

    pub async fn mount(&self) -> LoadOutcome {
        self.load(HomeOp::Loading).await
    }

    pub async fn refresh(&self) -> LoadOutcome {
        self.load(HomeOp::Refreshing).await
    }

    /// Recent invoices in the order the gateway returned them.
    pub fn invoices(&self) -> Vec<Invoice> {
        self.invoices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn state(&self) -> FlowState<HomeOp> {
        self.cell.state()
    }

    /// Show the read-only details prompt for the invoice at `index`.
    pub fn select(&self, index: usize) -> Option<Invoice> {
        let invoice = self.invoices.lock().unwrap_or_else(|e| e.into_inner()).get(index).cloned()?;
        self.notifier
            .emit(Notice::prompt("Invoice Details", invoice_details(&invoice)));
        Some(invoice)
    }

    pub fn unmount(&self) {
        self.cell.unmount();
    }

    async fn load(&self, op: HomeOp) -> LoadOutcome {
        if !self.cell.try_begin(op) {
            return LoadOutcome::Ignored;
        }
        let result = self.gateway.get_recent_invoices().await;
        if !self.cell.is_mounted() {
            return LoadOutcome::Discarded;
        }
        match result {
            Ok(invoices) => {
                let count = invoices.len();
                *self.invoices.lock().unwrap_or_else(|e| e.into_inner()) = invoices;
                self.cell.reset();
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                error!("Error loading recent invoices: {}", err);
                self.notifier.emit(Notice::error("Failed to load recent invoices"));
                self.cell.fail(err.to_string());
                LoadOutcome::Failed(err.to_string())
            }
        }
    }
}
