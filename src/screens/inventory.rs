//! Inventory screen: server-side search on submit, live filter on every keystroke.

use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use crate::models::Product;
use crate::screens::{FlowCell, FlowState, LoadOutcome};
use crate::services::gateway::Gateway;
use crate::services::notify::{Notice, Notifier};
use crate::services::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryOp {
    Loading,
    Refreshing,
}

/// Products matching `query` by name or SKU, ignoring case. A blank query keeps everything.
pub fn live_filter(products: &[Product], query: &str) -> Vec<Product> {
    if query.trim().is_empty() {
        return products.to_vec();
    }
    products.iter().filter(|p| p.matches(query)).cloned().collect()
}

pub struct InventoryScreen {
    gateway: Arc<dyn Gateway>,
    notifier: Notifier,
    cell: FlowCell<InventoryOp>,
    products: Mutex<Vec<Product>>,
    visible: Mutex<Vec<Product>>,
    query: Mutex<String>,
}

impl InventoryScreen {
    pub fn new(state: &AppState) -> Self {
        Self::with_parts(state.gateway.clone(), state.notifier.clone())
    }

    pub fn with_parts(gateway: Arc<dyn Gateway>, notifier: Notifier) -> Self {
        InventoryScreen {
            gateway,
            notifier,
            cell: FlowCell::new(),
            products: Mutex::new(Vec::new()),
            visible: Mutex::new(Vec::new()),
            query: Mutex::new(String::new()),
        }
    }

    pub async fn mount(&self) -> LoadOutcome {
        self.load(None, InventoryOp::Loading).await
    }

    /// Committed search with the current query.
    pub async fn submit(&self) -> LoadOutcome {
        let query = self.query();
        self.load(Some(query.as_str()), InventoryOp::Loading).await
    }

    pub async fn refresh(&self) -> LoadOutcome {
        let query = self.query();
        self.load(Some(query.as_str()), InventoryOp::Refreshing).await
    }

    /// Keystroke: update the query and filter what is already loaded.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        let filtered = {
            let products = self.products.lock().unwrap_or_else(|e| e.into_inner());
            live_filter(&products, &query)
        };
        *self.visible.lock().unwrap_or_else(|e| e.into_inner()) = filtered;
        *self.query.lock().unwrap_or_else(|e| e.into_inner()) = query;
    }

    pub fn query(&self) -> String {
        self.query.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn visible(&self) -> Vec<Product> {
        self.visible.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn state(&self) -> FlowState<InventoryOp> {
        self.cell.state()
    }

    pub fn header(&self) -> String {
        format!("Inventory ({} items)", self.visible.lock().unwrap_or_else(|e| e.into_inner()).len())
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.visible.lock().unwrap_or_else(|e| e.into_inner()).is_empty() {
            return None;
        }
        if self.query().is_empty() {
            Some("No products in inventory")
        } else {
            Some("No products found matching your search")
        }
    }

    pub fn unmount(&self) {
        self.cell.unmount();
    }

    async fn load(&self, search: Option<&str>, op: InventoryOp) -> LoadOutcome {
        if !self.cell.try_begin(op) {
            return LoadOutcome::Ignored;
        }
        let search = search.filter(|q| !q.is_empty());
        let result = self.gateway.get_inventory(search).await;
        if !self.cell.is_mounted() {
            return LoadOutcome::Discarded;
        }
        match result {
            Ok(products) => {
                debug!(count = products.len(), search = ?search, "Inventory loaded");
                let count = products.len();
                *self.visible.lock().unwrap_or_else(|e| e.into_inner()) = products.clone();
                *self.products.lock().unwrap_or_else(|e| e.into_inner()) = products;
                self.cell.reset();
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                error!("Error loading inventory: {}", err);
                self.notifier.emit(Notice::error("Failed to load inventory"));
                self.cell.fail(err.to_string());
                LoadOutcome::Failed(err.to_string())
            }
        }
    }
}
