//! Plain-text views of the screen controllers.

use std::fmt::Write;

use crate::config::Platform;
use crate::models::{Invoice, Product};
use crate::screens::camera::{CameraOp, CameraScreen, Permission};
use crate::screens::home::{HomeOp, HomeScreen};
use crate::screens::inventory::{InventoryOp, InventoryScreen};
use crate::screens::navigation::Route;
use crate::screens::review::{ReviewOp, ReviewScreen};
use crate::screens::FlowState;
use crate::services::notify::{Notice, NoticeLevel};
use crate::utils::format_money;

fn title(route: Route) -> String {
    format!("== {} ==\n", route.title())
}

pub fn home(screen: &HomeScreen) -> String {
    let mut out = title(Route::Home);
    out.push_str("Invoice Scanner\nScan invoices and manage inventory\n\n");
    out.push_str("[scan] Scan Invoice   [inventory] View Inventory\n\n");
    out.push_str("Recent Invoices\n");

    let invoices = screen.invoices();
    if invoices.is_empty() {
        if screen.state() == FlowState::InFlight(HomeOp::Loading) {
            out.push_str("Loading...\n");
        } else {
            out.push_str("No recent invoices\n");
        }
        return out;
    }
    for (index, invoice) in invoices.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", index + 1, invoice_row(invoice));
    }
    out
}

pub fn invoice_row(invoice: &Invoice) -> String {
    let mut row = format!("{}  {}  {}", invoice.vendor, invoice.date, format_money(invoice.total));
    if invoice.is_duplicate() {
        row.push_str("  [Duplicate]");
    }
    row
}

pub fn camera(screen: &CameraScreen) -> String {
    let mut out = title(Route::Camera);
    match screen.permission() {
        Permission::Unknown => {
            out.push_str("Requesting camera permission...\n");
            return out;
        }
        Permission::Denied => {
            out.push_str("Camera permission denied\n[permission] Grant Permission\n");
            return out;
        }
        Permission::Granted => {}
    }

    let instructions = match screen.platform() {
        Platform::Native => "Position the invoice within the frame and tap to capture",
        Platform::Web => "Click to select an invoice image file",
    };
    let _ = writeln!(out, "{}", instructions);
    match screen.state() {
        FlowState::InFlight(CameraOp::Capturing) => out.push_str("Capturing...\n"),
        FlowState::InFlight(CameraOp::Processing) => out.push_str("Processing...\n"),
        _ => out.push_str("[capture] Capture\n"),
    }
    out
}

pub fn review(screen: &ReviewScreen) -> String {
    let mut out = title(Route::Review);
    if screen.banner_visible() {
        out.push_str("! Potential Duplicate Detected\n");
        out.push_str("  This invoice appears similar to a previously scanned invoice.\n");
        if let Some(summary) = screen.similar_summary() {
            let _ = writeln!(out, "  {}", summary);
        }
        out.push_str("  [duplicate] Mark as Duplicate   [continue] Continue Anyway\n");
    }

    let form = screen.form();
    let _ = writeln!(out, "Vendor: {}", form.vendor);
    let _ = writeln!(out, "Date:   {}", form.date);
    let _ = writeln!(out, "Total:  {}", form.total);

    if let Some(message) = screen.validation_message() {
        let _ = writeln!(out, "{}", message);
    }
    match screen.state() {
        FlowState::InFlight(ReviewOp::Validating) => out.push_str("Validating...\n"),
        FlowState::InFlight(ReviewOp::Saving) => out.push_str("Saving...\n"),
        _ => out.push_str("[validate] Validate   [save] Save Invoice\n"),
    }
    out
}

pub fn inventory(screen: &InventoryScreen) -> String {
    let mut out = title(Route::Inventory);
    let query = screen.query();
    if !query.is_empty() {
        let _ = writeln!(out, "Search: {}", query);
    }
    let _ = writeln!(out, "{}", screen.header());

    if let FlowState::InFlight(InventoryOp::Loading) = screen.state() {
        if screen.products().is_empty() {
            out.push_str("Loading...\n");
            return out;
        }
    }
    if let Some(message) = screen.empty_message() {
        let _ = writeln!(out, "{}", message);
        return out;
    }
    for product in screen.visible() {
        out.push_str(&product_row(&product));
    }
    out
}

pub fn product_row(product: &Product) -> String {
    let mut row = format!("{}  SKU: {}  Qty: {}", product.name, product.sku, product.qty);
    if product.is_low_stock() {
        row.push_str("  [LOW]");
    }
    row.push('\n');
    if let Some(threshold) = product.low_stock_threshold {
        let _ = writeln!(row, "  Low stock threshold: {}", threshold);
    }
    row
}

pub fn notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Prompt => format!("-- {} --\n{}", notice.title, notice.message),
        NoticeLevel::Success | NoticeLevel::Error => format!("[{}] {}", notice.title, notice.message),
    }
}
