//! Stack navigation. The scan result is the only state that crosses screens
//! and it lives in a single-use slot.

use tracing::debug;

use crate::models::ScanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Camera,
    Review,
    Inventory,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "MyStock AI",
            Route::Camera => "Scan Invoice",
            Route::Review => "Review Invoice",
            Route::Inventory => "Inventory",
        }
    }
}

pub struct Navigator {
    stack: Vec<Route>,
    scan_slot: Option<ScanResult>,
}

impl Navigator {
    pub fn new() -> Self {
        Navigator {
            stack: vec![Route::Home],
            scan_slot: None,
        }
    }

    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::Home)
    }

    /// Go to `route`, popping back to it if it is already on the stack.
    /// Review is only reachable through [`Navigator::open_review`].
    pub fn navigate(&mut self, route: Route) -> bool {
        if route == Route::Review && self.scan_slot.is_none() {
            return false;
        }
        match self.stack.iter().position(|r| *r == route) {
            Some(pos) => {
                while self.stack.len() > pos + 1 {
                    self.pop();
                }
            }
            None => self.stack.push(route),
        }
        debug!(route = ?route, "Navigated");
        true
    }

    pub fn open_review(&mut self, scan: ScanResult) {
        self.scan_slot = Some(scan);
        self.navigate(Route::Review);
    }

    /// Hand the pending scan to the review screen. Yields it at most once.
    pub fn take_scan(&mut self) -> Option<ScanResult> {
        self.scan_slot.take()
    }

    pub fn back(&mut self) -> Option<Route> {
        if self.stack.len() <= 1 {
            return None;
        }
        self.pop();
        Some(self.current())
    }

    fn pop(&mut self) {
        if self.stack.pop() == Some(Route::Review) {
            self.scan_slot = None;
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
