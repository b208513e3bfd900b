use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::gpio::PinController;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Mutex<PinController>>,
    /// Public tunnel URL, set once at startup when a tunnel is open.
    pub public_url: Option<Arc<str>>,
    pub started_at: DateTime<Local>,
}

impl AppState {
    pub fn new(controller: PinController, public_url: Option<String>) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            public_url: public_url.map(Arc::from),
            started_at: Local::now(),
        }
    }
}
