use crate::use_cases::SessionRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    // Every connect, move, disconnect, and tick goes through this one lock.
    pub sessions: Arc<Mutex<SessionRegistry>>,
}
