use crate::use_cases::ConnId;
use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

/// Hands out the id that tags a websocket connection in the session registry and in its
/// `conn` log span.
///
/// Ids only need to be unique within one process, so a counter is enough. It starts from the
/// clock so a restarted server does not reuse the previous run's ids, keeping `conn_id` log
/// lines from two runs apart when logs are aggregated.
pub fn next_conn_id() -> ConnId {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| {
        let start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        AtomicU64::new(start)
    });
    counter.fetch_add(1, Ordering::Relaxed)
}
