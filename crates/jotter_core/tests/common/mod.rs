#![allow(dead_code)]

use jotter_core::db::open_db_in_memory;
use jotter_core::{Clock, NoteService, SharedConnection};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Clock whose time only moves when a test says so.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Arc<Self> {
        Arc::new(Self {
            now_ms: AtomicI64::new(now_ms),
        })
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) -> i64 {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

pub fn shared_in_memory() -> SharedConnection {
    SharedConnection::new(open_db_in_memory().unwrap())
}

pub fn service_at(
    now_ms: i64,
) -> (
    NoteService<SharedConnection, Arc<ManualClock>>,
    Arc<ManualClock>,
) {
    let clock = ManualClock::at(now_ms);
    let service = NoteService::with_clock(shared_in_memory(), Arc::clone(&clock));
    (service, clock)
}
