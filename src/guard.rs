//! Single-flight guard for admin form submissions.
//!
//! Each rendered form carries a random request id. A submission must acquire a
//! permit for its id before touching the store; while the permit is held the
//! same id is rejected as in flight, and once it is dropped the id is
//! remembered as done so a resubmitted form is not applied twice.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::token;

const REMEMBERED_IDS: usize = 1024;
const REQUEST_ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InFlight,
    AlreadyDone,
}

#[derive(Default)]
struct GuardState {
    in_flight: HashSet<String>,
    done: HashSet<String>,
    done_order: VecDeque<String>,
}

#[derive(Clone, Default)]
pub struct SubmissionGuard {
    state: Arc<Mutex<GuardState>>,
}

/// Held for the duration of one submission. Id-less permits are not remembered.
pub struct Permit {
    id: Option<String>,
    state: Arc<Mutex<GuardState>>,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh id to embed in a rendered form.
    pub fn new_request_id() -> String {
        token::generate(REQUEST_ID_LEN)
    }

    /// Acquire a permit for `request_id`. Submissions without an id are never
    /// deduplicated.
    pub fn begin(&self, request_id: &str) -> Result<Permit, Rejection> {
        if request_id.is_empty() {
            return Ok(Permit {
                id: None,
                state: self.state.clone(),
            });
        }
        let mut state = self.state.lock();
        if state.in_flight.contains(request_id) {
            return Err(Rejection::InFlight);
        }
        if state.done.contains(request_id) {
            return Err(Rejection::AlreadyDone);
        }
        state.in_flight.insert(request_id.to_string());
        Ok(Permit {
            id: Some(request_id.to_string()),
            state: self.state.clone(),
        })
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        let mut state = self.state.lock();
        state.in_flight.remove(&id);
        if state.done.insert(id.clone()) {
            state.done_order.push_back(id);
        }
        while state.done_order.len() > REMEMBERED_IDS {
            if let Some(oldest) = state.done_order.pop_front() {
                state.done.remove(&oldest);
            }
        }
    }
}
