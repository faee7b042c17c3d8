/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Single-slot correlation of an outbound request with its asynchronous response.
//!
//! The [BlockFetcher] holds at most one outstanding [FetchTask] at a time, system-wide. The
//! task pairs a match predicate with an executor; whichever of {matching response, deadline
//! expiry} happens first takes the task out of the slot and runs exactly one of
//! {executor, expire}. Expiry is the only cancellation mechanism: there is no cancel-on-demand.
//!
//! The slot sits behind its own lock because it is touched both from message-dispatch contexts
//! ([BlockFetcher::try_execute]) and from the [monitor thread](start_fetch_monitor) that drives
//! expiry.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ed25519_dalek::VerifyingKey;

use crate::logging::debug;
use crate::messages::SyncMessage;

pub(crate) type MatchFn = Box<dyn Fn(&SyncMessage) -> bool + Send + 'static>;
pub(crate) type ExecutorFn = Box<dyn FnOnce(SyncMessage) + Send + 'static>;
pub(crate) type ExpireFn = Box<dyn FnOnce() + Send + 'static>;

/// The sole outstanding request/response correlation.
pub(crate) struct FetchTask {
    /// Only responses from this peer are considered.
    pub(crate) peer: VerifyingKey,
    /// Whether an inbound message is the response this task is waiting for.
    pub(crate) matcher: MatchFn,
    /// Consumes the matching response.
    pub(crate) executor: ExecutorFn,
    /// Runs if no matching response arrives before `deadline`.
    pub(crate) expire: ExpireFn,
    pub(crate) deadline: Instant,
}

pub(crate) struct BlockFetcher {
    slot: Mutex<Option<FetchTask>>,
}

impl BlockFetcher {
    pub(crate) fn new() -> BlockFetcher {
        BlockFetcher {
            slot: Mutex::new(None),
        }
    }

    /// The number of outstanding tasks: 0 or 1. Callers use this as the fetch-occupancy guard.
    pub(crate) fn len(&self) -> usize {
        if self.slot.lock().unwrap().is_some() {
            1
        } else {
            0
        }
    }

    /// Register `task` as the sole outstanding task. Returns false, leaving the incumbent task
    /// and its deadline untouched, if the slot is already occupied.
    pub(crate) fn add_task(&self, task: FetchTask) -> bool {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_some() {
            return false;
        }
        *slot = Some(task);
        true
    }

    /// Test `message` against the outstanding task, if any. On a match the slot is cleared
    /// first, then the executor consumes the message; the slot is free again regardless of what
    /// the executor does. A message that matches nothing is handed back to the caller.
    pub(crate) fn try_execute(
        &self,
        origin: &VerifyingKey,
        message: SyncMessage,
    ) -> Option<SyncMessage> {
        let task = {
            let mut slot = self.slot.lock().unwrap();
            match slot.as_ref() {
                Some(task) if task.peer == *origin && (task.matcher)(&message) => slot.take(),
                _ => None,
            }
        };

        match task {
            Some(task) => {
                (task.executor)(message);
                debug::close_fetching();
                None
            }
            None => Some(message),
        }
    }

    /// Clear the slot and run the task's expiry callback if its deadline has passed.
    pub(crate) fn poll_expired(&self) {
        let expired = {
            let mut slot = self.slot.lock().unwrap();
            match slot.as_ref() {
                Some(task) if Instant::now() >= task.deadline => slot.take(),
                _ => None,
            }
        };

        if let Some(task) = expired {
            (task.expire)();
        }
    }
}

/// Spawn the thread that drives [BlockFetcher::poll_expired] until a shutdown signal arrives.
pub(crate) fn start_fetch_monitor(
    fetcher: Arc<BlockFetcher>,
    shutdown_signal: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        match shutdown_signal.try_recv() {
            Ok(()) => return,
            Err(TryRecvError::Empty) => (),
            Err(TryRecvError::Disconnected) => {
                panic!("Fetch monitor thread disconnected from main thread")
            }
        }

        fetcher.poll_expired();
        thread::sleep(Duration::from_millis(25));
    })
}
