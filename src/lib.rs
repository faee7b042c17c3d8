/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! viewsync is the peer-to-peer catch-up subprotocol of a leader-rotation BFT consensus engine.
//! A node that falls behind — missing a block, a quorum certificate, a set of prepare-votes, or
//! a view-change certificate — uses this crate to discover the gap, request the missing
//! artifact from a specific peer, correlate the asynchronous response, verify it, and splice it
//! into local consensus state. It offers:
//! 1. One handler entry point per wire message type ([sync::process::Synchronizer]), safe
//!    against out-of-order and byzantine peer input,
//! 2. Strict epoch/view admission checks on every inbound artifact,
//! 3. A single-writer state executor ([state]) that serializes every consensus-state mutation,
//! 4. and pluggable [network], consensus-state and [verification](bridge) collaborators.

pub mod bridge;

pub mod config;

pub(crate) mod logging;

pub mod messages;

pub mod network;

pub mod state;

pub mod sync;

pub mod types;
