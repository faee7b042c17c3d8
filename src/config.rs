/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Operator-specified parameters of the catch-up protocol.

use std::time::Duration;

use typed_builder::TypedBuilder;

/// Immutable parameters that define the behaviour of the
/// [Synchronizer](crate::sync::process::Synchronizer).
///
/// ## Fetch timeout
///
/// A registered fetch task that receives no matching response within `fetch_timeout` expires,
/// releasing the single fetch slot so that a later fetch can retry from scratch. Expiry is the
/// only cancellation mechanism a fetch has.
///
/// ## Syncing cache TTL
///
/// A requested block index or block hash suppresses duplicate requests for the same key until
/// `syncing_cache_ttl` has elapsed. This prevents request storms when many peers independently
/// report the same gap.
#[derive(Clone, TypedBuilder)]
#[builder(builder_method(doc = "
    Create a builder for building a [SyncConfiguration]. On the builder call the following
    methods to construct a valid [SyncConfiguration].

    Required:
    - `.fetch_timeout(...)`
    - `.syncing_cache_ttl(...)`
"))]
pub struct SyncConfiguration {
    #[builder(setter(
        doc = "Set how long a registered fetch task waits for a matching response before it expires. Required."
    ))]
    pub fetch_timeout: Duration,
    #[builder(setter(
        doc = "Set how long a requested block index or block hash suppresses duplicate requests for the same key. Required."
    ))]
    pub syncing_cache_ttl: Duration,
}
