/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types common across the subprotocols of the crate.

pub mod basic;

pub mod block;

pub mod certificates;
