pub(crate) mod artifacts;

pub(crate) mod bridge;

pub(crate) mod logging;

pub(crate) mod network;

pub(crate) mod node;

pub(crate) mod state;
