use std::{
    sync::{
        mpsc::{self, Sender},
        Arc,
    },
    thread::JoinHandle,
    time::Duration,
};

use viewsync::config::SyncConfiguration;
use viewsync::state::{start_state_executor, StateWriterHandle};
use viewsync::sync::process::Synchronizer;

use super::{bridge::MockBridge, network::MockNetwork, state::MockState};

/// A fully wired synchronizer over mock collaborators: the state executor and fetch monitor
/// threads run for the lifetime of the node and are shut down on drop.
pub(crate) struct SyncNode {
    pub(crate) synchronizer: Synchronizer<MockNetwork>,
    pub(crate) network: MockNetwork,
    pub(crate) state: MockState,
    pub(crate) bridge: Arc<MockBridge>,
    pub(crate) state_writer: StateWriterHandle,
    fetch_shutdown: Option<Sender<()>>,
    state_shutdown: Option<Sender<()>>,
    fetch_monitor: Option<JoinHandle<()>>,
    state_executor: Option<JoinHandle<()>>,
}

pub(crate) fn default_config() -> SyncConfiguration {
    SyncConfiguration::builder()
        .fetch_timeout(Duration::from_secs(10))
        .syncing_cache_ttl(Duration::from_secs(10))
        .build()
}

impl SyncNode {
    pub(crate) fn start(state: MockState, config: SyncConfiguration) -> SyncNode {
        let network = MockNetwork::new();
        let bridge = Arc::new(MockBridge::new());

        let (state_shutdown, state_shutdown_receiver) = mpsc::channel();
        let (state_writer, state_executor) =
            start_state_executor(Box::new(state.clone()), state_shutdown_receiver);

        let (fetch_shutdown, fetch_shutdown_receiver) = mpsc::channel();
        let (synchronizer, fetch_monitor) = Synchronizer::start(
            config,
            network.clone(),
            Arc::new(state.clone()),
            Arc::new(state.clone()),
            state_writer.clone(),
            bridge.clone(),
            fetch_shutdown_receiver,
        );

        SyncNode {
            synchronizer,
            network,
            state,
            bridge,
            state_writer,
            fetch_shutdown: Some(fetch_shutdown),
            state_shutdown: Some(state_shutdown),
            fetch_monitor: Some(fetch_monitor),
            state_executor: Some(state_executor),
        }
    }

    /// Block until every mutation queued so far has been executed. Commands run in submission
    /// order, so an empty round-trip through the executor flushes the queue.
    pub(crate) fn flush_state(&self) {
        self.state_writer.call(|_| {})
    }
}

impl Drop for SyncNode {
    fn drop(&mut self) {
        if let Some(shutdown) = self.fetch_shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(shutdown) = self.state_shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(monitor) = self.fetch_monitor.take() {
            let _ = monitor.join();
        }
        if let Some(executor) = self.state_executor.take() {
            let _ = executor.join();
        }
    }
}
