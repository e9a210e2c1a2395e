use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use ethlean_types::{
    block::SignedBlock, clock::SECONDS_PER_INTERVAL, state::State, vote::SignedVote,
};
use spawned_concurrency::tasks::{
    CallResponse, CastResponse, GenServer, GenServerHandle, send_after,
};
use store::Store;
use tracing::{error, warn};

mod metrics;
pub mod store;

/// Shared handle to the forkchoice store.
///
/// All store access is serialized through this lock; it is held for the
/// duration of a single store operation and never across an await point.
pub type SharedStore = Arc<Mutex<Store>>;

/// Handle to the chain service that processes blocks, votes and clock ticks.
#[derive(Clone)]
pub struct BlockChain {
    handle: GenServerHandle<BlockChainServer>,
    store: SharedStore,
}

impl BlockChain {
    /// Start the chain service from a genesis state.
    ///
    /// The first clock tick is scheduled for the genesis time; before that
    /// the service only reacts to incoming blocks and votes.
    pub fn spawn(genesis_state: State) -> BlockChain {
        let genesis_time = genesis_state.config.genesis_time;
        let store: SharedStore = Arc::new(Mutex::new(Store::from_genesis(genesis_state)));
        let handle = BlockChainServer {
            store: store.clone(),
        }
        .start();
        let time_until_genesis = (SystemTime::UNIX_EPOCH + Duration::from_secs(genesis_time))
            .duration_since(SystemTime::now())
            .unwrap_or_default();
        send_after(time_until_genesis, handle.clone(), CastMessage::Tick);
        BlockChain { handle, store }
    }

    /// Shared store handle for read-side consumers such as the HTTP API.
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    /// Sends a block to the chain service for processing.
    ///
    /// Note that this does not wait for processing, since the internal
    /// [`GenServerHandle::cast`] is non-blocking.
    pub async fn notify_new_block(&mut self, block: SignedBlock) {
        let _ = self
            .handle
            .cast(CastMessage::NewBlock(Box::new(block)))
            .await
            .inspect_err(|err| error!(%err, "Failed to notify chain service of new block"));
    }

    /// Sends a vote to the chain service for processing.
    pub async fn notify_new_vote(&mut self, vote: SignedVote) {
        let _ = self
            .handle
            .cast(CastMessage::NewVote(vote))
            .await
            .inspect_err(|err| error!(%err, "Failed to notify chain service of new vote"));
    }
}

struct BlockChainServer {
    store: SharedStore,
}

impl BlockChainServer {
    fn on_tick(&mut self, timestamp: u64) {
        let mut store = self.store.lock().unwrap();
        store.on_tick(timestamp);

        metrics::update_current_slot(store.current_slot());
        metrics::update_safe_target_slot(store.safe_target_slot());
    }

    fn on_block(&mut self, signed_block: SignedBlock) {
        let slot = signed_block.message.slot;
        let mut store = self.store.lock().unwrap();
        if let Err(err) = store.on_block(signed_block) {
            warn!(%slot, %err, "Failed to process block");
            return;
        }
        metrics::update_head_slot(slot);
        metrics::update_latest_justified_slot(store.latest_justified().slot);
        metrics::update_latest_finalized_slot(store.latest_finalized().slot);
    }

    fn on_vote(&mut self, signed_vote: SignedVote) {
        self.store.lock().unwrap().on_vote(signed_vote);
    }
}

#[derive(Clone, Debug)]
enum CastMessage {
    NewBlock(Box<SignedBlock>),
    NewVote(SignedVote),
    Tick,
}

impl GenServer for BlockChainServer {
    type CallMsg = ();

    type CastMsg = CastMessage;

    type OutMsg = ();

    type Error = ();

    async fn handle_call(
        &mut self,
        _message: Self::CallMsg,
        _handle: &GenServerHandle<Self>,
    ) -> CallResponse<Self> {
        CallResponse::Unused
    }

    async fn handle_cast(
        &mut self,
        message: Self::CastMsg,
        handle: &GenServerHandle<Self>,
    ) -> CastResponse {
        match message {
            CastMessage::Tick => {
                let timestamp = SystemTime::UNIX_EPOCH
                    .elapsed()
                    .expect("already past the unix epoch");
                self.on_tick(timestamp.as_secs());
                // Schedule the next tick at the start of the next interval,
                // aligned to wall-clock seconds.
                let millis_to_next_tick = ((timestamp.as_secs() as u128 + SECONDS_PER_INTERVAL as u128)
                    * 1000
                    - timestamp.as_millis()) as u64;
                send_after(
                    Duration::from_millis(millis_to_next_tick),
                    handle.clone(),
                    message,
                );
            }
            CastMessage::NewBlock(signed_block) => {
                self.on_block(*signed_block);
            }
            CastMessage::NewVote(signed_vote) => self.on_vote(signed_vote),
        }
        CastResponse::NoReply
    }
}
