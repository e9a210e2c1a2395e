use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    BitList, VariableList,
    typenum::{U262144, U1073741824},
};
use tree_hash::TreeHash as _;
use tree_hash_derive::TreeHash;

use crate::{
    block::{BlockBody, BlockHeader},
    primitives::{H256, Slot},
};

/// Per-slot history entries a state may retain (2^18 slots, about 12 days).
pub type HistoricalRootsLimit = U262144;

/// A list of historical block root hashes, one entry per slot since genesis.
/// Skipped slots hold the zero root.
pub type HistoricalBlockHashes = VariableList<H256, HistoricalRootsLimit>;

/// A bitfield indicating which historical slots were justified, indexed by
/// slot and grown in lockstep with [`HistoricalBlockHashes`].
pub type JustifiedSlots = BitList<HistoricalRootsLimit>;

/// Roots of checkpoints with justification votes in flight.
pub type JustificationsRoots = VariableList<H256, HistoricalRootsLimit>;

/// Per-root validator participation bits for in-flight justifications.
pub type JustificationsValidators = BitList<U1073741824>;

/// A (root, slot) pair identifying a block in the chain.
///
/// Checkpoints are the currency of justification and finalization: votes name
/// a source and a target checkpoint, and the state tracks the latest
/// justified and finalized ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Checkpoint {
    pub root: H256,
    pub slot: Slot,
}

/// Chain configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Config {
    pub num_validators: u64,
    pub genesis_time: u64,
}

/// The main consensus state object.
#[derive(Debug, Clone, PartialEq, Serialize, Encode, Decode, TreeHash)]
pub struct State {
    /// The chain's configuration parameters
    pub config: Config,
    /// The current slot number
    pub slot: Slot,
    /// The header of the most recent block
    pub latest_block_header: BlockHeader,
    /// The latest justified checkpoint
    pub latest_justified: Checkpoint,
    /// The latest finalized checkpoint
    pub latest_finalized: Checkpoint,
    /// A list of historical block root hashes
    pub historical_block_hashes: HistoricalBlockHashes,
    /// A bitfield indicating which historical slots were justified
    pub justified_slots: JustifiedSlots,
    /// Roots of checkpoints with justification votes in flight
    pub justifications_roots: JustificationsRoots,
    /// A bitlist of validators who participated in justifications
    pub justifications_validators: JustificationsValidators,
}

impl State {
    /// Build the slot-0 state for the given configuration.
    ///
    /// The genesis header carries the hash of an empty body and a zero state
    /// root; the state root is cached into it by the first `process_slot`.
    pub fn genesis(config: Config) -> Self {
        State {
            config,
            slot: 0,
            latest_block_header: BlockHeader {
                slot: 0,
                proposer_index: 0,
                parent_root: H256::ZERO,
                state_root: H256::ZERO,
                body_root: BlockBody::default().tree_hash_root(),
            },
            latest_justified: Checkpoint::default(),
            latest_finalized: Checkpoint::default(),
            historical_block_hashes: HistoricalBlockHashes::default(),
            justified_slots: JustifiedSlots::with_capacity(0)
                .expect("empty bitlist is within the limit"),
            justifications_roots: JustificationsRoots::default(),
            justifications_validators: JustificationsValidators::with_capacity(0)
                .expect("empty bitlist is within the limit"),
        }
    }
}
