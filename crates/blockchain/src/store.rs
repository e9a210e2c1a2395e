use std::collections::HashMap;

use ethlean_state_transition::state_transition;
use ethlean_types::{
    block::{Block, BlockBody, SignedBlock},
    clock::INTERVALS_PER_SLOT,
    primitives::{H256, Slot, TreeHash, ValidatorIndex},
    state::{Checkpoint, Config, State},
    vote::SignedVote,
};
use tracing::{info, trace};

/// Forkchoice store tracking chain state and validator votes.
///
/// This is the "local view" that a node uses to run LMD GHOST. It contains:
///
/// - which blocks and states are known,
/// - which checkpoints are justified and finalized,
/// - which block is currently considered the head,
/// - and, for each validator, the latest vote that should influence fork choice.
///
/// The `Store` is updated whenever a new block or vote is processed, and on
/// interval ticks that recompute the head and the safe target.
#[derive(Debug, Clone)]
pub struct Store {
    /// Current time in intervals since genesis.
    time: u64,

    /// Chain configuration parameters.
    config: Config,

    /// Root of the current canonical chain head block.
    ///
    /// This is the result of running the fork choice algorithm on the current
    /// contents of the `Store`.
    head: H256,

    /// Root of the current safe target for votes.
    ///
    /// The safe target is the deepest block already backed by a supermajority
    /// of latest votes. Higher-level logic can restrict which blocks it
    /// considers safe to vote for based on it.
    safe_target: H256,

    /// Highest slot justified checkpoint known to the store.
    ///
    /// LMD GHOST starts from this checkpoint when computing the head; only
    /// its descendants are considered viable.
    latest_justified: Checkpoint,

    /// Highest slot finalized checkpoint known to the store.
    ///
    /// Everything strictly before this checkpoint can be considered
    /// immutable. Fork choice will never revert finalized history.
    latest_finalized: Checkpoint,

    /// Mapping from block root to Block objects.
    ///
    /// Every block that might participate in fork choice must appear here.
    blocks: HashMap<H256, Block>,

    /// Mapping from block root to the post-state the block produced.
    ///
    /// These states carry justified and finalized checkpoints that we use to
    /// update the `Store`'s latest justified and latest finalized checkpoints.
    states: HashMap<H256, State>,

    /// Latest head vote by validator.
    ///
    /// Keyed by validator index to enforce one vote per validator; a newly
    /// received vote overwrites the previous one unconditionally.
    latest_votes: HashMap<ValidatorIndex, Checkpoint>,
}

impl Store {
    /// Bootstrap a store from a genesis state, deriving the genesis block.
    pub fn from_genesis(genesis_state: State) -> Self {
        let genesis_state_root = genesis_state.tree_hash_root();
        let genesis_block = Block {
            slot: 0,
            proposer_index: 0,
            parent_root: H256::ZERO,
            state_root: genesis_state_root,
            body: BlockBody::default(),
        };
        Self::get_forkchoice_store(genesis_state, genesis_block)
            .expect("the derived genesis block commits to the genesis state")
    }

    /// Initialize a store from a trusted anchor.
    ///
    /// The anchor block must commit to the anchor state.
    pub fn get_forkchoice_store(
        anchor_state: State,
        anchor_block: Block,
    ) -> Result<Self, StoreError> {
        let anchor_state_root = anchor_state.tree_hash_root();
        if anchor_block.state_root != anchor_state_root {
            return Err(StoreError::StateMismatch {
                expected: anchor_block.state_root,
                computed: anchor_state_root,
            });
        }

        let anchor_block_root = anchor_block.tree_hash_root();
        let anchor_checkpoint = Checkpoint {
            root: anchor_block_root,
            slot: anchor_block.slot,
        };

        info!(%anchor_state_root, %anchor_block_root, "Initialized store");

        Ok(Self {
            time: 0,
            config: anchor_state.config,
            head: anchor_block_root,
            safe_target: anchor_block_root,
            latest_justified: anchor_checkpoint,
            latest_finalized: anchor_checkpoint,
            blocks: HashMap::from([(anchor_block_root, anchor_block)]),
            states: HashMap::from([(anchor_block_root, anchor_state)]),
            latest_votes: HashMap::new(),
        })
    }

    /// Slot in progress at the store's current time.
    pub fn current_slot(&self) -> Slot {
        self.time / INTERVALS_PER_SLOT
    }

    /// Advance the store clock to the given wall-clock timestamp.
    ///
    /// Time advances one interval at a time. Interval 0 recomputes the head,
    /// interval 2 the safe target. If the store is more than a slot behind it
    /// fast-forwards first; the per-interval work is idempotent.
    pub fn on_tick(&mut self, timestamp: u64) {
        let time = timestamp.saturating_sub(self.config.genesis_time);

        if time.saturating_sub(self.time) > INTERVALS_PER_SLOT {
            self.time = time - INTERVALS_PER_SLOT;
        }

        while self.time < time {
            self.time += 1;

            let slot = self.current_slot();
            let interval = self.time % INTERVALS_PER_SLOT;

            trace!(%slot, %interval, "processing tick");

            match interval {
                // Start of slot: pick up votes accumulated during the
                // previous slot.
                0 => self.update_head(),
                // Mid-slot: refresh the safe target for validators.
                2 => self.update_safe_target(),
                _ => {}
            }
        }
    }

    /// Process a new block and update the forkchoice state.
    ///
    /// The block's post-state is computed with the state transition function
    /// against the parent's post-state and stored under the block's root.
    /// Votes carried in the block body are folded into the latest-vote table.
    pub fn on_block(&mut self, signed_block: SignedBlock) -> Result<(), StoreError> {
        let block = &signed_block.message;
        let block_root = block.tree_hash_root();
        let slot = block.slot;

        // Duplicate blocks are a no-op.
        if self.blocks.contains_key(&block_root) {
            return Ok(());
        }

        let parent_state =
            self.states
                .get(&block.parent_root)
                .ok_or(StoreError::UnknownParent {
                    parent_root: block.parent_root,
                    slot,
                })?;

        // Devnet-0 signatures are placeholders, so nothing asks the external
        // verifier for them here.
        let post_state = state_transition(parent_state, &signed_block, false)?;

        // Adopt higher checkpoints from the post-state.
        if post_state.latest_justified.slot > self.latest_justified.slot {
            self.latest_justified = post_state.latest_justified;
        }
        if post_state.latest_finalized.slot > self.latest_finalized.slot {
            self.latest_finalized = post_state.latest_finalized;
        }

        let state_root = block.state_root;
        self.blocks.insert(block_root, block.clone());
        self.states.insert(block_root, post_state);

        // On-chain votes influence fork choice like gossiped ones.
        for signed_vote in &block.body.attestations {
            self.on_vote(signed_vote.clone());
        }

        self.update_head();

        info!(%slot, %block_root, %state_root, "Processed new block");
        Ok(())
    }

    /// Record a validator's latest vote.
    ///
    /// The previous vote of the validator is overwritten unconditionally.
    pub fn on_vote(&mut self, signed_vote: SignedVote) {
        let vote = signed_vote.data;
        self.latest_votes.insert(vote.validator_id, vote.head);
    }

    /// Recompute the canonical head from the latest justified checkpoint.
    pub fn update_head(&mut self) {
        // A post-state may know of a higher justified checkpoint than any
        // block processed so far has surfaced.
        if let Some(checkpoint) = ethlean_fork_choice::latest_justified(&self.states)
            && checkpoint.slot > self.latest_justified.slot
        {
            self.latest_justified = checkpoint;
        }

        self.head = ethlean_fork_choice::compute_lmd_ghost_head(
            self.latest_justified.root,
            &self.blocks,
            &self.latest_votes,
            0,
        );
    }

    /// Recompute the deepest block backed by a supermajority of votes.
    pub fn update_safe_target(&mut self) {
        let min_target_score = (self.config.num_validators * 2).div_ceil(3);

        self.safe_target = ethlean_fork_choice::compute_lmd_ghost_head(
            self.latest_justified.root,
            &self.blocks,
            &self.latest_votes,
            min_target_score,
        );
    }

    /// Returns the root of the current canonical chain head block.
    pub fn head(&self) -> H256 {
        self.head
    }

    /// Returns the head as a checkpoint.
    pub fn head_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            root: self.head,
            slot: self.blocks[&self.head].slot,
        }
    }

    /// Returns the root of the current safe target block.
    pub fn safe_target(&self) -> H256 {
        self.safe_target
    }

    /// Returns the slot of the current safe target block.
    pub fn safe_target_slot(&self) -> Slot {
        self.blocks[&self.safe_target].slot
    }

    /// Returns a reference to all known blocks.
    pub fn blocks(&self) -> &HashMap<H256, Block> {
        &self.blocks
    }

    /// Returns the post-state recorded for the given block root.
    pub fn state(&self, block_root: &H256) -> Option<&State> {
        self.states.get(block_root)
    }

    /// Returns a reference to the latest votes by validator.
    pub fn latest_votes(&self) -> &HashMap<ValidatorIndex, Checkpoint> {
        &self.latest_votes
    }

    /// Returns a reference to the latest justified checkpoint.
    pub fn latest_justified(&self) -> &Checkpoint {
        &self.latest_justified
    }

    /// Returns a reference to the latest finalized checkpoint.
    pub fn latest_finalized(&self) -> &Checkpoint {
        &self.latest_finalized
    }

    /// Returns a reference to the chain configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the post-state of the current head block.
    pub fn head_state(&self) -> &State {
        self.states
            .get(&self.head)
            .expect("head state is always available")
    }
}

/// Errors that can occur during Store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("parent state not found for slot {slot}, missing block: {parent_root}")]
    UnknownParent { parent_root: H256, slot: u64 },

    #[error("anchor state root mismatch: expected {expected}, computed {computed}")]
    StateMismatch { expected: H256, computed: H256 },

    #[error("state transition failed: {0}")]
    StateTransitionFailed(#[from] ethlean_state_transition::Error),
}
