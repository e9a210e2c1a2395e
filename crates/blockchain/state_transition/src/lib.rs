use ethlean_types::{
    block::{Block, BlockHeader, SignedBlock},
    primitives::{H256, Slot, TreeHash, ValidatorIndex},
    state::State,
    vote::SignedVote,
};

pub mod justified_slots_ops;
mod metrics;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("target slot {target_slot} is not past the current slot {current_slot}")]
    SlotNotInFuture { target_slot: u64, current_slot: u64 },
    #[error("state slot {state_slot} does not match block slot {block_slot}")]
    SlotMismatch { state_slot: u64, block_slot: u64 },
    #[error("block slot {block_slot} is not newer than the latest header slot {parent_slot}")]
    BlockTooOld { parent_slot: u64, block_slot: u64 },
    #[error("validator {found} is not the proposer for slot {slot}")]
    InvalidProposer { found: u64, slot: u64 },
    #[error("parent root mismatch: expected {expected}, found {found}")]
    ParentRootMismatch { expected: H256, found: H256 },
    #[error("state root mismatch: expected {expected}, computed {computed}")]
    InvalidStateRoot { expected: H256, computed: H256 },
    #[error("per-slot history limit reached")]
    HistoryLimitReached,
}

/// Cache the state root into the latest block header if it is still empty.
///
/// Children reference their parent through the header's hash, so the root of
/// the pre-block state has to be written back before the header is hashed.
pub fn process_slot(state: &State) -> Result<State, Error> {
    if !state.latest_block_header.state_root.is_zero() {
        return Ok(state.clone());
    }
    let previous_state_root = state.tree_hash_root();
    let mut state = state.clone();
    state.latest_block_header.state_root = previous_state_root;
    Ok(state)
}

/// Advance the state through empty slots up to `target_slot`.
pub fn process_slots(state: &State, target_slot: Slot) -> Result<State, Error> {
    if state.slot >= target_slot {
        return Err(Error::SlotNotInFuture {
            target_slot,
            current_slot: state.slot,
        });
    }
    let _timer = metrics::time_slots_processing();
    let slots_advanced = target_slot - state.slot;

    let mut current = state.clone();
    while current.slot < target_slot {
        current = process_slot(&current)?;
        current.slot += 1;
    }

    metrics::inc_slots_processed(slots_advanced);
    Ok(current)
}

/// Validate the block header and update header-linked state.
pub fn process_block_header(state: &State, block: &Block) -> Result<State, Error> {
    let parent_header = &state.latest_block_header;
    let parent_slot = parent_header.slot;

    // Validation

    if block.slot != state.slot {
        return Err(Error::SlotMismatch {
            state_slot: state.slot,
            block_slot: block.slot,
        });
    }
    if block.slot <= parent_slot {
        return Err(Error::BlockTooOld {
            parent_slot,
            block_slot: block.slot,
        });
    }
    if !is_proposer(block.proposer_index, block.slot, state.config.num_validators) {
        return Err(Error::InvalidProposer {
            found: block.proposer_index,
            slot: block.slot,
        });
    }
    let parent_root = parent_header.tree_hash_root();
    if block.parent_root != parent_root {
        return Err(Error::ParentRootMismatch {
            expected: parent_root,
            found: block.parent_root,
        });
    }

    // State Updates

    let mut state = state.clone();

    // Special case: the first block after genesis anchors both checkpoints to
    // the genesis block. The genesis slot is also recorded as justified.
    let is_genesis_parent = parent_slot == 0;
    if is_genesis_parent {
        state.latest_justified.root = block.parent_root;
        state.latest_finalized.root = block.parent_root;
    }

    state
        .historical_block_hashes
        .push(block.parent_root)
        .map_err(|_| Error::HistoryLimitReached)?;
    state.justified_slots = justified_slots_ops::append(&state.justified_slots, is_genesis_parent)
        .map_err(|_| Error::HistoryLimitReached)?;

    // Skipped slots get a zero hash and an unjustified bit.
    for _ in 0..(block.slot - parent_slot - 1) {
        state
            .historical_block_hashes
            .push(H256::ZERO)
            .map_err(|_| Error::HistoryLimitReached)?;
        state.justified_slots = justified_slots_ops::append(&state.justified_slots, false)
            .map_err(|_| Error::HistoryLimitReached)?;
    }

    state.latest_block_header = BlockHeader {
        slot: block.slot,
        proposer_index: block.proposer_index,
        parent_root: block.parent_root,
        // Zeroed out until the next process_slot fills in the state root.
        state_root: H256::ZERO,
        body_root: block.body.tree_hash_root(),
    };
    Ok(state)
}

/// Apply votes in list order and update justification/finalization according
/// to the 3SF-mini rules.
///
/// A vote with a justified source justifies its target; two consecutive
/// justified checkpoints finalize the earlier one. Votes that do not fit the
/// rules are skipped, never rejected.
pub fn process_attestations(state: &State, attestations: &[SignedVote]) -> Result<State, Error> {
    let _timer = metrics::time_attestations_processing();
    let mut state = state.clone();

    for signed_vote in attestations {
        let vote = &signed_vote.data;
        let source = vote.source;
        let target = vote.target;

        // Source must come before target
        if source.slot >= target.slot {
            continue;
        }
        // Source must be within the justified history
        if source.slot >= state.justified_slots.len() as u64 {
            continue;
        }

        let source_is_justified = justified_slots_ops::get(&state.justified_slots, source.slot);
        let target_is_justified = justified_slots_ops::get(&state.justified_slots, target.slot);

        if source_is_justified && target_is_justified {
            // Consecutive justified checkpoints finalize the source.
            if source.slot + 1 == target.slot && state.latest_justified.slot < target.slot {
                state.latest_finalized = source;
                state.latest_justified = target;
                metrics::inc_finalizations();
            }
        } else if source_is_justified {
            // Justify the target.
            state.justified_slots =
                justified_slots_ops::ensure_len(&state.justified_slots, target.slot + 1)
                    .map_err(|_| Error::HistoryLimitReached)?;
            justified_slots_ops::set(&mut state.justified_slots, target.slot, true);
            metrics::inc_justifications();

            if target.slot > state.latest_justified.slot {
                state.latest_justified = target;
            }
        }
    }

    metrics::inc_attestations_processed(attestations.len() as u64);
    Ok(state)
}

/// Apply full block processing including header and body.
pub fn process_block(state: &State, block: &Block) -> Result<State, Error> {
    let _timer = metrics::time_block_processing();
    let state = process_block_header(state, block)?;
    process_attestations(&state, &block.body.attestations)
}

/// Transition the given pre-state to the block's post-state.
///
/// The `validate_signatures` flag is accepted for interface parity: Devnet-0
/// signatures are opaque 32-byte placeholders and the verification predicate
/// is supplied by the caller's environment, so nothing is checked here yet.
pub fn state_transition(
    state: &State,
    signed_block: &SignedBlock,
    _validate_signatures: bool,
) -> Result<State, Error> {
    let _timer = metrics::time_state_transition();
    let block = &signed_block.message;

    // Process empty slots up to the block slot, then the block itself.
    let state = process_slots(state, block.slot)?;
    let state = process_block(&state, block)?;

    // The block must commit to the state it produces.
    let computed_state_root = state.tree_hash_root();
    if block.state_root != computed_state_root {
        return Err(Error::InvalidStateRoot {
            expected: block.state_root,
            computed: computed_state_root,
        });
    }
    Ok(state)
}

/// Whether the given validator owns the proposal for `slot`.
///
/// Devnet-0 assigns slots round-robin over the registry, so validator
/// `slot % num_validators` proposes. An empty registry owns no slots.
pub fn is_proposer(validator_index: ValidatorIndex, slot: Slot, num_validators: u64) -> bool {
    if num_validators == 0 {
        return false;
    }
    slot % num_validators == validator_index
}

/// Checks if the slot is a valid candidate for justification after a given
/// finalized slot.
///
/// A slot is justifiable if its distance (`delta`) from the last finalized
/// slot is at most 5, a perfect square, or a pronic number (x² + x). See
/// https://github.com/ethereum/research/blob/master/3sf-mini/consensus.py for
/// the 3SF-mini reference.
///
/// Restricting the justifiable slots funnels votes towards a few candidates
/// under high latency, when validators would otherwise spread votes over many
/// slots and none would reach a supermajority.
pub fn slot_is_justifiable_after(slot: Slot, finalized_slot: Slot) -> bool {
    let Some(delta) = slot.checked_sub(finalized_slot) else {
        // Candidate slot must not be before the finalized slot
        return false;
    };
    delta <= 5
        || delta.isqrt().pow(2) == delta
        // delta = n(n+1) iff 4*delta + 1 = (2n+1)^2
        || (4 * delta + 1).isqrt().pow(2) == 4 * delta + 1
}
