use serde::Serialize;
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::{
    primitives::{H256, Slot, ValidatorIndex},
    vote::Attestations,
};

/// Fixed-size stand-in for a block.
///
/// A header carries everything needed to identify a block and its place in
/// the chain, with the variable-size body collapsed into its hash. Because
/// the body enters the Merkle tree as that same hash, a header and the block
/// it summarizes share one hash-tree-root, which is what lets the state track
/// its tip as `latest_block_header` and still be linked against by children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Encode, Decode, TreeHash)]
pub struct BlockHeader {
    /// Slot the summarized block was proposed in
    pub slot: Slot,
    /// Validator that proposed the summarized block
    pub proposer_index: ValidatorIndex,
    /// Hash-tree-root of the parent block
    pub parent_root: H256,
    /// Hash-tree-root of the post-block state, zero until cached by the slot
    /// processing that follows
    pub state_root: H256,
    /// Hash-tree-root of the body the header stands in for
    pub body_root: H256,
}

/// A full block: the header fields inline, with the body in place of the
/// body hash.
#[derive(Debug, Clone, PartialEq, Serialize, Encode, Decode, TreeHash)]
pub struct Block {
    /// Slot this block claims. Must match the state slot it is applied at.
    pub slot: Slot,
    /// Validator whose round-robin turn this slot is.
    pub proposer_index: ValidatorIndex,
    /// Hash-tree-root of the parent block, linking the chain together.
    pub parent_root: H256,
    /// Commitment to the state this block produces; the transition recomputes
    /// and checks it.
    pub state_root: H256,
    /// The votes the proposer chose to include.
    pub body: BlockBody,
}

/// The block payload.
///
/// At Devnet 0 a block carries nothing but votes; the proposer packages the
/// signed votes it has seen and the transition replays them in order.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Encode, Decode, TreeHash)]
pub struct BlockBody {
    /// Signed votes in the order the proposer included them. The order is
    /// observable: justification state carries from one vote to the next.
    pub attestations: Attestations,
}

/// Block bundled with the proposer's signature.
///
/// Devnet-0 signatures are opaque 32-byte placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Encode, Decode, TreeHash)]
pub struct SignedBlock {
    /// The proposed block.
    pub message: Block,
    /// Placeholder signature over `message`.
    pub signature: H256,
}
