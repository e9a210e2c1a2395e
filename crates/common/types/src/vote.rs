use serde::Serialize;
use ssz_derive::{Decode, Encode};
use ssz_types::{VariableList, typenum::U4096};
use tree_hash_derive::TreeHash;

use crate::{
    primitives::{H256, Slot, ValidatorIndex},
    state::Checkpoint,
};

/// A validator's view of the chain at a given slot.
///
/// The `head` checkpoint feeds fork choice, while the `source` → `target`
/// pair is the justification link the validator attests to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Encode, Decode, TreeHash)]
pub struct Vote {
    /// The index of the validator casting the vote.
    pub validator_id: ValidatorIndex,
    /// The slot for which the vote is cast.
    pub slot: Slot,
    /// Tip of the chain the validator is following; this is what LMD GHOST
    /// counts.
    pub head: Checkpoint,
    /// Checkpoint the vote tries to justify.
    pub target: Checkpoint,
    /// Already-justified checkpoint the vote builds on. Only votes whose
    /// source holds a justified slot count towards the target.
    pub source: Checkpoint,
}

/// Vote bundled with the validator's signature.
///
/// Devnet-0 signatures are opaque 32-byte placeholders; the verification
/// predicate lives outside the consensus core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Encode, Decode, TreeHash)]
pub struct SignedVote {
    /// The vote message signed by the validator.
    pub data: Vote,
    /// Placeholder signature over `data`.
    pub signature: H256,
}

/// List of signed votes carried in a block body.
pub type Attestations = VariableList<SignedVote, U4096>;
