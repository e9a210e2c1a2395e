use tree_hash::Hash256;

// Re-export SSZ traits and collection types to avoid users having to depend
// on these crates directly
pub use ssz::{Decode, Encode};
pub use ssz_types::{BitList, VariableList, typenum};
pub use tree_hash::TreeHash;

pub type H256 = Hash256;

/// Slot number since genesis.
pub type Slot = u64;

/// Position of a validator in the chain's registry.
pub type ValidatorIndex = u64;

pub type Epoch = u64;
