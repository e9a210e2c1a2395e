//! LMD GHOST head selection over the store's block forest.

use std::collections::HashMap;

use ethlean_types::{
    block::Block,
    primitives::{H256, ValidatorIndex},
    state::{Checkpoint, State},
};

/// Find the head block via LMD GHOST, starting the walk at `root`.
///
/// Votes for a block count towards every ancestor above the starting root, so
/// at each fork the child subtree with the most latest votes wins. Blocks
/// whose own weight falls below `min_score` are excluded from the walk, which
/// lets callers compute a supermajority-backed safe target with the same
/// machinery.
///
/// A zero `root` starts from the lowest-slot block (genesis).
pub fn compute_lmd_ghost_head(
    root: H256,
    blocks: &HashMap<H256, Block>,
    latest_votes: &HashMap<ValidatorIndex, Checkpoint>,
    min_score: u64,
) -> H256 {
    let root = if root.is_zero() {
        match blocks
            .iter()
            .min_by_key(|(hash, block)| (block.slot, **hash))
        {
            Some((hash, _)) => *hash,
            None => return root,
        }
    } else {
        root
    };

    // No votes means the starting root stays the head.
    if latest_votes.is_empty() {
        return root;
    }

    // Count votes for each block. A vote weighs on the target and all of its
    // ancestors down to (but excluding) the starting root.
    let root_slot = blocks[&root].slot;
    let mut vote_weights: HashMap<H256, u64> = HashMap::new();

    for vote in latest_votes.values() {
        if !blocks.contains_key(&vote.root) {
            continue;
        }

        let mut block_hash = vote.root;
        while let Some(block) = blocks.get(&block_hash) {
            if block.slot <= root_slot {
                break;
            }
            *vote_weights.entry(block_hash).or_default() += 1;
            block_hash = block.parent_root;
        }
    }

    // Group blocks above the score threshold under their parents.
    let mut children_map: HashMap<H256, Vec<H256>> = HashMap::new();
    for (block_hash, block) in blocks {
        let weight = vote_weights.get(block_hash).copied().unwrap_or(0);
        if !block.parent_root.is_zero() && weight >= min_score {
            children_map
                .entry(block.parent_root)
                .or_default()
                .push(*block_hash);
        }
    }

    // Walk down the tree, at each fork taking the child with the most votes.
    // Ties break towards the higher slot, then the higher root, so the walk
    // is deterministic regardless of map iteration order.
    let mut current = root;
    loop {
        let Some(children) = children_map.get(&current) else {
            return current;
        };
        let Some(best) = children
            .iter()
            .max_by_key(|child| {
                let weight = vote_weights.get(*child).copied().unwrap_or(0);
                (weight, blocks[*child].slot, **child)
            })
            .copied()
        else {
            return current;
        };
        current = best;
    }
}

/// Find the justified checkpoint with the highest slot across all known
/// post-states. Returns `None` when no states are known.
pub fn latest_justified(states: &HashMap<H256, State>) -> Option<Checkpoint> {
    states
        .values()
        .map(|state| state.latest_justified)
        .max_by_key(|checkpoint| checkpoint.slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethlean_types::{
        block::BlockBody,
        primitives::TreeHash,
        state::Config,
    };

    fn block(slot: u64, proposer_index: u64, parent_root: H256, state_byte: u8) -> (H256, Block) {
        let block = Block {
            slot,
            proposer_index,
            parent_root,
            state_root: H256::repeat_byte(state_byte),
            body: BlockBody::default(),
        };
        (block.tree_hash_root(), block)
    }

    /// Three-block chain: genesis -> A -> B.
    fn test_chain() -> (HashMap<H256, Block>, H256, H256, H256) {
        let (genesis_hash, genesis) = block(0, 0, H256::ZERO, 0x01);
        let (a_hash, a) = block(1, 1, genesis_hash, 0x02);
        let (b_hash, b) = block(2, 2, a_hash, 0x03);

        let blocks = HashMap::from([(genesis_hash, genesis), (a_hash, a), (b_hash, b)]);
        (blocks, genesis_hash, a_hash, b_hash)
    }

    #[test]
    fn no_votes_returns_the_starting_root() {
        let (blocks, genesis_hash, _, _) = test_chain();

        let head = compute_lmd_ghost_head(genesis_hash, &blocks, &HashMap::new(), 0);
        assert_eq!(head, genesis_hash);
    }

    #[test]
    fn a_zero_root_starts_from_genesis() {
        let (blocks, genesis_hash, _, _) = test_chain();

        let head = compute_lmd_ghost_head(H256::ZERO, &blocks, &HashMap::new(), 0);
        assert_eq!(head, genesis_hash);
    }

    #[test]
    fn a_single_vote_pulls_the_head_to_the_tip() {
        let (blocks, genesis_hash, _, b_hash) = test_chain();
        let votes = HashMap::from([(0, Checkpoint { root: b_hash, slot: 2 })]);

        let head = compute_lmd_ghost_head(genesis_hash, &blocks, &votes, 0);
        assert_eq!(head, b_hash);
    }

    #[test]
    fn votes_for_unknown_blocks_are_ignored() {
        let (blocks, genesis_hash, _, _) = test_chain();
        let votes = HashMap::from([(
            0,
            Checkpoint {
                root: H256::repeat_byte(0x99),
                slot: 2,
            },
        )]);

        let head = compute_lmd_ghost_head(genesis_hash, &blocks, &votes, 0);
        assert_eq!(head, genesis_hash);
    }

    #[test]
    fn the_heavier_fork_wins() {
        // genesis -> A -> B
        //         -> C -> D
        let (genesis_hash, genesis) = block(0, 0, H256::ZERO, 0x01);
        let (a_hash, a) = block(1, 1, genesis_hash, 0x02);
        let (b_hash, b) = block(2, 2, a_hash, 0x03);
        let (c_hash, c) = block(1, 3, genesis_hash, 0x04);
        let (d_hash, d) = block(2, 4, c_hash, 0x05);

        let blocks = HashMap::from([
            (genesis_hash, genesis),
            (a_hash, a),
            (b_hash, b),
            (c_hash, c),
            (d_hash, d),
        ]);

        let votes = HashMap::from([
            (0, Checkpoint { root: b_hash, slot: 2 }),
            (1, Checkpoint { root: d_hash, slot: 2 }),
            (2, Checkpoint { root: d_hash, slot: 2 }),
        ]);

        let head = compute_lmd_ghost_head(genesis_hash, &blocks, &votes, 0);
        assert_eq!(head, d_hash);
    }

    #[test]
    fn min_score_prunes_weakly_supported_blocks() {
        let (blocks, genesis_hash, _, b_hash) = test_chain();
        let votes = HashMap::from([(0, Checkpoint { root: b_hash, slot: 2 })]);

        // A single vote cannot satisfy a score threshold of 2 anywhere.
        let head = compute_lmd_ghost_head(genesis_hash, &blocks, &votes, 2);
        assert_eq!(head, genesis_hash);
    }

    #[test]
    fn the_head_is_stable_across_runs_and_vote_order() {
        let (genesis_hash, genesis) = block(0, 0, H256::ZERO, 0x01);
        let (a_hash, a) = block(1, 1, genesis_hash, 0x02);
        let (c_hash, c) = block(1, 3, genesis_hash, 0x04);

        let blocks =
            HashMap::from([(genesis_hash, genesis), (a_hash, a), (c_hash, c)]);

        // One vote each: the tie breaks on the block root, whichever order
        // the votes arrive in.
        let votes = HashMap::from([
            (0, Checkpoint { root: a_hash, slot: 1 }),
            (1, Checkpoint { root: c_hash, slot: 1 }),
        ]);
        let swapped = HashMap::from([
            (0, Checkpoint { root: c_hash, slot: 1 }),
            (1, Checkpoint { root: a_hash, slot: 1 }),
        ]);

        let expected = a_hash.max(c_hash);
        for _ in 0..10 {
            assert_eq!(
                compute_lmd_ghost_head(genesis_hash, &blocks, &votes, 0),
                expected
            );
            assert_eq!(
                compute_lmd_ghost_head(genesis_hash, &blocks, &swapped, 0),
                expected
            );
        }
    }

    #[test]
    fn latest_justified_picks_the_highest_slot() {
        let config = Config {
            num_validators: 4,
            genesis_time: 0,
        };
        let mut state_1 = State::genesis(config);
        state_1.latest_justified = Checkpoint {
            root: H256::repeat_byte(0x01),
            slot: 5,
        };
        let mut state_2 = State::genesis(config);
        state_2.latest_justified = Checkpoint {
            root: H256::repeat_byte(0x02),
            slot: 10,
        };
        let mut state_3 = State::genesis(config);
        state_3.latest_justified = Checkpoint {
            root: H256::repeat_byte(0x03),
            slot: 3,
        };

        let states = HashMap::from([
            (H256::repeat_byte(0xa1), state_1),
            (H256::repeat_byte(0xa2), state_2),
            (H256::repeat_byte(0xa3), state_3),
        ]);

        let latest = latest_justified(&states).unwrap();
        assert_eq!(latest.slot, 10);
        assert_eq!(latest.root, H256::repeat_byte(0x02));
    }

    #[test]
    fn latest_justified_is_none_without_states() {
        assert!(latest_justified(&HashMap::new()).is_none());
    }
}
