use ethlean_blockchain::BlockChain;
use ethlean_types::{block::SignedBlock, vote::SignedVote};
use libp2p::gossipsub::Event;
use ssz::Decode;
use tracing::{error, info, trace};

/// Gossip network name for Devnet 0.
pub const NETWORK_NAME: &str = "devnet0";

/// Topic kind for block gossip
pub const BLOCK_TOPIC_KIND: &str = "block";

/// Topic kind for attestation gossip
pub const ATTESTATION_TOPIC_KIND: &str = "attestation";

/// Full gossipsub topic name for the given topic kind.
///
/// Payloads on these topics are SSZ bytes wrapped in raw snappy compression.
pub fn gossip_topic(topic_kind: &str) -> String {
    format!("/leanconsensus/{NETWORK_NAME}/{topic_kind}/ssz_snappy")
}

/// Decode a gossip message by topic and hand it to the chain service.
///
/// Messages that fail to decompress or decode are logged and dropped without
/// touching the store.
pub async fn handle_gossipsub_message(blockchain: &mut BlockChain, event: Event) {
    let Event::Message {
        propagation_source: _,
        message_id: _,
        message,
    } = event
    else {
        unreachable!("we already matched on event_loop");
    };
    match message.topic.as_str().split("/").nth(3) {
        Some(BLOCK_TOPIC_KIND) => {
            let Ok(uncompressed_data) = decompress_message(&message.data)
                .inspect_err(|err| error!(%err, "Failed to decompress gossipped block"))
            else {
                return;
            };

            let Ok(signed_block) = SignedBlock::from_ssz_bytes(&uncompressed_data)
                .inspect_err(|err| error!(?err, "Failed to decode gossipped block"))
            else {
                return;
            };
            let slot = signed_block.message.slot;
            info!(%slot, "Received new block from gossipsub, sending for processing");
            blockchain.notify_new_block(signed_block).await;
        }
        Some(ATTESTATION_TOPIC_KIND) => {
            let Ok(uncompressed_data) = decompress_message(&message.data)
                .inspect_err(|err| error!(%err, "Failed to decompress gossipped vote"))
            else {
                return;
            };

            let Ok(signed_vote) = SignedVote::from_ssz_bytes(&uncompressed_data)
                .inspect_err(|err| error!(?err, "Failed to decode gossipped vote"))
            else {
                return;
            };
            let slot = signed_vote.data.slot;
            let validator = signed_vote.data.validator_id;
            info!(%slot, %validator, "Received new vote from gossipsub, sending for processing");
            blockchain.notify_new_vote(signed_vote).await;
        }
        _ => {
            trace!("Received message on unknown topic: {}", message.topic);
        }
    }
}

fn decompress_message(data: &[u8]) -> snap::Result<Vec<u8>> {
    let uncompressed_size = snap::raw::decompress_len(data)?;
    let mut uncompressed_data = vec![0u8; uncompressed_size];
    snap::raw::Decoder::new().decompress(data, &mut uncompressed_data)?;
    Ok(uncompressed_data)
}

/// Compress data using raw snappy format (for gossipsub messages).
pub fn compress_message(data: &[u8]) -> Vec<u8> {
    let max_compressed_len = snap::raw::max_compress_len(data.len());
    let mut compressed = vec![0u8; max_compressed_len];
    let compressed_len = snap::raw::Encoder::new()
        .compress(data, &mut compressed)
        .expect("snappy compression should not fail");
    compressed.truncate(compressed_len);
    compressed
}
