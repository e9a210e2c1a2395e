use std::time::Duration;

use ethlean_blockchain::BlockChain;
use ethlean_types::clock::SECONDS_PER_SLOT;
use libp2p::{
    Multiaddr,
    futures::StreamExt,
    gossipsub::{MessageAuthenticity, ValidationMode},
    swarm::{NetworkBehaviour, SwarmEvent},
};
use sha2::Digest;
use tracing::{info, trace};

use crate::gossipsub::{ATTESTATION_TOPIC_KIND, BLOCK_TOPIC_KIND};

pub mod gossipsub;

/// Start the gossip layer and run its event loop.
///
/// Subscribes to the Devnet-0 block and attestation topics over QUIC and
/// forwards decoded messages to the chain service.
pub async fn start_p2p(blockchain: BlockChain, bootnodes: Vec<Multiaddr>, listening_port: u16) {
    let config = libp2p::gossipsub::ConfigBuilder::default()
        // d
        .mesh_n(8)
        // d_low
        .mesh_n_low(6)
        // d_high
        .mesh_n_high(12)
        // d_lazy
        .gossip_lazy(6)
        .heartbeat_interval(Duration::from_millis(700))
        .fanout_ttl(Duration::from_secs(60))
        .history_length(6)
        .history_gossip(3)
        // seen_ttl_secs = seconds_per_slot * justification_lookback_slots * 2
        .duplicate_cache_time(Duration::from_secs(SECONDS_PER_SLOT * 3 * 2))
        .validation_mode(ValidationMode::Anonymous)
        .message_id_fn(compute_message_id)
        .build()
        .expect("invalid gossipsub config");

    let gossipsub = libp2p::gossipsub::Behaviour::new(MessageAuthenticity::Anonymous, config)
        .expect("failed to initiate behaviour");

    let behaviour = Behaviour { gossipsub };

    // TODO: set peer scoring params

    let mut swarm = libp2p::SwarmBuilder::with_new_identity()
        .with_tokio()
        .with_quic()
        .with_behaviour(|_| behaviour)
        .expect("failed to add behaviour to swarm")
        .with_swarm_config(|config| {
            // Disable idle connection timeout
            config.with_idle_connection_timeout(Duration::from_secs(u64::MAX))
        })
        .build();

    for bootnode in bootnodes {
        swarm.dial(bootnode).expect("failed to dial bootnode");
    }

    let listen_addr: Multiaddr = format!("/ip4/0.0.0.0/udp/{listening_port}/quic-v1")
        .parse()
        .expect("listening address is a valid multiaddr");
    swarm
        .listen_on(listen_addr)
        .expect("failed to bind gossipsub listening address");

    for topic_kind in [BLOCK_TOPIC_KIND, ATTESTATION_TOPIC_KIND] {
        let topic = libp2p::gossipsub::IdentTopic::new(gossipsub::gossip_topic(topic_kind));
        swarm
            .behaviour_mut()
            .gossipsub
            .subscribe(&topic)
            .expect("topic subscription cannot fail on a fresh swarm");
    }

    info!(%listening_port, "P2P node started");

    event_loop(swarm, blockchain).await;
}

/// [libp2p Behaviour](libp2p::swarm::NetworkBehaviour) wrapping Gossipsub.
#[derive(NetworkBehaviour)]
struct Behaviour {
    gossipsub: libp2p::gossipsub::Behaviour,
}

/// Event loop for the P2P crate. Processes swarm events, forwarding gossip to
/// the chain service.
async fn event_loop(mut swarm: libp2p::Swarm<Behaviour>, mut blockchain: BlockChain) {
    while let Some(event) = swarm.next().await {
        match event {
            SwarmEvent::Behaviour(BehaviourEvent::Gossipsub(
                message @ libp2p::gossipsub::Event::Message { .. },
            )) => {
                gossipsub::handle_gossipsub_message(&mut blockchain, message).await;
            }
            _ => {
                trace!(?event, "Ignored swarm event");
            }
        }
    }
}

fn compute_message_id(message: &libp2p::gossipsub::Message) -> libp2p::gossipsub::MessageId {
    const MESSAGE_DOMAIN_INVALID_SNAPPY: [u8; 4] = [0x00, 0x00, 0x00, 0x00];
    const MESSAGE_DOMAIN_VALID_SNAPPY: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

    let mut hasher = sha2::Sha256::new();
    let decompressed = snap::raw::Decoder::new().decompress_vec(&message.data);

    let (domain, data) = match decompressed.as_ref() {
        Ok(decompressed_data) => (MESSAGE_DOMAIN_VALID_SNAPPY, decompressed_data),
        Err(_) => (MESSAGE_DOMAIN_INVALID_SNAPPY, &message.data),
    };
    let topic = message.topic.as_str().as_bytes();
    let topic_len = (topic.len() as u64).to_be_bytes();
    hasher.update(domain);
    hasher.update(topic_len);
    hasher.update(topic);
    hasher.update(data);
    let hash = hasher.finalize();
    libp2p::gossipsub::MessageId(hash[..20].to_vec())
}
