use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use ethlean_blockchain::BlockChain;
use ethlean_p2p::start_p2p;
use ethlean_rpc::start_rpc_server;
use ethlean_types::{
    primitives::{H256, TreeHash},
    state::{Checkpoint, Config, State},
};
use libp2p::Multiaddr;
use tracing::info;
use tracing_subscriber::{Registry, layer::SubscriberExt};

use crate::version::CLIENT_VERSION;

mod version;

const ASCII_ART: &str = r#"
       _   _     _
   ___| |_| |__ | | ___  __ _ _ __
  / _ \ __| '_ \| |/ _ \/ _` | '_ \
 |  __/ |_| | | | |  __/ (_| | | | |
  \___|\__|_| |_|_|\___|\__,_|_| |_|
"#;

#[derive(Debug, clap::Parser)]
struct CliOptions {
    /// Directory holding genesis.json. Without it the process prints the
    /// banner and a demonstration hash-tree-root, then exits.
    #[arg(long)]
    network_config_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 9000)]
    gossipsub_port: u16,
    #[arg(long, default_value = "127.0.0.1:8008")]
    rpc_address: SocketAddr,
    /// Multiaddr of a peer to dial at startup. May be repeated.
    #[arg(long)]
    bootnode: Vec<Multiaddr>,
}

#[tokio::main]
async fn main() {
    let subscriber = Registry::default().with(tracing_subscriber::fmt::layer());
    tracing::subscriber::set_global_default(subscriber).unwrap();
    let options = CliOptions::parse();

    println!("{ASCII_ART}");
    println!("{CLIENT_VERSION}");

    // A taste of the codec: the hash-tree-root of a sample checkpoint.
    let checkpoint = Checkpoint {
        root: {
            let mut root = [0u8; 32];
            root[0] = 0xab;
            root[1] = 0xcd;
            H256::from(root)
        },
        slot: 100,
    };
    println!(
        "Checkpoint hash tree root: {:#x}",
        checkpoint.tree_hash_root()
    );

    let Some(config_dir) = options.network_config_dir else {
        return;
    };

    let genesis_path = config_dir.join("genesis.json");
    let genesis_json = std::fs::read_to_string(&genesis_path).expect("Failed to read genesis.json");
    let config: Config = serde_json::from_str(&genesis_json).expect("Failed to parse genesis.json");

    let genesis_state = State::genesis(config);
    let blockchain = BlockChain::spawn(genesis_state);

    let p2p_handle = tokio::spawn(start_p2p(
        blockchain.clone(),
        options.bootnode,
        options.gossipsub_port,
    ));
    let rpc_handle = tokio::spawn(start_rpc_server(options.rpc_address, blockchain.store()));

    info!("Node initialized");

    tokio::select! {
        _ = p2p_handle => {
            panic!("P2P node task has exited unexpectedly");
        }
        _ = rpc_handle => {
            panic!("RPC server task has exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            // Ctrl-C received, shutting down
        }
    }
    println!("Shutting down...");
}
