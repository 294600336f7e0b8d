// Entry point for the ledger node binary
use clap::Parser;
use log::{error, info, LevelFilter};
use powledger::{
    check_chain, Command, Engine, HttpPeerClient, Opt, PeerChainProvider, ProofOfWork, Server,
    Settings,
};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

fn main() {
    // Info by default, RUST_LOG still wins when set
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartNode {
            listen,
            config,
            difficulty,
            peers,
        } => {
            let mut settings = load_settings(config)?;
            if let Some(addr) = listen {
                settings.listen_addr = addr;
            }
            if let Some(difficulty) = difficulty {
                settings.difficulty = difficulty;
            }
            settings.peers.extend(peers);
            settings.validate()?;

            let engine = Arc::new(Engine::new(settings.engine_config())?);
            for peer in &settings.peers {
                engine.register_peer(peer);
            }
            info!("Node identifier: {}", engine.node_id());

            let peer_client = HttpPeerClient::new(settings.peer_timeout())?;
            let server = Server::new(engine, Arc::new(peer_client));
            server.run(&settings.listen_addr)?;
        }
        Command::Inspect { peer, config } => {
            let settings = load_settings(config)?;
            let client = HttpPeerClient::new(settings.peer_timeout())?;
            let peer_chain = client.fetch_chain(&peer)?;
            let pow = ProofOfWork::new(settings.difficulty);

            println!("Peer:            {peer}");
            println!("Reported length: {}", peer_chain.length);
            println!("Blocks received: {}", peer_chain.chain.len());
            if let Some(tip) = peer_chain.chain.last() {
                println!("Tip index:       {}", tip.get_index());
                println!("Tip hash:        {}", tip.hash());
            }
            match check_chain(&peer_chain.chain, &pow) {
                Ok(()) => println!("Valid:           yes"),
                Err(e) => println!("Valid:           no ({e})"),
            }
        }
    }
    Ok(())
}

fn load_settings(path: Option<PathBuf>) -> powledger::Result<Settings> {
    Settings::load(path.as_deref())
}
