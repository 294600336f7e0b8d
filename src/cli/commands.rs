use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "powledger")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "startnode", about = "Start a ledger node")]
    StartNode {
        #[arg(long, help = "Address to listen on, e.g. 0.0.0.0:8080")]
        listen: Option<String>,
        #[arg(long, help = "Path to a TOML settings file")]
        config: Option<PathBuf>,
        #[arg(long, help = "Leading zero hex digits required of a proof")]
        difficulty: Option<usize>,
        #[arg(long = "peer", help = "Peer address to register at start-up (repeatable)")]
        peers: Vec<String>,
    },
    #[command(name = "inspect", about = "Fetch a peer's chain and validate it")]
    Inspect {
        #[arg(help = "Peer address, e.g. 10.0.0.1:5000")]
        peer: String,
        #[arg(long, help = "Path to a TOML settings file")]
        config: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_startnode() {
        let opt = Opt::try_parse_from([
            "powledger",
            "startnode",
            "--listen",
            "127.0.0.1:5000",
            "--peer",
            "10.0.0.1:5000",
            "--peer",
            "10.0.0.2:5000",
        ])
        .unwrap();

        match opt.command {
            Command::StartNode {
                listen,
                peers,
                difficulty,
                ..
            } => {
                assert_eq!(listen.as_deref(), Some("127.0.0.1:5000"));
                assert_eq!(peers.len(), 2);
                assert_eq!(difficulty, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_inspect_requires_peer() {
        assert!(Opt::try_parse_from(["powledger", "inspect"]).is_err());
    }
}
