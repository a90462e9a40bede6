// Match server answering newline-delimited JSON requests over TCP

use chessmen::{server, MatchServer};
use clap::Parser;
use std::net::TcpListener;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(about = "Match server for chessmen clients")]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:2000")]
    addr: String,
    /// Seed for color assignment, random if omitted
    #[arg(short, long)]
    seed: Option<u64>,
    /// Read and write timeout for a single connection in milliseconds
    #[arg(short, long, default_value = "2000")]
    timeout: u64,
    /// Seconds of silence after which a user and their match are dropped
    #[arg(short, long, default_value = "30")]
    idle: u64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut match_server = match cli.seed {
        Some(seed) => MatchServer::with_seed(seed),
        None => MatchServer::new(),
    }
    .with_idle_timeout(Duration::from_secs(cli.idle));
    let listener = TcpListener::bind(&cli.addr).unwrap();
    let stop = AtomicBool::new(false);
    server::serve_tcp(
        &mut match_server,
        &listener,
        Duration::from_millis(cli.timeout),
        &stop,
    )
    .unwrap();
}
