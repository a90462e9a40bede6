// Console client: polls the match server and reads moves from stdin

use chessmen::{board::PrettyStyle, Move, Session, SyncConfig, TcpPeer};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser, Debug)]
#[command(about = "Console client for a chessmen match server")]
struct Cli {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Server address, overrides the config
    #[arg(short, long)]
    addr: Option<String>,
    /// Player name
    #[arg(short, long)]
    name: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SyncConfig::load(path).unwrap(),
        None => SyncConfig::default(),
    };
    if let Some(addr) = cli.addr {
        config.peer_addr = addr;
    }
    if cli.name.is_some() {
        config.user_name = cli.name;
    }

    let peer = TcpPeer::new(config.peer_addr.clone(), config.io_timeout());
    let mut session = Session::new(peer, &config);
    println!("You are: {}", session.connect().unwrap());

    let mut stdin = io::stdin().lock();
    let stop = AtomicBool::new(false);
    loop {
        // Poll until it is our turn, then ask for a move.
        let mut prev = None;
        session.run(&stop, |s, res| {
            if let Ok(status) = res {
                if prev != Some(*status) {
                    println!("Game status: {}", status);
                    prev = Some(*status);
                }
                if s.is_my_turn() {
                    stop.store(true, Ordering::Relaxed);
                }
            }
        });
        stop.store(false, Ordering::Relaxed);

        if let Some(role) = session.role() {
            println!("Your color: {}", role);
        }
        println!(
            "{}",
            session
                .board()
                .pretty(PrettyStyle::Ascii, session.orientation())
        );
        loop {
            print!("Your move: ");
            io::stdout().flush().unwrap();
            let mut s = String::new();
            if stdin.read_line(&mut s).unwrap() == 0 {
                return;
            }
            let res = Move::parse(s.trim(), session.orientation())
                .map_err(|e| e.to_string())
                .and_then(|mv| session.play(mv).map_err(|e| e.to_string()));
            match res {
                Ok(_) => break,
                Err(e) => println!("Bad move: {}", e),
            }
        }
    }
}
