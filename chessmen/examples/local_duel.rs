// Two players in one process, sharing an in-memory match server

use chessmen::{
    board::PrettyStyle, server::LocalPeer, Color, MatchServer, Move, Session, SyncConfig,
};
use clap::Parser;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::time::Duration;

/// Plays a local game, moves are read from stdin like `e2e4`
#[derive(Parser, Debug)]
struct Cli {
    /// Seed for color assignment
    #[arg(short, long, default_value = "0")]
    seed: u64,
    /// Print pieces with Unicode symbols
    #[arg(short, long)]
    utf8: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let style = if cli.utf8 {
        PrettyStyle::Utf8
    } else {
        PrettyStyle::Ascii
    };

    // Nobody polls while stdin blocks, so players are never dropped as idle
    let server = MatchServer::with_seed(cli.seed).with_idle_timeout(Duration::MAX);
    let server = Rc::new(RefCell::new(server));
    let config = SyncConfig::default();
    let mut players = [
        Session::new(LocalPeer::new(server.clone()), &config),
        Session::new(LocalPeer::new(server.clone()), &config),
    ];
    for p in &mut players {
        let id = p.connect().unwrap();
        println!("Connected as {}", id);
    }
    for p in &mut players {
        p.tick().unwrap();
    }

    let mut stdin = io::stdin().lock();
    loop {
        let Some(cur) = players.iter_mut().find(|p| p.is_my_turn()) else {
            println!("Nobody is to move");
            break;
        };
        let side = match cur.role() {
            Some(Color::White) => "White",
            _ => "Black",
        };
        println!("{}", cur.board().pretty(style, cur.orientation()));
        print!("{} move: ", side);
        io::stdout().flush().unwrap();
        let mut s = String::new();
        if stdin.read_line(&mut s).unwrap() == 0 {
            break;
        }

        let mv = match Move::parse(s.trim(), cur.orientation()) {
            Ok(mv) => mv,
            Err(e) => {
                println!("Bad move: {}", e);
                println!();
                continue;
            }
        };
        if let Err(e) = cur.play(mv) {
            println!("Bad move: {}", e);
            println!();
            continue;
        }
        println!();

        for p in &mut players {
            p.tick().unwrap();
        }
    }
}
