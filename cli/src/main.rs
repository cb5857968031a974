//! # Tile-merge CLI
//!
//! Command-line front end for the engine: play interactively in the
//! terminal or run headless simulations with configurable policies.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tilemerge_core::{Direction, Event, GameSession, SessionConfig, Turn};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tilemerge")]
#[command(author, version, about = "Play the tile-merge puzzle in the terminal or run simulations")]
struct Args {
    /// TOML session config; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of episodes to run in headless mode
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Side length of the grid
    #[arg(long)]
    size: Option<usize>,

    /// Maximum steps per episode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_steps: u32,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// Show board after each move in headless mode
    #[arg(long)]
    verbose: bool,

    /// Print a JSON snapshot of the final board of each episode
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Random legal moves
    Random,
    /// Cycle through directions: Left, Down, Right, Up
    Cycle,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if let Some(episodes) = args.episodes {
        run_headless(&args, config, episodes)
    } else {
        run_interactive(config)
    }
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(size) = args.size {
        config.grid_size = size;
    }
    config.validate()?;
    debug!(?config, "resolved config");
    Ok(config)
}

const HEADER: &str = "=== tilemerge ===\nControls: WASD or Arrow Keys | Q to quit | R to restart\n";

/// Run interactive mode where the user plays with the keyboard.
fn run_interactive(config: SessionConfig) -> Result<()> {
    let _raw = RawMode::enable();

    let mut session = GameSession::new(config)?;
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 3];

    redraw(&session)?;

    loop {
        let bytes_read = stdin.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }

        let event = match parse_input(&buffer[..bytes_read]) {
            Input::Event(event) => event,
            Input::Quit => break,
            Input::None => continue,
        };

        let turn = session.handle(event)?;
        if turn == Turn::Ignored {
            continue;
        }
        redraw(&session)?;

        if let Turn::Moved { outcome, .. } = &turn {
            if outcome.score_delta > 0 {
                println!("  +{} points!", outcome.score_delta);
            }
        }
        if session.is_game_over() {
            println!("\n  *** GAME OVER ***");
            println!("  Final Score: {}", session.score());
            println!("  Max Tile: {}", session.grid().max_value());
            println!("\n  Press R to restart or Q to quit");
        }
    }

    println!("\nGoodbye!");
    Ok(())
}

fn redraw(session: &GameSession) -> Result<()> {
    print!("\x1b[2J\x1b[H");
    println!("{HEADER}");
    print!("{session}");
    io::stdout().flush()?;
    Ok(())
}

/// Run headless simulation mode.
fn run_headless(args: &Args, config: SessionConfig, episodes: u32) -> Result<()> {
    let mut scores: Vec<u64> = Vec::with_capacity(episodes as usize);
    let mut max_tiles: Vec<u32> = Vec::with_capacity(episodes as usize);

    // Separate RNG for move selection so the policy does not perturb spawns.
    let mut policy_rng = SmallRng::seed_from_u64(config.seed.wrapping_add(1000));

    for episode in 0..episodes {
        let mut session = GameSession::new(SessionConfig {
            seed: config.seed.wrapping_add(u64::from(episode)),
            ..config.clone()
        })?;
        let mut steps = 0;
        let mut cycle = 0;

        while !session.is_game_over() && (args.max_steps == 0 || steps < args.max_steps) {
            let legal = session.legal_directions();
            let direction = match args.policy {
                Policy::Random => select_random(&legal, &mut policy_rng),
                Policy::Cycle => select_cycle(&legal, &mut cycle),
            };
            let Some(direction) = direction else {
                break;
            };

            session.handle(Event::Move(direction))?;
            steps += 1;

            if args.verbose {
                println!("Episode {} Step {}: {:?}", episode + 1, steps, direction);
                print!("{session}");
            }
        }

        let score = session.score();
        let max_tile = session.grid().max_value();
        info!(episode = episode + 1, score, max_tile, steps, "episode finished");

        if args.verbose {
            println!(
                "Episode {}: Score={}, MaxTile={}, Steps={}",
                episode + 1,
                score,
                max_tile,
                steps
            );
        }
        if args.json {
            println!("{}", serde_json::to_string(&session.snapshot())?);
        }

        scores.push(score);
        max_tiles.push(max_tile);
    }

    print_summary(args, &config, scores, &max_tiles);
    Ok(())
}

fn print_summary(args: &Args, config: &SessionConfig, mut scores: Vec<u64>, max_tiles: &[u32]) {
    let episodes = scores.len();
    if episodes == 0 {
        println!("=== Simulation Results ===");
        println!("episodes=0");
        return;
    }

    let total: u64 = scores.iter().sum();
    let avg_score = total as f64 / episodes as f64;
    scores.sort_unstable();
    let median_score = if episodes % 2 == 0 {
        (scores[episodes / 2 - 1] + scores[episodes / 2]) as f64 / 2.0
    } else {
        scores[episodes / 2] as f64
    };

    let mut tile_counts: HashMap<u32, u32> = HashMap::new();
    for tile in max_tiles {
        *tile_counts.entry(*tile).or_insert(0) += 1;
    }

    // Output results in parseable format
    println!("=== Simulation Results ===");
    println!("episodes={}", episodes);
    println!("policy={:?}", args.policy);
    println!("seed={}", config.seed);
    println!("grid_size={}", config.grid_size);
    println!("max_steps={}", args.max_steps);
    println!("avg_score={:.2}", avg_score);
    println!("median_score={:.2}", median_score);
    println!("min_score={}", scores[0]);
    println!("max_score={}", scores[episodes - 1]);
    println!(
        "max_tile_overall={}",
        max_tiles.iter().max().copied().unwrap_or(0)
    );

    let mut tile_list: Vec<_> = tile_counts.into_iter().collect();
    tile_list.sort_by_key(|&(tile, _)| tile);
    let distribution: Vec<String> = tile_list
        .iter()
        .map(|(tile, count)| format!("{tile}:{count}"))
        .collect();
    println!("tile_distribution={}", distribution.join(","));
}

fn legal_list(legal: &[bool; 4]) -> Vec<Direction> {
    Direction::all()
        .into_iter()
        .filter(|d| legal[d.index()])
        .collect()
}

/// Select a random legal direction.
fn select_random(legal: &[bool; 4], rng: &mut SmallRng) -> Option<Direction> {
    legal_list(legal).choose(rng).copied()
}

/// Select directions in a cycle: Left, Down, Right, Up.
fn select_cycle(legal: &[bool; 4], cycle: &mut usize) -> Option<Direction> {
    let order = [Direction::Left, Direction::Down, Direction::Right, Direction::Up];

    // Try directions in cycle order, starting from current position
    for _ in 0..4 {
        let direction = order[*cycle % 4];
        *cycle += 1;
        if legal[direction.index()] {
            return Some(direction);
        }
    }

    None
}

enum Input {
    Event(Event),
    Quit,
    None,
}

fn parse_input(bytes: &[u8]) -> Input {
    let direction = |d| Input::Event(Event::Move(d));
    match bytes {
        // Arrow keys (escape sequences)
        [27, 91, 65] => direction(Direction::Up),
        [27, 91, 66] => direction(Direction::Down),
        [27, 91, 67] => direction(Direction::Right),
        [27, 91, 68] => direction(Direction::Left),

        // WASD keys
        [b'w'] | [b'W'] => direction(Direction::Up),
        [b's'] | [b'S'] => direction(Direction::Down),
        [b'a'] | [b'A'] => direction(Direction::Left),
        [b'd'] | [b'D'] => direction(Direction::Right),

        // Control keys
        [b'q'] | [b'Q'] | [3] | [27] => Input::Quit, // q, Q, Ctrl+C, Esc
        [b'r'] | [b'R'] => Input::Event(Event::Restart(true)),

        _ => Input::None,
    }
}

/// Puts the terminal in non-canonical, no-echo mode until dropped.
struct RawMode {
    #[cfg(unix)]
    saved: Option<libc::termios>,
}

impl RawMode {
    #[cfg(unix)]
    fn enable() -> Self {
        use std::os::unix::io::AsRawFd;
        let fd = io::stdin().as_raw_fd();
        // SAFETY: termios is plain data and fd is this process's stdin.
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut termios) != 0 {
                return RawMode { saved: None };
            }
            let saved = termios;
            termios.c_lflag &= !(libc::ICANON | libc::ECHO);
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;
            libc::tcsetattr(fd, libc::TCSANOW, &termios);
            RawMode { saved: Some(saved) }
        }
    }

    // Interactive mode will require Enter after each key
    #[cfg(not(unix))]
    fn enable() -> Self {
        RawMode {}
    }
}

impl RawMode {
    #[cfg(unix)]
    fn restore(&self) {
        use std::os::unix::io::AsRawFd;
        if let Some(saved) = self.saved {
            // SAFETY: restores the attributes read in `enable`.
            unsafe {
                libc::tcsetattr(io::stdin().as_raw_fd(), libc::TCSANOW, &saved);
            }
        }
    }

    #[cfg(not(unix))]
    fn restore(&self) {}
}

impl Drop for RawMode {
    fn drop(&mut self) {
        self.restore();
    }
}
