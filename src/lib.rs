pub mod dispatch;
pub mod engine;
pub mod gameplay;
pub mod lobby;
pub mod othello;
pub mod simulation;
pub mod store;

use std::time::Duration;

/// dimensional analysis types
pub type Elo = f64;
pub type Heuristic = f32;

// rating parameters
pub const ELO_K: Elo = 30.;
pub const ELO_INITIAL: Elo = 1500.;

// lifetimes and pacing
pub const GAME_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const CHALLENGE_TTL: Duration = Duration::from_secs(60);
pub const USER_TTL: Duration = Duration::from_secs(60 * 60);
pub const SIMULATION_TTL: Duration = Duration::from_secs(60 * 60);
pub const SWEEP_PERIOD: Duration = Duration::from_secs(15);
pub const ANALYZE_DEADLINE: Duration = Duration::from_secs(120);

// engine parameters
pub const MIN_DEPTH: u8 = 1;
pub const MAX_DEPTH: u8 = 20;
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;
pub const DEFAULT_LEVEL: u8 = 3;

// simulation parameters
pub const SIM_CHANNEL: usize = 64;
pub const MIN_DELAY: u64 = 1;
pub const MAX_DELAY: u64 = 5;
pub const DEFAULT_DELAY: u64 = 2;

/// search depth for a user-facing difficulty level
pub fn depth(level: u8) -> u8 {
    match level {
        1 => 5,
        2 => 8,
        3 => 12,
        4 => 15,
        5 => 20,
        _ => panic!("level out of range: {}", level),
    }
}

/// initialize logging and exit on ctrl-c
pub fn init() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("forcing exit");
        std::process::exit(0);
    });
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// get a database connection and return the client
pub async fn db() -> tokio_postgres::Client {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let ref url = std::env::var("DB_URL").expect("DB_URL must be set");
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(connection);
    client
}
