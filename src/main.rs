use clap::Parser;
use othellobot::dispatch;
use othellobot::dispatch::Dispatcher;
use othellobot::engine::Shell;
use othellobot::lobby::Challenges;
use othellobot::lobby::Users;
use othellobot::simulation::Simulations;
use othellobot::store::Store;
use std::sync::Arc;
use std::time::Duration;

/// Multi-user Othello service backed by an analytical engine.
#[derive(Parser)]
#[command(name = "othellobot")]
struct Args {
    /// engine command line (program and arguments)
    #[arg(long)]
    engine: String,
    /// seconds between expiry sweeps
    #[arg(long, default_value_t = othellobot::SWEEP_PERIOD.as_secs())]
    sweep: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    othellobot::init();
    let args = Args::parse();
    let store = Arc::new(Store::new(othellobot::db().await));
    store.migrate().await?;
    let shell = Shell::spawn(&args.engine).await?;
    let dispatcher = Arc::new(Dispatcher {
        store: Arc::clone(&store),
        shell,
        users: Arc::new(Users::new(Box::new(dispatch::EchoFetcher))),
        challenges: Challenges::default(),
        sims: Arc::new(Simulations::default()),
        gateway: Arc::new(dispatch::Console),
        renderer: Arc::new(dispatch::TextBoard),
    });
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(args.sweep.max(1)));
        loop {
            ticker.tick().await;
            match store.expire().await {
                Ok(0) => {}
                Ok(n) => log::info!("expired {} games", n),
                Err(e) => log::warn!("expiry sweep failed: {}", e),
            }
        }
    });
    dispatch::run(dispatcher).await
}
