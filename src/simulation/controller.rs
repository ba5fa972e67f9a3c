use super::registry::Simulations;
use super::state::Simulation;
use crate::dispatch::Fault;
use crate::dispatch::Gateway;
use crate::dispatch::Renderer;
use crate::dispatch::Reply;
use crate::engine::Shell;
use crate::gameplay::Game;
use crate::gameplay::Player;
use crate::othello::Move;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::oneshot;
use uuid::Uuid;

/// One frame of an exhibition game, produced ahead of rendering.
#[derive(Debug, Clone)]
pub struct Step {
    pub game: Game,
    pub by: Option<Player>,
    pub mv: Option<Move>,
    pub over: bool,
    pub error: Option<String>,
}

/// Drive the game forward with engine best moves, one frame per move.
/// Backpressure from the bounded channel paces nothing here — frames
/// queue up to the channel bound while the consumer ticks. The
/// producer exits when the game ends, the engine fails, or the
/// consumer goes away.
pub async fn produce(shell: Shell, mut game: Game, steps: mpsc::Sender<Step>) {
    loop {
        let mover = game.current().clone();
        match shell.best_move(&game, mover.depth()).await {
            Ok(best) => {
                game.apply(best.tile);
                let step = Step {
                    game: game.clone(),
                    by: Some(mover),
                    mv: Some(Move::place(best.tile)),
                    over: game.is_over(),
                    error: None,
                };
                let over = step.over;
                if steps.send(step).await.is_err() {
                    return;
                }
                if over {
                    return;
                }
            }
            Err(e) => {
                log::warn!("simulation {} lost its engine: {}", game.id(), e);
                let _ = steps
                    .send(Step {
                        game: game.clone(),
                        by: None,
                        mv: None,
                        over: true,
                        error: Some(Fault::Engine.to_string()),
                    })
                    .await;
                return;
            }
        }
    }
}

/// Render frames at the configured pace. A set pause flag skips
/// ticks without consuming frames; stop and the deadline both end
/// the run and strip the control row.
pub async fn consume(
    gateway: Arc<dyn Gateway>,
    renderer: Arc<dyn Renderer>,
    trace: Uuid,
    sims: Arc<Simulations>,
    sim: Arc<Simulation>,
    mut steps: mpsc::Receiver<Step>,
    mut cancelled: oneshot::Receiver<()>,
    delay: Duration,
) {
    let deadline = tokio::time::Instant::now() + crate::SIMULATION_TTL;
    let mut ticker = tokio::time::interval(delay);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = &mut cancelled => {
                gateway.edit(trace, Reply::text("Simulation stopped.")).await;
                break;
            }
            _ = tokio::time::sleep_until(deadline) => {
                gateway.edit(trace, Reply::text("Simulation stopped.")).await;
                break;
            }
            _ = ticker.tick() => {
                if sim.paused() {
                    continue;
                }
                match steps.try_recv() {
                    Err(TryRecvError::Empty) => continue,
                    Err(TryRecvError::Disconnected) => {
                        gateway.edit(trace, Reply::text("Simulation stopped.")).await;
                        break;
                    }
                    Ok(step) => {
                        let over = step.over;
                        gateway.edit(trace, frame(renderer.as_ref(), &sim, step)).await;
                        if over {
                            break;
                        }
                    }
                }
            }
        }
    }
    sims.remove(&sim.id()).await;
}

/// the interactive control row attached to live frames
pub fn controls(id: Uuid) -> Vec<String> {
    vec![
        format!("pause {}", id),
        format!("resume {}", id),
        format!("stop {}", id),
    ]
}

fn frame(renderer: &dyn Renderer, sim: &Simulation, step: Step) -> Reply {
    let text = match (&step.error, &step.by, &step.mv) {
        (Some(error), _, _) => error.clone(),
        (None, Some(by), Some(mv)) if step.over => {
            format!("{} played {}. {}.", by, mv, step.game.result())
        }
        (None, Some(by), Some(mv)) => format!("{} played {}.", by, mv),
        _ => String::new(),
    };
    let reply = Reply::text(text).with_board(renderer.render(&step.game));
    if step.over {
        reply
    } else {
        reply.with_actions(controls(sim.id()))
    }
}
