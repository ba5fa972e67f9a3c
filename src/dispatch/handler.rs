use super::command::Command;
use super::error::Fault;
use super::gateway::Gateway;
use super::gateway::Renderer;
use super::gateway::Reply;
use crate::engine::Shell;
use crate::gameplay::Game;
use crate::gameplay::GameResult;
use crate::gameplay::MoveOutcome;
use crate::gameplay::Player;
use crate::lobby::Account;
use crate::lobby::Challenge;
use crate::lobby::Challenges;
use crate::lobby::Users;
use crate::othello::Tile;
use crate::simulation;
use crate::simulation::Simulation;
use crate::simulation::Simulations;
use crate::store::Exchange;
use crate::store::Store;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Routes validated commands to handlers with every collaborator
/// injected; nothing here owns global state. Each interaction gets a
/// fresh trace id and exactly one acknowledgement; anything after the
/// acknowledgement goes through the gateway's edit channel.
pub struct Dispatcher {
    pub store: Arc<Store>,
    pub shell: Shell,
    pub users: Arc<Users>,
    pub challenges: Challenges,
    pub sims: Arc<Simulations>,
    pub gateway: Arc<dyn Gateway>,
    pub renderer: Arc<dyn Renderer>,
}

impl Dispatcher {
    pub async fn dispatch(&self, account: Option<Account>, line: &str) {
        let trace = Uuid::now_v7();
        log::info!(
            "[{}] {} :: {}",
            trace,
            account
                .as_ref()
                .map(|a| a.username.as_str())
                .unwrap_or("<nobody>"),
            line
        );
        let outcome = match Command::parse(line) {
            Ok(command) => self.handle(trace, account, command).await,
            Err(fault) => Err(fault),
        };
        match outcome {
            Ok(reply) => self.gateway.send(trace, reply).await,
            Err(fault) => {
                match fault {
                    Fault::Internal(ref e) => log::error!("[{}] {:#}", trace, e),
                    ref fault => log::info!("[{}] rejected: {}", trace, fault),
                }
                self.gateway.send(trace, Reply::text(fault.to_string())).await;
            }
        }
    }

    async fn handle(
        &self,
        trace: Uuid,
        account: Option<Account>,
        command: Command,
    ) -> Result<Reply, Fault> {
        match command {
            Command::ChallengeUser { opponent } => {
                self.challenge_user(trace, caller(account)?, opponent).await
            }
            Command::ChallengeBot { level } => self.challenge_bot(caller(account)?, level).await,
            Command::Accept { challenger } => self.accept(caller(account)?, challenger).await,
            Command::Forfeit => self.forfeit(caller(account)?).await,
            Command::Move { tile } => self.game_move(caller(account)?, tile).await,
            Command::View => self.view(caller(account)?).await,
            Command::Analyze { level } => self.analyze(trace, caller(account)?, level).await,
            Command::Simulate {
                black,
                white,
                delay,
            } => self.simulate(trace, black, white, delay).await,
            Command::Stats { player } => self.stats(caller(account)?, player).await,
            Command::Leaderboard => self.leaderboard().await,
            Command::Ggf => self.ggf(caller(account)?).await,
            Command::Pause { id } => self.pause(id, true).await,
            Command::Resume { id } => self.pause(id, false).await,
            Command::Stop { id } => self.stop(id).await,
        }
    }
}

// lobby commands
impl Dispatcher {
    async fn challenge_user(
        &self,
        trace: Uuid,
        account: Account,
        opponent: String,
    ) -> Result<Reply, Fault> {
        let challenger = Player::human(account.id, account.username);
        let challenged = self.users.player(&opponent).await.map_err(Fault::from)?;
        if challenged.id() == challenger.id() {
            return Err(Fault::Option {
                name: "opponent",
                invalid: opponent,
                expected: "someone other than yourself",
            });
        }
        let gateway = Arc::clone(&self.gateway);
        let reply = Reply::text(format!(
            "{}, {} has challenged you. Reply 'accept {}' within {} seconds.",
            challenged,
            challenger,
            challenger.id(),
            crate::CHALLENGE_TTL.as_secs()
        ));
        let challenge = Challenge::new(challenger, challenged);
        self.challenges
            .create(challenge, move |c| async move {
                let text = format!("The challenge from {} expired.", c.challenger);
                gateway.edit(trace, Reply::text(text)).await;
            })
            .await;
        Ok(reply)
    }

    async fn challenge_bot(&self, account: Account, level: u8) -> Result<Reply, Fault> {
        let human = Player::human(account.id, account.username);
        let (black, white) = colours(human, Player::bot(level));
        let game = self.store.create_game(black, white).await?;
        match game.current().is_bot() {
            false => Ok(self.show(turn_text(&game), &game)),
            true => match self.run_bots(game).await? {
                MoveOutcome::Completed(game) => Ok(self.show(turn_text(&game), &game)),
                MoveOutcome::Over(game, result, exchange) => {
                    Ok(self.over(&game, &result, exchange))
                }
                MoveOutcome::BotTurn(_) => {
                    Err(Fault::Internal(anyhow::anyhow!("bot turn after update")))
                }
            },
        }
    }

    async fn accept(&self, account: Account, challenger: String) -> Result<Reply, Fault> {
        let challenged = Player::human(account.id, account.username);
        let challenger = self.users.player(&challenger).await.map_err(Fault::from)?;
        let challenge = Challenge::new(challenger.clone(), challenged.clone());
        if !self.challenges.accept(&challenge).await {
            return Err(Fault::UnknownChallenge);
        }
        let (black, white) = colours(challenger, challenged);
        let game = self.store.create_game(black, white).await?;
        Ok(self.show(turn_text(&game), &game))
    }
}

// game commands
impl Dispatcher {
    async fn game_move(&self, account: Account, tile: Tile) -> Result<Reply, Fault> {
        match self.store.make_move(&account.id, tile).await? {
            MoveOutcome::Completed(game) => Ok(self.show(turn_text(&game), &game)),
            MoveOutcome::Over(game, result, exchange) => Ok(self.over(&game, &result, exchange)),
            MoveOutcome::BotTurn(game) => match self.run_bots(game).await? {
                MoveOutcome::Completed(game) => Ok(self.show(turn_text(&game), &game)),
                MoveOutcome::Over(game, result, exchange) => {
                    Ok(self.over(&game, &result, exchange))
                }
                MoveOutcome::BotTurn(_) => {
                    Err(Fault::Internal(anyhow::anyhow!("bot turn after update")))
                }
            },
        }
    }

    /// play engine moves until a human is on move or the game ends,
    /// then settle the whole sequence in one transaction
    async fn run_bots(&self, mut game: Game) -> Result<MoveOutcome, Fault> {
        while game.current().is_bot() && !game.is_over() {
            let best = self
                .shell
                .best_move(&game, game.current().depth())
                .await
                .map_err(|e| {
                    log::warn!("bot move failed in game {}: {}", game.id(), e);
                    Fault::Engine
                })?;
            game.apply(best.tile);
        }
        self.store.update_game(game).await
    }

    async fn forfeit(&self, account: Account) -> Result<Reply, Fault> {
        let (result, exchange) = self.store.forfeit(&account.id).await?;
        Ok(Reply::text(verdict(&result, exchange)))
    }

    async fn view(&self, account: Account) -> Result<Reply, Fault> {
        let game = self.store.game_of(&account.id).await?;
        let legal = game
            .legal()
            .iter()
            .map(Tile::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Ok(self.show(
            format!("{} Legal moves: {}.", turn_text(&game), legal),
            &game,
        ))
    }

    async fn ggf(&self, account: Account) -> Result<Reply, Fault> {
        let game = self.store.game_of(&account.id).await?;
        Ok(Reply::text(game.ggf()))
    }

    async fn analyze(&self, trace: Uuid, account: Account, level: u8) -> Result<Reply, Fault> {
        let game = self.store.game_of(&account.id).await?;
        let shell = self.shell.clone();
        let gateway = Arc::clone(&self.gateway);
        let depth = crate::depth(level);
        tokio::spawn(async move {
            let analysis = tokio::time::timeout(
                crate::ANALYZE_DEADLINE,
                shell.ranked_moves(&game, depth),
            )
            .await;
            let reply = match analysis {
                Err(_) => Reply::text(Fault::Timeout.to_string()),
                Ok(Err(e)) => {
                    log::warn!("[{}] analysis failed: {}", trace, e);
                    Reply::text(Fault::Engine.to_string())
                }
                Ok(Ok(ranked)) => Reply::text(format!(
                    "Engine evaluation at depth {}:\n{}",
                    depth,
                    ranked
                        .iter()
                        .map(|t| format!("  {}", t))
                        .collect::<Vec<_>>()
                        .join("\n")
                )),
            };
            gateway.edit(trace, reply).await;
        });
        Ok(Reply::text("Analyzing..."))
    }
}

// rating commands
impl Dispatcher {
    async fn stats(&self, account: Account, target: Option<String>) -> Result<Reply, Fault> {
        let (id, name) = match target {
            None => (account.id, account.username),
            Some(target) => match target.parse::<u8>() {
                Ok(level) if (crate::MIN_LEVEL..=crate::MAX_LEVEL).contains(&level) => {
                    let bot = Player::bot(level);
                    (bot.id().to_string(), bot.name().to_string())
                }
                _ => {
                    let player = self.users.player(&target).await.map_err(Fault::from)?;
                    (player.id().to_string(), player.name().to_string())
                }
            },
        };
        let stats = self.store.stats(&id).await?;
        Ok(Reply::text(format!(
            "{} — {:.0} elo ({} won, {} drawn, {} lost)",
            name, stats.elo, stats.won, stats.drawn, stats.lost
        )))
    }

    async fn leaderboard(&self) -> Result<Reply, Fault> {
        let standings = self.store.leaderboard(&self.users, 50).await?;
        let lines = standings
            .iter()
            .enumerate()
            .map(|(n, s)| {
                format!(
                    "{:>2}. {} — {:.0} ({}/{}/{})",
                    n + 1,
                    s.name,
                    s.stats.elo,
                    s.stats.won,
                    s.stats.drawn,
                    s.stats.lost
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Reply::text(format!("Top players by rating:\n{}", lines)))
    }
}

// simulation commands
impl Dispatcher {
    async fn simulate(
        &self,
        trace: Uuid,
        black: u8,
        white: u8,
        delay: u64,
    ) -> Result<Reply, Fault> {
        let game = Game::new(Player::bot(black), Player::bot(white));
        let (sim, cancelled) = Simulation::new(game.id());
        self.sims.insert(Arc::clone(&sim)).await;
        let (tx, rx) = mpsc::channel(crate::SIM_CHANNEL);
        let actions = simulation::controls(sim.id());
        tokio::spawn(simulation::produce(self.shell.clone(), game, tx));
        tokio::spawn(simulation::consume(
            Arc::clone(&self.gateway),
            Arc::clone(&self.renderer),
            trace,
            Arc::clone(&self.sims),
            sim,
            rx,
            cancelled,
            Duration::from_secs(delay),
        ));
        Ok(Reply::text(format!(
            "Simulation started: Bot level {} vs Bot level {}.",
            black, white
        ))
        .with_actions(actions))
    }

    async fn pause(&self, id: Uuid, paused: bool) -> Result<Reply, Fault> {
        match self.sims.get(&id).await {
            Some(sim) => {
                sim.set_paused(paused);
                Ok(Reply::text(match paused {
                    true => "Simulation paused.",
                    false => "Simulation resumed.",
                }))
            }
            None => Ok(Reply::text("That simulation is no longer running.")),
        }
    }

    async fn stop(&self, id: Uuid) -> Result<Reply, Fault> {
        match self.sims.get(&id).await {
            Some(sim) => {
                sim.stop();
                Ok(Reply::text("Stopping the simulation."))
            }
            None => Ok(Reply::text("That simulation is no longer running.")),
        }
    }
}

// presentation helpers
impl Dispatcher {
    fn show(&self, text: impl Into<String>, game: &Game) -> Reply {
        Reply::text(text).with_board(self.renderer.render(game))
    }
    fn over(&self, game: &Game, result: &GameResult, exchange: Exchange) -> Reply {
        Reply::text(verdict(result, exchange)).with_board(self.renderer.render(game))
    }
}

fn caller(account: Option<Account>) -> Result<Account, Fault> {
    account.ok_or(Fault::UserNotProvided)
}

/// random colour assignment for a fresh game
fn colours(a: Player, b: Player) -> (Player, Player) {
    if rand::rng().random::<bool>() {
        (a, b)
    } else {
        (b, a)
    }
}

fn turn_text(game: &Game) -> String {
    format!("{} to move.", game.current())
}

fn verdict(result: &GameResult, exchange: Exchange) -> String {
    if result.is_draw() {
        format!("{}.", result)
    } else {
        format!(
            "{}. {} {:+.0}, {} {:+.0}.",
            result,
            result.winner(),
            exchange.winner,
            result.loser(),
            exchange.loser
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_is_required() {
        assert!(matches!(caller(None), Err(Fault::UserNotProvided)));
        let account = Account {
            id: "1001".into(),
            username: "alice".into(),
        };
        assert_eq!(caller(Some(account)).unwrap().id, "1001");
    }

    #[test]
    fn colours_keep_both_players() {
        let (black, white) = colours(Player::human("1001", "alice"), Player::bot(3));
        let mut ids = vec![black.id().to_string(), white.id().to_string()];
        ids.sort();
        assert_eq!(ids, vec!["1001", "3"]);
    }

    #[test]
    fn verdict_shows_rating_movement() {
        let result = GameResult::win(Player::human("1001", "alice"), Player::human("1002", "bob"));
        let text = verdict(
            &result,
            Exchange {
                winner: 15.,
                loser: -14.,
            },
        );
        assert_eq!(text, "alice beat bob. alice +15, bob -14.");
    }

    #[test]
    fn verdict_for_draws() {
        let result = GameResult::draw(Player::human("1001", "alice"), Player::human("1002", "bob"));
        assert_eq!(verdict(&result, Exchange::default()), "alice and bob drew.");
    }
}
