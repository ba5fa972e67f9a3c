use super::parse;
use super::request::Kind;
use super::request::Query;
use super::request::ScoredTile;
use crate::gameplay::Game;
use std::process::Stdio;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::io::Lines;
use tokio::process::Child;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

/// startup banner, matched line-by-line by prefix
pub const BANNER: [&str; 4] = ["Othello", "version", "build", "ready"];

/// how long the child may take to announce itself
const BANNER_DEADLINE: std::time::Duration = std::time::Duration::from_secs(10);

/// Thread-safe front of the analytical subprocess.
///
/// A single worker task owns the child's stdio; callers rendezvous with
/// it over a bounded request channel, so the child is never asked two
/// questions at once and no lock guards the pipes. Each request gets a
/// private oneshot carrying exactly one result.
#[derive(Debug, Clone)]
pub struct Shell {
    queries: mpsc::Sender<Query>,
}

impl Shell {
    /// Start the engine. `command` is the program followed by its
    /// arguments, whitespace-separated.
    pub async fn spawn(command: &str) -> anyhow::Result<Self> {
        let mut words = command.split_whitespace();
        let program = words
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty engine command"))?;
        let mut child = Command::new(program)
            .args(words)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow::anyhow!("failed to start engine '{}': {}", command, e))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow::anyhow!("engine stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .map(AsyncBufReadExt::lines)
            .ok_or_else(|| anyhow::anyhow!("engine stdout unavailable"))?;
        let (tx, rx) = mpsc::channel(1);
        let mut worker = Worker {
            _child: child,
            stdin,
            stdout,
            queries: rx,
        };
        tokio::time::timeout(BANNER_DEADLINE, worker.banner())
            .await
            .map_err(|_| anyhow::anyhow!("engine banner timed out"))??;
        tokio::spawn(worker.run());
        log::info!("engine shell started: {}", command);
        Ok(Self { queries: tx })
    }

    /// Enqueue a question; the receiver yields exactly one result.
    /// Refuses out-of-range depths and positions with nothing to search.
    pub async fn submit(
        &self,
        kind: Kind,
        game: &Game,
        depth: u8,
    ) -> anyhow::Result<oneshot::Receiver<anyhow::Result<Vec<ScoredTile>>>> {
        if !(crate::MIN_DEPTH..=crate::MAX_DEPTH).contains(&depth) {
            anyhow::bail!("depth {} out of range", depth);
        }
        if game.legal().is_empty() {
            anyhow::bail!("no legal moves to search from this position");
        }
        let (tx, rx) = oneshot::channel();
        self.queries
            .send(Query {
                kind,
                ggf: game.ggf(),
                depth,
                reply: tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("engine shell is gone"))?;
        Ok(rx)
    }

    /// the engine's single choice for the side to move
    pub async fn best_move(&self, game: &Game, depth: u8) -> anyhow::Result<ScoredTile> {
        let rx = self.submit(Kind::BestMove, game, depth).await?;
        let mut tiles = rx
            .await
            .map_err(|_| anyhow::anyhow!("engine shell dropped the request"))??;
        match tiles.len() {
            1 => Ok(tiles.remove(0)),
            n => Err(anyhow::anyhow!("expected one best move, got {}", n)),
        }
    }

    /// one evaluation per legal move, row-major
    pub async fn ranked_moves(&self, game: &Game, depth: u8) -> anyhow::Result<Vec<ScoredTile>> {
        let rx = self.submit(Kind::RankedMoves, game, depth).await?;
        rx.await
            .map_err(|_| anyhow::anyhow!("engine shell dropped the request"))?
    }
}

/// Owns the child and its pipes. Services one query to completion
/// before receiving the next; that rendezvous is the only
/// synchronization the subprocess needs.
struct Worker {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    queries: mpsc::Receiver<Query>,
}

impl Worker {
    async fn banner(&mut self) -> anyhow::Result<()> {
        for prefix in BANNER {
            let line = self.read().await?;
            if !line.starts_with(prefix) {
                anyhow::bail!("unexpected engine banner line: {}", line);
            }
        }
        Ok(())
    }

    async fn run(mut self) {
        while let Some(Query {
            kind,
            ggf,
            depth,
            reply,
        }) = self.queries.recv().await
        {
            let result = self
                .serve(kind, &ggf, depth)
                .await
                .inspect_err(|e| log::warn!("engine request failed: {}", e));
            let _ = reply.send(result);
        }
        log::info!("engine shell shutting down");
    }

    /// the three-command exchange for one question
    async fn serve(&mut self, kind: Kind, ggf: &str, depth: u8) -> anyhow::Result<Vec<ScoredTile>> {
        self.write(&format!("set depth {}", depth)).await?;
        loop {
            if self.read().await?.contains("set myname") {
                break;
            }
        }
        self.write(&format!("set game {}", ggf)).await?;
        match kind {
            Kind::BestMove => {
                self.write("go").await?;
                loop {
                    let line = self.read().await?;
                    if let Some(at) = line.find("=== ") {
                        return parse::best(&line[at + 4..]).map(|t| vec![t]);
                    }
                }
            }
            Kind::RankedMoves => {
                self.write("hint 64").await?;
                let mut hints = parse::Hints::new();
                loop {
                    let line = self.read().await?;
                    if hints.feed(&line)? {
                        return Ok(hints.ranked());
                    }
                }
            }
        }
    }

    async fn write(&mut self, line: &str) -> anyhow::Result<()> {
        log::debug!("engine < {}", line);
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// next non-empty stdout line
    async fn read(&mut self) -> anyhow::Result<String> {
        loop {
            match self.stdout.next_line().await? {
                None => anyhow::bail!("engine closed its stdout"),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => {
                    log::debug!("engine > {}", line);
                    return Ok(line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameplay::Player;

    /// drop a line-oriented sh stand-in for the engine into a temp file
    fn fake(body: &str) -> String {
        let path = std::env::temp_dir().join(format!("fake-engine-{}.sh", uuid::Uuid::now_v7()));
        std::fs::write(&path, body).expect("write fake engine");
        format!("sh {}", path.display())
    }

    const WELL_BEHAVED: &str = r#"
echo "Othello fake engine"
echo "version 0.0"
echo "build test"
echo "ready"
while read line; do
  case "$line" in
    "set depth"*) echo "set myname fake";;
    "set game"*) ;;
    "go") echo "note: pondering"; echo "=== f5/2.00";;
    "hint"*) echo "search d3 1.00"; echo "search c4 -0.25"; echo "book d3 1.50"; echo "status";;
  esac
done
"#;

    fn game() -> Game {
        Game::new(Player::human("1001", "alice"), Player::human("1002", "bob"))
    }

    #[tokio::test]
    async fn answers_one_caller_at_a_time() {
        let shell = Shell::spawn(&fake(WELL_BEHAVED)).await.unwrap();
        let game = game();
        let (a, b, c) = tokio::join!(
            shell.best_move(&game, 5),
            shell.best_move(&game, 12),
            shell.ranked_moves(&game, 8),
        );
        for best in [a.unwrap(), b.unwrap()] {
            assert_eq!(best.tile.to_string(), "f5");
            assert!((best.score - 2.0).abs() < f32::EPSILON);
        }
        let ranked = c.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].tile.to_string(), "d3");
        assert!((ranked[0].score - 1.5).abs() < f32::EPSILON);
        assert_eq!(ranked[1].tile.to_string(), "c4");
    }

    #[tokio::test]
    async fn rejects_bad_banner() {
        let script = fake("echo \"definitely not an engine\"\n");
        assert!(Shell::spawn(&script).await.is_err());
    }

    #[tokio::test]
    async fn validates_depth() {
        let shell = Shell::spawn(&fake(WELL_BEHAVED)).await.unwrap();
        assert!(shell.submit(Kind::BestMove, &game(), 0).await.is_err());
        assert!(shell.submit(Kind::BestMove, &game(), 21).await.is_err());
    }

    #[tokio::test]
    async fn refuses_finished_positions() {
        use crate::othello::Board;
        use crate::othello::Disc;
        use crate::othello::Tile;
        let mut board = Board::empty();
        board.place(Tile::new(0, 0), Disc::Black);
        board.place(Tile::new(7, 7), Disc::White);
        let game = Game::restore(
            uuid::Uuid::now_v7(),
            board,
            Player::human("1001", "alice"),
            Player::human("1002", "bob"),
            Vec::new(),
            std::time::SystemTime::now(),
        );
        let shell = Shell::spawn(&fake(WELL_BEHAVED)).await.unwrap();
        assert!(shell.submit(Kind::BestMove, &game, 5).await.is_err());
    }

    #[tokio::test]
    async fn survives_a_malformed_answer() {
        let flaky = r#"
echo "Othello fake engine"
echo "version 0.0"
echo "build test"
echo "ready"
asked=0
while read line; do
  case "$line" in
    "set depth"*) echo "set myname fake";;
    "set game"*) ;;
    "go")
      if [ "$asked" = 0 ]; then asked=1; echo "=== PA"; else echo "=== f5/2.00"; fi;;
  esac
done
"#;
        let shell = Shell::spawn(&fake(flaky)).await.unwrap();
        let game = game();
        assert!(shell.best_move(&game, 5).await.is_err());
        assert!(shell.best_move(&game, 5).await.is_ok());
    }
}
