use super::gateway::Gateway;
use super::gateway::Renderer;
use super::gateway::Reply;
use super::handler::Dispatcher;
use crate::gameplay::Game;
use crate::lobby::Account;
use crate::lobby::Fetcher;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use uuid::Uuid;

/// Plain-text gateway for running the service without a chat
/// platform attached.
pub struct Console;

#[async_trait::async_trait]
impl Gateway for Console {
    async fn send(&self, trace: Uuid, reply: Reply) {
        log::debug!(
            "[{}] send {}",
            trace,
            serde_json::to_string(&reply).unwrap_or_default()
        );
        print(&reply);
    }
    async fn edit(&self, trace: Uuid, reply: Reply) {
        log::debug!(
            "[{}] edit {}",
            trace,
            serde_json::to_string(&reply).unwrap_or_default()
        );
        println!("(edit)");
        print(&reply);
    }
}

fn print(reply: &Reply) {
    println!("{}", reply.text);
    if let Some(ref board) = reply.board {
        println!("{}", board);
    }
    if let Some(ref actions) = reply.actions {
        println!("[{}]", actions.join(" | "));
    }
}

/// Text renderer standing in for the image producer.
pub struct TextBoard;

impl Renderer for TextBoard {
    fn render(&self, game: &Game) -> String {
        format!(
            "{}{} (b) vs {} (w)",
            game.board(),
            game.black(),
            game.white()
        )
    }
}

/// Identity stand-in: every id resolves to itself.
pub struct EchoFetcher;

#[async_trait::async_trait]
impl Fetcher for EchoFetcher {
    async fn fetch(&self, id: &str) -> anyhow::Result<Account> {
        Ok(Account {
            id: id.to_string(),
            username: id.to_string(),
        })
    }
}

/// stdin REPL. Lines starting with `@user ` impersonate that user;
/// bare lines run as the operator.
pub async fn run(dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        {
            use std::io::Write;
            print!("> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => return Ok(()),
            _ => {}
        }
        let (account, rest) = identify(line);
        dispatcher.dispatch(Some(account), rest).await;
    }
}

fn identify(line: &str) -> (Account, &str) {
    if let Some(rest) = line.strip_prefix('@') {
        if let Some((user, command)) = rest.split_once(' ') {
            let account = Account {
                id: user.to_string(),
                username: user.to_string(),
            };
            return (account, command.trim());
        }
    }
    let operator = Account {
        id: "operator".to_string(),
        username: "operator".to_string(),
    };
    (operator, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impersonation_prefix() {
        let (account, rest) = identify("@alice move d3");
        assert_eq!(account.id, "alice");
        assert_eq!(rest, "move d3");
    }

    #[test]
    fn bare_lines_run_as_operator() {
        let (account, rest) = identify("leaderboard");
        assert_eq!(account.id, "operator");
        assert_eq!(rest, "leaderboard");
    }
}
