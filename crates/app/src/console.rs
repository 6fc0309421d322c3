use std::fmt::Write as _;
use std::io;

use services::{
    ControllerError, NextOutcome, SessionController, SessionPhase, TransitionOutcome,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;
use trivia_core::model::{AnswerOutcome, BatchStatus, OPTION_COUNT};

/// Line-oriented front end for a `SessionController`.
///
/// One command per line. Returns when the player quits or input ends.
pub struct Console<R, W> {
    input: Lines<R>,
    output: W,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Answer(usize),
    Next,
    Previous,
    Retry,
    Restart,
    Quit,
    Help,
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Ok(n) = line.parse::<usize>() {
            if (1..=OPTION_COUNT).contains(&n) {
                return Self::Answer(n - 1);
            }
        }
        match line.to_ascii_lowercase().as_str() {
            "n" | "next" => Self::Next,
            "p" | "prev" | "previous" => Self::Previous,
            "r" | "retry" => Self::Retry,
            "restart" => Self::Restart,
            "q" | "quit" => Self::Quit,
            _ => Self::Help,
        }
    }
}

const PLAYING_HELP: &str = "commands: 1-4 answer, n next, p previous, restart, q quit";

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: input.lines(),
            output,
        }
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    async fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        self.input.next_line().await
    }

    /// Run until the player quits.
    ///
    /// `prefill` is used as the name for the first session instead of asking.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from reading input or writing output.
    pub async fn run(
        &mut self,
        controller: &mut SessionController,
        mut prefill: Option<String>,
    ) -> io::Result<()> {
        self.say("Polyphonia: music history trivia").await?;
        loop {
            let keep_going = match controller.phase() {
                SessionPhase::Welcome => self.welcome(controller, prefill.take()).await?,
                SessionPhase::Playing => self.playing(controller).await?,
                SessionPhase::GameOver => self.game_over(controller).await?,
            };
            if !keep_going {
                debug!("console closed");
                return Ok(());
            }
        }
    }

    async fn welcome(
        &mut self,
        controller: &mut SessionController,
        prefill: Option<String>,
    ) -> io::Result<bool> {
        let raw = match prefill {
            Some(name) => name,
            None => {
                let last = controller.player().map(|p| p.as_str().to_owned());
                let text = match &last {
                    Some(name) => format!("Your name [{name}]: "),
                    None => "Your name: ".to_owned(),
                };
                let Some(line) = self.prompt(&text).await? else {
                    return Ok(false);
                };
                match last {
                    Some(name) if line.trim().is_empty() => name,
                    _ => line,
                }
            }
        };

        match controller.start(&raw).await {
            Ok(BatchStatus::Success) => {
                self.say(&format!(
                    "{} questions. Good luck, {}!",
                    controller.snapshot().total,
                    controller.player().map_or("", |p| p.as_str())
                ))
                .await?;
                self.show_question(controller).await?;
            }
            Ok(_) => self.say("Could not load questions. r to retry, q to quit.").await?,
            Err(ControllerError::InvalidName(err)) => self.say(&format!("{err}.")).await?,
            Err(err) => self.say(&err.to_string()).await?,
        }
        Ok(true)
    }

    async fn playing(&mut self, controller: &mut SessionController) -> io::Result<bool> {
        let Some(line) = self.prompt("> ").await? else {
            return Ok(false);
        };
        let loaded = controller.snapshot().status == BatchStatus::Success;

        match Command::parse(&line) {
            Command::Quit => return Ok(false),
            Command::Retry if !loaded => match controller.retry().await {
                Ok(BatchStatus::Success) => self.show_question(controller).await?,
                Ok(_) => self.say("Still no questions. r to retry, q to quit.").await?,
                Err(err) => self.say(&err.to_string()).await?,
            },
            Command::Restart => controller.restart(),
            Command::Answer(index) if loaded => self.answer(controller, index).await?,
            Command::Next if loaded => match controller.next().await {
                Ok(NextOutcome::Scheduled) => {
                    controller.settled().await;
                    self.show_question(controller).await?;
                }
                Ok(NextOutcome::Ignored) => self.say("Hold on.").await?,
                // The game-over screen reports the result.
                Ok(NextOutcome::Finished(_)) => {}
                Err(err) => self.say(&err.to_string()).await?,
            },
            Command::Previous if loaded => match controller.previous() {
                Ok(TransitionOutcome::Scheduled) => {
                    controller.settled().await;
                    self.show_question(controller).await?;
                }
                Ok(_) => self.say("This is the first question.").await?,
                Err(err) => self.say(&err.to_string()).await?,
            },
            _ if !loaded => self.say("r to retry, q to quit.").await?,
            _ => self.say(PLAYING_HELP).await?,
        }
        Ok(true)
    }

    async fn answer(
        &mut self,
        controller: &mut SessionController,
        index: usize,
    ) -> io::Result<()> {
        let Some(item) = controller.snapshot().item else {
            return Ok(());
        };
        let choice = &item.options()[index];
        let text = match controller.answer(choice) {
            Ok(AnswerOutcome::Revealed { correct: true, points }) => {
                format!("Correct! +{points}\n{}", item.note())
            }
            Ok(AnswerOutcome::Revealed { correct: false, .. }) => {
                format!("Not quite. The answer is {}.\n{}", item.answer(), item.note())
            }
            Ok(AnswerOutcome::Ignored) => "Already answered. n for next.".to_owned(),
            Err(err) => err.to_string(),
        };
        self.say(text.trim_end()).await
    }

    async fn show_question(&mut self, controller: &SessionController) -> io::Result<()> {
        let snap = controller.snapshot();
        let Some(item) = snap.item else {
            return Ok(());
        };
        let mut text = format!(
            "\nQuestion {}/{} [{} | {}]  score {}\n{}\n",
            snap.index + 1,
            snap.total,
            item.category(),
            item.difficulty(),
            snap.score,
            item.prompt()
        );
        for (i, option) in item.options().iter().enumerate() {
            let _ = writeln!(text, "  {}. {option}", i + 1);
        }
        self.say(text.trim_end()).await
    }

    async fn game_over(&mut self, controller: &mut SessionController) -> io::Result<bool> {
        let mut text = String::from("\nGame over.");
        if let Some(result) = controller.last_result() {
            let _ = write!(text, " Final score: {}", result.entry.score);
            if !result.saved {
                text.push_str(" (could not be saved)");
            }
        }
        text.push_str("\n\nLeaderboard");
        let highlighted = controller.highlighted_entry();
        for (i, entry) in controller.leaderboard().entries().iter().enumerate() {
            let marker = if highlighted == Some(i) { "*" } else { " " };
            let _ = write!(
                text,
                "\n{marker}{}. {:<15} {:>5}  {}",
                i + 1,
                entry.name,
                entry.score,
                entry.created_at.format("%Y-%m-%d")
            );
        }
        if controller.leaderboard().is_empty() {
            text.push_str("\n  (empty)");
        }
        self.say(&text).await?;

        loop {
            let Some(line) = self.prompt("r to play again, q to quit: ").await? else {
                return Ok(false);
            };
            match Command::parse(&line) {
                Command::Retry | Command::Restart => {
                    controller.restart();
                    return Ok(true);
                }
                Command::Quit => return Ok(false),
                _ => {}
            }
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}
