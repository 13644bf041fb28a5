//! Line-oriented REPL over an orchestrator.

use crate::output::format_status;
use anyhow::Context;
use taxflow_core::Task;
use taxflow_orchestrator::Orchestrator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const HELP: &str = "Commands:
  status        Show agent status
  stats         Show system statistics
  task <json>   Execute a task, e.g. task {\"agent_type\": \"filing\"}
  help          Show this help
  quit          Exit
";

#[derive(Debug, PartialEq)]
pub enum Command {
    Status,
    Stats,
    Task(Box<Task>),
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> anyhow::Result<Command> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(h, r)| (h, r.trim()));

    match head.to_ascii_lowercase().as_str() {
        "" => Ok(Command::Empty),
        "status" => Ok(Command::Status),
        "stats" => Ok(Command::Stats),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "task" => {
            if rest.is_empty() {
                anyhow::bail!("usage: task <json>");
            }
            let task: Task = serde_json::from_str(rest).context("task must be a JSON object")?;
            Ok(Command::Task(Box::new(task)))
        }
        other => anyhow::bail!("unknown command '{other}', try 'help'"),
    }
}

/// Reads commands from `input` until `quit` or end of input.
pub async fn run<R, W>(orchestrator: &Orchestrator, input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(HELP.as_bytes()).await?;
    let mut lines = input.lines();

    loop {
        output.write_all(b">>> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let reply = match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Empty) => continue,
            Ok(Command::Help) => HELP.to_string(),
            Ok(Command::Status) => format_status(&orchestrator.agent_status().await),
            Ok(Command::Stats) => {
                let stats = orchestrator.statistics().await;
                format!(
                    "Total agents: {}\nActive tasks: {}\nCompleted tasks: {}\n",
                    stats.total_agents, stats.active_tasks, stats.completed_tasks
                )
            }
            Ok(Command::Task(task)) => {
                let envelope = orchestrator.route_and_execute(*task).await;
                format!("{}\n", serde_json::to_string_pretty(&envelope)?)
            }
            Err(e) => format!("Error: {e:#}\n"),
        };
        output.write_all(reply.as_bytes()).await?;
    }

    output.flush().await?;
    Ok(())
}
