#![forbid(unsafe_code)]

//! `mission-timer-ctl`: local CLI companion for `mission-timer`.
//!
//! Connects to the IPC socket and sends JSON commands to the server.
//! Used by the operator at the coordination desk to drive team timers and
//! enter notes without going through the mobile mirror.

use std::io::{BufRead, BufReader, Write};

use clap::{Parser, Subcommand};
use interprocess::local_socket::{traits::Stream as _, GenericNamespaced, Stream, ToNsName};

#[derive(Debug, Parser)]
#[command(
    name = "mission-timer-ctl",
    about = "Local CLI for the mission-timer server",
    version,
    long_about = None
)]
struct Cli {
    /// IPC socket name (must match server's `ipc_name` config).
    #[arg(long, default_value = "mission-timer")]
    ipc_name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List teams with elapsed time and warning state.
    List,

    /// List routing targets and the current selection.
    Targets,

    /// Start a team's timer.
    Start {
        /// Team name.
        team: String,
    },

    /// Stop a team's timer.
    Stop {
        /// Team name.
        team: String,
    },

    /// Reset a team's timer to zero.
    Reset {
        /// Team name.
        team: String,
    },

    /// Register a new team.
    AddTeam {
        /// Team name.
        team: String,
        /// First warning after this many minutes.
        #[arg(long)]
        first: Option<u64>,
        /// Second warning after this many minutes.
        #[arg(long)]
        second: Option<u64>,
    },

    /// Remove a team (stops its timer).
    RemoveTeam {
        /// Team name.
        team: String,
    },

    /// Change a team's warning thresholds.
    Thresholds {
        /// Team name.
        team: String,
        /// First warning after this many minutes.
        #[arg(long)]
        first: Option<u64>,
        /// Second warning after this many minutes.
        #[arg(long)]
        second: Option<u64>,
    },

    /// Add a note to the mission log.
    Note {
        /// Note text.
        content: String,
        /// Routing target; defaults to the selected target.
        #[arg(long)]
        target: Option<String>,
    },

    /// Reply to an existing log entry.
    Reply {
        /// Id of the entry being answered.
        parent_id: u64,
        /// Reply text.
        content: String,
        /// Routing target; defaults to the parent's target.
        #[arg(long)]
        target: Option<String>,
    },

    /// Select the default routing target for notes.
    Select {
        /// Target name.
        target: String,
    },
}

fn build_request(command: &Command) -> serde_json::Value {
    match command {
        Command::List => serde_json::json!({ "command": "list" }),
        Command::Targets => serde_json::json!({ "command": "targets" }),
        Command::Start { team } => serde_json::json!({ "command": "start", "team": team }),
        Command::Stop { team } => serde_json::json!({ "command": "stop", "team": team }),
        Command::Reset { team } => serde_json::json!({ "command": "reset", "team": team }),
        Command::AddTeam {
            team,
            first,
            second,
        } => serde_json::json!({
            "command": "add-team",
            "team": team,
            "first_minutes": first,
            "second_minutes": second,
        }),
        Command::RemoveTeam { team } => {
            serde_json::json!({ "command": "remove-team", "team": team })
        }
        Command::Thresholds {
            team,
            first,
            second,
        } => serde_json::json!({
            "command": "thresholds",
            "team": team,
            "first_minutes": first,
            "second_minutes": second,
        }),
        Command::Note { content, target } => {
            serde_json::json!({ "command": "note", "content": content, "target": target })
        }
        Command::Reply {
            parent_id,
            content,
            target,
        } => serde_json::json!({
            "command": "reply",
            "parent_id": parent_id,
            "content": content,
            "target": target,
        }),
        Command::Select { target } => {
            serde_json::json!({ "command": "select", "target": target })
        }
    }
}

fn main() {
    let args = Cli::parse();
    let request_json = build_request(&args.command);

    match send_ipc_command(&args.ipc_name, &request_json) {
        Ok(response) => {
            if let Some(obj) = response.as_object() {
                let ok = obj
                    .get("ok")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                if ok {
                    if let Some(data) = obj.get("data") {
                        println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
                    } else {
                        println!("OK");
                    }
                } else {
                    let err_msg = obj
                        .get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown error");
                    eprintln!("Error: {err_msg}");
                    std::process::exit(1);
                }
            } else {
                println!("{response}");
            }
        }
        Err(err) => {
            eprintln!("Failed to connect to server: {err}");
            eprintln!("Is mission-timer running with ipc_name '{}'?", args.ipc_name);
            std::process::exit(1);
        }
    }
}

/// Connect to the IPC socket, send a JSON command, and read the response.
fn send_ipc_command(
    ipc_name: &str,
    request: &serde_json::Value,
) -> std::result::Result<serde_json::Value, Box<dyn std::error::Error>> {
    let name = ipc_name.to_ns_name::<GenericNamespaced>()?;
    let mut stream = Stream::connect(name)?;

    let mut request_line = serde_json::to_string(request)?;
    request_line.push('\n');
    stream.write_all(request_line.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    let response: serde_json::Value = serde_json::from_str(response_line.trim())?;
    Ok(response)
}
