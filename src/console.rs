//! Line-oriented presentation: renders controller state and forwards commands.

use std::path::PathBuf;

use chatdesk::controller::{ChatController, ControllerState, Notification, NotificationLevel};
use chatdesk::models::Role;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  <text>            send a message to the current session
  /new <name>       create a session and switch to it
  /select <id>      switch to a session
  /delete <id>      delete a session
  /voice <file>     send a recorded audio file
  /sessions         list sessions
  /sidebar          toggle the session list
  /help             show this help
  /quit             exit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Send(String),
    New(String),
    Select(String),
    Delete(String),
    Voice(PathBuf),
    Sessions,
    ToggleSidebar,
    Help,
    Quit,
    Nothing,
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Nothing);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let required = |what: &str| {
        if arg.is_empty() {
            Err(format!("/{name} needs {what}"))
        } else {
            Ok(arg.to_string())
        }
    };

    match name {
        // Blank names still go to the controller, which rejects them.
        "new" => Ok(Command::New(arg.to_string())),
        "select" => required("a session id").map(Command::Select),
        "delete" => required("a session id").map(Command::Delete),
        "voice" => required("an audio file path").map(|p| Command::Voice(PathBuf::from(p))),
        "sessions" => Ok(Command::Sessions),
        "sidebar" => Ok(Command::ToggleSidebar),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command /{other}, try /help")),
    }
}

pub fn render_sessions(state: &ControllerState) -> String {
    if state.is_loading_sessions {
        return "Loading sessions…".to_string();
    }
    if state.chat_sessions.is_empty() {
        return "No sessions yet, create one with /new <name>".to_string();
    }
    state
        .chat_sessions
        .iter()
        .map(|s| {
            let marker = if state.current_session_id.as_deref() == Some(s.id.as_str()) {
                '*'
            } else {
                ' '
            };
            format!("{marker} [{}] {}", s.id, s.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_thread(state: &ControllerState) -> String {
    let Some(session) = state.current_session() else {
        return "No session selected".to_string();
    };

    let mut lines = vec![format!("── {} ──", session.title)];
    if state.messages.is_empty() && !state.is_loading {
        lines.push("Send a message to start chatting".to_string());
    }
    for msg in &state.messages {
        let label = match msg.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        let suffix = if state.pending_message_id.as_deref() == Some(msg.id.as_str()) {
            " (sending…)"
        } else {
            ""
        };
        lines.push(format!("{label}: {}{suffix}", msg.content));
    }
    if state.is_loading && state.pending_message_id.is_none() {
        lines.push("…".to_string());
    }
    lines.join("\n")
}

pub fn render_notification(notification: &Notification) -> String {
    match notification.level {
        NotificationLevel::Success => format!("✓ {}", notification.message),
        NotificationLevel::Error => format!("✗ {}", notification.message),
    }
}

/// Reads commands from stdin until `/quit` or end of input.
pub async fn run(controller: &ChatController) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        // Failures were already reported through notifications.
        let result = match command {
            Command::Nothing => continue,
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Sessions => {
                println!("{}", render_sessions(&controller.state()));
                continue;
            }
            Command::ToggleSidebar => {
                let open = !controller.state().is_sidebar_open;
                controller.set_sidebar_open(open);
                if open {
                    println!("{}", render_sessions(&controller.state()));
                }
                continue;
            }
            Command::Send(text) => controller.send_text_message(&text).await,
            Command::New(name) => {
                controller.set_show_new_session_modal(true);
                controller.set_new_session_name(name.clone());
                controller.create_session(&name).await
            }
            Command::Select(id) => controller.select_session(&id).await,
            Command::Delete(id) => controller.delete_session(&id).await,
            Command::Voice(path) => match tokio::fs::read(&path).await {
                Ok(audio) => controller.send_voice_message(audio).await,
                Err(e) => {
                    println!("Cannot read {}: {e}", path.display());
                    continue;
                }
            },
        };
        if let Err(e) = result {
            debug!("Command failed: {e}");
        }

        let state = controller.state();
        if state.is_sidebar_open {
            println!("{}", render_sessions(&state));
        }
        println!("{}", render_thread(&state));
    }

    Ok(())
}
