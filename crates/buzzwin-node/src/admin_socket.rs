//! Unix socket server for admin commands.
//!
//! Local IPC for operators: inspect karma, grant manual awards and repair
//! derived state (streaks, ripple counts).

use crate::error::Result;
use crate::ledger::Ledger;
use buzzwin_karma::{KarmaAction, KarmaBreakdown};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Admin command sent over the socket.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Show a user's karma
    GetKarma { user_id: String },
    /// Award karma for an action by name
    AwardKarma { user_id: String, action: String },
    /// Rebuild a user's streak state from completions
    RecomputeState { user_id: String },
    /// Repair ripple counts on every ritual
    ReconcileRipples,
    /// List all user ids
    ListUsers,
    /// Ping (health check)
    Ping,
}

/// Response from admin command.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdminResponse {
    Ok { message: String },
    Error { error: String },
    List { items: Vec<String> },
    Karma { user_id: String, total: u64, breakdown: KarmaBreakdown },
    Pong,
}

impl AdminResponse {
    fn error(e: impl std::fmt::Display) -> Self {
        AdminResponse::Error { error: e.to_string() }
    }
}

/// Admin socket server.
pub struct AdminSocket {
    ledger: Ledger,
    socket_path: PathBuf,
}

impl AdminSocket {
    /// Create a new admin socket server.
    pub fn new(ledger: Ledger, socket_path: &Path) -> Self {
        Self {
            ledger,
            socket_path: socket_path.to_path_buf(),
        }
    }

    /// Run the admin socket server.
    pub async fn run(&self) -> Result<()> {
        // Remove stale socket file from a previous run
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        tracing::info!("Admin socket listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let ledger = self.ledger.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, ledger).await {
                            tracing::error!("Admin connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept admin connection: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ledger: Ledger) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let response = match serde_json::from_str::<AdminCommand>(&line) {
            Ok(cmd) => execute_command(cmd, &ledger),
            Err(e) => AdminResponse::Error {
                error: format!("Invalid command: {}", e),
            },
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer.write_all(response_json.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}

fn execute_command(cmd: AdminCommand, ledger: &Ledger) -> AdminResponse {
    match cmd {
        AdminCommand::GetKarma { user_id } => match ledger.get_user_karma(&user_id) {
            Ok(karma) => AdminResponse::Karma {
                user_id: karma.user_id,
                total: karma.total,
                breakdown: karma.breakdown,
            },
            Err(e) => AdminResponse::error(e),
        },

        AdminCommand::AwardKarma { user_id, action } => {
            let action: KarmaAction = match action.parse() {
                Ok(action) => action,
                Err(e) => return AdminResponse::error(e),
            };
            match ledger.award_karma(&user_id, action) {
                Ok((award, _)) => {
                    tracing::info!(user_id = %user_id, action = %action, "Manual karma award");
                    AdminResponse::Ok {
                        message: format!(
                            "Awarded {} points to {} ({}), total {}",
                            award.points, user_id, action, award.new_total
                        ),
                    }
                }
                Err(e) => AdminResponse::error(e),
            }
        }

        AdminCommand::RecomputeState { user_id } => match ledger.recompute_ritual_state(&user_id) {
            Ok(state) => AdminResponse::Ok {
                message: format!(
                    "{}: current streak {}, longest {}, {} completions",
                    user_id,
                    state.stats.current_streak,
                    state.stats.longest_streak,
                    state.stats.total_completed
                ),
            },
            Err(e) => AdminResponse::error(e),
        },

        AdminCommand::ReconcileRipples => match ledger.reconcile_ripple_counts() {
            Ok(repaired) => AdminResponse::Ok {
                message: format!("Repaired {} ritual(s)", repaired),
            },
            Err(e) => AdminResponse::error(e),
        },

        AdminCommand::ListUsers => match ledger.storage().list_users() {
            Ok(users) => AdminResponse::List {
                items: users.into_iter().map(|u| u.id).collect(),
            },
            Err(e) => AdminResponse::error(e),
        },

        AdminCommand::Ping => AdminResponse::Pong,
    }
}

/// Default socket path.
pub fn default_socket_path() -> PathBuf {
    let data_dir = std::env::var("BUZZWIN_DATA_DIR").unwrap_or_else(|_| "./buzzwin-data".to_string());
    PathBuf::from(data_dir).join("admin.sock")
}
