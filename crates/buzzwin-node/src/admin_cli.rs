//! buzzwin-admin CLI tool
//!
//! Talks to a running buzzwin-node over its admin socket.
//!
//! Usage:
//!   buzzwin-admin get-karma <user_id>
//!   buzzwin-admin award <user_id> <action>
//!   buzzwin-admin recompute-state <user_id>
//!   buzzwin-admin reconcile-ripples
//!   buzzwin-admin list-users
//!   buzzwin-admin ping

use buzzwin_node::admin_socket::{AdminCommand, AdminResponse};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

fn print_usage() {
    eprintln!("buzzwin-admin - Inspect and repair a Buzzwin ledger node");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  buzzwin-admin get-karma <user_id>         Show karma total and breakdown");
    eprintln!("  buzzwin-admin award <user_id> <action>    Award karma for an action");
    eprintln!("  buzzwin-admin recompute-state <user_id>   Rebuild streak state from completions");
    eprintln!("  buzzwin-admin reconcile-ripples           Repair ritual ripple counts");
    eprintln!("  buzzwin-admin list-users                  List all user ids");
    eprintln!("  buzzwin-admin ping                        Check if daemon is running");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  BUZZWIN_SOCKET  Path to admin socket (default: ./buzzwin-data/admin.sock)");
}

fn get_socket_path() -> PathBuf {
    std::env::var("BUZZWIN_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| buzzwin_node::admin_socket::default_socket_path())
}

fn send_command(cmd: AdminCommand) -> Result<AdminResponse, String> {
    let socket_path = get_socket_path();

    let mut stream = UnixStream::connect(&socket_path).map_err(|e| {
        format!(
            "Failed to connect to buzzwin-node at {:?}: {}\n\
             Is the buzzwin-node running?",
            socket_path, e
        )
    })?;

    let cmd_json = serde_json::to_string(&cmd).map_err(|e| e.to_string())?;
    writeln!(stream, "{}", cmd_json).map_err(|e| e.to_string())?;

    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader
        .read_line(&mut response_line)
        .map_err(|e| e.to_string())?;

    serde_json::from_str(&response_line).map_err(|e| format!("Invalid response: {}", e))
}

fn require_arg(args: &[String], index: usize, usage: &str) -> String {
    match args.get(index) {
        Some(arg) => arg.clone(),
        None => {
            eprintln!("Error: {}", usage);
            std::process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cmd = match args[1].as_str() {
        "get-karma" => AdminCommand::GetKarma {
            user_id: require_arg(&args, 2, "get-karma requires a user_id argument"),
        },
        "award" => AdminCommand::AwardKarma {
            user_id: require_arg(&args, 2, "award requires <user_id> <action>"),
            action: require_arg(&args, 3, "award requires <user_id> <action>"),
        },
        "recompute-state" => AdminCommand::RecomputeState {
            user_id: require_arg(&args, 2, "recompute-state requires a user_id argument"),
        },
        "reconcile-ripples" => AdminCommand::ReconcileRipples,
        "list-users" => AdminCommand::ListUsers,
        "ping" => AdminCommand::Ping,
        "-h" | "--help" | "help" => {
            print_usage();
            std::process::exit(0);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    };

    match send_command(cmd) {
        Ok(response) => match response {
            AdminResponse::Ok { message } => {
                println!("{}", message);
            }
            AdminResponse::Error { error } => {
                eprintln!("Error: {}", error);
                std::process::exit(1);
            }
            AdminResponse::List { items } => {
                if items.is_empty() {
                    println!("(none)");
                } else {
                    for item in items {
                        println!("{}", item);
                    }
                }
            }
            AdminResponse::Karma {
                user_id,
                total,
                breakdown,
            } => {
                println!("{}: {} karma", user_id, total);
                println!("  rituals     {}", breakdown.rituals);
                println!("  community   {}", breakdown.community);
                println!("  creation    {}", breakdown.creation);
                println!("  milestones  {}", breakdown.milestones);
            }
            AdminResponse::Pong => {
                println!("pong - buzzwin-node is running");
            }
        },
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
