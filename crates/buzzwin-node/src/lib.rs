//! Buzzwin Node - karma and ritual participation ledger
//!
//! Keeps karma balances, ritual rosters and completion streaks for the
//! Buzzwin community, and serves them over an HTTP API.
//!
//! # Architecture
//!
//! - **Models**: Stored documents (User, RitualDefinition, RitualCompletion, ...)
//! - **Storage**: RocksDB-backed persistent storage with guarded transactions
//! - **Ledger**: Karma awards, rituals, impact moments and story reactions
//! - **API**: HTTP endpoints for clients
//! - **Admin Socket**: Unix socket for local admin commands (buzzwin-admin CLI)
//!
//! # Example
//!
//! ```no_run
//! use buzzwin_node::{BuzzwinNode, NodeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NodeConfig::from_env()?;
//!     let node = BuzzwinNode::new(config)?;
//!     node.run().await?;
//!     Ok(())
//! }
//! ```

pub mod models;
pub mod storage;
pub mod ledger;
pub mod rituals;
pub mod moments;
pub mod reactions;
pub mod node;
pub mod api;
pub mod admin_socket;
pub mod error;

pub use models::{ImpactMoment, RitualCompletion, RitualDefinition, StoryReaction, User, UserRitualState};
pub use storage::Storage;
pub use ledger::{AwardOutcome, Clock, KarmaSummary, Ledger};
pub use rituals::{CompletionOutcome, JoinOutcome, LeaveOutcome, NewRitual};
pub use moments::{MomentPatch, NewMoment};
pub use reactions::ReactionOutcome;
pub use node::{BuzzwinNode, NodeConfig, NodeState};
pub use error::{Error, Result};
