//! # mx-sync
//!
//! Command-line driver for the sliding sync engine.
//!
//! Runs the sync loop against a homeserver and prints a one-line summary
//! per tick. Implements the recommended caller policy around the engine:
//! retry immediately when the cursor expires, pause briefly on transport
//! failures, and abort on a malformed response.
//!
//! ## Example
//!
//! ```bash
//! mx-sync --homeserver https://matrix.example \
//!     --token "$MATRIX_TOKEN" \
//!     --user-id @me:matrix.example \
//!     --mode growing --batch-size 20 --ticks 10
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use mx_sync_client::{ClientError, HttpTransport, RequestOverrides, SlidingSync, SlidingSyncConfig};
use mx_sync_core::RoomList;
use mx_sync_types::Presence;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Pause before retrying after a transport failure.
const RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Command-line sync loop driver for MSC4186 simplified sliding sync.
#[derive(Parser, Debug)]
#[command(name = "mx-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Homeserver base URL, e.g. https://matrix.example
    #[arg(long)]
    homeserver: String,

    /// Access token (or set MATRIX_TOKEN)
    #[arg(long, env = "MATRIX_TOKEN")]
    token: String,

    /// Our user id, enables left-room detection
    #[arg(long)]
    user_id: Option<String>,

    /// Connection id echoed on every request
    #[arg(long, default_value = "mx-sync-cli")]
    conn_id: String,

    /// Windowing mode for the single configured list
    #[arg(long, value_enum, default_value = "growing")]
    mode: Mode,

    /// Rooms fetched per tick
    #[arg(long, default_value_t = 20)]
    batch_size: u64,

    /// Timeline events requested per room
    #[arg(long, default_value_t = 10)]
    timeline_limit: u32,

    /// Stop after this many successful ticks (runs forever when absent)
    #[arg(long)]
    ticks: Option<u64>,

    /// Presence hint to send with each request
    #[arg(long, value_enum)]
    presence: Option<PresenceArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Growing,
    Paging,
    Selective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PresenceArg {
    Online,
    Offline,
    Unavailable,
}

impl From<PresenceArg> for Presence {
    fn from(arg: PresenceArg) -> Self {
        match arg {
            PresenceArg::Online => Presence::Online,
            PresenceArg::Offline => Presence::Offline,
            PresenceArg::Unavailable => Presence::Unavailable,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let list = match cli.mode {
        Mode::Growing => RoomList::growing("all_rooms", cli.batch_size),
        Mode::Paging => RoomList::paging("all_rooms", cli.batch_size),
        Mode::Selective => RoomList::selective("all_rooms", Vec::new()),
    }
    .with_timeline_limit(cli.timeline_limit)
    .with_required_state(vec![
        ("m.room.name".to_string(), String::new()),
        ("m.room.member".to_string(), "$ME".to_string()),
    ]);

    let mut sync = SlidingSync::new(SlidingSyncConfig::new(&cli.conn_id), HttpTransport::new());
    sync.add_list(list);
    sync.enable_all_extensions();

    let overrides = RequestOverrides {
        set_presence: cli.presence.map(Presence::from),
        ..RequestOverrides::default()
    };

    let mut completed = 0u64;
    loop {
        match sync
            .sync_once(
                &cli.homeserver,
                &cli.token,
                cli.user_id.as_deref(),
                Some(&overrides),
            )
            .await
        {
            Ok(update) => {
                completed += 1;
                info!(
                    "tick {completed}: pos={} rooms={} (joined={} invited={} left={}){}",
                    update.pos,
                    update.rooms.len(),
                    update.rooms.joined.len(),
                    update.rooms.invited.len(),
                    update.rooms.left.len(),
                    if sync.is_fully_synced() {
                        " [fully synced]"
                    } else {
                        ""
                    },
                );
                if cli.ticks.is_some_and(|limit| completed >= limit) {
                    break;
                }
            }
            // The engine already cleared its cursor; loop immediately.
            Err(ClientError::CursorExpired) => {
                warn!("sync position expired, restarting from scratch");
            }
            Err(error @ ClientError::TransportFailure { .. }) => {
                warn!("transport failure, retrying in {RETRY_PAUSE:?}: {error}");
                tokio::time::sleep(RETRY_PAUSE).await;
            }
            Err(error) => {
                return Err(error).context("sync loop aborted");
            }
        }
    }

    Ok(())
}
