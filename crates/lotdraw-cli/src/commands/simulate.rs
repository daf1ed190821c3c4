//! End-to-end lottery simulation over the in-memory adapters
//!
//! A seeded RNG stands in for the physical draw. Every audience channel is
//! subscribed and each envelope is printed as one JSON line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use lotdraw_engine::{
    BroadcastDelays, BucketProgress, Channel, ChannelHub, DrawEngine, InMemoryDirectory,
    QuotaSchedule, Registry,
};
use lotdraw_types::{ResultCandidate, ResultKind};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::LotdrawConfig;
use crate::error::{CliError, CliResult};
use crate::fixtures;
use crate::output::{print_output, print_success, OutputFormat};

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// JSON array of participants (synthesised from the quota if absent)
    #[arg(long)]
    pub participants: Option<PathBuf>,

    /// JSON array of lots (synthesised from the quota if absent)
    #[arg(long)]
    pub lots: Option<PathBuf>,

    /// RNG seed for reproducible draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip the pauses between broadcast steps
    #[arg(long)]
    pub fast: bool,

    /// Stop after this many committed results
    #[arg(long)]
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRow {
    #[tabled(rename = "Group")]
    pub group: u32,
    #[tabled(rename = "Class")]
    pub draw_class: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Committed")]
    pub committed: u64,
    #[tabled(rename = "Limit")]
    pub limit: u32,
}

impl From<&BucketProgress> for ProgressRow {
    fn from(progress: &BucketProgress) -> Self {
        Self {
            group: progress.bucket.group.number(),
            draw_class: progress.bucket.draw_class.to_string(),
            kind: progress.bucket.kind.to_string(),
            committed: progress.committed,
            limit: progress.limit,
        }
    }
}

/// Print every envelope of one channel until the hub is dropped.
fn spawn_printer(hub: &ChannelHub, channel: Channel) -> JoinHandle<()> {
    let mut receiver = hub.subscribe(channel);
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(envelope) => match serde_json::to_string(&envelope) {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!(channel = %channel, error = %e, "Cannot serialise envelope"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(channel = %channel, skipped, "Printer lagged behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Run a whole lottery
pub async fn execute(
    args: SimulateArgs,
    config: &LotdrawConfig,
    quota: Arc<QuotaSchedule>,
    format: OutputFormat,
) -> CliResult<()> {
    let participants = match &args.participants {
        Some(path) => fixtures::load_participants(path)?,
        None => fixtures::synthesize_participants(&quota),
    };
    let lots = match &args.lots {
        Some(path) => fixtures::load_lots(path)?,
        None => fixtures::synthesize_lots(&quota),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        participants = participants.len(),
        lots = lots.len(),
        seed,
        "Starting simulation"
    );

    let directory = InMemoryDirectory::with_records(participants, lots).await;
    let registry = Registry::in_memory(Arc::new(directory));
    let hub = Arc::new(ChannelHub::new(config.broadcast.channel_capacity));
    let printers: Vec<JoinHandle<()>> = Channel::ALL
        .into_iter()
        .map(|channel| spawn_printer(&hub, channel))
        .collect();

    let delays = if args.fast {
        BroadcastDelays::immediate()
    } else {
        config.broadcast.delays
    };
    let engine = DrawEngine::builder(quota, registry)
        .config(config.engine)
        .broadcast_to(hub.clone(), delays)
        .build();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut sequences = Vec::new();
    let mut committed = 0u64;

    while let Some(next) = engine.next_draw().await? {
        if args.limit.is_some_and(|limit| committed >= limit) {
            break;
        }
        let slot = next.slot;

        let eligible = engine.eligible_participants(&slot).await?;
        let winner = eligible.choose(&mut rng).ok_or_else(|| {
            CliError::Stalled(format!(
                "no eligible participant left for draw #{}",
                slot.global_draw_number
            ))
        })?;

        let candidate = match slot.kind {
            ResultKind::Incumbent => {
                let available = engine.available_lots(slot.group, slot.draw_class).await?;
                let lot = next
                    .preview_lot
                    .filter(|preview| available.iter().any(|l| l.id == preview.id))
                    .or_else(|| available.choose(&mut rng).cloned())
                    .ok_or_else(|| {
                        CliError::Stalled(format!(
                            "no lot left for draw #{}",
                            slot.global_draw_number
                        ))
                    })?;
                ResultCandidate::incumbent(slot.group, slot.draw_class, winner.id, lot.id)
            }
            ResultKind::Alternate => {
                ResultCandidate::alternate(slot.group, slot.draw_class, winner.id)
            }
        };

        let result = engine.submit(candidate).await?;
        debug!(
            draw = slot.global_draw_number,
            result_id = %result.result.id,
            "Draw committed"
        );
        committed += 1;
        sequences.extend(result.sequence);
    }

    for sequence in sequences {
        let report = sequence.join().await?;
        if report.failed > 0 {
            warn!(
                result_id = %report.result_id,
                failed = report.failed,
                "Broadcast sequence had failed emissions"
            );
        }
    }

    let progress = engine.progress().await?;

    // Closing the hub ends the printers once they drain their channels.
    drop(engine);
    drop(hub);
    for printer in printers {
        printer
            .await
            .map_err(|e| CliError::Task(e.to_string()))?;
    }

    let rows: Vec<ProgressRow> = progress.iter().map(ProgressRow::from).collect();
    print_output(rows, format)?;
    if format == OutputFormat::Table {
        print_success(&format!("{} results committed (seed {})", committed, seed));
    }
    Ok(())
}
