//! Draw schedule inspection

use std::sync::Arc;

use lotdraw_engine::{DrawSchedule, QuotaSchedule, SlotRun};
use serde::Serialize;
use tabled::Tabled;

use crate::error::CliResult;
use crate::output::{print_info, print_output, OutputFormat};

/// One row per run of consecutive draws of a bucket
#[derive(Debug, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    #[tabled(rename = "Group")]
    pub group: u32,
    #[tabled(rename = "Class")]
    pub draw_class: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Slots")]
    pub slots: u32,
    #[tabled(rename = "First #")]
    pub first: u64,
    #[tabled(rename = "Last #")]
    pub last: u64,
}

impl From<&SlotRun> for ScheduleRow {
    fn from(run: &SlotRun) -> Self {
        Self {
            group: run.bucket.group.number(),
            draw_class: run.bucket.draw_class.to_string(),
            kind: run.bucket.kind.to_string(),
            slots: run.len,
            first: run.first_index + 1,
            last: run.first_index + u64::from(run.len),
        }
    }
}

/// Print the flattened draw schedule
pub fn execute(quota: Arc<QuotaSchedule>, format: OutputFormat) -> CliResult<()> {
    let schedule = DrawSchedule::new(quota);
    let rows: Vec<ScheduleRow> = schedule.runs().iter().map(ScheduleRow::from).collect();
    print_output(rows, format)?;
    if format == OutputFormat::Table {
        print_info(&format!("{} draws in total", schedule.total_slots()));
    }
    Ok(())
}
