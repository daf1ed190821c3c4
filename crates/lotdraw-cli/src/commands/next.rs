//! Pure next-draw lookup

use std::sync::Arc;

use colored::*;
use lotdraw_engine::{NextDrawCalculator, QuotaSchedule};
use lotdraw_types::ResultKind;

use crate::error::CliResult;
use crate::output::{print_single, print_warning, OutputFormat};

/// Show the draw that follows `committed` results
pub fn execute(quota: Arc<QuotaSchedule>, committed: u64, format: OutputFormat) -> CliResult<()> {
    let calculator = NextDrawCalculator::from_quota(quota);
    let next = calculator.compute(committed);

    if format == OutputFormat::Json {
        return print_single(&next);
    }

    match next {
        Some(slot) => {
            println!("{} {}", "Next draw:".bold(), format!("#{}", slot.global_draw_number).cyan());
            println!("  Group:       {}", slot.group);
            println!("  Class:       {}", slot.draw_class);
            println!("  Kind:        {}", slot.kind);
            match slot.kind {
                ResultKind::Incumbent => println!("  Lot index:   {}", slot.position),
                ResultKind::Alternate => println!("  Order no.:   {}", slot.position),
            }
        }
        None => print_warning(&format!(
            "Schedule exhausted after {} draws",
            calculator.schedule().total_slots()
        )),
    }
    Ok(())
}
