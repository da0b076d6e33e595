//! Recurring transactions: templates that the processor turns into realized
//! entries on their due dates, rolling each template forward one occurrence
//! per run.

mod core;
mod process_endpoint;

pub use core::{
    Frequency, ProcessReport, TemplateOutcome, due_templates, next_occurrence,
    process_due_templates,
};
pub use process_endpoint::{preview_recurring_endpoint, process_recurring_endpoint};
