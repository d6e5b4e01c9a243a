#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod batch;
mod metric_entry;

pub use batch::*;
pub use metric_entry::*;
