pub mod common;
pub mod completions;
pub mod conflicts;
pub mod reset;
pub mod status;
pub mod sync;
