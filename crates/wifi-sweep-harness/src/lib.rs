pub mod aggregate;
pub mod cancel;
pub mod extract;
pub mod launcher;
pub mod report;
pub mod results;
pub mod runner;

pub use cancel::CancelToken;
pub use launcher::{Launcher, Ns3Launcher};
pub use report::{CombinationOutcome, SkipReason, SkippedCombination, SweepReport};
pub use results::{Confirm, ResultsWorkspace, StalePolicy, clear_stale_output};
pub use runner::{SweepRunner, dry_run};
