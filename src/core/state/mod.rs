// State management: watermarks and progress snapshots

pub mod progress;
pub mod store;

pub use progress::{MilestoneTracker, ProgressSnapshot, ProgressStatus, MILESTONES};
pub use store::{ProgressKind, ProgressStore};
