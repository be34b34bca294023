mod sink;
mod source;
mod types;
mod utils;

pub use sink::{DirSink, ResultSink};
pub use source::{DirSource, SnapshotSource};
pub use types::{ReviewConfig, ReviewSummary, SnapshotReport, SnapshotStatus};
pub use utils::review_snapshots;
pub use utils::snapshot_identifier;
pub use utils::story_id;
