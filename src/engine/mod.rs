pub mod authority;
pub mod controller;
pub mod proposer;
pub mod replication;
pub mod ticker;

pub use authority::AuthorityService;
pub use controller::{CosmicSummary, SessionController, StartOutcome, StatusOutcome, StepOutcome};
pub use replication::SpawnPlan;
