pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod oracles;
pub mod queue;
pub mod store;

pub use config::AppConfig;
pub use engine::{
    AuthorityService, CosmicSummary, SessionController, StartOutcome, StatusOutcome, StepOutcome,
};
pub use error::{HivemindError, Result};
pub use oracles::{CosmicDashboard, OracleHub};
pub use queue::{HttpOrderQueue, NullOrderQueue, OrderQueue};
pub use store::PostgresStore;
