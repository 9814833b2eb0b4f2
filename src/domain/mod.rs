pub mod agent;
pub mod authority;
pub mod gate;
pub mod hive;
pub mod limits;
pub mod session;

pub use agent::Agent;
pub use authority::AuthorityState;
pub use gate::{
    GateSnapshot, GateState, LatticeMode, LatticeReading, LatticeSnapshot, OrderProposal,
    OrderSide, PlanetaryCondition, PlanetaryReading, PlanetarySnapshot, Recommendation,
    StargateReading, StargateSnapshot,
};
pub use hive::{Hive, HiveStatus};
pub use session::{Session, SessionStatus};
