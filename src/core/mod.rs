//! Core engines for PulseMesh

pub mod bus;
pub mod decay;
pub mod governance;
pub mod sweeper;

pub use bus::{BusEvent, EmitOutcome, PulseBus};
pub use decay::{decayed_coherence, DecayTracker, TrackerConfig, TrackerConfigPatch};
pub use governance::GovernanceGate;
pub use sweeper::DecayService;
