//! Procsim runtime
//!
//! Executes declarative cyclic simulation programs: stateful algorithm
//! instances and derived variables evaluated in declared order on a fixed
//! cycle, with per-name history buffers for lag access and per-cycle
//! snapshot emission.

pub mod cancel;
pub mod clock;
pub mod engine;
pub mod error;
pub mod eval;
pub mod loader;
pub mod node;
pub mod program;
pub mod programs;
pub mod registry;
pub mod storage;
pub mod types;

pub use cancel::{cancel_channel, CancelHandle, CancelToken};
pub use clock::{Clock, ClockConfig};
pub use engine::Engine;
pub use error::{ConfigError, Error, ProgramError, Result};
pub use loader::{load_file, load_str, ProgramConfig, ProgramItem};
pub use registry::{DocEntry, ProgramRegistry};
pub use storage::VariableStore;
pub use types::{ClockMode, Snapshot, VarKey};
