// =============================================================================
// Signals Module
// =============================================================================
//
// Mutable bookkeeping that sits on top of the stateless indicator engines:
// which indicators are switched on and the latest cross each one reported.

pub mod registry;

pub use registry::{RegistrySnapshot, SignalRegistry, SignalSlot};
