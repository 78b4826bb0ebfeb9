//! Canonical algorithm suite
//!
//! One module per program type. Each module owns its params struct
//! (serde defaults are the type's default parameters), its builder and
//! its documentation entry, and registers itself into the catalog.

pub mod functions;
pub mod list_wave;
pub mod pid;
pub mod random;
pub mod sine_wave;
pub mod square_wave;
pub mod tank;
pub mod triangle_wave;
pub mod valve;

use crate::registry::ProgramRegistry;

/// Register the canonical suite and the builtin math functions.
pub fn register_builtins(registry: &mut ProgramRegistry) {
    sine_wave::register(registry);
    square_wave::register(registry);
    triangle_wave::register(registry);
    list_wave::register(registry);
    random::register(registry);
    pid::register(registry);
    tank::register(registry);
    valve::register(registry);
    functions::register(registry);
}
