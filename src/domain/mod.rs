// Domain layer: core models and ports (interfaces). No runtime wiring here.

pub mod model;
pub mod ports;
