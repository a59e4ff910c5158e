// Domain layer: core models and ports (interfaces) the reconciler talks through.

pub mod model;
pub mod ports;
