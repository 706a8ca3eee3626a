// Domain layer: result-set model and the ports the dashboard talks through.

pub mod model;
pub mod ports;
