// Domain layer: models, typed order lines and ports. No I/O here.

pub mod model;
pub mod orders;
pub mod ports;
