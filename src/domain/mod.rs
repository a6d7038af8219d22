// Domain layer: models and the object store port. No I/O here.

pub mod model;
pub mod ports;
