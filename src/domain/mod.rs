// Domain layer: records, document model and ports. Adapters live under src/adapters.

pub mod document;
pub mod model;
pub mod ports;
