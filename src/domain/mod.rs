// Domain layer: record types and ports. The core and adapters depend on this, never the reverse.

pub mod model;
pub mod ports;
