pub mod context;
pub mod diagnostics;
pub mod gate;
pub mod limiter;
pub mod monitor;
pub mod normalizer;
pub mod sink;
