pub mod campaign;
pub mod config;
pub mod core_types;
pub mod error;
pub mod formula;
pub mod optimizer;
pub mod pool;
pub mod scorer;
pub mod seed;
