mod atomic;
pub mod bars;
mod columns;
pub mod snapshot;
