pub mod builtins;
#[allow(clippy::module_inception)]
mod executor;
mod wait;

pub use executor::Executor;
