pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{NatPmpClient, TransmissionClient};
pub use config::{AppConfig, ControlEndpoint};
pub use core::{mapping::MappingRequester, reconciler::SessionReconciler, scheduler::Scheduler};
pub use utils::error::{Result, SyncError};
