pub mod mapping;
pub mod reconciler;
pub mod scheduler;

pub use crate::domain::model::{PortLease, PortMapping, Protocol, ReconcileOutcome};
pub use crate::domain::ports::{MappingGateway, PeerPortControl, Reconcile};
pub use crate::utils::error::Result;
