use crate::domain::model::{PortMapping, Protocol, ReconcileOutcome};
use crate::utils::error::{ControlApiFailure, GatewayFailure, Result};
use async_trait::async_trait;

/// NAT port-mapping gateway. A port of 0 lets the gateway choose.
#[async_trait]
pub trait MappingGateway: Send + Sync {
    async fn add_port_mapping(
        &self,
        protocol: Protocol,
        requested_external_port: u16,
        requested_internal_port: u16,
        lease_secs: u32,
    ) -> std::result::Result<PortMapping, GatewayFailure>;
}

/// Remote control of the torrent client's peer port.
#[async_trait]
pub trait PeerPortControl: Send + Sync {
    async fn peer_port(&self) -> std::result::Result<u16, ControlApiFailure>;
    async fn set_peer_port(&self, port: u16) -> std::result::Result<(), ControlApiFailure>;
}

#[async_trait]
pub trait Reconcile: Send + Sync {
    async fn reconcile(&self) -> Result<ReconcileOutcome>;
}
