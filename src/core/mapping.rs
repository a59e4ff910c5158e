use crate::core::{MappingGateway, PortLease, Protocol};
use crate::utils::error::{Result, SyncError};

/// Asks the gateway for a mapping of its own choosing. Failures are not retried here;
/// the next scheduler tick is the retry.
pub struct MappingRequester<G: MappingGateway> {
    gateway: G,
}

impl<G: MappingGateway> MappingRequester<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub async fn request_mapping(&self, protocol: Protocol, lease_secs: u32) -> Result<PortLease> {
        let mapping = self
            .gateway
            .add_port_mapping(protocol, 0, 0, lease_secs)
            .await
            .map_err(|source| SyncError::GatewayError { protocol, source })?;

        tracing::debug!(
            "Got {} port {} -> {}",
            protocol,
            mapping.mapped_external_port,
            mapping.internal_port
        );

        if mapping.lifetime_secs < lease_secs {
            tracing::warn!(
                "Gateway granted {} mapping for {}s, shorter than the requested {}s",
                protocol,
                mapping.lifetime_secs,
                lease_secs
            );
        }

        Ok(PortLease::from_mapping(mapping))
    }
}
