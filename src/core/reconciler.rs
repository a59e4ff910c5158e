use crate::config::AppConfig;
use crate::core::mapping::MappingRequester;
use crate::core::{MappingGateway, PeerPortControl, Protocol, Reconcile, ReconcileOutcome};
use crate::utils::error::{ControlApiFailure, ControlOperation, Result, SyncError};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Deadline for each call to the control API.
pub const CONTROL_API_TIMEOUT: Duration = Duration::from_secs(2);

/// One full pass: lease TCP and UDP ports, check them, then make Transmission advertise the TCP port.
pub struct SessionReconciler<G: MappingGateway, C: PeerPortControl> {
    requester: MappingRequester<G>,
    control: C,
    lease_secs: u32,
    control_timeout: Duration,
}

impl<G: MappingGateway, C: PeerPortControl> SessionReconciler<G, C> {
    pub fn new(gateway: G, control: C, config: &AppConfig) -> Self {
        Self {
            requester: MappingRequester::new(gateway),
            control,
            lease_secs: config.lease_secs(),
            control_timeout: CONTROL_API_TIMEOUT,
        }
    }

    pub fn with_control_timeout(mut self, timeout: Duration) -> Self {
        self.control_timeout = timeout;
        self
    }

    async fn bounded<T, F>(&self, operation: ControlOperation, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, ControlApiFailure>>,
    {
        let result = match tokio::time::timeout(self.control_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ControlApiFailure::Timeout(self.control_timeout)),
        };
        result.map_err(|source| SyncError::ControlApiError { operation, source })
    }
}

#[async_trait]
impl<G: MappingGateway, C: PeerPortControl> Reconcile for SessionReconciler<G, C> {
    async fn reconcile(&self) -> Result<ReconcileOutcome> {
        let tcp = self
            .requester
            .request_mapping(Protocol::Tcp, self.lease_secs)
            .await?;
        let udp = self
            .requester
            .request_mapping(Protocol::Udp, self.lease_secs)
            .await?;

        tcp.validate()?;
        udp.validate()?;

        if tcp.internal_port != udp.internal_port {
            tracing::warn!(
                "TCP ({}) and UDP ({}) ports do not match, using TCP",
                tcp.internal_port,
                udp.internal_port
            );
        }
        let port = tcp.internal_port;

        let current = self
            .bounded(ControlOperation::Read, self.control.peer_port())
            .await?;
        tracing::debug!("Transmission peer port: {}", current);

        if current == port {
            return Ok(ReconcileOutcome::Unchanged { port });
        }

        tracing::info!(
            "Transmission peer port ({}) does not match TCP port ({}), reconfiguring",
            current,
            port
        );
        self.bounded(ControlOperation::Write, self.control.set_peer_port(port))
            .await?;

        Ok(ReconcileOutcome::Updated {
            from: current,
            to: port,
        })
    }
}
