//! NAT-PMP (RFC 6886) client used to lease port mappings from the gateway.
//!
//! Only the MAP operation is implemented. Requests go to UDP port 5351 on the
//! gateway and are retransmitted starting at 250ms, doubling each time, until
//! the configured deadline passes.

use crate::domain::model::{PortMapping, Protocol};
use crate::domain::ports::MappingGateway;
use crate::utils::error::GatewayFailure;
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, trace};

/// NAT-PMP server port (IANA assigned)
pub const NATPMP_SERVER_PORT: u16 = 5351;

const NATPMP_VERSION: u8 = 0;
const MAP_REQUEST_LEN: usize = 12;
const MAP_RESPONSE_LEN: usize = 16;
const RESPONSE_OPCODE_OFFSET: u8 = 128;

const INITIAL_RETRY_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

fn result_code_message(code: u16) -> &'static str {
    match code {
        1 => "Unsupported NAT-PMP version",
        2 => "Not authorized/refused",
        3 => "Network failure",
        4 => "Out of resources",
        5 => "Unsupported opcode",
        _ => "Unknown result code",
    }
}

#[derive(Debug, Clone)]
pub struct NatPmpClient {
    server: SocketAddr,
    timeout: Duration,
}

impl NatPmpClient {
    pub fn new(gateway: IpAddr) -> Self {
        Self::with_server_addr(SocketAddr::new(gateway, NATPMP_SERVER_PORT))
    }

    pub fn with_server_addr(server: SocketAddr) -> Self {
        Self {
            server,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server
    }

    async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, GatewayFailure> {
        let bind_addr: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        // connected sockets only receive datagrams from the gateway
        socket.connect(self.server).await?;

        let deadline = Instant::now() + self.timeout;
        let mut wait = INITIAL_RETRY_INTERVAL;
        let mut buf = [0u8; 64];

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(GatewayFailure::Timeout(self.timeout));
            }

            socket.send(request).await?;
            trace!("sent {} byte NAT-PMP request to {}", request.len(), self.server);

            match tokio::time::timeout(wait.min(deadline - now), socket.recv(&mut buf)).await {
                Ok(received) => {
                    let len = received?;
                    return Ok(buf[..len].to_vec());
                }
                Err(_) => {
                    debug!("no NAT-PMP response from {} within {:?}", self.server, wait);
                    wait *= 2;
                }
            }
        }
    }
}

#[async_trait]
impl MappingGateway for NatPmpClient {
    async fn add_port_mapping(
        &self,
        protocol: Protocol,
        requested_external_port: u16,
        requested_internal_port: u16,
        lease_secs: u32,
    ) -> Result<PortMapping, GatewayFailure> {
        let request = build_map_request(
            protocol,
            requested_internal_port,
            requested_external_port,
            lease_secs,
        );
        let response = self.exchange(&request).await?;
        parse_map_response(protocol, &response)
    }
}

/// Builds the 12 byte MAP request.
pub fn build_map_request(
    protocol: Protocol,
    internal_port: u16,
    suggested_external_port: u16,
    lifetime_secs: u32,
) -> [u8; MAP_REQUEST_LEN] {
    let mut request = [0u8; MAP_REQUEST_LEN];
    request[0] = NATPMP_VERSION;
    request[1] = protocol.natpmp_opcode();
    // bytes 2..4 reserved
    request[4..6].copy_from_slice(&internal_port.to_be_bytes());
    request[6..8].copy_from_slice(&suggested_external_port.to_be_bytes());
    request[8..12].copy_from_slice(&lifetime_secs.to_be_bytes());
    request
}

/// Parses a MAP response, rejecting anything that does not answer a `protocol` request.
pub fn parse_map_response(
    protocol: Protocol,
    response: &[u8],
) -> Result<PortMapping, GatewayFailure> {
    if response.len() < MAP_RESPONSE_LEN {
        return Err(GatewayFailure::InvalidResponse(format!(
            "response too short: {} bytes (expected {})",
            response.len(),
            MAP_RESPONSE_LEN
        )));
    }

    if response[0] != NATPMP_VERSION {
        return Err(GatewayFailure::InvalidResponse(format!(
            "invalid version: {} (expected {})",
            response[0], NATPMP_VERSION
        )));
    }

    let expected_opcode = RESPONSE_OPCODE_OFFSET + protocol.natpmp_opcode();
    if response[1] != expected_opcode {
        return Err(GatewayFailure::InvalidResponse(format!(
            "invalid opcode: {} (expected {})",
            response[1], expected_opcode
        )));
    }

    let result_code = u16::from_be_bytes([response[2], response[3]]);
    if result_code != 0 {
        return Err(GatewayFailure::Refused {
            code: result_code,
            message: result_code_message(result_code).to_string(),
        });
    }

    // bytes 4..8 carry seconds since the gateway's epoch
    let internal_port = u16::from_be_bytes([response[8], response[9]]);
    let mapped_external_port = u16::from_be_bytes([response[10], response[11]]);
    let lifetime_secs =
        u32::from_be_bytes([response[12], response[13], response[14], response[15]]);

    Ok(PortMapping {
        protocol,
        internal_port,
        mapped_external_port,
        lifetime_secs,
    })
}
