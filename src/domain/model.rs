use crate::utils::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// NAT-PMP opcode for a MAP request of this protocol.
    pub fn natpmp_opcode(self) -> u8 {
        match self {
            Protocol::Udp => 1,
            Protocol::Tcp => 2,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
        }
    }
}

/// What the gateway answered to a MAP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub protocol: Protocol,
    pub internal_port: u16,
    pub mapped_external_port: u16,
    pub lifetime_secs: u32,
}

/// A mapping obtained during one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortLease {
    pub protocol: Protocol,
    pub internal_port: u16,
    pub external_port: u16,
    pub lease_seconds: u32,
}

impl PortLease {
    /// `lease_seconds` is the lifetime the gateway granted, which may be shorter than requested.
    pub fn from_mapping(mapping: PortMapping) -> Self {
        Self {
            protocol: mapping.protocol,
            internal_port: mapping.internal_port,
            external_port: mapping.mapped_external_port,
            lease_seconds: mapping.lifetime_secs,
        }
    }

    /// Only a lease whose external port equals its internal port can be advertised.
    pub fn validate(&self) -> Result<()> {
        if self.internal_port != self.external_port {
            return Err(SyncError::PortMismatchError {
                protocol: self.protocol,
                internal: self.internal_port,
                external: self.external_port,
            });
        }
        Ok(())
    }
}

/// Successful end of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Unchanged { port: u16 },
    Updated { from: u16, to: u16 },
}
