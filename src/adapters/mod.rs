// Adapters layer: concrete clients for the NAT-PMP gateway and the Transmission RPC API.

pub mod natpmp;
pub mod transmission;

pub use natpmp::NatPmpClient;
pub use transmission::TransmissionClient;
