use crate::config::{AppConfig, ControlEndpoint};
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_duration_range, validate_ip, validate_required_field, Validate,
};
use clap::Parser;
use std::time::Duration;

const MIN_PERIOD: Duration = Duration::from_secs(3);
const MAX_PERIOD: Duration = Duration::from_secs(u32::MAX as u64);

#[derive(Debug, Clone, Parser)]
#[command(name = "natpmp-port-sync")]
#[command(about = "Keeps Transmission's peer port in sync with a NAT-PMP port mapping")]
pub struct CliConfig {
    #[arg(long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(
        long = "transmission.url",
        help = "Transmission RPC server URL (http://, https:// or unix://<socket path>)"
    )]
    pub transmission_url: Option<String>,

    #[arg(long = "gateway.ip", help = "IP address of NAT-PMP gateway")]
    pub gateway_ip: Option<String>,

    #[arg(
        long,
        default_value = "60s",
        value_parser = parse_duration::parse,
        help = "Port mapping lease duration"
    )]
    pub period: Duration,

    #[arg(
        long = "gateway.timeout",
        default_value = "4s",
        value_parser = parse_duration::parse,
        help = "Deadline for a single NAT-PMP request"
    )]
    pub gateway_timeout: Duration,

    #[arg(long = "log.json", help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    pub fn app_config(&self) -> Result<AppConfig> {
        let url = validate_required_field("transmission.url", &self.transmission_url)?;
        let transmission = ControlEndpoint::parse("transmission.url", url)?;

        let gateway = validate_required_field("gateway.ip", &self.gateway_ip)?;
        let gateway = validate_ip("gateway.ip", gateway)?;

        validate_duration_range("period", self.period, MIN_PERIOD, MAX_PERIOD)?;
        validate_duration_range(
            "gateway.timeout",
            self.gateway_timeout,
            Duration::from_millis(250),
            Duration::from_secs(120),
        )?;

        Ok(AppConfig {
            transmission,
            gateway,
            period: self.period,
            gateway_timeout: self.gateway_timeout,
            verbose: self.verbose,
            log_json: self.log_json,
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        self.app_config().map(|_| ())
    }
}
