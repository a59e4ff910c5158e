use anyhow::Context;
use clap::Parser;
use natpmp_port_sync::utils::{logger, validation::Validate};
use natpmp_port_sync::{CliConfig, NatPmpClient, Scheduler, SessionReconciler, TransmissionClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 驗證配置
    if let Err(e) = cli.validate() {
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }
    let config = cli.app_config()?;

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting natpmp-port-sync");
    tracing::debug!("Config: {:?}", config);

    let transmission = TransmissionClient::new(&config.transmission)
        .context("failed to create transmission client")?;
    tracing::info!(
        "Transmission RPC endpoint: {}",
        transmission.endpoint_description()
    );

    let nat = NatPmpClient::new(config.gateway).with_timeout(config.gateway_timeout);
    tracing::info!("NAT-PMP gateway: {}", nat.server_addr());

    let reconciler = SessionReconciler::new(nat, transmission, &config);
    Scheduler::new(reconciler, &config).run_forever().await
}
