use anyhow::Context;
use clap::Parser;
use master_chooser::core::{AddressStore, ConfigProvider};
use master_chooser::utils::error::ErrorSeverity;
use master_chooser::utils::{logger, validation::Validate};
use master_chooser::{
    ChooserCommand, ChooserConfig, ChooserError, ChooserOutcome, CliConfig, ConsoleNotifier,
    EndpointVerifier, FilePrefsStore, MasterChooser, ProbeWorker, ScanResult, VerificationResult,
    XmlRpcMasterClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    let log_format = if cli.json_logs {
        logger::LogFormat::Json
    } else {
        logger::LogFormat::Compact
    };
    logger::init_logger(log_format, cli.verbose);

    tracing::info!("Starting master-chooser");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    tracing::debug!("Resolved configuration:\n{}", describe(&config)?);

    match run(&cli.command, &config).await {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

async fn run(command: &ChooserCommand, config: &ChooserConfig) -> master_chooser::Result<i32> {
    let store = FilePrefsStore::new(config.prefs_path());

    match command {
        ChooserCommand::Verify { address } => {
            let worker = build_worker(config)?;
            let result = worker.dispatch(address.clone())?.wait().await;
            println!("{}", result.notice());
            Ok(exit_code_for(result))
        }
        ChooserCommand::Connect {
            address,
            scan_result,
            scan_format,
        } => {
            let worker = build_worker(config)?;
            let mut chooser = MasterChooser::open(
                store,
                worker,
                ConsoleNotifier,
                config.default_master_uri(),
            )
            .await?;

            if let Some(address) = address {
                chooser.set_address_text(address.clone());
            }
            if let Some(contents) = scan_result {
                chooser.apply_scan(&ScanResult::new(scan_format.clone(), contents.clone()))?;
            }

            tracing::info!("🔍 Verifying master address: {}", chooser.address_text());
            match chooser.connect().await? {
                Some(outcome) => {
                    print_outcome(&outcome)?;
                    Ok(0)
                }
                None => Ok(exit_code_for(
                    chooser
                        .last_result()
                        .unwrap_or(VerificationResult::InvalidSyntax),
                )),
            }
        }
        ChooserCommand::NewMaster { private } => {
            print_outcome(&ChooserOutcome::NewMaster { private: *private })?;
            Ok(0)
        }
        ChooserCommand::Show => {
            let address = store
                .load_last_address()
                .await?
                .unwrap_or_else(|| config.default_master_uri().to_string());
            println!("{}", address);
            Ok(0)
        }
    }
}

fn build_worker(config: &ChooserConfig) -> master_chooser::Result<ProbeWorker<XmlRpcMasterClient>> {
    let transport = XmlRpcMasterClient::new(config.probe_timeout())?;
    Ok(ProbeWorker::new(EndpointVerifier::from_config(transport, config)))
}

fn print_outcome(outcome: &ChooserOutcome) -> master_chooser::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

fn exit_code_for(result: VerificationResult) -> i32 {
    match result {
        VerificationResult::Valid => 0,
        VerificationResult::InvalidSyntax => 1,
        VerificationResult::Unreachable => 2,
    }
}

fn exit_with(e: &ChooserError) -> ! {
    tracing::error!(
        "❌ master-chooser failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn describe(config: &ChooserConfig) -> anyhow::Result<String> {
    toml::to_string(config).context("failed to render configuration")
}
