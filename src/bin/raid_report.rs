/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use clap::Parser;
use log::{info, warn};
use raid_report::{render, ContainerConfigBuilder, OutputFormat, ServiceContainer};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

/// Inventory MegaRAID controllers and SMART disk health
#[derive(Debug, Parser)]
#[command(name = "raid_report", version, about)]
struct Opt {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format (table, metrics, json or toml)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Write the report atomically to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Path of the MegaCLI binary
    #[arg(long)]
    megacli: Option<String>,

    /// Path of the smartctl binary
    #[arg(long)]
    smartctl: Option<String>,

    /// Timeout for each external command, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Run the external tools through sudo
    #[arg(long)]
    sudo: bool,

    /// Skip SMART health collection
    #[arg(long)]
    no_smart: bool,

    /// Skip MegaRAID inventory collection
    #[arg(long)]
    no_megaraid: bool,

    /// Answer tool invocations from a TOML capture file
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Only report missing tools and privileges, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let opt = Opt::parse();

    // Defaults, then the TOML file, then flags
    let provider = ServiceContainer::with_defaults()
        .create_configuration_provider(opt.config.as_deref())
        .await?;
    let mut config = provider.get_report_config().await?;

    // The level is known only once the file is read
    let verbose = opt.verbose || provider.is_verbose_enabled().await?;
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    let format = match opt.format {
        Some(format) => format,
        None => provider.get_output_format().await?,
    };

    if let Some(path) = opt.megacli {
        config.megacli_path = path;
    }
    if let Some(path) = opt.smartctl {
        config.smartctl_path = path;
    }
    if let Some(timeout) = opt.timeout {
        config.command_timeout = timeout;
    }
    config.use_sudo |= opt.sudo;
    config.verbose = verbose;
    if opt.no_smart {
        config.collect_smart = false;
    }
    if opt.no_megaraid {
        config.collect_megaraid = false;
    }

    let container = ServiceContainer::new(
        ContainerConfigBuilder::new()
            .command_timeout(Duration::from_secs(config.command_timeout))
            .retry_count(config.retry_count)
            .output(opt.output)
            .replay(opt.replay)
            .build(),
    );

    let service = container.create_reporting_service().await?;

    let missing = service.validate_dependencies(&config).await?;
    let privileged = service.check_privileges().await?;
    if opt.check {
        for tool in &missing {
            println!("missing: {}", tool);
        }
        println!("elevated privileges: {}", if privileged { "yes" } else { "no" });
        return Ok(());
    }

    for tool in &missing {
        warn!("{} not found, its collection will be recorded as failed", tool);
    }
    if !privileged && !config.use_sudo {
        warn!("Not running as root; MegaCLI and smartctl may refuse to answer (try --sudo)");
    }

    let report = service.generate_report(config).await?;
    let error_count = report.errors().count();
    if error_count > 0 {
        warn!("{} collection step(s) failed", error_count);
    }

    let rendered = render(&report, format)?;
    service.publish_report(&rendered).await?;
    info!("Report published as {}", format);

    Ok(())
}
