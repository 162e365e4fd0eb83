//! Check command - Load and resolve a permission config file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use netperm::{ConnectionDirection, PermissionConfig, ResolvedPermissions};

use super::{describe_flags, emit};
use crate::OutputFormat;

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Path to the TOML permission config
    #[arg(required = true)]
    pub config: PathBuf,

    /// Skip invalid entries instead of failing, regardless of `strict`
    #[arg(long)]
    pub lenient: bool,
}

/// Summary of a resolved config.
#[derive(Debug, Serialize)]
struct CheckResult {
    path: String,
    strict: bool,
    configured: usize,
    resolved: usize,
    binds: Vec<BindDisplay>,
    subnets: Vec<SubnetDisplay>,
}

#[derive(Debug, Serialize)]
struct BindDisplay {
    service: String,
    permissions: String,
}

#[derive(Debug, Serialize)]
struct SubnetDisplay {
    subnet: String,
    direction: ConnectionDirection,
    permissions: String,
}

impl CheckResult {
    fn new(path: &Path, config: &PermissionConfig, resolved: &ResolvedPermissions) -> Self {
        Self {
            path: path.display().to_string(),
            strict: config.strict,
            configured: config.whitebind.len() + config.whitelist.len(),
            resolved: resolved.len(),
            binds: resolved
                .binds
                .iter()
                .map(|bind| BindDisplay {
                    service: bind.service.to_string(),
                    permissions: describe_flags(bind.flags),
                })
                .collect(),
            subnets: resolved
                .subnets
                .iter()
                .map(|entry| SubnetDisplay {
                    subnet: entry.permissions.subnet.to_string(),
                    direction: entry.direction,
                    permissions: describe_flags(entry.permissions.flags),
                })
                .collect(),
        }
    }
}

/// Execute the check command.
pub fn execute(args: CheckArgs, format: OutputFormat, quiet: bool) -> Result<()> {
    let mut config = PermissionConfig::load(&args.config).context("Failed to load config")?;
    if args.lenient {
        config.strict = false;
    }

    tracing::info!(
        config = %args.config.display(),
        strict = config.strict,
        "Checking permission config"
    );

    let resolved = config.resolve().context("Invalid permission config")?;
    let result = CheckResult::new(&args.config, &config, &resolved);

    emit(format, &result, |result| {
        println!("Config: {}", result.path);
        println!("  Resolved: {} of {}", result.resolved, result.configured);

        if !result.binds.is_empty() {
            println!("\nWhitebind:");
            for bind in &result.binds {
                println!("  {} [{}]", bind.service, bind.permissions);
            }
        }

        if !result.subnets.is_empty() {
            println!("\nWhitelist:");
            for subnet in &result.subnets {
                println!(
                    "  {} ({}) [{}]",
                    subnet.subnet, subnet.direction, subnet.permissions
                );
            }
        }

        if result.resolved < result.configured && !quiet {
            println!(
                "\nSkipped {} invalid entries",
                result.configured - result.resolved
            );
        }
    })
}
