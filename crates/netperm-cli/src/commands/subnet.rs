//! Subnet command - Parse whitelist entries.

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use netperm::{ConnectionDirection, PermissionFlags, WhitelistPermissions};

use super::{describe_flags, emit};
use crate::OutputFormat;

/// Arguments for the subnet command.
#[derive(Args)]
pub struct SubnetArgs {
    /// Entries of the form [permissions@]subnet
    #[arg(required = true)]
    pub entries: Vec<String>,
}

/// Parse result for one entry.
#[derive(Debug, Serialize)]
struct SubnetResult {
    entry: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    subnet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    direction: Option<ConnectionDirection>,
    permissions: Vec<&'static str>,
    implicit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip)]
    flags: PermissionFlags,
}

impl SubnetResult {
    fn parse(entry: String) -> Self {
        match WhitelistPermissions::try_parse(&entry) {
            Ok((permissions, direction)) => Self {
                entry,
                valid: true,
                subnet: Some(permissions.subnet.to_string()),
                direction: Some(direction),
                permissions: permissions.flags.to_strings(),
                implicit: permissions.flags.is_implicit(),
                error: None,
                flags: permissions.flags,
            },
            Err(e) => Self {
                entry,
                valid: false,
                subnet: None,
                direction: None,
                permissions: Vec::new(),
                implicit: false,
                error: Some(e.to_string()),
                flags: PermissionFlags::NONE,
            },
        }
    }
}

/// Execute the subnet command.
pub fn execute(args: SubnetArgs, format: OutputFormat) -> Result<()> {
    let results: Vec<SubnetResult> = args.entries.into_iter().map(SubnetResult::parse).collect();

    emit(format, &results, |results| {
        for result in results {
            match (&result.subnet, result.direction, &result.error) {
                (Some(subnet), Some(direction), _) => println!(
                    "{} -> {} ({}) [{}]",
                    result.entry,
                    subnet,
                    direction,
                    describe_flags(result.flags)
                ),
                (_, _, error) => println!(
                    "{} -> INVALID: {}",
                    result.entry,
                    error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    })?;

    let failed = results.iter().filter(|r| !r.valid).count();
    if failed > 0 {
        bail!("{} of {} whitelist entries are invalid", failed, results.len());
    }
    Ok(())
}
