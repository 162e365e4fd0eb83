//! Bind command - Parse whitebind entries.

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use netperm::{PermissionFlags, WhitebindPermissions};

use super::{describe_flags, emit};
use crate::OutputFormat;

/// Arguments for the bind command.
#[derive(Args)]
pub struct BindArgs {
    /// Entries of the form [permissions@]addr:port
    #[arg(required = true)]
    pub entries: Vec<String>,
}

/// Parse result for one entry.
#[derive(Debug, Serialize)]
struct BindResult {
    entry: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    permissions: Vec<&'static str>,
    implicit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip)]
    flags: PermissionFlags,
}

impl BindResult {
    fn parse(entry: String) -> Self {
        match WhitebindPermissions::try_parse(&entry) {
            Ok(bind) => Self {
                entry,
                valid: true,
                service: Some(bind.service.to_string()),
                permissions: bind.flags.to_strings(),
                implicit: bind.flags.is_implicit(),
                error: None,
                flags: bind.flags,
            },
            Err(e) => Self {
                entry,
                valid: false,
                service: None,
                permissions: Vec::new(),
                implicit: false,
                error: Some(e.to_string()),
                flags: PermissionFlags::NONE,
            },
        }
    }
}

/// Execute the bind command.
pub fn execute(args: BindArgs, format: OutputFormat) -> Result<()> {
    let results: Vec<BindResult> = args.entries.into_iter().map(BindResult::parse).collect();

    emit(format, &results, |results| {
        for result in results {
            match (&result.service, &result.error) {
                (Some(service), _) => println!(
                    "{} -> {} [{}]",
                    result.entry,
                    service,
                    describe_flags(result.flags)
                ),
                (None, error) => println!(
                    "{} -> INVALID: {}",
                    result.entry,
                    error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    })?;

    let failed = results.iter().filter(|r| !r.valid).count();
    if failed > 0 {
        bail!("{} of {} whitebind entries are invalid", failed, results.len());
    }
    Ok(())
}
