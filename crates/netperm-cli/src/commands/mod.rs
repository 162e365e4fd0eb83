//! Subcommand implementations.

pub mod bind;
pub mod check;
pub mod subnet;

use anyhow::Result;
use serde::Serialize;

use crate::OutputFormat;

/// Print `value` as JSON, or run `human` for human-readable output.
pub fn emit<T, F>(format: OutputFormat, value: &T, human: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match format {
        OutputFormat::Human => human(value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(value)?),
    }
    Ok(())
}

/// Render a flag set for display, noting the implicit default.
pub fn describe_flags(flags: netperm::PermissionFlags) -> String {
    let names = flags.to_strings();
    let names = if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(",")
    };
    if flags.is_implicit() {
        format!("{} (implicit)", names)
    } else {
        names
    }
}

#[cfg(test)]
mod tests {
    use netperm::PermissionFlags;

    use super::*;

    #[test]
    fn test_describe_flags() {
        assert_eq!(
            describe_flags(PermissionFlags::RELAY | PermissionFlags::MEMPOOL),
            "relay,mempool"
        );
        assert_eq!(describe_flags(PermissionFlags::NONE), "(none)");
        assert_eq!(
            describe_flags(PermissionFlags::ALL | PermissionFlags::ISIMPLICIT),
            "bloomfilter,forcerelay,noban,mempool,addr,blockfilters (implicit)"
        );
    }
}
