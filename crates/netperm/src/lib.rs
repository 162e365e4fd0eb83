//! Netperm Peer Permissions
//!
//! This crate provides the permission model a peer-to-peer node uses to
//! grant extra capabilities to trusted peers, and the parsers that turn
//! operator configuration into permission records.
//!
//! # Permission Model
//!
//! - Permissions are a bitmask ([`PermissionFlags`])
//! - Some permissions imply others (`forcerelay` implies `relay`,
//!   `noban` implies `download`)
//! - An entry without a permission list receives every default permission
//!   and is marked implicit, so callers can tell it apart from an entry
//!   that asked for `all`
//!
//! # Entry Syntax
//!
//! ```text
//! whitebind: [permissions@]addr:port
//! whitelist: [permissions@]subnet
//! ```
//!
//! `permissions` is a comma-separated list of `all`, `bloomfilter`,
//! `forcerelay`, `relay`, `noban`, `mempool`, `addr` and `download`.
//! Whitelist entries also accept `in` and `out` to restrict the entry to
//! one connection direction.
//!
//! # Usage
//!
//! ```
//! use netperm::prelude::*;
//!
//! let bind = WhitebindPermissions::try_parse("noban,mempool@127.0.0.1:8334")?;
//! assert!(bind.flags.has_flag(PermissionFlags::DOWNLOAD));
//!
//! let (entry, direction) = WhitelistPermissions::try_parse("relay,in@10.0.0.0/8")?;
//! assert_eq!(entry.flags.to_strings(), vec!["relay"]);
//! assert_eq!(direction, ConnectionDirection::Inbound);
//! # Ok::<(), netperm::PermissionError>(())
//! ```
//!
//! Address text is resolved through [`ServiceLookup`] and [`SubnetLookup`].
//! [`NumericLookup`] handles numeric IPv4 and IPv6 literals; supply your
//! own lookup to resolve host names.

pub mod config;
pub mod error;
pub mod flags;
pub mod grammar;
pub mod net;
pub mod whitebind;
pub mod whitelist;

// Re-export main types
pub use config::{PermissionConfig, ResolvedPermissions, WhitelistEntry};
pub use error::{ConfigError, ConfigResult, PermissionError, PermissionResult};
pub use flags::PermissionFlags;
pub use grammar::ConnectionDirection;
pub use net::{InvalidSubnet, NumericLookup, ServiceLookup, Subnet, SubnetLookup};
pub use whitebind::WhitebindPermissions;
pub use whitelist::WhitelistPermissions;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::PermissionConfig;
    pub use crate::error::{PermissionError, PermissionResult};
    pub use crate::flags::PermissionFlags;
    pub use crate::grammar::ConnectionDirection;
    pub use crate::whitebind::WhitebindPermissions;
    pub use crate::whitelist::WhitelistPermissions;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _ = PermissionFlags::ALL;
        let _ = PermissionConfig::new();
        let _ = ConnectionDirection::Both;
    }

    #[test]
    fn test_explicit_never_implicit_absent_always_implicit() {
        let explicit = [
            "all@1.2.3.4:1",
            "@1.2.3.4:1",
            "relay,noban@1.2.3.4:1",
            "download@[::1]:1",
        ];
        for token in explicit {
            let bind = WhitebindPermissions::try_parse(token).unwrap();
            assert!(!bind.flags.is_implicit(), "{token}");
        }

        for token in ["1.2.3.4:1", "[::1]:8333"] {
            let bind = WhitebindPermissions::try_parse(token).unwrap();
            assert_eq!(
                bind.flags,
                PermissionFlags::ALL | PermissionFlags::ISIMPLICIT
            );
        }
        for token in ["10.0.0.0/8", "::/0", "1.2.3.4"] {
            let entry = WhitelistPermissions::parse_ignoring_direction(token).unwrap();
            assert_eq!(
                entry.flags,
                PermissionFlags::ALL | PermissionFlags::ISIMPLICIT
            );
        }
    }

    #[test]
    fn test_parsers_share_flag_semantics() {
        let lists = ["bloomfilter", "forcerelay,mempool", "noban,addr", "all"];
        for list in lists {
            let bind = WhitebindPermissions::try_parse(&format!("{list}@1.2.3.4:8333")).unwrap();
            let entry =
                WhitelistPermissions::parse_ignoring_direction(&format!("{list}@1.2.3.4")).unwrap();
            assert_eq!(bind.flags, entry.flags, "{list}");
        }
    }

    #[test]
    fn test_rendered_names_parse_back() {
        let flags = PermissionFlags::BLOOMFILTER
            | PermissionFlags::FORCERELAY
            | PermissionFlags::DOWNLOAD
            | PermissionFlags::ADDR;
        let token = format!("{flags}@1.2.3.4:8333");
        let bind = WhitebindPermissions::try_parse(&token).unwrap();
        assert_eq!(bind.flags, flags);
    }
}
