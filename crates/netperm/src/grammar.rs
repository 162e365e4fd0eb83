//! Permission prefix grammar shared by the whitebind and whitelist parsers.
//!
//! ```text
//! token    := [ flaglist "@" ] location
//! flaglist := flagname ("," flagname)*
//! ```
//!
//! Without a flag list the entry gets [`PermissionFlags::ALL`] marked
//! with [`PermissionFlags::ISIMPLICIT`]. With one, only the listed
//! permissions are granted.

use serde::{Deserialize, Serialize};

use crate::error::{PermissionError, PermissionResult};
use crate::flags::PermissionFlags;

/// Which connections a whitelisted subnet applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionDirection {
    /// Only connections initiated by the peer.
    Inbound,
    /// Only connections this node opens.
    Outbound,
    /// Connections in either direction.
    #[default]
    Both,
}

impl ConnectionDirection {
    /// Returns `true` if inbound connections are covered.
    pub fn includes_inbound(self) -> bool {
        matches!(self, Self::Inbound | Self::Both)
    }

    /// Returns `true` if outbound connections are covered.
    pub fn includes_outbound(self) -> bool {
        matches!(self, Self::Outbound | Self::Both)
    }

    /// Get the name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for ConnectionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `in`/`out` selectors are accepted in the flag list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirectionSelectors {
    Accepted,
    Rejected,
}

/// The result of splitting a token into permissions and location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PermissionPrefix<'a> {
    pub flags: PermissionFlags,
    pub direction: ConnectionDirection,
    pub location: &'a str,
}

/// Split `token` at its last `@` and parse the permission list before it.
///
/// Nothing is returned unless every name in the list is recognized.
pub(crate) fn parse_permission_prefix(
    token: &str,
    selectors: DirectionSelectors,
) -> PermissionResult<PermissionPrefix<'_>> {
    let Some((list, location)) = token.rsplit_once('@') else {
        return Ok(PermissionPrefix {
            flags: PermissionFlags::ALL | PermissionFlags::ISIMPLICIT,
            direction: ConnectionDirection::Both,
            location: token,
        });
    };

    let mut flags = PermissionFlags::NONE;
    let mut inbound = false;
    let mut outbound = false;

    for name in list.split(',') {
        if let Some(flag) = PermissionFlags::from_permission_name(name) {
            flags.add_flag(flag);
            continue;
        }
        match (name, selectors) {
            // Empty entries such as "relay,,noban" are allowed.
            ("", _) => {}
            ("in", DirectionSelectors::Accepted) => inbound = true,
            ("out", DirectionSelectors::Accepted) => outbound = true,
            _ => return Err(PermissionError::UnknownPermission(name.to_string())),
        }
    }

    let direction = match (inbound, outbound) {
        (true, false) => ConnectionDirection::Inbound,
        (false, true) => ConnectionDirection::Outbound,
        _ => ConnectionDirection::Both,
    };

    Ok(PermissionPrefix {
        flags,
        direction,
        location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(token: &str) -> PermissionResult<PermissionPrefix<'_>> {
        parse_permission_prefix(token, DirectionSelectors::Accepted)
    }

    #[test]
    fn test_no_prefix_is_implicit_all() {
        let prefix = parse("1.2.3.4:8333").unwrap();
        assert_eq!(
            prefix.flags,
            PermissionFlags::ALL | PermissionFlags::ISIMPLICIT
        );
        assert_eq!(prefix.direction, ConnectionDirection::Both);
        assert_eq!(prefix.location, "1.2.3.4:8333");
    }

    #[test]
    fn test_explicit_list() {
        let prefix = parse("bloomfilter,relay@192.168.1.1:8333").unwrap();
        assert_eq!(
            prefix.flags,
            PermissionFlags::BLOOMFILTER | PermissionFlags::RELAY
        );
        assert!(!prefix.flags.is_implicit());
        assert_eq!(prefix.location, "192.168.1.1:8333");
    }

    #[test]
    fn test_explicit_all_is_not_implicit() {
        let prefix = parse("all@10.0.0.0/8").unwrap();
        assert_eq!(prefix.flags, PermissionFlags::ALL);
    }

    #[test]
    fn test_every_name() {
        let prefix =
            parse("bloomfilter,forcerelay,relay,noban,mempool,addr,download@h").unwrap();
        assert_eq!(
            prefix.flags,
            PermissionFlags::ALL.difference(PermissionFlags::BLOCKFILTERS)
        );
    }

    #[test]
    fn test_splits_at_last_separator() {
        let err = parse("noban@relay@1.2.3.4:1").unwrap_err();
        assert_eq!(
            err,
            PermissionError::UnknownPermission("noban@relay".to_string())
        );

        let prefix = parse("noban@").unwrap();
        assert_eq!(prefix.location, "");
    }

    #[test]
    fn test_empty_entries_are_skipped() {
        let prefix = parse("relay,,noban,@1.2.3.4:1").unwrap();
        assert_eq!(prefix.flags, PermissionFlags::RELAY | PermissionFlags::NOBAN);

        let prefix = parse("@1.2.3.4:1").unwrap();
        assert_eq!(prefix.flags, PermissionFlags::NONE);
        assert!(!prefix.flags.is_implicit());
    }

    #[test]
    fn test_unknown_name_fails_whole_token() {
        let err = parse("relay,bogusflag@1.2.3.4:9999").unwrap_err();
        assert_eq!(
            err,
            PermissionError::UnknownPermission("bogusflag".to_string())
        );
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let err = parse("NoBan@1.2.3.4:1").unwrap_err();
        assert!(err.is_unknown_permission());
    }

    #[test]
    fn test_direction_selectors() {
        assert_eq!(
            parse("in@10.0.0.0/8").unwrap().direction,
            ConnectionDirection::Inbound
        );
        assert_eq!(
            parse("relay,out@10.0.0.0/8").unwrap().direction,
            ConnectionDirection::Outbound
        );
        assert_eq!(
            parse("in,out@10.0.0.0/8").unwrap().direction,
            ConnectionDirection::Both
        );
        assert_eq!(
            parse("relay@10.0.0.0/8").unwrap().direction,
            ConnectionDirection::Both
        );

        // Selectors grant nothing.
        assert_eq!(parse("in@10.0.0.0/8").unwrap().flags, PermissionFlags::NONE);
    }

    #[test]
    fn test_direction_selectors_rejected() {
        let err = parse_permission_prefix("noban,in@1.2.3.4:1", DirectionSelectors::Rejected)
            .unwrap_err();
        assert_eq!(err, PermissionError::UnknownPermission("in".to_string()));
    }

    #[test]
    fn test_direction_helpers() {
        assert!(ConnectionDirection::Both.includes_inbound());
        assert!(ConnectionDirection::Both.includes_outbound());
        assert!(!ConnectionDirection::Inbound.includes_outbound());
        assert!(!ConnectionDirection::Outbound.includes_inbound());
        assert_eq!(ConnectionDirection::default(), ConnectionDirection::Both);
        assert_eq!(ConnectionDirection::Outbound.to_string(), "outbound");
    }
}
