//! Permissions for peers inside a whitelisted subnet.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PermissionError, PermissionResult};
use crate::flags::PermissionFlags;
use crate::grammar::{ConnectionDirection, DirectionSelectors, parse_permission_prefix};
use crate::net::{NumericLookup, Subnet, SubnetLookup};

/// Permissions granted to peers whose address falls in a subnet.
///
/// The flag list may also carry `in` and/or `out` to choose which
/// connections the entry covers. The direction is returned next to the
/// record by [`try_parse`](Self::try_parse) since it selects connections
/// rather than granting anything.
///
/// # Example
///
/// ```
/// use netperm::{ConnectionDirection, PermissionFlags, WhitelistPermissions};
///
/// let (entry, direction) = WhitelistPermissions::try_parse("10.0.0.0/8").unwrap();
/// assert_eq!(entry.flags, PermissionFlags::ALL | PermissionFlags::ISIMPLICIT);
/// assert_eq!(entry.subnet.to_string(), "10.0.0.0/8");
/// assert_eq!(direction, ConnectionDirection::Both);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhitelistPermissions {
    /// Granted permissions.
    pub flags: PermissionFlags,
    /// The remote address range this entry covers.
    pub subnet: Subnet,
}

impl WhitelistPermissions {
    /// Parse a `[permissions@]subnet` entry using numeric addresses.
    pub fn try_parse(token: &str) -> PermissionResult<(Self, ConnectionDirection)> {
        Self::try_parse_with(token, &NumericLookup)
    }

    /// Parse an entry, resolving the subnet with `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::UnknownPermission`] for an unrecognized
    /// permission name, and [`PermissionError::InvalidLocation`] if the
    /// subnet does not resolve.
    pub fn try_parse_with<L>(
        token: &str,
        lookup: &L,
    ) -> PermissionResult<(Self, ConnectionDirection)>
    where
        L: SubnetLookup + ?Sized,
    {
        let prefix = parse_permission_prefix(token, DirectionSelectors::Accepted)?;

        let Some(subnet) = lookup.lookup_subnet(prefix.location) else {
            return Err(PermissionError::invalid_location(
                prefix.location,
                format!(
                    "Invalid netmask specified in -whitelist: '{}'",
                    prefix.location
                ),
            ));
        };

        debug!(
            subnet = %subnet,
            flags = %prefix.flags,
            direction = %prefix.direction,
            implicit = prefix.flags.is_implicit(),
            "Parsed whitelist permissions"
        );

        Ok((
            Self {
                flags: prefix.flags,
                subnet,
            },
            prefix.direction,
        ))
    }

    /// Parse an entry and discard the connection direction.
    pub fn parse_ignoring_direction(token: &str) -> PermissionResult<Self> {
        Self::try_parse(token).map(|(entry, _)| entry)
    }

    /// Parse an entry with `lookup` and discard the connection direction.
    pub fn parse_ignoring_direction_with<L>(token: &str, lookup: &L) -> PermissionResult<Self>
    where
        L: SubnetLookup + ?Sized,
    {
        Self::try_parse_with(token, lookup).map(|(entry, _)| entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_subnet() {
        let (entry, direction) = WhitelistPermissions::try_parse("10.0.0.0/8").unwrap();
        assert_eq!(
            entry.flags,
            PermissionFlags::ALL | PermissionFlags::ISIMPLICIT
        );
        assert_eq!(entry.subnet, "10.0.0.0/8".parse::<Subnet>().unwrap());
        assert_eq!(direction, ConnectionDirection::Both);
    }

    #[test]
    fn test_explicit_subnet_with_direction() {
        let (entry, direction) =
            WhitelistPermissions::try_parse("noban,in@192.168.0.0/16").unwrap();
        assert_eq!(entry.flags, PermissionFlags::NOBAN);
        assert!(entry.flags.has_flag(PermissionFlags::DOWNLOAD));
        assert_eq!(entry.subnet.to_string(), "192.168.0.0/16");
        assert_eq!(direction, ConnectionDirection::Inbound);

        let (_, direction) = WhitelistPermissions::try_parse("relay,out@::1").unwrap();
        assert_eq!(direction, ConnectionDirection::Outbound);
    }

    #[test]
    fn test_invalid_netmask() {
        let err = WhitelistPermissions::try_parse("relay@10.0.0.0/40").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid netmask specified in -whitelist: '10.0.0.0/40'"
        );
        assert!(err.is_invalid_location());
    }

    #[test]
    fn test_unknown_permission() {
        let err = WhitelistPermissions::try_parse("relay,sideways@10.0.0.0/8").unwrap_err();
        assert_eq!(
            err,
            PermissionError::UnknownPermission("sideways".to_string())
        );
    }

    #[test]
    fn test_ignoring_direction() {
        let entry = WhitelistPermissions::parse_ignoring_direction("out,mempool@1.2.3.4").unwrap();
        assert_eq!(entry.flags, PermissionFlags::MEMPOOL);
        assert_eq!(entry.subnet.to_string(), "1.2.3.4/32");

        assert!(WhitelistPermissions::parse_ignoring_direction("mempool@nowhere").is_err());
    }

    #[test]
    fn test_custom_lookup() {
        let lookup = |text: &str| -> Option<Subnet> {
            (text == "lan").then(|| "192.168.0.0/16".parse().unwrap())
        };
        let entry =
            WhitelistPermissions::parse_ignoring_direction_with("addr@lan", &lookup).unwrap();
        assert_eq!(entry.flags, PermissionFlags::ADDR);
        assert!(entry.subnet.contains(&"192.168.4.4".parse().unwrap()));
    }
}
