//! Permissions for peers connecting to a whitebind address.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PermissionError, PermissionResult};
use crate::flags::PermissionFlags;
use crate::grammar::{DirectionSelectors, parse_permission_prefix};
use crate::net::{NumericLookup, ServiceLookup};

/// Permissions granted to every peer that connects through a local bind
/// address.
///
/// # Example
///
/// ```
/// use netperm::{PermissionFlags, WhitebindPermissions};
///
/// let bind = WhitebindPermissions::try_parse("bloomfilter,relay@192.168.1.1:8333").unwrap();
/// assert_eq!(bind.flags, PermissionFlags::BLOOMFILTER | PermissionFlags::RELAY);
/// assert_eq!(bind.service, "192.168.1.1:8333".parse::<std::net::SocketAddr>().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhitebindPermissions {
    /// Granted permissions.
    pub flags: PermissionFlags,
    /// The local endpoint peers connect to.
    pub service: SocketAddr,
}

impl WhitebindPermissions {
    /// Parse a `[permissions@]addr:port` entry using numeric addresses.
    pub fn try_parse(token: &str) -> PermissionResult<Self> {
        Self::try_parse_with(token, &NumericLookup)
    }

    /// Parse an entry, resolving the endpoint with `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::UnknownPermission`] for an unrecognized
    /// permission name, and [`PermissionError::InvalidLocation`] if the
    /// endpoint does not resolve or has no port.
    pub fn try_parse_with<L>(token: &str, lookup: &L) -> PermissionResult<Self>
    where
        L: ServiceLookup + ?Sized,
    {
        let prefix = parse_permission_prefix(token, DirectionSelectors::Rejected)?;

        let Some(service) = lookup.lookup_service(prefix.location) else {
            return Err(PermissionError::invalid_location(
                prefix.location,
                format!(
                    "Cannot resolve -whitebind address: '{}'",
                    prefix.location
                ),
            ));
        };
        if service.port() == 0 {
            return Err(PermissionError::invalid_location(
                prefix.location,
                format!(
                    "Need to specify a port with -whitebind: '{}'",
                    prefix.location
                ),
            ));
        }

        debug!(
            service = %service,
            flags = %prefix.flags,
            implicit = prefix.flags.is_implicit(),
            "Parsed whitebind permissions"
        );

        Ok(Self {
            flags: prefix.flags,
            service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_permissions() {
        let bind = WhitebindPermissions::try_parse("bloomfilter,relay@192.168.1.1:8333").unwrap();
        assert_eq!(
            bind.flags,
            PermissionFlags::BLOOMFILTER | PermissionFlags::RELAY
        );
        assert!(!bind.flags.is_implicit());
        assert_eq!(bind.service, "192.168.1.1:8333".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_implicit_permissions() {
        let bind = WhitebindPermissions::try_parse("[::1]:8334").unwrap();
        assert_eq!(
            bind.flags,
            PermissionFlags::ALL | PermissionFlags::ISIMPLICIT
        );
        assert_eq!(bind.service.port(), 8334);
    }

    #[test]
    fn test_invalid_address() {
        let err = WhitebindPermissions::try_parse("noban@bad_address").unwrap_err();
        assert_eq!(
            err,
            PermissionError::InvalidLocation {
                location: "bad_address".to_string(),
                message: "Cannot resolve -whitebind address: 'bad_address'".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_port() {
        let err = WhitebindPermissions::try_parse("relay@1.2.3.4").unwrap_err();
        assert_eq!(
            err,
            PermissionError::InvalidLocation {
                location: "1.2.3.4".to_string(),
                message: "Need to specify a port with -whitebind: '1.2.3.4'".to_string(),
            }
        );

        let err = WhitebindPermissions::try_parse("::1").unwrap_err();
        assert_eq!(err.to_string(), "Need to specify a port with -whitebind: '::1'");

        let err = WhitebindPermissions::try_parse("relay@1.2.3.4:0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Need to specify a port with -whitebind: '1.2.3.4:0'"
        );
    }

    #[test]
    fn test_unknown_permission() {
        let err = WhitebindPermissions::try_parse("bogusflag@1.2.3.4:9999").unwrap_err();
        assert_eq!(
            err,
            PermissionError::UnknownPermission("bogusflag".to_string())
        );
    }

    #[test]
    fn test_direction_selectors_not_accepted() {
        let err = WhitebindPermissions::try_parse("in@1.2.3.4:9999").unwrap_err();
        assert_eq!(err, PermissionError::UnknownPermission("in".to_string()));

        let err = WhitebindPermissions::try_parse("noban,out@1.2.3.4:9999").unwrap_err();
        assert_eq!(err, PermissionError::UnknownPermission("out".to_string()));
    }

    #[test]
    fn test_custom_lookup() {
        let lookup = |text: &str| -> Option<SocketAddr> {
            (text == "localnode").then(|| SocketAddr::from(([127, 0, 0, 1], 8333)))
        };
        let bind = WhitebindPermissions::try_parse_with("mempool@localnode", &lookup).unwrap();
        assert_eq!(bind.flags, PermissionFlags::MEMPOOL);
        assert_eq!(bind.service, SocketAddr::from(([127, 0, 0, 1], 8333)));

        let err = WhitebindPermissions::try_parse_with("mempool@elsewhere", &lookup).unwrap_err();
        assert!(err.is_invalid_location());
    }
}
