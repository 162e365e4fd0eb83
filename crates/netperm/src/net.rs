//! Network locations that permissions attach to.
//!
//! The permission parsers never interpret address text themselves. They
//! hand it to a [`ServiceLookup`] (for bind endpoints) or a
//! [`SubnetLookup`] (for whitelisted ranges). [`NumericLookup`] is the
//! default for both and accepts numeric IPv4 and IPv6 literals only.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Resolves the location part of a whitebind entry into an endpoint.
pub trait ServiceLookup {
    /// Resolve `text` into an address and port, or `None` if it is invalid.
    fn lookup_service(&self, text: &str) -> Option<SocketAddr>;
}

/// Resolves the location part of a whitelist entry into a subnet.
pub trait SubnetLookup {
    /// Resolve `text` into a subnet, or `None` if it is invalid.
    fn lookup_subnet(&self, text: &str) -> Option<Subnet>;
}

impl<F> ServiceLookup for F
where
    F: Fn(&str) -> Option<SocketAddr>,
{
    fn lookup_service(&self, text: &str) -> Option<SocketAddr> {
        self(text)
    }
}

impl<F> SubnetLookup for F
where
    F: Fn(&str) -> Option<Subnet>,
{
    fn lookup_subnet(&self, text: &str) -> Option<Subnet> {
        self(text)
    }
}

/// Lookup that accepts numeric address literals and performs no name
/// resolution.
///
/// Endpoints use socket address syntax (`1.2.3.4:8333`, `[::1]:8333`).
/// A bare address without a port resolves with port 0.
/// Subnets use the forms accepted by [`Subnet::from_str`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericLookup;

impl ServiceLookup for NumericLookup {
    fn lookup_service(&self, text: &str) -> Option<SocketAddr> {
        // A bare address resolves with port 0 so the caller can report it.
        text.parse::<SocketAddr>()
            .ok()
            .or_else(|| text.parse::<IpAddr>().ok().map(|ip| SocketAddr::new(ip, 0)))
    }
}

impl SubnetLookup for NumericLookup {
    fn lookup_subnet(&self, text: &str) -> Option<Subnet> {
        text.parse().ok()
    }
}

/// Error returned when subnet text is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid subnet: '{0}'")]
pub struct InvalidSubnet(String);

/// A range of addresses given by a network address and prefix length.
///
/// The network address is always stored with host bits cleared.
///
/// # Example
///
/// ```
/// use netperm::Subnet;
///
/// let subnet: Subnet = "10.1.2.3/8".parse().unwrap();
/// assert_eq!(subnet.to_string(), "10.0.0.0/8");
/// assert!(subnet.contains(&"10.200.0.1".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subnet {
    network: IpAddr,
    prefix_len: u8,
}

impl Subnet {
    /// Create a subnet, clearing host bits of `addr`.
    ///
    /// Returns `None` if `prefix_len` is longer than the address.
    pub fn new(addr: IpAddr, prefix_len: u8) -> Option<Self> {
        let width = address_width(&addr);
        if prefix_len > width {
            return None;
        }
        let bits = address_bits(&addr) & mask(width, prefix_len);
        Some(Self {
            network: bits_to_address(&addr, bits),
            prefix_len,
        })
    }

    /// A subnet containing exactly one address.
    pub fn single(addr: IpAddr) -> Self {
        Self {
            network: addr,
            prefix_len: address_width(&addr),
        }
    }

    /// The network address.
    pub fn network(&self) -> IpAddr {
        self.network
    }

    /// The prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Check if `addr` falls inside this subnet.
    ///
    /// Addresses of the other family never match.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        if self.network.is_ipv4() != addr.is_ipv4() {
            return false;
        }
        let width = address_width(addr);
        address_bits(addr) & mask(width, self.prefix_len) == address_bits(&self.network)
    }
}

impl FromStr for Subnet {
    type Err = InvalidSubnet;

    /// Parse `addr`, `addr/len` or `addr/netmask`.
    ///
    /// A bare address is a single-host subnet. A netmask must be of the
    /// same family as the address and have contiguous leading ones.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSubnet(text.to_string());

        let Some((addr, suffix)) = text.split_once('/') else {
            let addr: IpAddr = text.parse().map_err(|_| invalid())?;
            return Ok(Self::single(addr));
        };

        let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
        let width = address_width(&addr);

        let prefix_len = if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            suffix.parse::<u8>().map_err(|_| invalid())?
        } else {
            let netmask: IpAddr = suffix.parse().map_err(|_| invalid())?;
            if netmask.is_ipv4() != addr.is_ipv4() {
                return Err(invalid());
            }
            netmask_prefix(width, address_bits(&netmask)).ok_or_else(invalid)?
        };

        Self::new(addr, prefix_len).ok_or_else(invalid)
    }
}

impl TryFrom<String> for Subnet {
    type Error = InvalidSubnet;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Subnet> for String {
    fn from(subnet: Subnet) -> Self {
        subnet.to_string()
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

fn address_width(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn address_bits(addr: &IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(*v4)),
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

fn bits_to_address(family: &IpAddr, bits: u128) -> IpAddr {
    match family {
        // Bits were masked from a v4 address, so they fit in 32 bits.
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::from(bits as u32)),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::from(bits)),
    }
}

fn mask(width: u8, prefix_len: u8) -> u128 {
    if prefix_len == 0 {
        return 0;
    }
    let full = if width == 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    };
    (u128::MAX << (width - prefix_len)) & full
}

fn netmask_prefix(width: u8, bits: u128) -> Option<u8> {
    // Align the mask to the top of a u128 so leading_ones counts its prefix.
    let aligned = bits << (128 - u32::from(width));
    let ones = aligned.leading_ones();
    if ones < 128 && aligned << ones != 0 {
        return None;
    }
    u8::try_from(ones).ok()
}
