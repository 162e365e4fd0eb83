//! Permission flags granted to peers.
//!
//! A [`PermissionFlags`] value is a bitmask of capabilities a node extends
//! to a peer that connected through a whitebind address or from a
//! whitelisted subnet.
//!
//! # Composite Flags
//!
//! Some flags are defined as unions of other flags, so granting them
//! always grants the implied capability as well:
//!
//! ```text
//! FORCERELAY = bit 2  | RELAY
//! NOBAN      = bit 4  | DOWNLOAD
//! BLOCKFILTERS_EXPLICIT = BLOCKFILTERS | bit 17
//! ```
//!
//! # Example
//!
//! ```
//! use netperm::PermissionFlags;
//!
//! let mut flags = PermissionFlags::NONE;
//! flags.add_flag(PermissionFlags::NOBAN);
//!
//! assert!(flags.has_flag(PermissionFlags::NOBAN));
//! assert!(flags.has_flag(PermissionFlags::DOWNLOAD));
//! assert_eq!(flags.to_strings(), vec!["noban"]);
//! ```

use std::fmt;

use bitflags::bitflags;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::PermissionError;

bitflags! {
    /// Capabilities a node grants to a peer.
    ///
    /// | Flag | Grants |
    /// |------|--------|
    /// | [`BLOOMFILTER`](Self::BLOOMFILTER) | bloom filter queries even if disabled node-wide |
    /// | [`RELAY`](Self::RELAY) | transaction relay even in blocks-only mode |
    /// | [`FORCERELAY`](Self::FORCERELAY) | relay even if already in the mempool (implies `RELAY`) |
    /// | [`DOWNLOAD`](Self::DOWNLOAD) | block download past the upload target |
    /// | [`NOBAN`](Self::NOBAN) | no banning for misbehavior (implies `DOWNLOAD`) |
    /// | [`MEMPOOL`](Self::MEMPOOL) | mempool queries |
    /// | [`ADDR`](Self::ADDR) | address requests bypassing the privacy cache |
    /// | [`BLOCKFILTERS`](Self::BLOCKFILTERS) | compact block filter queries |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PermissionFlags: u32 {
        /// Can query bloom filters.
        const BLOOMFILTER = 1 << 1;
        /// Relay and accept transactions from this peer.
        const RELAY = 1 << 3;
        /// Always relay transactions from this peer.
        const FORCERELAY = (1 << 2) | Self::RELAY.bits();
        /// Allow headers and block download regardless of node limits.
        const DOWNLOAD = 1 << 18;
        /// Can't be banned for misbehavior.
        const NOBAN = (1 << 4) | Self::DOWNLOAD.bits();
        /// Can query the mempool.
        const MEMPOOL = 1 << 5;
        /// Can request addresses without hitting the cache.
        const ADDR = 1 << 6;
        /// Can query compact block filters.
        const BLOCKFILTERS = 1 << 16;
        /// Block filters were requested directly rather than through `ALL`.
        const BLOCKFILTERS_EXPLICIT = Self::BLOCKFILTERS.bits() | (1 << 17);
        /// The operator did not choose fine grained permissions.
        const ISIMPLICIT = 1 << 31;
    }
}

impl PermissionFlags {
    /// No capabilities.
    pub const NONE: Self = Self::empty();

    /// The default capability set used when no permission list is given.
    pub const ALL: Self = Self::BLOOMFILTER
        .union(Self::FORCERELAY)
        .union(Self::RELAY)
        .union(Self::NOBAN)
        .union(Self::MEMPOOL)
        .union(Self::ADDR)
        .union(Self::BLOCKFILTERS)
        .union(Self::DOWNLOAD);

    /// Returns `true` if every bit of `f` is set.
    ///
    /// Composite flags are only reported when all of their bits are
    /// present, so `RELAY` alone does not satisfy `FORCERELAY`.
    #[inline]
    #[must_use]
    pub fn has_flag(self, f: Self) -> bool {
        (self & f) == f
    }

    /// Sets every bit of `f`.
    #[inline]
    pub fn add_flag(&mut self, f: Self) {
        *self |= f;
    }

    /// Clears every bit of `f`.
    ///
    /// Unassigned bits in `self` are preserved.
    #[inline]
    pub fn clear_flag(&mut self, f: Self) {
        self.remove(f);
    }

    /// Returns `true` if the flags came from the blanket default.
    #[inline]
    #[must_use]
    pub fn is_implicit(self) -> bool {
        self.has_flag(Self::ISIMPLICIT)
    }

    /// Returns a copy without the [`ISIMPLICIT`](Self::ISIMPLICIT) marker.
    #[must_use]
    pub fn explicit(self) -> Self {
        let mut flags = self;
        flags.clear_flag(Self::ISIMPLICIT);
        flags
    }

    /// Looks up a single permission name as written in configuration.
    ///
    /// Names are case-sensitive. Only names accepted in a permission list
    /// are recognized; `blockfilters` is rendered but never parsed.
    ///
    /// ```
    /// use netperm::PermissionFlags;
    ///
    /// assert_eq!(
    ///     PermissionFlags::from_permission_name("relay"),
    ///     Some(PermissionFlags::RELAY)
    /// );
    /// assert_eq!(
    ///     PermissionFlags::from_permission_name("all"),
    ///     Some(PermissionFlags::ALL)
    /// );
    /// assert_eq!(PermissionFlags::from_permission_name("Relay"), None);
    /// ```
    #[must_use]
    pub fn from_permission_name(name: &str) -> Option<Self> {
        match name {
            "bloomfilter" => Some(Self::BLOOMFILTER),
            "noban" => Some(Self::NOBAN),
            "forcerelay" => Some(Self::FORCERELAY),
            "mempool" => Some(Self::MEMPOOL),
            "download" => Some(Self::DOWNLOAD),
            "all" => Some(Self::ALL),
            "relay" => Some(Self::RELAY),
            "addr" => Some(Self::ADDR),
            _ => None,
        }
    }

    /// Returns the human-readable names of the granted capabilities.
    ///
    /// Names come out in a fixed order. A composite flag hides the weaker
    /// flag it implies, so `FORCERELAY` renders as `forcerelay` only.
    /// The implicit marker and unassigned bits are never rendered.
    #[must_use]
    pub fn to_strings(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.has_flag(Self::BLOOMFILTER) {
            names.push("bloomfilter");
        }
        if self.has_flag(Self::FORCERELAY) {
            names.push("forcerelay");
        } else if self.has_flag(Self::RELAY) {
            names.push("relay");
        }
        if self.has_flag(Self::NOBAN) {
            names.push("noban");
        } else if self.has_flag(Self::DOWNLOAD) {
            names.push("download");
        }
        if self.has_flag(Self::MEMPOOL) {
            names.push("mempool");
        }
        if self.has_flag(Self::ADDR) {
            names.push("addr");
        }
        if self.has_flag(Self::BLOCKFILTERS) {
            names.push("blockfilters");
        }
        names
    }
}

impl Default for PermissionFlags {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for PermissionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(","))
    }
}

/// Serialized form: the rendered names plus the implicit marker.
///
/// ```json
/// { "permissions": ["forcerelay", "mempool"], "implicit": false }
/// ```
#[derive(Serialize)]
struct FlagsRepr {
    permissions: Vec<&'static str>,
    implicit: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FlagsInput {
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default)]
    implicit: bool,
}

impl Serialize for PermissionFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FlagsRepr {
            permissions: self.to_strings(),
            implicit: self.is_implicit(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PermissionFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let input = FlagsInput::deserialize(deserializer)?;
        let mut flags = Self::NONE;
        for name in input.permissions {
            // `blockfilters` only appears in rendered output.
            let flag = match name.as_str() {
                "blockfilters" => Self::BLOCKFILTERS,
                other => Self::from_permission_name(other).ok_or_else(|| {
                    <D::Error as de::Error>::custom(PermissionError::UnknownPermission(
                        other.to_string(),
                    ))
                })?,
            };
            flags.add_flag(flag);
        }
        if input.implicit {
            flags.add_flag(Self::ISIMPLICIT);
        }
        Ok(flags)
    }
}
