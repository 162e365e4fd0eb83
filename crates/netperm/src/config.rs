//! Operator configuration for whitebind and whitelist entries.
//!
//! Entries are kept as raw strings until [`PermissionConfig::resolve`]
//! parses them, so a single bad entry can either abort loading or be
//! skipped depending on [`PermissionConfig::strict`].
//!
//! ```toml
//! strict = false
//! whitebind = ["noban@127.0.0.1:8334"]
//! whitelist = ["10.0.0.0/8", "relay,in@192.168.0.0/16"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult, PermissionResult};
use crate::grammar::ConnectionDirection;
use crate::net::{NumericLookup, ServiceLookup, SubnetLookup};
use crate::whitebind::WhitebindPermissions;
use crate::whitelist::WhitelistPermissions;

/// Raw permission entries as written by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionConfig {
    /// Abort on the first invalid entry instead of skipping it.
    ///
    /// Defaults to `true`.
    pub strict: bool,

    /// `[permissions@]addr:port` entries.
    pub whitebind: Vec<String>,

    /// `[permissions@]subnet` entries.
    pub whitelist: Vec<String>,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            strict: true,
            whitebind: Vec::new(),
            whitelist: Vec::new(),
        }
    }
}

impl PermissionConfig {
    /// Create an empty strict configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a whitebind entry.
    pub fn with_whitebind(mut self, entry: impl Into<String>) -> Self {
        self.whitebind.push(entry.into());
        self
    }

    /// Add a whitelist entry.
    pub fn with_whitelist(mut self, entry: impl Into<String>) -> Self {
        self.whitelist.push(entry.into());
        self
    }

    /// Set whether invalid entries abort resolution.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml_str(&text)?;
        debug!(
            path = %path.display(),
            whitebind = config.whitebind.len(),
            whitelist = config.whitelist.len(),
            "Loaded permission config"
        );
        Ok(config)
    }

    /// Parse every entry using numeric address lookup.
    pub fn resolve(&self) -> ConfigResult<ResolvedPermissions> {
        self.resolve_with(&NumericLookup)
    }

    /// Parse every entry, resolving locations with `lookup`.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`ConfigError::Entry`] for the first entry
    /// that fails to parse. Otherwise failing entries are logged and left
    /// out of the result.
    pub fn resolve_with<L>(&self, lookup: &L) -> ConfigResult<ResolvedPermissions>
    where
        L: ServiceLookup + SubnetLookup + ?Sized,
    {
        let mut resolved = ResolvedPermissions::default();

        for (index, entry) in self.whitebind.iter().enumerate() {
            let parsed = WhitebindPermissions::try_parse_with(entry, lookup);
            if let Some(bind) = self.accept("whitebind", index, entry, parsed)? {
                if bind.flags.is_implicit() {
                    info!(
                        entry = %entry,
                        "whitebind entry has no permission list, granting default permissions"
                    );
                }
                resolved.binds.push(bind);
            }
        }

        for (index, entry) in self.whitelist.iter().enumerate() {
            let parsed = WhitelistPermissions::try_parse_with(entry, lookup);
            if let Some((permissions, direction)) = self.accept("whitelist", index, entry, parsed)?
            {
                if permissions.flags.is_implicit() {
                    info!(
                        entry = %entry,
                        "whitelist entry has no permission list, granting default permissions"
                    );
                }
                resolved.subnets.push(WhitelistEntry {
                    permissions,
                    direction,
                });
            }
        }

        Ok(resolved)
    }

    fn accept<T>(
        &self,
        option: &'static str,
        index: usize,
        entry: &str,
        parsed: PermissionResult<T>,
    ) -> ConfigResult<Option<T>> {
        match parsed {
            Ok(value) => Ok(Some(value)),
            Err(source) if self.strict => Err(ConfigError::Entry {
                option,
                index,
                source,
            }),
            Err(source) => {
                warn!(
                    option,
                    index,
                    entry = %entry,
                    error = %source,
                    "Skipping invalid permission entry"
                );
                Ok(None)
            }
        }
    }
}

/// A parsed whitelist entry together with the connections it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// The parsed permissions and subnet.
    pub permissions: WhitelistPermissions,
    /// Which connections the entry applies to.
    pub direction: ConnectionDirection,
}

/// Every entry of a [`PermissionConfig`] that parsed successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPermissions {
    /// Whitebind entries in configuration order.
    pub binds: Vec<WhitebindPermissions>,
    /// Whitelist entries in configuration order.
    pub subnets: Vec<WhitelistEntry>,
}

impl ResolvedPermissions {
    /// Total number of resolved entries.
    pub fn len(&self) -> usize {
        self.binds.len() + self.subnets.len()
    }

    /// Returns `true` if nothing resolved.
    pub fn is_empty(&self) -> bool {
        self.binds.is_empty() && self.subnets.is_empty()
    }
}
