//! Protocol configuration types and builders.

use crate::error::{Result, WireError};

/// Default maximum string or binary length (16 MiB).
const DEFAULT_STRING_LIMIT: usize = 16 * 1024 * 1024;
/// Default maximum number of elements in a single container.
const DEFAULT_CONTAINER_LIMIT: usize = 1024 * 1024;
/// Default maximum nesting of structs and containers.
const DEFAULT_MAX_DEPTH: usize = 64;

/// Limits and header options for the binary protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    string_limit: usize,
    container_limit: usize,
    max_depth: usize,
    strict_read: bool,
    strict_write: bool,
    warn_on_type_mismatch: bool,
}

impl ProtocolConfig {
    /// Returns a builder initialised with the defaults.
    pub fn builder() -> ProtocolConfigBuilder {
        ProtocolConfigBuilder::new()
    }

    /// Returns the maximum accepted string or binary length in bytes.
    pub fn string_limit(&self) -> usize {
        self.string_limit
    }

    /// Returns the maximum accepted element count of a list, set or map.
    pub fn container_limit(&self) -> usize {
        self.container_limit
    }

    /// Returns the maximum nesting depth of structs and containers.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns true if message headers must carry a version.
    pub fn strict_read(&self) -> bool {
        self.strict_read
    }

    /// Returns true if message headers are written with a version.
    pub fn strict_write(&self) -> bool {
        self.strict_write
    }

    /// Returns true if skipping a known field with a mismatched wire type
    /// is logged at warn level instead of debug.
    pub fn warn_on_type_mismatch(&self) -> bool {
        self.warn_on_type_mismatch
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            string_limit: DEFAULT_STRING_LIMIT,
            container_limit: DEFAULT_CONTAINER_LIMIT,
            max_depth: DEFAULT_MAX_DEPTH,
            strict_read: false,
            strict_write: true,
            warn_on_type_mismatch: true,
        }
    }
}

/// Builder for `ProtocolConfig`.
#[derive(Debug, Clone, Default)]
pub struct ProtocolConfigBuilder {
    string_limit: Option<usize>,
    container_limit: Option<usize>,
    max_depth: Option<usize>,
    strict_read: Option<bool>,
    strict_write: Option<bool>,
    warn_on_type_mismatch: Option<bool>,
}

impl ProtocolConfigBuilder {
    /// Creates a new protocol configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum string or binary length.
    pub fn string_limit(mut self, limit: usize) -> Self {
        self.string_limit = Some(limit);
        self
    }

    /// Sets the maximum container element count.
    pub fn container_limit(mut self, limit: usize) -> Self {
        self.container_limit = Some(limit);
        self
    }

    /// Sets the maximum nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Requires versioned message headers when reading.
    pub fn strict_read(mut self, strict: bool) -> Self {
        self.strict_read = Some(strict);
        self
    }

    /// Writes versioned message headers.
    pub fn strict_write(mut self, strict: bool) -> Self {
        self.strict_write = Some(strict);
        self
    }

    /// Chooses the log level used when a mistyped field is skipped.
    pub fn warn_on_type_mismatch(mut self, warn: bool) -> Self {
        self.warn_on_type_mismatch = Some(warn);
        self
    }

    /// Builds the protocol configuration.
    pub fn build(self) -> Result<ProtocolConfig> {
        let defaults = ProtocolConfig::default();

        let max_depth = self.max_depth.unwrap_or(defaults.max_depth);
        if max_depth == 0 {
            return Err(WireError::Configuration(
                "max_depth must be at least 1".to_string(),
            ));
        }

        let string_limit = self.string_limit.unwrap_or(defaults.string_limit);
        if string_limit > i32::MAX as usize {
            return Err(WireError::Configuration(format!(
                "string_limit {} exceeds the largest encodable length {}",
                string_limit,
                i32::MAX
            )));
        }

        let container_limit = self.container_limit.unwrap_or(defaults.container_limit);
        if container_limit > i32::MAX as usize {
            return Err(WireError::Configuration(format!(
                "container_limit {} exceeds the largest encodable count {}",
                container_limit,
                i32::MAX
            )));
        }

        Ok(ProtocolConfig {
            string_limit,
            container_limit,
            max_depth,
            strict_read: self.strict_read.unwrap_or(defaults.strict_read),
            strict_write: self.strict_write.unwrap_or(defaults.strict_write),
            warn_on_type_mismatch: self
                .warn_on_type_mismatch
                .unwrap_or(defaults.warn_on_type_mismatch),
        })
    }
}
