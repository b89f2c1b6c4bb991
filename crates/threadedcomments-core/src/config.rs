//! Tree configuration: path separator, segment width, sibling stamping.

use serde::Deserialize;

use crate::core::{CoreError, CoreResult};

/// Default separator between path segments.
pub const DEFAULT_PATH_SEPARATOR: &str = "/";

/// Default number of digits per path segment.
pub const DEFAULT_PATH_DIGITS: usize = 10;

/// Largest segment width whose capacity still fits in an `i64` id.
pub const MAX_PATH_DIGITS: usize = 18;

/// Configuration for the tree manager.
///
/// Injected explicitly wherever paths are built or decoded; nothing reads
/// these values from process-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Separator between zero-padded segments. Must not contain a digit.
    pub path_separator: String,
    /// Width of each zero-padded segment. Ids at or above
    /// `10^path_digits` cannot be encoded.
    pub path_digits: usize,
    /// When a child is added or removed, stamp the new `newest_activity`
    /// on every sibling as well as on the parent.
    pub stamp_siblings: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            path_separator: DEFAULT_PATH_SEPARATOR.to_string(),
            path_digits: DEFAULT_PATH_DIGITS,
            stamp_siblings: true,
        }
    }
}

impl TreeConfig {
    /// Check that the separator and width can produce ordered paths.
    pub fn validate(&self) -> CoreResult<()> {
        if self.path_separator.is_empty() {
            return Err(CoreError::Config {
                message: "path_separator must not be empty".to_string(),
            });
        }
        if self.path_separator.chars().any(|c| c.is_ascii_digit()) {
            return Err(CoreError::Config {
                message: format!(
                    "path_separator {:?} must not contain digits",
                    self.path_separator
                ),
            });
        }
        if self.path_digits == 0 || self.path_digits > MAX_PATH_DIGITS {
            return Err(CoreError::Config {
                message: format!(
                    "path_digits must be between 1 and {MAX_PATH_DIGITS}, got {}",
                    self.path_digits
                ),
            });
        }
        Ok(())
    }

    /// Largest id that fits in one path segment.
    #[must_use]
    pub fn max_id(&self) -> i64 {
        let digits = u32::try_from(self.path_digits.min(MAX_PATH_DIGITS)).unwrap_or(0);
        10_i64.pow(digits) - 1
    }

    /// Check that `max_existing_id` still fits the configured width.
    ///
    /// Run once when a store is opened so that an undersized `path_digits`
    /// fails loudly instead of silently breaking the listing order.
    pub fn check_capacity(&self, max_existing_id: i64) -> CoreResult<()> {
        if max_existing_id > self.max_id() {
            return Err(CoreError::Config {
                message: format!(
                    "path_digits = {} cannot encode existing id {max_existing_id}",
                    self.path_digits
                ),
            });
        }
        Ok(())
    }
}
