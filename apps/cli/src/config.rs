// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tool configuration loaded from environment variables.

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of parsed files kept in the handle cache.
    pub cache_max_files: usize,
    /// Cache time-to-live in hours.
    pub cache_ttl_hours: u64,
    /// Path to the IfcConvert binary.
    pub ifcconvert_path: String,
    /// Deadline for one IfcConvert invocation in seconds.
    pub export_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            cache_max_files: std::env::var("IFC_CACHE_MAX_FILES")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            cache_ttl_hours: std::env::var("IFC_CACHE_TTL_HOURS")
                .unwrap_or_else(|_| "24".into())
                .parse()
                .unwrap_or(24),
            ifcconvert_path: std::env::var("IFCCONVERT_PATH")
                .unwrap_or_else(|_| "IfcConvert".into()),
            export_timeout_secs: std::env::var("IFCCONVERT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .unwrap_or(300),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
