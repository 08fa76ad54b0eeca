//! Device name filter.

use regex::Regex;

use crate::error::ConfigError;

/// Default pattern: Linux software RAID devices (`/dev/md0`, `/dev/md127`, ...).
pub const DEFAULT_HDD_REGEX: &str = "md[0-9]+$";

/// Selects which filesystem devices are reported.
///
/// The pattern is searched anywhere in the device path, so `md[0-9]+$`
/// matches `/dev/md3` without needing a leading `.*`.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    regex: Regex,
}

impl DeviceFilter {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, device: &str) -> bool {
        self.regex.is_match(device)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_HDD_REGEX).expect("default hdd_regex is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_md_devices() {
        let filter = DeviceFilter::default();
        assert!(filter.is_match("/dev/md3"));
        assert!(filter.is_match("/dev/md127"));
        assert!(!filter.is_match("tmpfs"));
        assert!(!filter.is_match("/dev/loop0"));
        assert!(!filter.is_match("/dev/md"));
        // anchored at the end only
        assert!(!filter.is_match("/dev/md3p1"));
    }

    #[test]
    fn test_custom_pattern() {
        let filter = DeviceFilter::new("^/dev/(sd|nvme)").unwrap();
        assert!(filter.is_match("/dev/sda1"));
        assert!(filter.is_match("/dev/nvme0n1p2"));
        assert!(!filter.is_match("/dev/md0"));
        assert_eq!(filter.as_str(), "^/dev/(sd|nvme)");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = DeviceFilter::new("md[0-9").unwrap_err();
        assert!(err.to_string().contains("md[0-9"));
    }
}
