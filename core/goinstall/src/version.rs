//! Dotted version numbers for OS-version gating.
//!
//! Minimum OS versions in the catalog (`10.6`, `10.8`) and OS versions
//! reported by machines (`10.11.12`, `10.2-RELEASE`, `5.4.0-91-generic`) are
//! compared numerically, component by component.
//!
//! ## Parsing
//!
//! Each dot-separated component contributes its leading run of ASCII digits.
//! Parsing stops at the first component without leading digits, and a
//! component followed by anything other than digits is the last one taken:
//!
//! ```text
//! "10.11.12"          -> 10.11.12
//! "10.2-RELEASE"      -> 10.2
//! "5.4.0-91-generic"  -> 5.4.0
//! "10.x.3"            -> 10
//! "RELEASE"           -> (empty, compares as 0)
//! ```
//!
//! Missing trailing components compare as zero, so `10.8 == 10.8.0`.

use std::cmp::Ordering;
use std::fmt;

/// A numeric, dot-separated version.
#[derive(Debug, Clone, Default)]
pub struct VersionNumber {
    components: Vec<u64>,
}

impl VersionNumber {
    /// Parses the numeric prefix of a version string.
    ///
    /// Never fails; an input without any leading digits yields the empty
    /// version, which is equal to `0`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut components = Vec::new();
        for part in raw.trim().split('.') {
            let digits_len = part.bytes().take_while(u8::is_ascii_digit).count();
            if digits_len == 0 {
                break;
            }
            let value = part[..digits_len].parse::<u64>().unwrap_or(u64::MAX);
            components.push(value);
            if digits_len < part.len() {
                break;
            }
        }
        Self { components }
    }

    /// Returns the parsed numeric components.
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionNumber {}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self.components.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl From<&str> for VersionNumber {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
