use semver::{BuildMetadata, Version};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("Empty version string")]
    Empty,
    #[error("Expected X[.Y[.Z]][suffix] format, got: {input}")]
    InvalidFormat { input: String },
}

/// Product version with release-train ordering.
///
/// Accepts one to three dotted numeric components followed by an optional
/// suffix. Alphabetic suffixes such as `b3` or `a1` rank before the plain
/// release (`60.0b3 < 60.0`), numeric parts of a suffix compare numerically
/// (`60.0b9 < 60.0b10`), and a trailing `esr` is ignored.
#[derive(Debug, Clone)]
pub struct ProductVersion {
    raw: String,
    parsed: Version,
}

impl FromStr for ProductVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError::Empty);
        }
        let invalid = || VersionParseError::InvalidFormat {
            input: trimmed.to_string(),
        };

        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let body = body.strip_suffix("esr").unwrap_or(body);

        let core_end = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(body.len());
        let (core, suffix) = body.split_at(core_end);
        let core = core.trim_end_matches('.');

        let mut parts = core.split('.');
        let major = parts
            .next()
            .and_then(|part| part.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(part) => part.parse::<u64>().map_err(|_| invalid())?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(part) => part.parse::<u64>().map_err(|_| invalid())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        let pre = normalize_suffix(suffix).ok_or_else(invalid)?;
        let normalized = if pre.is_empty() {
            format!("{major}.{minor}.{patch}")
        } else {
            format!("{major}.{minor}.{patch}-{pre}")
        };

        let mut parsed = Version::parse(&normalized).map_err(|_| invalid())?;
        parsed.build = BuildMetadata::EMPTY;

        Ok(Self {
            raw: trimmed.to_string(),
            parsed,
        })
    }
}

/// Turn `b10`, `-beta.2` or `rc1` into dot-separated semver pre-release
/// identifiers. Build metadata after `+` is dropped.
fn normalize_suffix(suffix: &str) -> Option<String> {
    let suffix = suffix.split('+').next().unwrap_or_default();
    let suffix = suffix.trim_start_matches('-');

    let mut identifiers: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for ch in suffix.chars() {
        if ch == '.' || ch == '-' {
            if !current.is_empty() {
                identifiers.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !ch.is_ascii_alphanumeric() {
            return None;
        }
        let is_digit = ch.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            identifiers.push(std::mem::take(&mut current));
        }
        current_is_digit = is_digit;
        current.push(ch);
    }
    if !current.is_empty() {
        identifiers.push(current);
    }

    Some(
        identifiers
            .into_iter()
            .map(|identifier| {
                if identifier.bytes().all(|b| b.is_ascii_digit()) {
                    // semver rejects leading zeros in numeric identifiers
                    let trimmed = identifier.trim_start_matches('0');
                    if trimmed.is_empty() {
                        "0".to_string()
                    } else {
                        trimmed.to_string()
                    }
                } else {
                    identifier
                }
            })
            .collect::<Vec<_>>()
            .join("."),
    )
}

impl PartialEq for ProductVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parsed == other.parsed
    }
}

impl Eq for ProductVersion {}

impl Ord for ProductVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed.cmp(&other.parsed)
    }
}

impl PartialOrd for ProductVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for ProductVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.parsed.hash(state);
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compare two build ids. Timestamps like `20180101120000` compare
/// numerically; anything else falls back to string order.
#[must_use]
pub fn compare_build_ids(left: &str, right: &str) -> Ordering {
    match (left.trim().parse::<u64>(), right.trim().parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        _ => left.trim().cmp(right.trim()),
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{ProductVersion, VersionParseError, compare_build_ids};

    fn v(input: &str) -> ProductVersion {
        input.parse().expect("valid version in test")
    }

    #[test]
    fn short_versions_are_padded() {
        assert_eq!(v("60"), v("60.0.0"));
        assert_eq!(v("60.1"), v("60.1.0"));
        assert_eq!(v("v60.1"), v("60.1.0"));
    }

    #[test]
    fn release_train_ordering() {
        assert!(v("60.0b3") < v("60.0"));
        assert!(v("60.0a1") < v("60.0b1"));
        assert!(v("60.0b9") < v("60.0b10"));
        assert!(v("59.0.3") < v("60.0b1"));
        assert!(v("1.0.0-beta.2") < v("1.0.0-beta.10"));
        assert!(v("1.0.0-beta.2") < v("1.0.0"));
        assert!(v("61.0") > v("60.0.2"));
    }

    #[test]
    fn esr_suffix_is_ignored() {
        assert_eq!(v("60.2.0esr"), v("60.2.0"));
        assert_eq!(v("60.2.0esr").to_string(), "60.2.0esr");
    }

    #[test]
    fn build_metadata_does_not_affect_ordering() {
        assert_eq!(
            v("1.2.3+build.5").cmp(&v("1.2.3+build.9")),
            Ordering::Equal
        );
    }

    #[test]
    fn invalid_versions_are_rejected() {
        assert_eq!("".parse::<ProductVersion>(), Err(VersionParseError::Empty));
        assert!("abc".parse::<ProductVersion>().is_err());
        assert!("1.2.3.4".parse::<ProductVersion>().is_err());
        assert!("1.2b#".parse::<ProductVersion>().is_err());
    }

    #[test]
    fn build_ids_compare_numerically_when_possible() {
        assert_eq!(
            compare_build_ids("20180101000000", "20171231235959"),
            Ordering::Greater
        );
        assert_eq!(compare_build_ids("9", "10"), Ordering::Less);
        assert_eq!(compare_build_ids("abc", "abd"), Ordering::Less);
        assert_eq!(compare_build_ids(" 5 ", "5"), Ordering::Equal);
    }
}
