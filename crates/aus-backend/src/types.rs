use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-random result a caller can pick instead of rolling the rollout dice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceResult {
    #[default]
    Unset,
    Succeed,
    Fail,
}

impl ForceResult {
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::Unset => None,
            Self::Succeed => Some("succeed"),
            Self::Fail => Some("fail"),
        }
    }

    /// Value of the `force` query parameter that selects this result.
    #[must_use]
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Self::Unset => None,
            Self::Succeed => Some("1"),
            Self::Fail => Some("-1"),
        }
    }

    /// Map a raw `force` query parameter onto a result. Anything other than
    /// the two known encodings is a background check.
    #[must_use]
    pub fn from_query_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("1") => Self::Succeed,
            Some("-1") => Self::Fail,
            _ => Self::Unset,
        }
    }
}

/// One client's update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateQuery {
    pub product: String,
    pub channel: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub build_id: String,
    #[serde(default)]
    pub build_target: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub distribution: Option<String>,
    #[serde(default)]
    pub force: ForceResult,
}

impl UpdateQuery {
    #[must_use]
    pub fn new(product: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            channel: channel.into(),
            version: String::new(),
            build_id: String::new(),
            build_target: None,
            locale: None,
            os_version: None,
            distribution: None,
            force: ForceResult::Unset,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_build_id(mut self, build_id: impl Into<String>) -> Self {
        self.build_id = build_id.into();
        self
    }

    #[must_use]
    pub fn with_build_target(mut self, build_target: impl Into<String>) -> Self {
        self.build_target = Some(build_target.into());
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    #[must_use]
    pub fn with_os_version(mut self, os_version: impl Into<String>) -> Self {
        self.os_version = Some(os_version.into());
        self
    }

    #[must_use]
    pub fn with_distribution(mut self, distribution: impl Into<String>) -> Self {
        self.distribution = Some(distribution.into());
        self
    }

    #[must_use]
    pub fn with_force(mut self, force: ForceResult) -> Self {
        self.force = force;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("background rate must be between 0 and 100, got {0}")]
pub struct BackgroundRateError(pub u8);

/// Percentage of background checks that receive the primary mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BackgroundRate(u8);

impl BackgroundRate {
    pub const FULL: Self = Self(100);
    pub const NONE: Self = Self(0);

    /// # Errors
    /// Returns an error when `percent` is above 100.
    pub fn new(percent: u8) -> Result<Self, BackgroundRateError> {
        if percent > 100 {
            return Err(BackgroundRateError(percent));
        }
        Ok(Self(percent))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_full(self) -> bool {
        self.0 >= 100
    }
}

impl Default for BackgroundRate {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<u8> for BackgroundRate {
    type Error = BackgroundRateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BackgroundRate> for u8 {
    fn from(rate: BackgroundRate) -> Self {
        rate.0
    }
}

impl fmt::Display for BackgroundRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    #[default]
    Minor,
    Major,
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// Match predicates of a rule. `None` matches every query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConditions {
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub build_id: Option<String>,
    #[serde(default)]
    pub build_target: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub distribution: Option<String>,
}

/// A stored targeting rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: i64,
    #[serde(default = "default_data_version")]
    pub data_version: i64,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub mapping: Option<String>,
    #[serde(default)]
    pub fallback_mapping: Option<String>,
    #[serde(default)]
    pub background_rate: BackgroundRate,
    #[serde(default)]
    pub update_type: UpdateType,
    #[serde(flatten)]
    pub conditions: RuleConditions,
}

fn default_data_version() -> i64 {
    1
}

impl Rule {
    #[must_use]
    pub fn new(rule_id: i64, priority: i64) -> Self {
        Self {
            rule_id,
            data_version: default_data_version(),
            priority,
            mapping: None,
            fallback_mapping: None,
            background_rate: BackgroundRate::FULL,
            update_type: UpdateType::Minor,
            conditions: RuleConditions::default(),
        }
    }

    #[must_use]
    pub fn with_data_version(mut self, data_version: i64) -> Self {
        self.data_version = data_version;
        self
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: impl Into<String>) -> Self {
        self.mapping = Some(mapping.into());
        self
    }

    #[must_use]
    pub fn with_fallback_mapping(mut self, fallback_mapping: impl Into<String>) -> Self {
        self.fallback_mapping = Some(fallback_mapping.into());
        self
    }

    #[must_use]
    pub fn with_background_rate(mut self, background_rate: BackgroundRate) -> Self {
        self.background_rate = background_rate;
        self
    }

    #[must_use]
    pub fn with_update_type(mut self, update_type: UpdateType) -> Self {
        self.update_type = update_type;
        self
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: RuleConditions) -> Self {
        self.conditions = conditions;
        self
    }

    /// Release served to clients in the rollout bucket. An empty mapping
    /// means "serve nothing".
    #[must_use]
    pub fn primary_release(&self) -> Option<&str> {
        self.mapping.as_deref().filter(|name| !name.is_empty())
    }

    #[must_use]
    pub fn fallback_release(&self) -> Option<&str> {
        self.fallback_mapping
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

/// A named release whose `blob` holds the stored payload document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub name: String,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default = "default_data_version")]
    pub data_version: i64,
    pub blob: serde_json::Value,
}

/// Administrative kill switch for one product/channel pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shutoff {
    pub product: String,
    pub channel: String,
    #[serde(default = "default_data_version")]
    pub data_version: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Consistency-scope token threaded through every store call of one
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transaction {
    id: u64,
}

impl Transaction {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self { id }
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.id
    }
}
