use std::cmp::Ordering;

use aus_backend::{ProductVersion, RuleConditions, UpdateQuery, compare_build_ids};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
}

impl Comparator {
    fn split(condition: &str) -> (Self, &str) {
        let condition = condition.trim();
        for (prefix, comparator) in [
            ("<=", Self::LessOrEqual),
            (">=", Self::GreaterOrEqual),
            ("<", Self::Less),
            (">", Self::Greater),
            ("=", Self::Equal),
        ] {
            if let Some(operand) = condition.strip_prefix(prefix) {
                return (comparator, operand.trim());
            }
        }
        (Self::Equal, condition)
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Less => ordering == Ordering::Less,
            Self::LessOrEqual => ordering != Ordering::Greater,
            Self::Greater => ordering == Ordering::Greater,
            Self::GreaterOrEqual => ordering != Ordering::Less,
            Self::Equal => ordering == Ordering::Equal,
        }
    }
}

fn list_items(condition: &str) -> impl Iterator<Item = &str> {
    condition
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn matches_exact(condition: Option<&str>, value: &str) -> bool {
    condition.is_none_or(|expected| expected == value)
}

/// Exact channel or trailing-`*` glob, checked against the query's channel
/// and its fallback channel.
fn matches_channel(condition: Option<&str>, channel: &str, fallback_channel: &str) -> bool {
    let Some(pattern) = condition else {
        return true;
    };
    let matches = |candidate: &str| match pattern.strip_suffix('*') {
        Some(prefix) => candidate.starts_with(prefix),
        None => candidate == pattern,
    };
    matches(channel) || matches(fallback_channel)
}

fn matches_version(condition: Option<&str>, version: &str) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    let Ok(client) = version.parse::<ProductVersion>() else {
        return false;
    };
    list_items(condition).any(|item| {
        let (comparator, operand) = Comparator::split(item);
        operand
            .parse::<ProductVersion>()
            .is_ok_and(|target| comparator.holds(client.cmp(&target)))
    })
}

fn matches_build_id(condition: Option<&str>, build_id: &str) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    if build_id.trim().is_empty() {
        return false;
    }
    list_items(condition).any(|item| {
        let (comparator, operand) = Comparator::split(item);
        comparator.holds(compare_build_ids(build_id, operand))
    })
}

fn matches_list(condition: Option<&str>, value: Option<&str>) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    value.is_some_and(|value| list_items(condition).any(|item| item == value))
}

fn matches_os_version(condition: Option<&str>, os_version: Option<&str>) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    os_version.is_some_and(|os| list_items(condition).any(|item| os.contains(item)))
}

pub(crate) fn rule_matches(
    conditions: &RuleConditions,
    query: &UpdateQuery,
    fallback_channel: &str,
) -> bool {
    matches_exact(conditions.product.as_deref(), &query.product)
        && matches_channel(
            conditions.channel.as_deref(),
            &query.channel,
            fallback_channel,
        )
        && matches_version(conditions.version.as_deref(), &query.version)
        && matches_build_id(conditions.build_id.as_deref(), &query.build_id)
        && matches_list(
            conditions.build_target.as_deref(),
            query.build_target.as_deref(),
        )
        && matches_list(conditions.locale.as_deref(), query.locale.as_deref())
        && matches_os_version(
            conditions.os_version.as_deref(),
            query.os_version.as_deref(),
        )
        && matches_list(
            conditions.distribution.as_deref(),
            query.distribution.as_deref(),
        )
}
