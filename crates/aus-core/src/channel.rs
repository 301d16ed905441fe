/// Marker separating a channel from its partner-customization suffix.
pub const CCK_MARKER: &str = "-cck-";

/// Strip a partner suffix: `release-cck-acme` falls back to `release`.
#[must_use]
pub fn fallback_channel(channel: &str) -> &str {
    channel
        .split_once(CCK_MARKER)
        .map_or(channel, |(base, _)| base)
}
