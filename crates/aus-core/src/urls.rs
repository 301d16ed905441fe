use std::collections::HashMap;

use url::Url;

/// Download host -> products allowed to link to it.
pub type DomainAllowlist = HashMap<String, Vec<String>>;

/// Whether `url` points at a host that `product` may not serve from.
///
/// The host (with an explicit non-default port, if any) must be an
/// allowlist key and list `product`. Userinfo and a port equal to the
/// scheme default are not part of the compared domain. URLs without a host
/// are forbidden.
#[must_use]
pub fn is_forbidden_url(url: &str, product: &str, allowlist: &DomainAllowlist) -> bool {
    let domain = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            let host = parsed.host_str()?.to_string();
            Some(match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host,
            })
        })
        .unwrap_or_default();

    let Some(products) = allowlist.get(&domain) else {
        log::warn!("Forbidden domain: {domain}");
        return true;
    };
    if !products.iter().any(|allowed| allowed == product) {
        log::warn!("Forbidden domain for product {product}: {domain}");
        return true;
    }
    false
}

/// Whether `url` starts with one of the configured special force hosts.
#[must_use]
pub fn is_special_url(url: &str, special_hosts: &[String]) -> bool {
    special_hosts
        .iter()
        .any(|prefix| url.starts_with(prefix.as_str()))
}
