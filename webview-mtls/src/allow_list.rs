//! Host allow-list for client certificate requests.
//!
//! # Examples
//!
//! ```rust
//! use webview_mtls::HostAllowList;
//!
//! let hosts = HostAllowList::parse("Example.com, api.example.com");
//! assert!(hosts.contains(Some("EXAMPLE.COM")));
//! assert!(!hosts.contains(Some("other.example")));
//! assert!(!hosts.contains(None));
//!
//! // An empty list allows every host.
//! assert!(HostAllowList::parse("").contains(Some("anything.example")));
//! ```

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A normalized set of hostnames.
///
/// Built once from configuration and immutable afterwards. An empty set means
/// "every host is allowed".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostAllowList {
    hosts: BTreeSet<String>,
}

impl HostAllowList {
    /// Parses a comma-separated list of hosts.
    ///
    /// Each token is normalized (see [`normalize_host`]); empty tokens are
    /// dropped and duplicates collapse. There are no error conditions: input
    /// without any usable token yields an empty (allow-all) list.
    pub fn parse(raw: &str) -> Self {
        let hosts = raw
            .split(',')
            .map(normalize_host)
            .filter(|h| !h.is_empty())
            .collect();
        Self { hosts }
    }

    /// Whether `host` is allowed.
    ///
    /// Always true for an empty list. Otherwise a missing or blank host is
    /// rejected, and any other host is allowed iff its normalized form is a
    /// member.
    pub fn contains(&self, host: Option<&str>) -> bool {
        if self.hosts.is_empty() {
            return true;
        }
        let Some(host) = host else {
            return false;
        };
        let host = normalize_host(host);
        !host.is_empty() && self.hosts.contains(&host)
    }

    /// Whether the list is empty (allows every host).
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Number of distinct hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// The normalized hosts, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}

impl FromStr for HostAllowList {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for HostAllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, host) in self.hosts.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(host)?;
        }
        Ok(())
    }
}

/// Normalizes a host token.
///
/// Trims and lowercases, then strips a `scheme://` prefix, anything from the
/// first `/`, the brackets (and port) of an IPv6 literal, and a `:port`
/// suffix when the token has exactly one `:`. Bare IPv6 literals are kept
/// as is.
pub fn normalize_host(raw: &str) -> String {
    let mut token = raw.trim().to_lowercase();

    if let Some((_, rest)) = token.split_once("://") {
        token = rest.to_owned();
    }
    if let Some(end) = token.find('/') {
        token.truncate(end);
    }

    if let Some(inner) = token.strip_prefix('[') {
        if let Some((literal, _)) = inner.split_once(']') {
            return literal.trim().to_owned();
        }
    }

    if token.matches(':').count() == 1 {
        if let Some(end) = token.find(':') {
            token.truncate(end);
        }
    }
    token.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_lowercases_and_dedups() {
        let list = HostAllowList::parse(" Example.com ,api.example.com,EXAMPLE.COM,, ");
        assert_eq!(list.iter().collect::<Vec<_>>(), ["api.example.com", "example.com"]);
        for host in list.iter() {
            assert_eq!(host, host.trim());
            assert_eq!(host, host.to_lowercase());
            assert!(!host.is_empty());
        }
    }

    #[test]
    fn empty_and_blank_inputs_allow_everything() {
        for raw in ["", "   ", ",", " , ,"] {
            let list = HostAllowList::parse(raw);
            assert!(list.is_empty(), "{raw:?}");
            assert!(list.contains(Some("any.example")));
            assert!(list.contains(None));
        }
    }

    #[test]
    fn missing_host_is_rejected_by_non_empty_list() {
        let list = HostAllowList::parse("example.com");
        assert!(!list.contains(None));
        assert!(!list.contains(Some("")));
        assert!(!list.contains(Some("   ")));
    }

    #[test]
    fn membership_is_case_insensitive() {
        let list = HostAllowList::parse("Example.com, api.example.com");
        assert!(list.contains(Some("EXAMPLE.COM")));
        assert!(list.contains(Some("Api.Example.Com")));
        assert!(!list.contains(Some("www.example.com")));
    }

    #[test]
    fn normalizes_urls_ports_and_ipv6() {
        assert_eq!(normalize_host("https://Example.com:8443/path"), "example.com");
        assert_eq!(normalize_host("example.com:443"), "example.com");
        assert_eq!(normalize_host("[::1]:442"), "::1");
        assert_eq!(normalize_host("[FE80::1]"), "fe80::1");
        assert_eq!(normalize_host("::1"), "::1");
        assert_eq!(normalize_host("10.0.0.2:3000"), "10.0.0.2");
        assert_eq!(normalize_host("  "), "");
    }

    #[test]
    fn url_shaped_entries_match_plain_hosts() {
        let list = HostAllowList::parse("https://term.example:8443, [::1]:442");
        assert!(list.contains(Some("term.example")));
        assert!(list.contains(Some("::1")));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn display_round_trips() {
        let list: HostAllowList = "b.example, a.example".parse().unwrap();
        assert_eq!(list.to_string(), "a.example,b.example");
        assert_eq!(HostAllowList::parse(&list.to_string()), list);
    }
}
