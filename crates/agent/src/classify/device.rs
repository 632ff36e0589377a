//! Detection of traffic bound for the local LED controller.
//!
//! Requests to hosts on the private network are real-time device commands;
//! they must reach the device untouched and never be cached.

use std::net::IpAddr;

use ipnet::IpNet;
use ledcache_core::BypassMatching;
use url::{Host, Url};

/// Hostname prefixes used by the legacy matcher, checked with `starts_with`.
pub const LEGACY_PREFIXES: &[&str] = &[
    "192.168", "10.", "172.16.", "172.17.", "172.18.", "172.19.", "172.20.", "172.21.", "172.22.", "172.23.",
    "172.24.", "172.25.", "172.26.", "172.27.", "172.28.", "172.29.", "172.30.", "172.31.",
];

/// Matches request hosts against the device networks.
#[derive(Debug, Clone)]
pub struct DeviceMatcher {
    matching: BypassMatching,
    networks: Vec<IpNet>,
}

impl DeviceMatcher {
    pub fn new(matching: BypassMatching, networks: Vec<IpNet>) -> Self {
        Self { matching, networks }
    }

    /// Whether the URL's host is the local device.
    ///
    /// In `Cidr` mode only IP literals can match; a DNS name never does.
    pub fn is_device(&self, url: &Url) -> bool {
        match self.matching {
            BypassMatching::Cidr => match url.host() {
                Some(Host::Ipv4(v4)) => self.contains(IpAddr::V4(v4)),
                Some(Host::Ipv6(v6)) => self.contains(IpAddr::V6(v6)),
                _ => false,
            },
            BypassMatching::Prefix => url
                .host_str()
                .is_some_and(|host| LEGACY_PREFIXES.iter().any(|prefix| host.starts_with(prefix))),
        }
    }

    fn contains(&self, ip: IpAddr) -> bool {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
            v4 => v4,
        };
        self.networks.iter().any(|net| net.contains(&ip))
    }
}
