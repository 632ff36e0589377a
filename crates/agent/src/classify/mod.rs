//! Request classification.
//!
//! Pure and total: every request gets exactly one [`RoutingCategory`].
//! Precedence is Bypass, then StaticAsset, then CdnAsset, then Default.

pub mod device;

use ledcache_core::{AppConfig, Request};
use url::Url;

pub use device::DeviceMatcher;

/// Path suffixes served cache-first as static assets.
pub const STATIC_EXTENSIONS: &[&str] = &[".html", ".js", ".css", ".png", ".jpg", ".jpeg", ".svg", ".json"];

/// Routing label for an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingCategory {
    /// Local device traffic: straight to the network, never cached.
    Bypass,
    StaticAsset,
    CdnAsset,
    Default,
}

impl RoutingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::StaticAsset => "static_asset",
            Self::CdnAsset => "cdn_asset",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for RoutingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    device: DeviceMatcher,
    cdn_hosts: Vec<String>,
}

impl Classifier {
    pub fn new(device: DeviceMatcher, cdn_hosts: Vec<String>) -> Self {
        Self { device, cdn_hosts }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            DeviceMatcher::new(config.bypass_matching, config.device_networks.clone()),
            config.cdn_hosts.clone(),
        )
    }

    pub fn classify(&self, request: &Request) -> RoutingCategory {
        if self.is_bypass(&request.url) {
            RoutingCategory::Bypass
        } else if is_static_asset(request) {
            RoutingCategory::StaticAsset
        } else if self.is_cdn(&request.url) {
            RoutingCategory::CdnAsset
        } else {
            RoutingCategory::Default
        }
    }

    pub fn is_bypass(&self, url: &Url) -> bool {
        self.device.is_device(url)
    }

    /// Host contains `cdn.` or one of the configured CDN domains.
    pub fn is_cdn(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        host.contains("cdn.") || self.cdn_hosts.iter().any(|cdn| host.contains(cdn.as_str()))
    }
}

/// GET with a known static extension, or GET of the root path.
pub fn is_static_asset(request: &Request) -> bool {
    if !request.is_get() {
        return false;
    }
    let path = request.url.path();
    path == "/" || STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
