//! Client identification utilities
//!
//! Common functions for identifying clients via HTTP headers.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Default device title when the client sends no User-Agent.
pub const UNKNOWN_DEVICE: &str = "Unknown device";

/// Client identity attached to a device session
///
/// The title is the raw User-Agent string; it is display data, not a
/// trust anchor.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub ip: Option<IpAddr>,
    /// Human-readable device title (User-Agent or "Unknown device")
    pub device_title: String,
}

impl DeviceInfo {
    pub fn new(ip: Option<IpAddr>, device_title: String) -> Self {
        Self { ip, device_title }
    }

    /// Get IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Extract device info from request headers
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
pub fn extract_device_info(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> DeviceInfo {
    let device_title = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.to_string())
        .unwrap_or_else(|| UNKNOWN_DEVICE.to_string());

    DeviceInfo::new(extract_client_ip(headers, direct_ip), device_title)
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    // Check X-Forwarded-For header (first IP in the list)
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}
