//! MQTT endpoint plumbing for the `selectord` bridge.
//!
//! The bridge speaks plain MQTT to a broker on the local machine; TLS broker
//! schemes are rejected. Non-loopback brokers require an explicit opt-in on
//! the command line.

use anyhow::{anyhow, Context, Result};

/// A resolved MQTT broker endpoint.
pub struct MqttEndpoint {
    pub host: String,
    pub port: u16,
}

/// Parse an MQTT broker address into host and port.
///
/// Supports formats:
/// - `host:port`
/// - `mqtt://host:port` / `tcp://host:port`
/// - `[ipv6]:port` (IPv6 with brackets)
///
/// TLS schemes (`mqtts://`, `ssl://`) are not supported by this stage and
/// fail with an explicit error.
pub fn parse_mqtt_endpoint(addr: &str) -> Result<MqttEndpoint> {
    let mut remainder = addr.trim();

    if let Some((scheme, rest)) = remainder.split_once("://") {
        match scheme {
            "mqtt" | "tcp" => {}
            "mqtts" | "ssl" => {
                return Err(anyhow!("TLS MQTT brokers are not supported: {}", addr))
            }
            other => return Err(anyhow!("unsupported MQTT scheme: {}", other)),
        }
        remainder = rest;
    }

    let (host, port) = split_host_port(remainder)?;
    Ok(MqttEndpoint { host, port })
}

fn split_host_port(addr: &str) -> Result<(String, u16)> {
    // Handle IPv6 addresses in brackets: [::1]:1883
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, rest) = rest
            .split_once(']')
            .ok_or_else(|| anyhow!("invalid MQTT address: {}", addr))?;
        let port = rest
            .strip_prefix(':')
            .ok_or_else(|| anyhow!("missing MQTT port in {}", addr))?;
        let port: u16 = port
            .parse()
            .with_context(|| format!("invalid MQTT port in {}", addr))?;
        return Ok((host.to_string(), port));
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("missing MQTT port in {}", addr))?;
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid MQTT port in {}", addr))?;
    Ok((host.to_string(), port))
}

/// Validate that the endpoint is loopback.
pub fn validate_loopback_addr(endpoint: &MqttEndpoint, original: &str) -> Result<()> {
    let host = endpoint.host.as_str();
    if host == "localhost" || host == "127.0.0.1" || host == "::1" {
        return Ok(());
    }
    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        if ip.is_loopback() {
            return Ok(());
        }
    }
    Err(anyhow!(
        "MQTT broker must be loopback: {} (use --allow-remote-mqtt to override)",
        original
    ))
}
