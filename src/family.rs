use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use serde::Deserialize;

/// IP family used for outgoing connections to the update API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Family {
    V4,
    V6,
    /// No preference, dual-stack dialing.
    #[default]
    Any,
}

impl Family {
    /// Returns `true` when `value` names a family or explicitly asks for none.
    pub fn is_recognized(value: &str) -> bool {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "" | "any" | "ipv4" | "4" | "ipv6" | "6"
        )
    }

    pub fn admits(&self, ip: &IpAddr) -> bool {
        match self {
            Family::V4 => ip.is_ipv4(),
            Family::V6 => ip.is_ipv6(),
            Family::Any => true,
        }
    }

    /// Keeps the resolved addresses this family may dial, in resolver order.
    pub fn retain<I>(&self, addrs: I) -> Vec<SocketAddr>
    where
        I: IntoIterator<Item = SocketAddr>,
    {
        addrs
            .into_iter()
            .filter(|addr| self.admits(&addr.ip()))
            .collect()
    }
}

impl From<&str> for Family {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ipv4" | "4" => Family::V4,
            "ipv6" | "6" => Family::V6,
            _ => Family::Any,
        }
    }
}

impl From<String> for Family {
    fn from(value: String) -> Self {
        Family::from(value.as_str())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::V4 => "ipv4",
            Family::V6 => "ipv6",
            Family::Any => "any",
        })
    }
}

/// Resolver that only hands the connector addresses of one family.
#[derive(Debug, Clone, Copy)]
pub struct FamilyResolver {
    family: Family,
}

impl FamilyResolver {
    pub fn new(family: Family) -> Self {
        Self { family }
    }
}

impl Resolve for FamilyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(lookup(self.family, name))
    }
}

async fn lookup(
    family: Family,
    name: Name,
) -> Result<Addrs, Box<dyn std::error::Error + Send + Sync>> {
    // Port is replaced by the connector.
    let resolved = tokio::net::lookup_host((name.as_str(), 0)).await?;
    let addrs = family.retain(resolved);
    if addrs.is_empty() {
        let err = io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no {} address found for {}", family, name.as_str()),
        );
        return Err(err.into());
    }
    Ok(Box::new(addrs.into_iter()))
}
