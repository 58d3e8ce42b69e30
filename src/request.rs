use std::fmt;

use reqwest::Url;

use crate::error::UpdateError;
use crate::family::Family;

pub const DEFAULT_BASE: &str = "https://ydns.io/api/v1/update/";

const REDACTED: &str = "***";

/// Basic-auth pair for the update API. `Debug` never shows either half.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    pass: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn pass(&self) -> &str {
        &self.pass
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &REDACTED)
            .field("pass", &REDACTED)
            .finish()
    }
}

/// Everything needed to ask the API to update one host record.
#[derive(Clone)]
pub struct UpdateRequest {
    pub base: String,
    pub host: String,
    /// Left out to let the server use the caller's address.
    pub ip: Option<String>,
    pub record_id: Option<String>,
    pub credentials: Credentials,
    pub family: Family,
}

/// Output of [`UpdateRequest::build`]: where to send the GET and who to authenticate as.
#[derive(Debug, Clone)]
pub struct UpdateTarget {
    pub url: Url,
    pub credentials: Credentials,
}

impl UpdateRequest {
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base: DEFAULT_BASE.to_string(),
            host: host.into(),
            ip: None,
            record_id: None,
            credentials,
            family: Family::Any,
        }
    }

    /// Builds the target URL. Any query already on the base is replaced and
    /// parameters are written in key order so the URL is reproducible.
    pub fn build(&self) -> Result<UpdateTarget, UpdateError> {
        let mut url = Url::parse(&self.base).map_err(|e| UpdateError::InvalidBaseUrl {
            base: self.base.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(UpdateError::InvalidBaseUrl {
                base: self.base.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }

        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("host", &self.host);
            if let Some(ip) = non_empty(&self.ip) {
                query.append_pair("ip", ip);
            }
            if let Some(record_id) = non_empty(&self.record_id) {
                query.append_pair("record_id", record_id);
            }
        }

        Ok(UpdateTarget {
            url,
            credentials: self.credentials.clone(),
        })
    }
}

impl fmt::Debug for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateRequest")
            .field("base", &self.base)
            .field("host", &self.host)
            .field("ip", &self.ip)
            .field("record_id", &self.record_id)
            .field("user", &REDACTED)
            .field("pass", &REDACTED)
            .field("family", &self.family)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
