use std::net::IpAddr;
use std::sync::Arc;

use log::{debug, info};
use reqwest::{Client, Url};

use crate::error::UpdateError;
use crate::family::{Family, FamilyResolver};
use crate::request::UpdateRequest;

const USER_AGENT: &str = concat!("ydns-updater/", env!("CARGO_PKG_VERSION"));

/// Sends one update to the API per [`Updater::run`].
#[derive(Debug, Clone)]
pub struct Updater {
    request: UpdateRequest,
}

impl Updater {
    pub fn new(request: UpdateRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &UpdateRequest {
        &self.request
    }

    pub async fn run(&self) -> Result<(), UpdateError> {
        let target = self.request.build()?;

        info!("updating record: {:?}", self.request);

        // Fresh client per run so no pooled connection outlives its family.
        let client = build_client(self.request.family)?;
        check_literal_host(&target.url, self.request.family)?;

        let response = client
            .get(target.url)
            .basic_auth(
                target.credentials.user(),
                Some(target.credentials.pass()),
            )
            .send()
            .await
            .map_err(|e| UpdateError::transport(e.without_url()))?;

        let status = response.status();
        let body = response.text().await.map_err(UpdateError::BodyRead)?;

        debug!(
            "got response from api: status={} body={:?}",
            status.as_u16(),
            body.trim_end()
        );

        UpdateError::check_status(status)?;

        info!("update was successful: host={}", self.request.host);
        Ok(())
    }
}

/// Builds an HTTP client whose connections are restricted to `family`.
pub fn build_client(family: Family) -> Result<Client, UpdateError> {
    let mut builder = Client::builder().user_agent(USER_AGENT);

    if family != Family::Any {
        builder = builder.dns_resolver(Arc::new(FamilyResolver::new(family)));
    }

    builder.build().map_err(UpdateError::transport)
}

/// IP-literal hosts never reach the resolver, so the family is enforced here.
fn check_literal_host(url: &Url, family: Family) -> Result<(), UpdateError> {
    let Some(host) = url.host_str() else {
        return Ok(());
    };
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    let Ok(ip) = literal.parse::<IpAddr>() else {
        return Ok(());
    };

    if family.admits(&ip) {
        Ok(())
    } else {
        Err(UpdateError::transport(format!(
            "cannot dial {ip} over {family}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Credentials;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn literal_hosts_must_match_the_family() {
        assert!(check_literal_host(&url("http://127.0.0.1/"), Family::V4).is_ok());
        assert!(check_literal_host(&url("http://[::1]/"), Family::V6).is_ok());
        assert!(check_literal_host(&url("http://[::1]/"), Family::Any).is_ok());

        let err = check_literal_host(&url("http://127.0.0.1/"), Family::V6).unwrap_err();
        assert!(matches!(err, UpdateError::Transport(_)));
        assert_eq!(
            err.to_string(),
            "cannot perform http get: cannot dial 127.0.0.1 over ipv6"
        );

        let err = check_literal_host(&url("http://[::1]/"), Family::V4).unwrap_err();
        assert!(matches!(err, UpdateError::Transport(_)));
    }

    #[test]
    fn named_hosts_are_left_to_the_resolver() {
        assert!(check_literal_host(&url("https://ydns.io/"), Family::V4).is_ok());
        assert!(check_literal_host(&url("https://ydns.io/"), Family::V6).is_ok());
    }

    #[test]
    fn clients_build_for_every_family() {
        for family in [Family::V4, Family::V6, Family::Any] {
            assert!(build_client(family).is_ok(), "family {family}");
        }
    }

    #[tokio::test]
    async fn invalid_base_fails_before_any_request() {
        let mut request = UpdateRequest::new("test-1.com", Credentials::new("user", "pass"));
        request.base = "::nope::".to_string();

        let err = Updater::new(request).run().await.unwrap_err();
        assert!(matches!(err, UpdateError::InvalidBaseUrl { .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // Grab a free port, then close it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut request = UpdateRequest::new("test-1.com", Credentials::new("user", "secret-pass"));
        request.base = format!("http://{addr}/");

        let err = Updater::new(request).run().await.unwrap_err();
        assert!(matches!(err, UpdateError::Transport(_)), "got {err:?}");
        assert!(!err.to_string().contains("secret-pass"));
    }
}
