pub mod async_poll;
pub mod http;

use std::fmt;

/// Port the local backend listens on.
pub const BACKEND_PORT: u16 = 8000;

/// Where the client is currently running. Asked again for every request,
/// so a host change is picked up by the next call.
pub trait HostSource: Send + Sync {
    fn hostname(&self) -> String;
}

impl<F> HostSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn hostname(&self) -> String {
        self()
    }
}

/// A host that never changes.
#[derive(Debug, Clone)]
pub struct StaticHost(pub String);

impl StaticHost {
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }
}

impl HostSource for StaticHost {
    fn hostname(&self) -> String {
        self.0.clone()
    }
}

/// `http://<host>:<port>` for one request. Never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddress(String);

impl BackendAddress {
    pub fn resolve(host: &dyn HostSource, port: u16) -> Self {
        Self(format!("http://{}:{port}", host.hostname()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full URL for an endpoint. The endpoint is used as given.
    pub fn join(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.0)
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
