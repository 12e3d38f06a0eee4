use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:7000";

/// Process configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub seed: Option<PathBuf>,
    pub tls: Option<TlsPaths>,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = get("CATALOG_ADDR")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| anyhow::anyhow!("CATALOG_ADDR {:?}: {}", addr, e))?;
        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            _ => None,
        };
        Ok(Self {
            addr,
            seed: get("CATALOG_SEED").filter(|s| !s.is_empty()).map(PathBuf::from),
            tls,
            cors_origin: get("CORS_ALLOW_ORIGIN").filter(|s| !s.is_empty() && s != "*"),
        })
    }
}
