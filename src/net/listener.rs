//! Listener construction.
//!
//! # Responsibilities
//! - Bind plain TCP listeners
//! - Bind TCP listeners with a rustls configuration for TLS
//! - Bind Unix-domain socket listeners with a file mode

use std::fmt;
use std::fs::{self, Permissions};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::{TcpListener, UnixListener};

use crate::config::schema::{ListenerConfig, ListenerKind};
use crate::config::validation::parse_mode;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to load TLS certificate: {0}")]
    Tls(#[source] io::Error),

    #[error("TLS listener configured without certificate and key")]
    MissingTls,

    #[error("Invalid socket mode: {0}")]
    InvalidMode(String),

    #[error("Failed to prepare socket {path:?}: {source}")]
    Socket {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A listener bound and ready to be served.
pub enum BoundListener {
    Tcp(TcpListener),
    Tls {
        listener: std::net::TcpListener,
        config: RustlsConfig,
    },
    Unix {
        listener: UnixListener,
        path: PathBuf,
    },
}

impl fmt::Display for BoundListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundListener::Tcp(listener) => match listener.local_addr() {
                Ok(addr) => write!(f, "http://{addr}"),
                Err(_) => write!(f, "http://<unknown>"),
            },
            BoundListener::Tls { listener, .. } => match listener.local_addr() {
                Ok(addr) => write!(f, "https://{addr}"),
                Err(_) => write!(f, "https://<unknown>"),
            },
            BoundListener::Unix { path, .. } => write!(f, "unix:{}", path.display()),
        }
    }
}

fn socket_addr(ip: &str, port: u16) -> Result<SocketAddr, ListenerError> {
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| ListenerError::InvalidAddress(ip.to_string()))?;
    Ok(SocketAddr::new(ip, port))
}

/// Bind a plain TCP listener on `ip:port`.
pub async fn tcp(ip: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let addr = socket_addr(ip, port)?;
    let listener = TcpListener::bind(addr).await.map_err(|source| ListenerError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    tracing::info!(address = %addr, "TCP listener bound");
    Ok(listener)
}

/// Bind `ip:port` and load the PEM certificate and key for TLS.
pub async fn tls(
    ip: &str,
    port: u16,
    cert_path: &Path,
    key_path: &Path,
) -> Result<(std::net::TcpListener, RustlsConfig), ListenerError> {
    for (what, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(ListenerError::Tls(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{what} file not found: {path:?}"),
            )));
        }
    }
    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(ListenerError::Tls)?;

    let addr = socket_addr(ip, port)?;
    let bind_error = |source| ListenerError::Bind {
        addr: addr.to_string(),
        source,
    };
    let listener = std::net::TcpListener::bind(addr).map_err(bind_error)?;
    listener.set_nonblocking(true).map_err(bind_error)?;

    tracing::info!(address = %addr, cert = ?cert_path, "TLS listener bound");
    Ok((listener, config))
}

/// Bind a Unix-domain socket at `path` and apply `mode` to the socket file.
///
/// A stale socket file left by a previous run is removed first.
pub fn unix(path: &Path, mode: u32) -> Result<UnixListener, ListenerError> {
    let socket_error = |source| ListenerError::Socket {
        path: path.to_path_buf(),
        source,
    };

    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = ?path, "Removed stale socket file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(socket_error(e)),
    }

    let listener = UnixListener::bind(path).map_err(socket_error)?;
    fs::set_permissions(path, Permissions::from_mode(mode)).map_err(socket_error)?;

    tracing::info!(path = ?path, mode = %format!("{mode:o}"), "Unix listener bound");
    Ok(listener)
}

/// Bind the listener described by `config`.
pub async fn bind(config: &ListenerConfig) -> Result<BoundListener, ListenerError> {
    match config.kind {
        ListenerKind::Tcp => Ok(BoundListener::Tcp(tcp(&config.ip, config.port).await?)),
        ListenerKind::Tls => {
            let files = config.tls.as_ref().ok_or(ListenerError::MissingTls)?;
            let (listener, tls_config) = tls(
                &config.ip,
                config.port,
                Path::new(&files.cert_path),
                Path::new(&files.key_path),
            )
            .await?;
            Ok(BoundListener::Tls {
                listener,
                config: tls_config,
            })
        }
        ListenerKind::Unix => {
            let mode = parse_mode(&config.socket_mode)
                .ok_or_else(|| ListenerError::InvalidMode(config.socket_mode.clone()))?;
            let path = PathBuf::from(&config.socket_path);
            let listener = unix(&path, mode)?;
            Ok(BoundListener::Unix { listener, path })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_binds_ephemeral_port() {
        let listener = tcp("127.0.0.1", 0).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_tcp_rejects_bad_ip() {
        assert!(matches!(tcp("localhost:80", 0).await, Err(ListenerError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_tls_missing_files() {
        let err = tls("127.0.0.1", 0, Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem"))
            .await
            .unwrap_err();
        match err {
            ListenerError::Tls(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unix_replaces_stale_socket_and_sets_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.sock");
        fs::write(&path, b"stale").unwrap();

        let _listener = unix(&path, 0o600).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_bind_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ListenerConfig {
            kind: ListenerKind::Unix,
            socket_path: dir.path().join("bind.sock").display().to_string(),
            ..ListenerConfig::default()
        };
        let bound = bind(&config).await.unwrap();
        assert!(bound.to_string().starts_with("unix:"));

        config.kind = ListenerKind::Tls;
        assert!(matches!(bind(&config).await, Err(ListenerError::MissingTls)));
    }
}
