// src/server.rs

// dependencies
use crate::errors::StartupError;
use crate::static_server::StaticServer;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::convert::Infallible;
use std::fs::File;
use std::future::Future;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

// struct type which represents where and how the server listens
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsFiles>,
}

// struct type which represents a PEM certificate chain and its private key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for ListenConfig {
    fn default() -> Self {
        ListenConfig {
            host: "0.0.0.0".to_string(),
            port: 4507,
            tls: None,
        }
    }
}

// struct type which represents a bound listener ready to accept connections
pub struct Server {
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    handler: Arc<StaticServer>,
}

// methods for the Server type
impl Server {
    // load TLS material and bind the listening socket; failures here are fatal
    pub async fn bind(handler: StaticServer, listen: &ListenConfig) -> Result<Self, StartupError> {
        let acceptor = match &listen.tls {
            Some(tls) => Some(TlsAcceptor::from(Arc::new(load_tls_config(tls)?))),
            None => None,
        };

        let listener = TcpListener::bind((listen.host.as_str(), listen.port))
            .await
            .map_err(|source| StartupError::Bind {
                addr: format!("{}:{}", listen.host, listen.port),
                source,
            })?;

        Ok(Server {
            listener,
            acceptor,
            handler: Arc::new(handler),
        })
    }

    // utility to return the bound address, useful when binding port 0
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    // utility to return whether connections are wrapped in TLS
    pub fn is_tls(&self) -> bool {
        self.acceptor.is_some()
    }

    // accept connections until `shutdown` resolves; each connection gets its own task
    // and in-flight connections are left to finish
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(connection) => connection,
                    Err(err) => {
                        // typically EMFILE; back off instead of spinning
                        tracing::warn!(error = %err, "failed to accept connection");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        continue;
                    }
                },
                _ = &mut shutdown => {
                    tracing::info!("shutting down, no longer accepting connections");
                    break;
                }
            };

            let handler = Arc::clone(&self.handler);
            match &self.acceptor {
                Some(acceptor) => {
                    let acceptor = acceptor.clone();
                    tokio::spawn(async move {
                        match acceptor.accept(stream).await {
                            Ok(tls_stream) => serve_connection(tls_stream, peer, handler).await,
                            Err(err) => {
                                tracing::debug!(%peer, error = %err, "TLS handshake failed");
                            }
                        }
                    });
                }
                None => {
                    tokio::spawn(serve_connection(stream, peer, handler));
                }
            }
        }
    }
}

// drive one HTTP/1.1 or HTTP/2 connection to completion
async fn serve_connection<I>(io: I, peer: SocketAddr, handler: Arc<StaticServer>)
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |request| {
        let handler = Arc::clone(&handler);
        async move { Ok::<_, Infallible>(handler.serve(request).await) }
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    if let Err(err) = builder.serve_connection(TokioIo::new(io), service).await {
        // the client went away mid-response; its open file is dropped with the body
        tracing::debug!(%peer, error = %err, "connection aborted");
    }
}

// build a rustls server configuration from PEM files
pub fn load_tls_config(tls: &TlsFiles) -> Result<rustls::ServerConfig, StartupError> {
    let certs = read_certs(&tls.cert)?;
    let key = read_private_key(&tls.key)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .and_then(|builder| builder.with_no_client_auth().with_single_cert(certs, key))
        .map_err(|err| tls_error(&tls.cert, err))?;

    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, StartupError> {
    let mut reader = BufReader::new(File::open(path).map_err(|err| tls_error(path, err))?);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| tls_error(path, err))?;

    if certs.is_empty() {
        return Err(tls_error(path, "no certificates found"));
    }
    Ok(certs)
}

fn read_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, StartupError> {
    let mut reader = BufReader::new(File::open(path).map_err(|err| tls_error(path, err))?);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|err| tls_error(path, err))?
        .ok_or_else(|| tls_error(path, "no private key found"))
}

fn tls_error(path: &Path, reason: impl ToString) -> StartupError {
    StartupError::Tls {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
