//! TLS transport implementation.
//!
//! EPP over TCP per RFC 5734: TLS is mandatory, and the server speaks first
//! with a greeting frame that is consumed as part of connecting.
//!
//! Certificate verification is on by default against the Mozilla root set
//! (`webpki-roots`). It can only be turned off through
//! [`TlsOptions::testbed`], which disables both chain and host name checks
//! for registry test environments.

use crate::connection::{Connect, Connection, Endpoint};
use crate::{Error, Result};
use async_trait::async_trait;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;


/// Hard limit on TCP connect plus TLS handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for each frame read or write.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// TLS connection settings.
#[derive(Debug, Clone)]
pub struct TlsOptions {
    /// Verify the server certificate chain and host name.
    pub verify_certificate: bool,
    /// Limit on TCP connect plus TLS handshake.
    pub connect_timeout: Duration,
    /// Deadline for each frame read or write.
    pub read_timeout: Duration,
    extra_roots: Vec<CertificateDer<'static>>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verify_certificate: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            extra_roots: Vec::new(),
        }
    }
}

impl TlsOptions {
    /// Production settings: verification on.
    pub fn production() -> Self {
        Self::default()
    }

    /// Testbed settings: certificate and host name verification off.
    pub fn testbed() -> Self {
        Self {
            verify_certificate: false,
            ..Self::default()
        }
    }

    /// Trusts an additional root certificate (DER) besides the Mozilla set.
    #[must_use]
    pub fn with_root_certificate(mut self, cert: CertificateDer<'static>) -> Self {
        self.extra_roots.push(cert);
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = limit;
        self
    }

    /// Sets the per-frame read/write deadline.
    #[must_use]
    pub fn with_read_timeout(mut self, limit: Duration) -> Self {
        self.read_timeout = limit;
        self
    }
}

/// Opens TLS connections to EPP servers.
///
/// # Example
///
/// ```no_run
/// use epp_transport::{Connect, Endpoint, TlsConnector, TlsOptions};
/// use epp_core::Frame;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = TlsConnector::new(TlsOptions::production())?;
/// let mut conn = connector.connect(&Endpoint::new("epp.nominet.uk", 700)).await?;
/// conn.send(&Frame::new("<epp>...</epp>")).await?;
/// let response = conn.recv().await?;
/// conn.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TlsConnector {
    connector: tokio_rustls::TlsConnector,
    options: TlsOptions,
}

impl TlsConnector {
    /// Builds the rustls client configuration for `options`.
    ///
    /// # Errors
    ///
    /// Returns `Error::TlsConfig` if a supplied root certificate is invalid or
    /// the protocol versions cannot be configured.
    pub fn new(options: TlsOptions) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::TlsConfig(format!("protocol versions: {e}")))?;

        let config = if options.verify_certificate {
            let mut roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            for cert in &options.extra_roots {
                roots
                    .add(cert.clone())
                    .map_err(|e| Error::TlsConfig(format!("failed to add root certificate: {e}")))?;
            }
            builder.with_root_certificates(roots).with_no_client_auth()
        } else {
            tracing::warn!("TLS certificate verification disabled (testbed mode)");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(SkipVerification { provider }))
                .with_no_client_auth()
        };

        Ok(Self {
            connector: tokio_rustls::TlsConnector::from(Arc::new(config)),
            options,
        })
    }
}

#[async_trait]
impl Connect for TlsConnector {
    type Stream = TlsStream<TcpStream>;

    async fn connect(&self, endpoint: &Endpoint) -> Result<Connection<Self::Stream>> {
        let server_name = ServerName::try_from(endpoint.host.as_str())
            .map(|name| name.to_owned())
            .map_err(|e| {
                Error::ConnectionFailed(format!("invalid server name {:?}: {e}", endpoint.host))
            })?;
        let addr = endpoint.to_string();

        tracing::debug!(peer = %addr, verify = self.options.verify_certificate, "Connecting to EPP server");

        let handshake = async {
            let tcp = TcpStream::connect(addr.as_str()).await.map_err(|e| {
                Error::ConnectionFailed(format!("Failed to connect to EPP server {addr}: {e}"))
            })?;
            tcp.set_nodelay(true)?;

            self.connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| Error::ConnectionFailed(format!("TLS handshake with {addr} failed: {e}")))
        };

        let stream = timeout(self.options.connect_timeout, handshake)
            .await
            .map_err(|_| Error::Timeout {
                operation: "connect",
            })??;

        Connection::establish(stream, addr, self.options.read_timeout).await
    }
}

/// Accepts any server certificate. Testbed use only.
///
/// Handshake signatures are still checked so the peer must hold the key for
/// the certificate it presents.
#[derive(Debug)]
struct SkipVerification {
    provider: Arc<CryptoProvider>,
}

impl rustls::client::danger::ServerCertVerifier for SkipVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> core::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> core::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> core::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
