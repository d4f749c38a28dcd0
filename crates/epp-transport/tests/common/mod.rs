//! Integration test helpers: a minimal TLS EPP server.
//!
//! Provides:
//! - Self-signed certificates via rcgen
//! - A one-shot TLS listener that sends a greeting and answers from a script

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use epp_core::{read_frame, write_frame};
use rustls::pki_types::{CertificateDer, PrivatePkcs8KeyDer};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;

/// Default timeout for test operations.
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const GREETING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<epp xmlns="urn:ietf:params:xml:ns:epp-1.0">
  <greeting>
    <svID>Test EPP server</svID>
    <svDate>2025-01-01T00:00:00Z</svDate>
  </greeting>
</epp>"#;

/// What the stub server does once the TLS handshake is done.
#[allow(dead_code)]
pub enum Script {
    /// Send the greeting, then answer each request with the next reply.
    Replies(Vec<String>),
    /// Send a header promising more bytes than follow, then hang up.
    TruncatedGreeting,
}

/// Self-signed server identity.
pub struct TestCert {
    pub cert: CertificateDer<'static>,
    key_der: Vec<u8>,
}

impl TestCert {
    /// Generates a certificate for `names`.
    pub fn generate(names: &[&str]) -> Self {
        let certified = rcgen::generate_simple_self_signed(
            names.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
        )
        .expect("Certificate generation failed");

        Self {
            cert: certified.cert.der().clone(),
            key_der: certified.key_pair.serialize_der(),
        }
    }

    fn acceptor(&self) -> TlsAcceptor {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("Protocol versions")
            .with_no_client_auth()
            .with_single_cert(
                vec![self.cert.clone()],
                PrivatePkcs8KeyDer::from(self.key_der.clone()).into(),
            )
            .expect("Server config");
        TlsAcceptor::from(Arc::new(config))
    }
}

/// Running stub server.
pub struct TestServer {
    pub addr: SocketAddr,
    /// Yields every request payload the server received.
    pub task: JoinHandle<Vec<String>>,
}

/// Installs a tracing subscriber once; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Starts a stub server that accepts one TLS connection and runs `script`.
pub async fn spawn_server(cert: &TestCert, script: Script) -> TestServer {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Bind failed");
    let addr = listener.local_addr().expect("No local address");
    let acceptor = cert.acceptor();

    let task = tokio::spawn(async move {
        let mut requests = Vec::new();
        let Ok((tcp, _)) = listener.accept().await else {
            return requests;
        };
        // Handshake failures are expected in negative tests.
        let Ok(mut tls) = acceptor.accept(tcp).await else {
            return requests;
        };

        match script {
            Script::TruncatedGreeting => {
                let _ = tls.write_all(&500u32.to_be_bytes()).await;
                let _ = tls.write_all(b"<epp>").await;
                let _ = tls.shutdown().await;
            }
            Script::Replies(replies) => {
                if write_frame(&mut tls, GREETING.as_bytes()).await.is_err() {
                    return requests;
                }
                for reply in replies {
                    let Ok(request) = read_frame(&mut tls).await else {
                        break;
                    };
                    requests.push(String::from_utf8_lossy(request.payload()).into_owned());
                    if write_frame(&mut tls, reply.as_bytes()).await.is_err() {
                        break;
                    }
                }
                let _ = tls.shutdown().await;
            }
        }
        requests
    });

    TestServer { addr, task }
}

/// Minimal EPP response carrying `code`.
#[allow(dead_code)]
pub fn result_response(code: u16, msg: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<epp xmlns="urn:ietf:params:xml:ns:epp-1.0">
  <response>
    <result code="{code}"><msg>{msg}</msg></result>
  </response>
</epp>"#
    )
}
