//! Scripted in-memory registry for operation tests.
//!
//! Each connect hands out one end of a `tokio::io::duplex` pipe while a
//! spawned task plays the registry: greeting first, then one scripted reply
//! per request. Once the script runs out the task keeps reading until the
//! client closes, so stray requests are still recorded.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use epp_core::{read_frame, write_frame};
use epp_registrar::{Registrar, RegistrarConfig};
use epp_transport::{Connect, Connection, Endpoint};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

/// Per-frame deadline of every scripted connection.
pub const READ_DEADLINE: Duration = Duration::from_secs(2);

pub const GREETING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<epp xmlns="urn:ietf:params:xml:ns:epp-1.0"><greeting><svID>Scripted registry</svID></greeting></epp>"#;

/// A scripted server reply.
#[derive(Clone)]
pub enum Reply {
    /// A complete frame.
    Xml(String),
    /// A header promising more bytes than follow, then hang up.
    Truncated,
}

/// What the server saw on one connection.
#[derive(Debug, Default)]
pub struct Transcript {
    pub requests: Vec<String>,
    /// The client closed its side.
    pub closed: bool,
}

/// `Connect` implementation backed by a scripted registry.
#[derive(Clone)]
pub struct ScriptedRegistry {
    script: Vec<Reply>,
    refuse: bool,
    connects: Arc<AtomicUsize>,
    sessions: Arc<Mutex<Vec<JoinHandle<Transcript>>>>,
}

impl ScriptedRegistry {
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            script,
            refuse: false,
            connects: Arc::new(AtomicUsize::new(0)),
            sessions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A registry that refuses every connection.
    pub fn unreachable() -> Self {
        Self {
            refuse: true,
            ..Self::new(Vec::new())
        }
    }

    /// Connection attempts so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Waits for every server task and returns their transcripts.
    pub async fn transcripts(&self) -> Vec<Transcript> {
        let handles: Vec<_> = self.sessions.lock().unwrap().drain(..).collect();
        let mut out = Vec::new();
        for handle in handles {
            out.push(
                tokio::time::timeout(Duration::from_secs(5), handle)
                    .await
                    .expect("server task did not finish")
                    .expect("server task panicked"),
            );
        }
        out
    }

    /// Requests seen on the only connection.
    pub async fn single_transcript(&self) -> Transcript {
        let mut transcripts = self.transcripts().await;
        assert_eq!(transcripts.len(), 1, "expected exactly one connection");
        transcripts.remove(0)
    }
}

#[async_trait]
impl Connect for ScriptedRegistry {
    type Stream = DuplexStream;

    async fn connect(&self, endpoint: &Endpoint) -> epp_transport::Result<Connection<DuplexStream>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(epp_transport::Error::ConnectionFailed(format!(
                "Failed to connect to EPP server {endpoint}: connection refused"
            )));
        }

        let (client, server) = tokio::io::duplex(64 * 1024);
        let handle = tokio::spawn(serve(server, self.script.clone()));
        self.sessions.lock().unwrap().push(handle);

        Connection::establish(client, endpoint.to_string(), READ_DEADLINE).await
    }
}

async fn serve(mut stream: DuplexStream, script: Vec<Reply>) -> Transcript {
    let mut transcript = Transcript::default();
    if write_frame(&mut stream, GREETING.as_bytes()).await.is_err() {
        return transcript;
    }

    let mut replies = script.into_iter();
    loop {
        let request = match read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(_) => {
                transcript.closed = true;
                return transcript;
            }
        };
        transcript
            .requests
            .push(String::from_utf8_lossy(request.payload()).into_owned());

        match replies.next() {
            Some(Reply::Xml(xml)) => {
                if write_frame(&mut stream, xml.as_bytes()).await.is_err() {
                    return transcript;
                }
            }
            Some(Reply::Truncated) => {
                let _ = stream.write_all(&200u32.to_be_bytes()).await;
                let _ = stream.write_all(b"<epp>").await;
                let _ = stream.shutdown().await;
            }
            // Unscripted request: leave it unanswered.
            None => {}
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

pub fn registrar(registry: &ScriptedRegistry) -> Registrar<ScriptedRegistry> {
    init_tracing();
    let config = RegistrarConfig::new("TESTIPS", "s3cret", true);
    Registrar::with_connector(&config, registry.clone())
}

pub fn result(code: u16, msg: &str) -> Reply {
    Reply::Xml(format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<epp xmlns="urn:ietf:params:xml:ns:epp-1.0">
  <response>
    <result code="{code}"><msg>{msg}</msg></result>
    <trID><svTRID>test-1</svTRID></trID>
  </response>
</epp>"#
    ))
}

pub fn login_ok() -> Reply {
    result(1000, "Command completed successfully")
}

pub fn logout_ok() -> Reply {
    result(1500, "Command completed successfully; ending session")
}

pub fn check_response(name: &str, avail: &str) -> Reply {
    Reply::Xml(format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<epp xmlns="urn:ietf:params:xml:ns:epp-1.0">
  <response>
    <result code="1000"><msg>Command completed successfully</msg></result>
    <resData>
      <domain:chkData xmlns:domain="urn:ietf:params:xml:ns:domain-1.0">
        <domain:cd><domain:name avail="{avail}">{name}</domain:name></domain:cd>
      </domain:chkData>
    </resData>
  </response>
</epp>"#
    ))
}

pub fn info_response(name: &str) -> Reply {
    Reply::Xml(format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<epp xmlns="urn:ietf:params:xml:ns:epp-1.0">
  <response>
    <result code="1000"><msg>Command completed successfully</msg></result>
    <resData>
      <domain:infData xmlns:domain="urn:ietf:params:xml:ns:domain-1.0">
        <domain:name>{name}</domain:name>
        <domain:roid>123456-UK</domain:roid>
        <domain:registrant>ABC123</domain:registrant>
        <domain:ns>
          <domain:hostObj>ns1.example.net</domain:hostObj>
          <domain:hostObj>ns2.example.net</domain:hostObj>
        </domain:ns>
        <domain:clID>TESTIPS</domain:clID>
        <domain:crDate>2020-03-15T10:20:30Z</domain:crDate>
        <domain:exDate>2026-03-15T10:20:30Z</domain:exDate>
        <domain:authInfo>
          <domain:pw>Xy7-auth</domain:pw>
        </domain:authInfo>
      </domain:infData>
    </resData>
  </response>
</epp>"#
    ))
}
