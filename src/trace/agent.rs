//! Trace agent client
//!
//! Ships recorded spans to an external trace agent over a Unix-domain
//! socket. Each message is a JSON object prefixed with a 4-byte big-endian
//! length; the agent answers every message with a frame of its own, which is
//! read and discarded.
//!
//! The whole channel is fire-and-forget: connection, registration, and send
//! failures are printed to stderr and swallowed. A missing or unreachable
//! agent never changes the interpreter's behavior or exit status.

use super::SpanRecord;
use serde::Serialize;
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{env, thread};

/// Environment variable naming the agent socket path.
pub const SOCKET_ENV: &str = "TAPEFOLD_AGENT_SOCKET";
/// Environment variable naming the application for registration.
pub const NAME_ENV: &str = "TAPEFOLD_AGENT_NAME";
/// Environment variable carrying the registration key.
pub const KEY_ENV: &str = "TAPEFOLD_AGENT_KEY";

const DEFAULT_SOCKET_PATH: &str = "./tapefold-agent.sock";
const CONNECT_ATTEMPTS: u32 = 5;
const RETRY_WAIT: Duration = Duration::from_secs(1);

/// Agent connection settings resolved from the environment.
pub struct AgentConfig {
    pub socket_path: PathBuf,
    pub app: String,
    pub key: String,
}

impl AgentConfig {
    /// Returns `Some` only when reporting was requested by setting at least
    /// one of [`SOCKET_ENV`] or [`NAME_ENV`]. An unconfigured run never pays
    /// the connection-retry cost.
    pub fn from_env() -> Option<Self> {
        let socket = env::var_os(SOCKET_ENV);
        let name = env::var(NAME_ENV).ok();
        if socket.is_none() && name.is_none() {
            return None;
        }

        Some(Self {
            socket_path: socket
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH)),
            app: name.unwrap_or_else(|| "tapefold".to_string()),
            key: env::var(KEY_ENV).unwrap_or_default(),
        })
    }
}

/// Wire messages, serialized externally tagged: `{"StartSpan": {...}}`.
#[derive(Debug, Serialize)]
enum Command {
    Register {
        app: String,
        key: String,
        language: &'static str,
        api_version: &'static str,
    },
    StartRequest {
        timestamp: f64,
        request_id: String,
    },
    StartSpan {
        timestamp: f64,
        request_id: String,
        span_id: String,
        parent_id: Option<String>,
        operation: String,
    },
    StopSpan {
        timestamp: f64,
        request_id: String,
        span_id: String,
    },
    FinishRequest {
        timestamp: f64,
        request_id: String,
    },
}

/// Report one run's spans to the agent.
///
/// Sends Register, StartRequest, then a controller span named
/// `Controller/<controller>` wrapping one StartSpan/StopSpan pair per
/// record, and finally FinishRequest. Any failure aborts the report with a
/// message on stderr.
pub fn report(
    config: &AgentConfig,
    records: &[SpanRecord],
    start: SystemTime,
    controller: &str,
) {
    let mut client = match AgentClient::connect(&config.socket_path) {
        Ok(client) => client,
        Err(e) => {
            eprintln!(
                "Trace agent: could not connect to {}: {}",
                config.socket_path.display(),
                e
            );
            return;
        }
    };

    let request_id = wire_id();
    let controller_span_id = wire_id();
    let last_stop = records.last().map(|r| r.stop).unwrap_or(start);

    let result = (|| -> io::Result<()> {
        client.send(&Command::Register {
            app: config.app.clone(),
            key: config.key.clone(),
            language: "tape",
            api_version: "1.0",
        })?;
        client.send(&Command::StartRequest {
            timestamp: epoch_seconds(start),
            request_id: request_id.clone(),
        })?;
        client.send(&Command::StartSpan {
            timestamp: epoch_seconds(start),
            request_id: request_id.clone(),
            span_id: controller_span_id.clone(),
            parent_id: None,
            operation: format!("Controller/{}", controller),
        })?;

        for record in records {
            let span_id = wire_id();
            client.send(&Command::StartSpan {
                timestamp: epoch_seconds(record.start),
                request_id: request_id.clone(),
                span_id: span_id.clone(),
                parent_id: Some(controller_span_id.clone()),
                operation: record.name.clone(),
            })?;
            client.send(&Command::StopSpan {
                timestamp: epoch_seconds(record.stop),
                request_id: request_id.clone(),
                span_id,
            })?;
        }

        client.send(&Command::StopSpan {
            timestamp: epoch_seconds(last_stop),
            request_id: request_id.clone(),
            span_id: controller_span_id,
        })?;
        client.send(&Command::FinishRequest {
            timestamp: epoch_seconds(last_stop),
            request_id,
        })
    })();

    if let Err(e) = result {
        eprintln!("Trace agent: report failed: {}", e);
    }
}

/// A connected agent socket.
struct AgentClient {
    socket: UnixStream,
}

impl AgentClient {
    fn connect(path: &Path) -> io::Result<Self> {
        let mut last_err = None;
        for attempt in 0..CONNECT_ATTEMPTS {
            if attempt > 0 {
                thread::sleep(RETRY_WAIT);
            }
            match UnixStream::connect(path) {
                Ok(socket) => return Ok(Self { socket }),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "no connect attempts")))
    }

    fn send(&mut self, command: &Command) -> io::Result<()> {
        let body = serde_json::to_vec(command)?;
        self.socket
            .write_all(&(body.len() as u32).to_be_bytes())?;
        self.socket.write_all(&body)?;
        self.read_response()
    }

    /// Read and discard the agent's length-prefixed reply.
    fn read_response(&mut self) -> io::Result<()> {
        let mut len_buf = [0u8; 4];
        self.socket.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut body = vec![0u8; len];
        self.socket.read_exact(&mut body)
    }
}

fn epoch_seconds(t: SystemTime) -> f64 {
    t.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// 24-character lowercase hex identifier for requests and spans.
fn wire_id() -> String {
    let bytes: [u8; 12] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    #[test]
    fn test_wire_id_shape() {
        let id = wire_id();
        assert_eq!(id.len(), 24);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_command_serialization_is_externally_tagged() {
        let value = serde_json::to_value(Command::StopSpan {
            timestamp: 12.5,
            request_id: "r".to_string(),
            span_id: "s".to_string(),
        })
        .unwrap();

        assert_eq!(value["StopSpan"]["timestamp"], 12.5);
        assert_eq!(value["StopSpan"]["span_id"], "s");
    }

    #[test]
    fn test_send_frames_and_reads_reply() {
        let path = env::temp_dir().join(format!("tapefold-agent-test-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).expect("bind test socket");

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut len_buf = [0u8; 4];
            stream.read_exact(&mut len_buf).expect("read length");
            let len = u32::from_be_bytes(len_buf) as usize;
            let mut body = vec![0u8; len];
            stream.read_exact(&mut body).expect("read body");

            let reply = b"{}";
            stream
                .write_all(&(reply.len() as u32).to_be_bytes())
                .expect("write length");
            stream.write_all(reply).expect("write reply");

            serde_json::from_slice::<serde_json::Value>(&body).expect("valid JSON")
        });

        let mut client = AgentClient::connect(&path).expect("connect");
        client
            .send(&Command::StartRequest {
                timestamp: 1.0,
                request_id: "abc".to_string(),
            })
            .expect("send");

        let received = server.join().expect("server thread");
        assert_eq!(received["StartRequest"]["request_id"], "abc");
        let _ = std::fs::remove_file(&path);
    }
}
