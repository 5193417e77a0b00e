//! Fakes standing in for the TV.

use webos_ip::connection::Connector;
use webos_ip::{ClientConfig, Codec, RedactedKey};

use std::collections::VecDeque;
use std::io::{Error as IoError, ErrorKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, duplex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const PAIRING_KEY: &str = "ABCD1234";
pub const WIRED_MAC: &str = "a8:23:fe:00:00:01";
pub const WIFI_MAC: &str = "a8:23:fe:00:00:02";

// Not a whole number of cipher blocks.
const GARBAGE_REPLY: [u8; 20] = [
    0x3f, 0x91, 0x07, 0xc4, 0x5e, 0xaa, 0x12, 0x80, 0xfe, 0x6b, 0x29, 0xd3, 0x44, 0x0c, 0xb7, 0x71,
    0x9a, 0x05, 0xe8, 0x36,
];

pub fn codec() -> Codec {
    Codec::new(&RedactedKey::new(PAIRING_KEY)).expect("key derivation")
}

pub fn config(address: &str) -> ClientConfig {
    ClientConfig::new(address, RedactedKey::new(PAIRING_KEY))
}

/// Poll `check` every 20 ms until it holds or `limit` passes.
pub async fn eventually(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// Replies the way a TV with fixed settings would, tracking the foreground app.
#[derive(Debug)]
struct TvModel {
    current_app: String,
}

impl TvModel {
    fn reply(&mut self, command: &str) -> String {
        match command {
            "GET_MACADDRESS wired" => WIRED_MAC.to_string(),
            "GET_MACADDRESS wifi" => WIFI_MAC.to_string(),
            "MUTE_STATE" => String::from("MUTE:on"),
            "CURRENT_VOL" => String::from("VOL:37"),
            "CURRENT_APP" => format!("APP:{}", self.current_app),
            "GET_IPCONTROL_STATE" => String::from("ON"),
            _ => {
                if let Some(input) = command.strip_prefix("INPUT_SELECT ") {
                    self.current_app = format!("com.webos.app.{input}");
                } else if let Some(app) = command.strip_prefix("APP_LAUNCH ") {
                    self.current_app = app.to_string();
                }
                String::from("OK")
            }
        }
    }
}

/// Serve the protocol on `stream` until the peer goes away.
async fn serve<S>(mut stream: S, codec: Codec, model: Arc<Mutex<TvModel>>, log: CommandLog)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 1024];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let Ok(plaintext) = codec.decode(&buf[..n]) else {
            return;
        };
        let command = String::from_utf8_lossy(&plaintext).trim().to_string();
        let reply = model.lock().expect("model lock").reply(&command);
        log.record(command);

        let frame = codec.encode(format!("{reply}\n").as_bytes());
        if stream.write_all(&frame).await.is_err() {
            return;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<(Instant, String)>>>);

impl CommandLog {
    fn record(&self, command: String) {
        self.0.lock().expect("log lock").push((Instant::now(), command));
    }

    pub fn commands(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, c)| c).collect()
    }

    pub fn entries(&self) -> Vec<(Instant, String)> {
        self.0.lock().expect("log lock").clone()
    }

    pub fn contains(&self, command: &str) -> bool {
        self.commands().iter().any(|c| c == command)
    }
}

/// A TV listening on a real loopback socket.
pub struct FakeTv {
    pub address: String,
    pub log: CommandLog,
    task: JoinHandle<()>,
}

impl FakeTv {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let address = listener.local_addr().expect("local addr").to_string();
        let log = CommandLog::default();
        let model = Arc::new(Mutex::new(TvModel {
            current_app: String::from("com.webos.app.livetv"),
        }));

        let task_log = log.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, codec(), model.clone(), task_log.clone()));
            }
        });

        Self { address, log, task }
    }
}

impl Drop for FakeTv {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// What the next `connect` call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dial error.
    Fail,
    /// A stream whose peer is gone; the first write fails.
    Broken,
    /// A stream whose peer never answers; every read times out.
    Silent,
    /// A stream answered by the fake TV.
    Responsive,
    /// A stream whose peer answers every command with bytes that do not decode.
    Garbled,
}

/// In-memory connector following a script of outcomes.
#[derive(Clone)]
pub struct ScriptedConnector {
    script: Arc<Mutex<VecDeque<Outcome>>>,
    fallback: Outcome,
    attempts: Arc<Mutex<Vec<Instant>>>,
    // Keeps silent peers open.
    peers: Arc<Mutex<Vec<DuplexStream>>>,
    pub log: CommandLog,
}

impl ScriptedConnector {
    pub fn new(script: impl IntoIterator<Item = Outcome>, fallback: Outcome) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            fallback,
            attempts: Arc::new(Mutex::new(Vec::new())),
            peers: Arc::new(Mutex::new(Vec::new())),
            log: CommandLog::default(),
        }
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().expect("attempts lock").clone()
    }
}

impl Connector for ScriptedConnector {
    type Stream = DuplexStream;

    fn address(&self) -> &str {
        "scripted-tv:9761"
    }

    async fn connect(&self) -> Result<DuplexStream, IoError> {
        self.attempts.lock().expect("attempts lock").push(Instant::now());
        let outcome = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(self.fallback);

        match outcome {
            Outcome::Fail => Err(IoError::new(ErrorKind::ConnectionRefused, "scripted refusal")),
            Outcome::Broken => {
                let (client, peer) = duplex(4096);
                drop(peer);
                Ok(client)
            }
            Outcome::Silent => {
                let (client, peer) = duplex(4096);
                self.peers.lock().expect("peers lock").push(peer);
                Ok(client)
            }
            Outcome::Responsive => {
                let (client, peer) = duplex(4096);
                let model = Arc::new(Mutex::new(TvModel {
                    current_app: String::from("com.webos.app.livetv"),
                }));
                tokio::spawn(serve(peer, codec(), model, self.log.clone()));
                Ok(client)
            }
            Outcome::Garbled => {
                let (client, mut peer) = duplex(4096);
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    while let Ok(n) = peer.read(&mut buf).await {
                        if n == 0 || peer.write_all(&GARBAGE_REPLY).await.is_err() {
                            return;
                        }
                    }
                });
                Ok(client)
            }
        }
    }
}
