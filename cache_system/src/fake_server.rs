//! In-process RESP server for unit tests
//!
//! Speaks enough of the protocol for the adapter's commands, answers as a
//! sentinel for master `m1` (pointing at itself) and counts accepted
//! connections and commands. A custom handler can override any reply.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub(crate) const MASTER_NAME: &str = "m1";

/// Returns a raw reply to send instead of the default one
pub(crate) type Handler = Arc<dyn Fn(&[Vec<u8>]) -> Option<Vec<u8>> + Send + Sync>;

struct State {
    addr: SocketAddr,
    accepts: AtomicUsize,
    commands: Mutex<HashMap<String, Vec<Vec<Vec<u8>>>>>,
    store: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    handler: Option<Handler>,
}

pub(crate) struct FakeServer {
    state: Arc<State>,
    task: JoinHandle<()>,
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl FakeServer {
    pub(crate) async fn start() -> Self {
        Self::spawn(None).await
    }

    /// Start a server whose replies go through `handler` first
    pub(crate) async fn with_handler(
        handler: impl Fn(&[Vec<u8>]) -> Option<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        Self::spawn(Some(Arc::new(handler))).await
    }

    async fn spawn(handler: Option<Handler>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let state = Arc::new(State {
            addr: listener.local_addr().unwrap(),
            accepts: AtomicUsize::new(0),
            commands: Mutex::new(HashMap::new()),
            store: Mutex::new(HashMap::new()),
            handler,
        });

        let accept_state = state.clone();
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                accept_state.accepts.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(socket, accept_state.clone()));
            }
        });

        Self { state, task }
    }

    pub(crate) fn endpoint(&self) -> String {
        self.state.addr.to_string()
    }

    pub(crate) fn accepts(&self) -> usize {
        self.state.accepts.load(Ordering::SeqCst)
    }

    /// How many times a command (upper case) was received
    pub(crate) fn command_count(&self, name: &str) -> usize {
        self.state
            .commands
            .lock()
            .unwrap()
            .get(name)
            .map_or(0, Vec::len)
    }

    /// Arguments of the last call of a command, name excluded
    pub(crate) fn last_args(&self, name: &str) -> Option<Vec<Vec<u8>>> {
        self.state
            .commands
            .lock()
            .unwrap()
            .get(name)
            .and_then(|calls| calls.last().cloned())
    }

    pub(crate) fn value(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.state.store.lock().unwrap().get(key).cloned()
    }
}

pub(crate) fn error(message: &str) -> Vec<u8> {
    format!("-{}\r\n", message).into_bytes()
}

fn simple(text: &str) -> Vec<u8> {
    format!("+{}\r\n", text).into_bytes()
}

fn integer(n: i64) -> Vec<u8> {
    format!(":{}\r\n", n).into_bytes()
}

fn bulk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

fn nil() -> Vec<u8> {
    b"$-1\r\n".to_vec()
}

fn array(items: Vec<Vec<u8>>) -> Vec<u8> {
    let mut out = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        out.extend(item);
    }
    out
}

async fn serve(mut socket: TcpStream, state: Arc<State>) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(read) => read,
        };
        buffer.extend_from_slice(&chunk[..read]);

        while let Some((args, used)) = parse_command(&buffer) {
            buffer.drain(..used);
            let reply = state.reply(&args);
            if socket.write_all(&reply).await.is_err() {
                return;
            }
        }
    }
}

fn read_line(buffer: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let end = start + buffer.get(start..)?.windows(2).position(|w| w == b"\r\n")?;
    Some((&buffer[start..end], end + 2))
}

fn parse_len(line: &[u8], prefix: u8) -> Option<usize> {
    let (first, digits) = line.split_first()?;
    if *first != prefix {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// One array-of-bulk-strings command and the bytes it used; `None` until complete
fn parse_command(buffer: &[u8]) -> Option<(Vec<Vec<u8>>, usize)> {
    let (line, mut pos) = read_line(buffer, 0)?;
    let count = parse_len(line, b'*')?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let (line, start) = read_line(buffer, pos)?;
        let end = start + parse_len(line, b'$')?;
        if buffer.len() < end + 2 {
            return None;
        }
        args.push(buffer[start..end].to_vec());
        pos = end + 2;
    }

    Some((args, pos))
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

fn number(arg: Option<&Vec<u8>>) -> i64 {
    arg.and_then(|raw| std::str::from_utf8(raw).ok()?.parse().ok())
        .unwrap_or_default()
}

impl State {
    fn reply(&self, args: &[Vec<u8>]) -> Vec<u8> {
        let Some((name, rest)) = args.split_first() else {
            return error("ERR empty command");
        };
        let name = String::from_utf8_lossy(name).to_uppercase();
        self.commands
            .lock()
            .unwrap()
            .entry(name.clone())
            .or_default()
            .push(rest.to_vec());

        if let Some(reply) = self.handler.as_ref().and_then(|handler| handler(args)) {
            return reply;
        }

        let mut store = self.store.lock().unwrap();
        match name.as_str() {
            "PING" => simple("PONG"),
            "GET" => match rest.first().and_then(|key| store.get(key)) {
                Some(value) => bulk(value),
                None => nil(),
            },
            "SET" => {
                let (Some(key), Some(value)) = (rest.first(), rest.get(1)) else {
                    return error("ERR wrong number of arguments for 'set' command");
                };
                let nx = rest[2..].iter().any(|arg| arg.eq_ignore_ascii_case(b"NX"));
                if nx && store.contains_key(key) {
                    return nil();
                }
                store.insert(key.clone(), value.clone());
                simple("OK")
            }
            "DEL" => integer(rest.iter().filter(|key| store.remove(*key).is_some()).count() as i64),
            "EXISTS" => integer(rest.iter().filter(|key| store.contains_key(*key)).count() as i64),
            "PEXPIRE" | "PEXPIREAT" => {
                let Some(key) = rest.first() else {
                    return error("ERR wrong number of arguments");
                };
                if !store.contains_key(key) {
                    return integer(0);
                }
                let at = number(rest.get(1));
                let elapsed = if name == "PEXPIRE" { at <= 0 } else { at <= now_millis() };
                if elapsed {
                    store.remove(key);
                }
                integer(1)
            }
            "ROLE" => array(vec![bulk(b"master"), integer(0), array(Vec::new())]),
            "SENTINEL" => self.sentinel(rest),
            _ => simple("OK"),
        }
    }

    fn sentinel(&self, rest: &[Vec<u8>]) -> Vec<u8> {
        let ip = self.addr.ip().to_string();
        let port = self.addr.port().to_string();
        let sub = rest
            .first()
            .map(|sub| String::from_utf8_lossy(sub).to_uppercase())
            .unwrap_or_default();

        match sub.as_str() {
            "MASTERS" => array(vec![array(vec![
                bulk(b"name"),
                bulk(MASTER_NAME.as_bytes()),
                bulk(b"ip"),
                bulk(ip.as_bytes()),
                bulk(b"port"),
                bulk(port.as_bytes()),
                bulk(b"flags"),
                bulk(b"master"),
            ])]),
            "GET-MASTER-ADDR-BY-NAME" => array(vec![bulk(ip.as_bytes()), bulk(port.as_bytes())]),
            _ => array(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_waits_for_full_frame() {
        let frame = b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n";

        for cut in 0..frame.len() {
            assert!(parse_command(&frame[..cut]).is_none(), "cut at {}", cut);
        }
        let (args, used) = parse_command(frame).unwrap();
        assert_eq!(args, vec![b"GET".to_vec(), b"key".to_vec()]);
        assert_eq!(used, frame.len());
    }

    #[test]
    fn test_parse_command_handles_binary_payload() {
        let frame = b"*2\r\n$3\r\nGET\r\n$4\r\n\r\n\x00\xff\r\n*1\r\n$4\r\nPING\r\n";

        let (args, used) = parse_command(frame).unwrap();
        assert_eq!(args[1], vec![b'\r', b'\n', 0x00, 0xff]);
        let (next, _) = parse_command(&frame[used..]).unwrap();
        assert_eq!(next, vec![b"PING".to_vec()]);
    }
}
