//! Canned-response HTTP server for adapter tests.

use crate::client::{Endpoints, GoogleClient};
use clienttrack_core::remote::{AccessToken, CredentialSlot};
use reqwest::Url;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub(crate) const TOKEN: &str = "test-token";

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: String,
    url: Url,
    headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    /// Percent-encoded path, as sent.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json request body")
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// Serves one canned `(status, body)` response per connection, in order.
pub(crate) struct StubServer {
    base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    pub fn serve(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let base = format!("http://{}", listener.local_addr().expect("listener addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let worker = thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    break;
                };
                let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
                match read_request(&mut stream) {
                    Ok(request) => seen.lock().expect("requests lock").push(request),
                    Err(_) => break,
                }
                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        Self {
            base,
            requests,
            worker: Some(worker),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            sheets: format!("{}/v4/spreadsheets", self.base),
            drive: format!("{}/drive/v3/files", self.base),
            upload: format!("{}/upload/drive/v3/files", self.base),
        }
    }

    /// A client signed in with [`TOKEN`] and pointed at this server.
    pub fn client(&self) -> GoogleClient {
        let credentials = CredentialSlot::new();
        credentials.set(AccessToken::new(TOKEN));
        GoogleClient::with_endpoints(credentials, Duration::from_secs(5), self.endpoints())
            .expect("client")
    }

    /// Wait for every canned response to be served and return the requests.
    pub fn finish(mut self) -> Vec<Recorded> {
        if let Some(worker) = self.worker.take() {
            worker.join().expect("stub server thread");
        }
        let requests = self.requests.lock().expect("requests lock");
        requests.clone()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Decode a chunked body; `None` until the terminating chunk has arrived.
fn dechunk(raw: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut rest = raw;
    loop {
        let line_end = find(rest, b"\r\n")?;
        let size_line = std::str::from_utf8(&rest[..line_end]).ok()?;
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        rest = &rest[line_end + 2..];
        if size == 0 {
            return Some(out);
        }
        if rest.len() < size + 2 {
            return None;
        }
        out.extend_from_slice(&rest[..size]);
        rest = &rest[size + 2..];
    }
}

fn read_request(stream: &mut TcpStream) -> io::Result<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    let mut read_more = |buf: &mut Vec<u8>| -> io::Result<()> {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"));
        }
        buf.extend_from_slice(&chunk[..n]);
        Ok(())
    };

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        read_more(&mut buf)?;
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or("").split(' ');
    let method = request_line.next().unwrap_or("").to_string();
    let target = request_line.next().unwrap_or("/").to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    let header = |name: &str| {
        headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    let mut body = buf.split_off(header_end + 4);
    if let Some(length) = header("content-length").and_then(|value| value.parse::<usize>().ok()) {
        while body.len() < length {
            read_more(&mut body)?;
        }
        body.truncate(length);
    } else if header("transfer-encoding").is_some_and(|value| value.eq_ignore_ascii_case("chunked")) {
        body = loop {
            if let Some(decoded) = dechunk(&body) {
                break decoded;
            }
            read_more(&mut body)?;
        };
    }

    let url = Url::parse(&format!("http://stub{}", target))
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
    Ok(Recorded {
        method,
        url,
        headers,
        body,
    })
}
