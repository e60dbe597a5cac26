//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of routes (path → status + body), counts GETs per path,
//! and can delay the response or trickle the body to simulate slow mirrors.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// If false, omit `Content-Length` and close the connection after the body.
    pub content_length: bool,
    /// Sleep before sending anything.
    pub delay: Duration,
    /// When set, the body is written in pieces of this size with `piece_delay` between them.
    pub piece: Option<usize>,
    pub piece_delay: Duration,
    /// Close the connection after this many body bytes, whatever the headers declared.
    pub cut_at: Option<usize>,
}

impl Route {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            content_length: true,
            delay: Duration::ZERO,
            piece: None,
            piece_delay: Duration::ZERO,
            cut_at: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: format!("status {status}\n").into_bytes(),
            ..Self::ok(Vec::new())
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn trickle(mut self, piece: usize, piece_delay: Duration) -> Self {
        self.piece = Some(piece);
        self.piece_delay = piece_delay;
        self
    }

    pub fn cut_short(mut self, after: usize) -> Self {
        self.cut_at = Some(after);
        self
    }

    pub fn without_length(mut self) -> Self {
        self.content_length = false;
        self
    }
}

pub struct TestServer {
    base: String,
    hits: Arc<HashMap<String, AtomicUsize>>,
}

impl TestServer {
    /// `http://127.0.0.1:PORT` + `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Number of GET requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .get(path)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

/// Starts a server in a background thread; it runs until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits: Arc<HashMap<String, AtomicUsize>> = Arc::new(
        routes
            .iter()
            .map(|(p, _)| (p.to_string(), AtomicUsize::new(0)))
            .collect(),
    );
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(p, r)| (p.to_string(), r))
            .collect(),
    );
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &HashMap<String, AtomicUsize>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/");

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }
    if let Some(counter) = hits.get(path) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
    let route = match routes.get(path) {
        Some(r) => r,
        None => {
            let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            return;
        }
    };

    thread::sleep(route.delay);
    let mut header = format!("HTTP/1.1 {} {}\r\n", route.status, reason(route.status));
    if route.content_length {
        header.push_str(&format!("Content-Length: {}\r\n", route.body.len()));
    }
    header.push_str("Connection: close\r\n\r\n");
    if stream.write_all(header.as_bytes()).is_err() {
        return;
    }
    let body = match route.cut_at {
        Some(n) => &route.body[..n.min(route.body.len())],
        None => &route.body[..],
    };
    match route.piece {
        Some(size) => {
            for chunk in body.chunks(size.max(1)) {
                if stream.write_all(chunk).is_err() {
                    return;
                }
                thread::sleep(route.piece_delay);
            }
        }
        None => {
            let _ = stream.write_all(body);
        }
    }
    let _ = stream.flush();
}
