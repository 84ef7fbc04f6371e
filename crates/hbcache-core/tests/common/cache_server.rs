//! Minimal HTTP/1.1 server serving a fixed set of objects for integration tests.
//!
//! Responds to HEAD and GET. Paths listed with a status other than 200 answer
//! with that status; unknown paths answer 404. Every request is counted so
//! tests can assert how much network traffic an operation caused.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

pub struct CacheServer {
    /// Base URL with a trailing slash, e.g. "http://127.0.0.1:12345/".
    pub url: String,
    requests: Arc<AtomicUsize>,
    log: Arc<Mutex<Vec<(String, String)>>>,
}

impl CacheServer {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// (method, path) of every request received so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }
}

/// Object table: path (without leading slash) → (status, body).
pub type Routes = HashMap<String, (u16, Vec<u8>)>;

pub fn routes(entries: &[(&str, u16, &[u8])]) -> Routes {
    entries
        .iter()
        .map(|(path, status, body)| (path.to_string(), (*status, body.to_vec())))
        .collect()
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start(routes: Routes) -> CacheServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let requests = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(Vec::new()));
    {
        let requests = Arc::clone(&requests);
        let log = Arc::clone(&log);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let requests = Arc::clone(&requests);
                let log = Arc::clone(&log);
                thread::spawn(move || handle(stream, &routes, &requests, &log));
            }
        });
    }
    CacheServer {
        url: format!("http://127.0.0.1:{}/", port),
        requests,
        log,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    routes: &Routes,
    requests: &AtomicUsize,
    log: &Mutex<Vec<(String, String)>>,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts
        .next()
        .unwrap_or("/")
        .trim_start_matches('/')
        .to_string();
    requests.fetch_add(1, Ordering::SeqCst);
    log.lock().unwrap().push((method.clone(), path.clone()));

    let (status, body) = match routes.get(&path) {
        Some((status, body)) => (*status, body.as_slice()),
        None => (404, &b"not found"[..]),
    };
    let reason = match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(body);
    }
}

/// Starts a listener that accepts connections and never answers. Returns its
/// base URL with a trailing slash.
pub fn start_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    format!("http://127.0.0.1:{}/", port)
}
