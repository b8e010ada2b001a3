//! Minimal HTTP/1.1 server protected by basic auth, for integration tests.
//!
//! Serves a single static body to requests carrying the expected
//! `Authorization` header and answers 401 to everything else.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct AuthServerOptions {
    /// Expected `Authorization` header value, e.g. `Basic YWxpY2U6c2VjcmV0`.
    pub authorization: String,
    /// Status line sent with the body to authorized requests.
    pub status: &'static str,
}

/// Starts a server in a background thread serving `body` to `alice:secret`.
/// Returns the URL of the data file. The server runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(
        body,
        AuthServerOptions {
            authorization: "Basic YWxpY2U6c2VjcmV0".to_string(),
            status: "200 OK",
        },
    )
}

pub fn start_with_options(body: Vec<u8>, opts: AuthServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, &body, &opts));
        }
    });
    format!("http://127.0.0.1:{}/data/18311100.txt", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: &AuthServerOptions) {
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

    let authorized = authorization(request).is_some_and(|v| v == opts.authorization);
    if !authorized {
        let _ = stream.write_all(
            b"HTTP/1.1 401 Unauthorized\r\n\
              WWW-Authenticate: Basic realm=\"data\"\r\n\
              Content-Length: 0\r\n\
              Connection: close\r\n\r\n",
        );
        return;
    }

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        opts.status,
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
}

/// Value of the `Authorization` header, if present.
fn authorization(request: &str) -> Option<&str> {
    request
        .lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.trim())
}
