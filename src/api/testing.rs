//! One-shot HTTP server for exercising the client against real sockets.

use std::io::Read;
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use tiny_http::{Header, Response, Server};

/// A request as the server saw it.
pub struct Captured {
    /// Method and URL, such as `POST /api/users/login`.
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Serve exactly one request with `status` and `body`. Returns the base URL
/// and a handle yielding the captured request.
pub fn serve_once(status: u16, body: &str) -> (String, JoinHandle<Captured>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr().to_ip().unwrap());
    let body = body.to_string();

    let handle = thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut received = String::new();
        request.as_reader().read_to_string(&mut received).unwrap();

        let captured = Captured {
            request_line: format!("{} {}", request.method(), request.url()),
            headers: request
                .headers()
                .iter()
                .map(|h| (h.field.to_string(), h.value.to_string()))
                .collect(),
            body: received,
        };

        let json = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
        request
            .respond(
                Response::from_string(body)
                    .with_status_code(status)
                    .with_header(json),
            )
            .unwrap();
        captured
    });

    (url, handle)
}

/// A URL nothing is listening on.
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
