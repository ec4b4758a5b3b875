//! Loopback HTTP server for classifier and source tests.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use urlaudit::engine::classifier::{UrlClassifier, client_builder};
use urlaudit::{Classification, ClassificationResult, PropertyType, VerificationTask};

/// Serves fixed routes on 127.0.0.1. `/registry` returns the JSON passed to [`TestServer::start`].
pub struct TestServer {
    pub base: String,
    pub port: u16,
}

impl TestServer {
    /// `registry` gets the base URL (`http://127.0.0.1:<port>`) and returns the `/registry` body.
    pub fn start(registry: impl FnOnce(&str) -> String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let base = format!("http://127.0.0.1:{port}");
        let registry_body = registry(&base);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let body = registry_body.clone();
                thread::spawn(move || handle(stream, port, &body));
            }
        });
        Self { base, port }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn handle(mut stream: TcpStream, port: u16, registry_body: &str) {
    let request = read_request(&mut stream);
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
    let (status, location, body): (&str, Option<String>, String) = match path.as_str() {
        "/ok" => ("200 OK", None, "<html>ok</html>".into()),
        "/moved" => (
            "301 Moved Permanently",
            Some(format!("http://127.0.0.1:{port}/ok")),
            String::new(),
        ),
        "/moved-away" => (
            "301 Moved Permanently",
            Some(format!("http://localhost:{port}/ok")),
            String::new(),
        ),
        "/gone" => ("410 Gone", None, String::new()),
        "/forbidden" => ("403 Forbidden", None, String::new()),
        "/slow-down" => ("429 Too Many Requests", None, String::new()),
        "/down" => ("503 Service Unavailable", None, String::new()),
        "/teapot" => ("418 I'm a teapot", None, String::new()),
        "/custom-reason" => ("200 Everything Fine", None, "<html>ok</html>".into()),
        "/odd-status" => ("299 Odd Status", None, String::new()),
        "/registry" => ("200 OK", None, registry_body.to_string()),
        "/registry-broken" => ("200 OK", None, "<html>maintenance</html>".into()),
        _ => ("404 Not Found", None, String::new()),
    };
    let mut head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    if let Some(loc) = location {
        head.push_str(&format!("Location: {loc}\r\n"));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body.as_bytes());
    let _ = stream.flush();
}

/// Client with the production headers but no proxy, so loopback requests stay local.
pub fn local_client() -> Client {
    client_builder(Duration::from_secs(5))
        .no_proxy()
        .build()
        .unwrap()
}

pub fn local_classifier() -> UrlClassifier {
    UrlClassifier::from_client(local_client())
}

/// A port nothing listens on.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn task(id: &str, property: PropertyType, url: &str) -> VerificationTask {
    VerificationTask {
        entity_id: id.to_string(),
        entity_name: format!("Entity {id}"),
        entity_tvl: Some(100.0),
        property,
        url: url.to_string(),
    }
}

pub fn result(id: &str, property: PropertyType, url: &str, c: Classification) -> ClassificationResult {
    ClassificationResult::for_task(&task(id, property, url), c)
}
