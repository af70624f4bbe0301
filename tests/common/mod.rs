//! In-process stand-in for the rendering service.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

pub struct StubService {
    pub base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl StubService {
    /// Answer one request per entry in `responses`, in order.
    pub fn spawn(responses: Vec<(u16, String)>) -> Self {
        Self::spawn_raw(
            responses
                .into_iter()
                .map(|(status, body)| (status, body.into_bytes()))
                .collect(),
        )
    }

    /// Like [`StubService::spawn`], with bodies sent as raw bytes.
    pub fn spawn_raw(responses: Vec<(u16, Vec<u8>)>) -> Self {
        let (listener, base_url) = bind();
        let handle = thread::spawn(move || {
            responses
                .into_iter()
                .map(|(status, body)| {
                    let (mut stream, _) = listener.accept().expect("accept");
                    let path = read_request_path(&mut stream);
                    respond(&mut stream, status, &body);
                    path
                })
                .collect()
        });
        Self { base_url, handle }
    }

    /// Answer a single request, but only after `release` fires. `received`
    /// fires once the request has arrived.
    pub fn spawn_gated(status: u16, body: String) -> (Self, Receiver<()>, Sender<()>) {
        let (listener, base_url) = bind();
        let (received_tx, received_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let path = read_request_path(&mut stream);
            received_tx.send(()).expect("signal received");
            release_rx.recv().expect("wait for release");
            respond(&mut stream, status, body.as_bytes());
            vec![path]
        });
        (Self { base_url, handle }, received_rx, release_tx)
    }

    /// Request paths seen by the stub, in arrival order.
    pub fn join(self) -> Vec<String> {
        self.handle.join().expect("stub thread")
    }
}

fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    (listener, format!("http://{addr}/svg/"))
}

fn read_request_path(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    loop {
        let mut header = String::new();
        let read = reader.read_line(&mut header).expect("header line");
        if read == 0 || header == "\r\n" {
            break;
        }
    }
    request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

fn respond(stream: &mut TcpStream, status: u16, body: &[u8]) {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: image/svg+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).expect("write response head");
    stream.write_all(body).expect("write response body");
    stream.flush().expect("flush response");
}
