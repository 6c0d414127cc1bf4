#![forbid(unsafe_code)]

mod support;

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use support::*;

fn pick_free_port() -> Option<u16> {
    match std::net::TcpListener::bind(("127.0.0.1", 0)) {
        Ok(listener) => {
            let port = listener.local_addr().expect("local addr").port();
            drop(listener);
            Some(port)
        }
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => None,
        Err(err) => panic!("bind ephemeral port: {err}"),
    }
}

fn wait_for_server(port: u16) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        if Instant::now() >= deadline {
            panic!("server did not become reachable on 127.0.0.1:{port}");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Sends one raw request and returns the status code, the header lines and the body.
fn http_exchange(port: u16, raw: &str) -> (u16, Vec<String>, Vec<u8>) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    stream.write_all(raw.as_bytes()).expect("write request");
    stream.flush().expect("flush request");

    let mut reader = BufReader::new(stream);
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .expect("read status line");
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .expect("status code");

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).expect("read header");
        let trimmed = line.trim();
        if read == 0 || trimmed.is_empty() {
            break;
        }
        headers.push(trimmed.to_string());
    }

    let mut body = Vec::new();
    reader.read_to_end(&mut body).expect("read body");
    (status, headers, body)
}

fn http_get_json(port: u16, path: &str) -> Value {
    let (status, _, body) = http_exchange(
        port,
        &format!("GET {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n"),
    );
    assert_eq!(status, 200, "GET {path}");
    serde_json::from_slice(&body).expect("json body")
}

#[test]
fn cli_help_and_version_exit_zero() {
    let exe = env!("CARGO_BIN_EXE_ss_server");
    let output = Command::new(exe).arg("--help").output().expect("run --help");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("USAGE:"));

    let output = Command::new(exe).arg("-V").output().expect("run -V");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "version line: {stdout}");
}

#[test]
fn binary_serves_auth_status_over_http() {
    let Some(port) = pick_free_port() else {
        eprintln!("skipping: binding local ports is not permitted here");
        return;
    };
    let storage_dir = temp_dir("binary_smoke");
    let mut child = Command::new(env!("CARGO_BIN_EXE_ss_server"))
        .args(["--port", &port.to_string(), "--bcrypt-cost", "4", "--log-level", "warn"])
        .arg("--storage-dir")
        .arg(&storage_dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn ss_server");

    wait_for_server(port);
    let status = http_get_json(port, "/api/auth/status");
    let _ = child.kill();
    let _ = child.wait();

    assert_eq!(status, json!({ "user": null }));
    assert!(storage_dir.join("streamstory.db").exists());
    let _ = std::fs::remove_dir_all(&storage_dir);
}

#[test]
fn in_process_server_handles_post_head_and_rejects_other_methods() {
    let listener = match std::net::TcpListener::bind(("127.0.0.1", 0)) {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("skipping: binding local ports is not permitted here");
            return;
        }
        Err(err) => panic!("bind ephemeral port: {err}"),
    };
    let port = listener.local_addr().expect("local addr").port();
    let storage_dir = temp_dir("in_process_serve");
    let mut server_app = ss_server::App::with_mailer(
        test_config(storage_dir.clone()),
        Box::new(Inbox::default()),
    )
    .expect("open app");
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    let worker = std::thread::spawn(move || ss_server::serve(listener, &mut server_app, flag));

    let body = json!({ "email": "x@example.com", "password": "nope" }).to_string();
    let (status, headers, raw) = http_exchange(
        port,
        &format!(
            "POST /api/auth/login HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    );
    assert_eq!(status, 401);
    assert!(headers.iter().any(|h| h == "Cache-Control: no-store"));
    let payload: Value = serde_json::from_slice(&raw).expect("json body");
    assert_eq!(payload, json!({ "error": { "email": "unknown_email" } }));

    let (status, headers, raw) = http_exchange(
        port,
        "HEAD /api/auth/status HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n",
    );
    assert_eq!(status, 200);
    assert!(raw.is_empty());
    assert!(headers.iter().any(|h| h.starts_with("Content-Length: ") && h != "Content-Length: 0"));

    let (status, _, _) = http_exchange(
        port,
        "DELETE /api/models/1 HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n",
    );
    assert_eq!(status, 405);

    shutdown.store(true, Ordering::Relaxed);
    worker
        .join()
        .expect("server thread")
        .expect("serve returns cleanly");
    let _ = std::fs::remove_dir_all(&storage_dir);
}
