#![forbid(unsafe_code)]

use crate::app::App;
use crate::http::{HttpResponse, read_request, write_response};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const IO_TIMEOUT: Duration = Duration::from_secs(2);
const ACCEPT_POLL: Duration = Duration::from_millis(25);

/// Serves connections one at a time until `shutdown` is raised.
pub fn serve(listener: TcpListener, app: &mut App, shutdown: Arc<AtomicBool>) -> std::io::Result<()> {
    listener.set_nonblocking(true)?;
    while !shutdown.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(err) = handle_connection(stream, app) {
                    tracing::warn!(peer = %peer, error = %err, "connection failed");
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(err) => {
                tracing::warn!(error = %err, "accept failed");
            }
        }
    }
    Ok(())
}

fn handle_connection(mut stream: TcpStream, app: &mut App) -> std::io::Result<()> {
    // Accepted sockets may inherit non-blocking mode from the listener.
    stream.set_nonblocking(false)?;
    let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
    let _ = stream.set_write_timeout(Some(IO_TIMEOUT));
    let Some(request) = read_request(&mut stream)? else {
        return Ok(());
    };

    let method = request.method.as_str();
    if !matches!(method, "GET" | "HEAD" | "POST") {
        return write_response(
            &mut stream,
            &HttpResponse::text(405, "Method not allowed."),
            false,
        );
    }
    let response = app.handle(&request);
    write_response(&mut stream, &response, method == "HEAD")
}
