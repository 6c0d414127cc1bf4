#![forbid(unsafe_code)]

use ss_server::config::{usage, version_line};
use ss_server::logging::init_tracing;
use ss_server::{App, ServerConfig, serve};
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    let config = ServerConfig::from_env()?;
    init_tracing(&config)?;

    let mut app = App::open(config.clone())?;
    let listener = TcpListener::bind(("127.0.0.1", config.port))?;
    tracing::info!(
        port = config.port,
        storage_dir = %config.storage_dir.display(),
        host_url = %config.host_url,
        "{} listening",
        version_line()
    );

    serve(listener, &mut app, Arc::new(AtomicBool::new(false)))?;
    Ok(())
}
