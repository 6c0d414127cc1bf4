#![forbid(unsafe_code)]

mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod mail;
mod routes;
mod server;
mod support;

pub use app::App;
pub use config::{ConfigError, ServerConfig};
pub use error::AppError;
pub use http::{HttpRequest, HttpResponse};
pub use mail::{LogMailer, Mail, MailError, Mailer, OutboxMailer};
pub use server::serve;
