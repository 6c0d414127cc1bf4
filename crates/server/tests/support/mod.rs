#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::{Value, json};
use ss_server::{App, HttpRequest, HttpResponse, Mail, MailError, Mailer, ServerConfig};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub(crate) const HOST_URL: &str = "http://ss.test";
pub(crate) const PASSWORD: &str = "secret-pass";

pub(crate) fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("ss_server_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Keeps every sent mail so tests can follow activation and reset links.
#[derive(Clone, Default)]
pub(crate) struct Inbox {
    mails: Arc<Mutex<Vec<Mail>>>,
}

impl Inbox {
    pub(crate) fn all(&self) -> Vec<Mail> {
        self.mails.lock().expect("inbox lock").clone()
    }

    pub(crate) fn last_link_token(&self, marker: &str) -> String {
        let mails = self.all();
        let mail = mails.last().expect("at least one mail");
        link_token(&mail.text, marker).expect("link token in mail")
    }
}

impl Mailer for Inbox {
    fn send(&mut self, mail: &Mail) -> Result<(), MailError> {
        self.mails.lock().expect("inbox lock").push(mail.clone());
        Ok(())
    }
}

pub(crate) fn link_token(text: &str, marker: &str) -> Option<String> {
    let (_, rest) = text.split_once(marker)?;
    let token = rest.split_whitespace().next()?.to_string();
    (!token.is_empty()).then_some(token)
}

/// Cheapest bcrypt cost so hashing does not dominate test time.
pub(crate) fn test_config(storage_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        storage_dir,
        port: 0,
        host_url: HOST_URL.to_string(),
        mail_outbox: None,
        bcrypt_cost: 4,
        log_level: "warn".to_string(),
        log_file: None,
    }
}

pub(crate) struct Harness {
    pub(crate) app: App,
    pub(crate) inbox: Inbox,
    pub(crate) storage_dir: PathBuf,
}

impl Harness {
    pub(crate) fn new(test_name: &str) -> Self {
        let storage_dir = temp_dir(test_name);
        let inbox = Inbox::default();
        let app = App::with_mailer(test_config(storage_dir.clone()), Box::new(inbox.clone()))
            .expect("open app");
        Self {
            app,
            inbox,
            storage_dir,
        }
    }

    pub(crate) fn send(&mut self, request: HttpRequest) -> HttpResponse {
        self.app.handle(&request)
    }

    pub(crate) fn get(&mut self, target: &str, cookies: &[String]) -> HttpResponse {
        self.send(with_cookies(HttpRequest::new("GET", target), cookies))
    }

    pub(crate) fn post(&mut self, target: &str, body: Value, cookies: &[String]) -> HttpResponse {
        self.send(with_cookies(
            HttpRequest::new("POST", target).with_json(&body),
            cookies,
        ))
    }

    /// Registers and activates an account through the public endpoints.
    pub(crate) fn active_user(&mut self, email: &str) {
        let response = self.post(
            "/api/auth/register",
            json!({ "email": email, "password": PASSWORD, "password2": PASSWORD }),
            &[],
        );
        assert_eq!(response.status, 200, "register: {:?}", response.json_body());
        let token = self.inbox.last_link_token("/login/");
        let response = self.post("/api/auth/activate", json!({ "token": token }), &[]);
        assert_eq!(response.status, 200, "activate: {:?}", response.json_body());
    }

    /// Logs in and returns the cookies a browser would send back.
    pub(crate) fn login(&mut self, email: &str, remember: bool) -> Vec<String> {
        let response = self.post(
            "/api/auth/login",
            json!({ "email": email, "password": PASSWORD, "remember": remember }),
            &[],
        );
        assert_eq!(response.status, 200, "login: {:?}", response.json_body());
        cookie_pairs(&response)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

fn with_cookies(mut request: HttpRequest, cookies: &[String]) -> HttpRequest {
    if !cookies.is_empty() {
        request = request.with_header("Cookie", &cookies.join("; "));
    }
    request
}

/// `name=value` pairs of every cookie the response sets to a non-empty value.
pub(crate) fn cookie_pairs(response: &HttpResponse) -> Vec<String> {
    response
        .set_cookies
        .iter()
        .filter_map(|cookie| cookie.split(';').next())
        .filter(|pair| pair.split_once('=').is_some_and(|(_, value)| !value.is_empty()))
        .map(str::to_string)
        .collect()
}

pub(crate) fn cookie_value(response: &HttpResponse, name: &str) -> Option<String> {
    response
        .set_cookies
        .iter()
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

pub(crate) fn body(response: &HttpResponse) -> Value {
    response.json_body().expect("json body")
}

/// Four finest states, two mid-level clusters and one root, with a short history.
pub(crate) fn three_scale_model() -> Value {
    json!({
        "scales": [
            {
                "areTheseInitialStates": true,
                "states": [
                    {"stateNo": 0, "stationaryProbability": 0.3, "transitionProbabilities": [0.5, 0.3, 0.2, 0.0], "suggestedLabel": {"label": "idle"}},
                    {"stateNo": 1, "stationaryProbability": 0.2, "transitionProbabilities": [0.4, 0.0, 0.0, 0.6]},
                    {"stateNo": 2, "stationaryProbability": 0.25, "transitionProbabilities": [0.05, 0.05, 0.9, 0.0]},
                    {"stateNo": 3, "stationaryProbability": 0.25, "transitionProbabilities": [0.0, 0.2, 0.0, 0.8]}
                ]
            },
            {
                "areTheseInitialStates": false,
                "states": [
                    {"stateNo": 10, "stationaryProbability": 0.5, "transitionProbabilities": [0.7, 0.3], "childStates": [0, 1], "initialStates": [0, 1]},
                    {"stateNo": 11, "stationaryProbability": 0.5, "transitionProbabilities": [0.2, 0.8], "childStates": [2, 3], "initialStates": [2, 3]}
                ]
            },
            {
                "areTheseInitialStates": false,
                "states": [
                    {"stateNo": 20, "stationaryProbability": 1.0, "transitionProbabilities": [1.0], "childStates": [10, 11], "initialStates": [0, 1, 2, 3]}
                ]
            }
        ],
        "stateHistoryTimes": [0.0, 1.0, 2.0, 3.0],
        "stateHistoryInitialStates": [0, 1, 2, 0]
    })
}
