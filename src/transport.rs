//! Failure categories for outbound provider calls.
//!
//! Both the geocoder and the weather client go through `ureq`; this module
//! folds its errors into a small set of categories that callers can explain
//! to a user (timeout vs. connection vs. HTTP status vs. bad payload).

use serde::de::DeserializeOwned;
use std::io;

/// Why a provider request failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderFailure {
    #[error("request timed out")]
    Timeout,
    #[error("connection error")]
    Connection,
    #[error("HTTP error {0}")]
    Http(u16),
    #[error("unparseable response")]
    Parse,
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderFailure {
    /// Classify an error raised while reading or decoding a response body.
    pub fn from_body_error(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => Self::Parse,
            _ => Self::Connection,
        }
    }
}

impl From<ureq::Error> for ProviderFailure {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => Self::Http(code),
            ureq::Error::Transport(transport) => {
                if is_timeout(&transport) {
                    return Self::Timeout;
                }
                match transport.kind() {
                    ureq::ErrorKind::Dns
                    | ureq::ErrorKind::ConnectionFailed
                    | ureq::ErrorKind::ProxyConnect
                    | ureq::ErrorKind::Io => Self::Connection,
                    _ => Self::Transport(transport.to_string()),
                }
            }
        }
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(|e| matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
}

/// Decode a JSON response body.
pub(crate) fn read_json<T: DeserializeOwned>(response: ureq::Response) -> Result<T, ProviderFailure> {
    response.into_json().map_err(ProviderFailure::from_body_error)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::Value;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    fn read_request(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut header = String::new();
            if reader.read_line(&mut header).unwrap() <= 2 {
                break;
            }
        }
        request_line.trim_end().to_string()
    }

    /// Answer a single request on a loopback port. The handle yields its request line.
    pub(crate) fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request_line = read_request(&stream);
            stream.write_all(response.as_bytes()).unwrap();
            request_line
        });
        (base, handle)
    }

    /// Accept one request and never answer it.
    fn stall_once(hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            read_request(&stream);
            thread::sleep(hold);
        });
        base
    }

    /// A loopback address nothing listens on.
    fn refused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        base
    }

    fn get(base: &str, timeout: Duration) -> Result<ureq::Response, ProviderFailure> {
        let config = ClientConfig { timeout, ..ClientConfig::default() };
        Ok(config.agent().get(&format!("{}/ping", base)).call()?)
    }

    #[test]
    fn test_status_maps_to_http() {
        let (base, server) = serve_once("503 Service Unavailable", "{}");
        let err = get(&base, Duration::from_secs(5)).unwrap_err();
        assert_eq!(err, ProviderFailure::Http(503));
        assert_eq!(server.join().unwrap(), "GET /ping HTTP/1.1");
    }

    #[test]
    fn test_non_json_body_is_parse() {
        let (base, _server) = serve_once("200 OK", "<html>busy</html>");
        let response = get(&base, Duration::from_secs(5)).unwrap();
        assert_eq!(read_json::<Value>(response).unwrap_err(), ProviderFailure::Parse);
    }

    #[test]
    fn test_stalled_server_is_timeout() {
        let base = stall_once(Duration::from_secs(2));
        let err = get(&base, Duration::from_millis(300)).unwrap_err();
        assert_eq!(err, ProviderFailure::Timeout);
    }

    #[test]
    fn test_refused_is_connection() {
        let err = get(&refused_url(), Duration::from_secs(2)).unwrap_err();
        assert_eq!(err, ProviderFailure::Connection);
    }

    #[test]
    fn test_body_error_categories() {
        let timeout = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert_eq!(ProviderFailure::from_body_error(timeout), ProviderFailure::Timeout);

        let garbage = io::Error::new(io::ErrorKind::InvalidData, "expected value at line 1");
        assert_eq!(ProviderFailure::from_body_error(garbage), ProviderFailure::Parse);

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        assert_eq!(ProviderFailure::from_body_error(reset), ProviderFailure::Connection);
    }

    #[test]
    fn test_display_names_category() {
        assert_eq!(ProviderFailure::Http(503).to_string(), "HTTP error 503");
        assert_eq!(ProviderFailure::Timeout.to_string(), "request timed out");
    }
}
