use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use ureq::Agent;

use super::{Fetch, FetchError, Request};

const OK: u16 = 200;

/// Blocking client for the evstats api. One attempt per request, no retries.
pub struct EvStatsClient {
    agent: Agent,
    daily_url: String,
    maker_url: String,
}

impl EvStatsClient {
    pub fn new(daily_url: &str, maker_url: &str, timeout: Duration) -> Self {
        // Statuses are judged here, not by ureq, so a 404 reads like any other "no data".
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        EvStatsClient {
            agent: Agent::new_with_config(config),
            daily_url: daily_url.to_owned(),
            maker_url: maker_url.to_owned(),
        }
    }

    fn try_fetch(&self, request: &Request) -> Result<Value, FetchError> {
        let response = match request {
            Request::Daily(date) => {
                let url = format!("{}{}", self.daily_url, date);

                self.agent.get(url.as_str()).call()
            }

            Request::MakerMetrics { bucket, makers } => {
                // The api wants the filter as a JSON array inside the query string.
                let filter = serde_json::to_string(makers)?;

                self.agent
                    .get(self.maker_url.as_str())
                    .query("filterMakers", filter)
                    .query("timePeriod", bucket.as_str())
                    .call()
            }
        };

        let mut response = response?;

        let status = response.status().as_u16();
        if status != OK {
            return Err(FetchError::Status(status));
        }

        let body = response.body_mut().read_json::<Value>()?;

        match body {
            Value::Object(_) => Ok(body),
            _ => Err(FetchError::NotAnObject),
        }
    }
}

impl Fetch for EvStatsClient {
    fn fetch(&self, request: &Request) -> Option<Value> {
        match self.try_fetch(request) {
            Ok(body) => {
                debug!(%request, "fetched");
                Some(body)
            }
            Err(error) => {
                warn!(%request, %error, "no data");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TimeBucket;
    use jiff::civil::date;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Answers exactly one request, then hands the request head back over the channel.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            let mut head = Vec::new();
            let mut buffer = [0u8; 1024];
            while !head.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = stream.read(&mut buffer).unwrap();
                if read == 0 {
                    break;
                }
                head.extend_from_slice(&buffer[..read]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            sender.send(String::from_utf8_lossy(&head).into_owned()).unwrap();
        });

        (format!("http://{address}/"), receiver)
    }

    fn client_for(base: &str) -> EvStatsClient {
        EvStatsClient::new(base, &format!("{base}makerMetrics"), Duration::from_secs(5))
    }

    #[test]
    fn returns_the_document_on_success() {
        let (base, head) = serve_once("200 OK", r#"{"v2":{"cars":{"models":{"ModelA":3}}}}"#);
        let client = client_for(&base);

        let body = client.fetch(&Request::Daily(date(2025, 3, 15))).unwrap();

        assert_eq!(body["v2"]["cars"]["models"]["ModelA"], 3);
        assert!(head.recv().unwrap().starts_with("GET /2025-03-15 "));
    }

    #[test]
    fn non_success_status_is_absent() {
        let (base, _head) = serve_once("404 Not Found", r#"{"error":"nope"}"#);
        let client = client_for(&base);

        assert!(client.fetch(&Request::Daily(date(2025, 3, 15))).is_none());
    }

    #[test]
    fn non_object_body_is_absent() {
        let (base, _head) = serve_once("200 OK", "[1, 2, 3]");
        let client = client_for(&base);

        assert!(client.fetch(&Request::Daily(date(2025, 3, 15))).is_none());
    }

    #[test]
    fn transport_failure_is_absent() {
        // Grab a free port, then let it go so nothing listens there.
        let address = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = client_for(&format!("http://{address}/"));

        assert!(client.fetch(&Request::Daily(date(2025, 3, 15))).is_none());
    }

    #[test]
    fn maker_metrics_carries_bucket_and_filter() {
        let (base, head) = serve_once("200 OK", r#"{"periods":[],"data":{}}"#);
        let client = client_for(&base);

        let request = Request::MakerMetrics {
            bucket: TimeBucket::Quarter,
            makers: vec!["tesla".to_owned()],
        };

        assert!(client.fetch(&request).is_some());

        let head = head.recv().unwrap();
        assert!(head.starts_with("GET /makerMetrics?"));
        assert!(head.contains("timePeriod=quarter"));
        assert!(head.contains("filterMakers="));
    }
}
