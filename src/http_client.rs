use std::time::Duration;

use anyhow::{bail, Result};
use embedded_svc::http::client::Client;
use embedded_svc::http::Method;
use embedded_svc::io::Read;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use log::info;

use bin_day_epd::fetch::{Response, Transport};

const MAX_BODY: usize = 32 * 1024;

/// HTTPS-capable GET session over the ESP-IDF client, verified against the
/// global CA store and the certificate bundle. Opens one connection per
/// request.
pub struct HttpSession {
    timeout: Duration,
    closed: bool,
}

impl HttpSession {
    pub fn new(timeout: Duration) -> Self {
        HttpSession {
            timeout,
            closed: false,
        }
    }

    /// Release the session. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.closed {
            info!("HTTP session closed");
            self.closed = true;
        }
    }
}

/// Drop the last path segment, which carries the address identifier for
/// schedule requests.
fn redacted(url: &str) -> &str {
    url.rsplit_once('/').map_or(url, |(head, _)| head)
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl Transport for HttpSession {
    fn get(&mut self, url: &str) -> Result<Response> {
        if self.closed {
            bail!("HTTP session already closed");
        }

        let config = Configuration {
            timeout: Some(self.timeout),
            use_global_ca_store: true,
            crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
            ..Default::default()
        };

        let connection = EspHttpConnection::new(&config)?;
        let mut client = Client::wrap(connection);

        let request = client.request(Method::Get, url, &[("accept", "application/json")])?;
        let mut response = request.submit()?;

        let status = response.status();
        info!("HTTP GET {} -> status {}", redacted(url), status);

        if status != 200 {
            return Ok(Response {
                status,
                body: String::new(),
            });
        }

        let mut body: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = response.read(&mut buf)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&buf[..n]);
            if body.len() > MAX_BODY {
                bail!("Response too large (>32KB)");
            }
        }

        Ok(Response {
            status,
            body: String::from_utf8(body)?,
        })
    }
}
