//! Diagnostic hook invoked before a request leaves the executor.

use log::debug;
use reqwest::Method;

/// What an observer gets to see about an outgoing request.
///
/// Header values are withheld so a credential can never reach a sink.
#[derive(Debug)]
pub struct RequestTrace<'a> {
    pub method: &'a Method,
    pub url: &'a str,
    pub header_names: Vec<&'a str>,
    pub has_body: bool,
}

pub trait RequestObserver: Send + Sync {
    fn on_request(&self, trace: &RequestTrace<'_>);
}

/// Writes each trace to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RequestObserver for LogObserver {
    fn on_request(&self, trace: &RequestTrace<'_>) {
        debug!(
            "Sending {} request to {} (headers: {:?}, body: {})",
            trace.method, trace.url, trace.header_names, trace.has_body
        );
    }
}
