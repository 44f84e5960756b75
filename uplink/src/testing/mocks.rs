//! Scripted transport for tests.

use crate::cancellation::CancellationToken;
use crate::errors::UplinkError;
use crate::transport::{Request, Response, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

struct Scripted {
    response: Response,
    delay: Duration,
}

/// A transport that replays scripted responses and records every request.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<Request>>,
    default_delay: Duration,
}

impl MockTransport {
    /// Creates a transport with no latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that answers every request after a delay.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            default_delay: delay,
            ..Self::default()
        }
    }

    /// Scripts the next response.
    pub fn enqueue(&self, response: Response) {
        self.responses.lock().push_back(Scripted {
            response,
            delay: self.default_delay,
        });
    }

    /// Scripts the next response with its own latency.
    pub fn enqueue_delayed(&self, response: Response, delay: Duration) {
        self.responses.lock().push_back(Scripted { response, delay });
    }

    /// Returns every request sent so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests sent.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Clears recorded requests and remaining scripted responses.
    pub fn reset(&self) {
        self.requests.lock().clear();
        self.responses.lock().clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: &Request,
        cancellation: &CancellationToken,
    ) -> Result<Response, UplinkError> {
        self.requests.lock().push(request.clone());

        let Some(scripted) = self.responses.lock().pop_front() else {
            return Err(UplinkError::network("no scripted response"));
        };

        if !scripted.delay.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(scripted.delay) => {}
                () = cancellation.cancelled() => {
                    return Err(UplinkError::aborted(
                        cancellation.reason().unwrap_or_else(|| "cancelled".to_string()),
                    ));
                }
            }
        }
        if cancellation.is_cancelled() {
            return Err(UplinkError::aborted(
                cancellation.reason().unwrap_or_else(|| "cancelled".to_string()),
            ));
        }

        Ok(scripted.response)
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("pending", &self.responses.lock().len())
            .field("sent", &self.requests.lock().len())
            .finish()
    }
}
