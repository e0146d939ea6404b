use std::io::Write;
use std::time::Duration;

use futures_util::StreamExt;
use mirror_logging::mirror_debug;
use url::Url;

use crate::{Downloaded, FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// `None` leaves the whole-request deadline to the transport.
    pub request_timeout: Option<Duration>,
    pub redirect_limit: usize,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            redirect_limit: 10,
            user_agent: concat!("site-mirror/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves `url` and streams its body into `dest`.
    ///
    /// A non-success status is an error; nothing is written in that case.
    async fn download(
        &self,
        url: &Url,
        dest: &mut (dyn Write + Send),
    ) -> Result<Downloaded, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let redirect_limit = settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                mirror_debug!("following redirect #{} to {}", count + 1, attempt.url());
                attempt.follow()
            }
        });

        let mut builder = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .user_agent(settings.user_agent)
            .redirect(policy);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn download(
        &self,
        url: &Url,
        dest: &mut (dyn Write + Send),
    ) -> Result<Downloaded, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let declared_length = response.content_length();
        let mut bytes_written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            dest.write_all(&chunk)
                .map_err(|err| FetchError::new(FailureKind::Io, err.to_string()))?;
            bytes_written += chunk.len() as u64;
        }

        Ok(Downloaded {
            status: status.as_u16(),
            declared_length,
            bytes_written,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
