#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use mirror_engine::{Downloaded, FailureKind, FetchError, Fetcher};
use url::Url;

#[derive(Debug, Clone)]
pub enum Reply {
    Body {
        body: Vec<u8>,
        declared_length: Option<u64>,
    },
    Status(u16, &'static str),
}

impl Reply {
    pub fn ok(body: &[u8]) -> Self {
        Reply::Body {
            body: body.to_vec(),
            declared_length: Some(body.len() as u64),
        }
    }
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, Reply>,
    calls: Vec<String>,
}

/// In-memory fetcher answering from a fixed script and recording every call.
/// Unscripted URLs answer 404.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, url: &str, reply: Reply) -> Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .insert(url.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn download(
        &self,
        url: &Url,
        dest: &mut (dyn Write + Send),
    ) -> Result<Downloaded, FetchError> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(url.to_string());
            script.replies.get(url.as_str()).cloned()
        };

        match reply {
            Some(Reply::Body {
                body,
                declared_length,
            }) => {
                dest.write_all(&body)
                    .map_err(|err| FetchError::new(FailureKind::Io, err.to_string()))?;
                Ok(Downloaded {
                    status: 200,
                    declared_length,
                    bytes_written: body.len() as u64,
                })
            }
            Some(Reply::Status(code, reason)) => Err(FetchError::new(
                FailureKind::HttpStatus(code),
                format!("{code} {reason}"),
            )),
            None => Err(FetchError::new(
                FailureKind::HttpStatus(404),
                "404 Not Found",
            )),
        }
    }
}

/// Names of leftover download temp files directly under `dir`.
pub fn temp_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name.starts_with("download_tmp_"))
                .collect()
        })
        .unwrap_or_default()
}
