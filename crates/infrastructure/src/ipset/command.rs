use super::backend::{SetBackend, SetFamily};
use async_trait::async_trait;
use dnsieve_domain::DomainError;
use std::io;
use std::net::IpAddr;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Upper bound for one `ipset` invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// [`SetBackend`] driving the `ipset` command line tool.
///
/// Every invocation is bounded by a timeout; the child is killed when it
/// expires.
pub struct IpsetCommand {
    program: String,
    timeout: Duration,
}

impl IpsetCommand {
    pub fn new() -> Self {
        Self::with_program("ipset")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn spawn_error(&self, err: io::Error) -> DomainError {
        match err.kind() {
            io::ErrorKind::NotFound => DomainError::Unsupported("ipset"),
            io::ErrorKind::PermissionDenied => {
                DomainError::PermissionDenied(format!("running {}: {}", self.program, err))
            }
            _ => DomainError::Ipset(format!("running {}: {}", self.program, err)),
        }
    }
}

impl Default for IpsetCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `fut` for at most `timeout`. Dropping it kills the child.
async fn bounded<T>(
    program: &str,
    timeout: Duration,
    fut: impl Future<Output = Result<T, DomainError>>,
) -> Result<T, DomainError> {
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        DomainError::Ipset(format!("{} did not finish within {:?}", program, timeout))
    })?
}

/// Map a failed invocation to the matching error kind.
fn exit_error(stderr: &[u8]) -> DomainError {
    let msg = String::from_utf8_lossy(stderr).trim().to_string();
    if msg.contains("Operation not permitted") || msg.contains("must be root") {
        DomainError::PermissionDenied(msg)
    } else if msg.contains("Kernel error received") || msg.contains("not supported") {
        DomainError::Unsupported("ipset")
    } else {
        DomainError::Ipset(msg)
    }
}

/// Extract the family from `ipset list -t` output.
fn parse_family(output: &str) -> Option<SetFamily> {
    let header = output
        .lines()
        .find_map(|line| line.strip_prefix("Header:"))?;
    let mut words = header.split_whitespace();
    while let Some(word) = words.next() {
        if word == "family" {
            return match words.next()? {
                "inet" => Some(SetFamily::Inet),
                "inet6" => Some(SetFamily::Inet6),
                _ => None,
            };
        }
    }
    None
}

#[async_trait]
impl SetBackend for IpsetCommand {
    async fn family(&self, set: &str) -> Result<SetFamily, DomainError> {
        let output = bounded(&self.program, self.timeout, async {
            Command::new(&self.program)
                .args(["list", "-t", set])
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| self.spawn_error(e))
        })
        .await?;

        if !output.status.success() {
            return Err(exit_error(&output.stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_family(&stdout)
            .ok_or_else(|| DomainError::Ipset(format!("unexpected header for set {:?}", set)))
    }

    async fn add_entries(&self, set: &str, ips: &[IpAddr]) -> Result<(), DomainError> {
        if ips.is_empty() {
            return Ok(());
        }

        let mut script = String::with_capacity(ips.len() * 32);
        for ip in ips {
            script.push_str("add ");
            script.push_str(set);
            script.push(' ');
            script.push_str(&ip.to_string());
            script.push('\n');
        }

        bounded(&self.program, self.timeout, async {
            let mut child = Command::new(&self.program)
                .args(["restore", "-exist"])
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| self.spawn_error(e))?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(script.as_bytes()).await.map_err(|e| {
                    DomainError::Ipset(format!("writing to {}: {}", self.program, e))
                })?;
            }

            let output = child
                .wait_with_output()
                .await
                .map_err(|e| self.spawn_error(e))?;
            if !output.status.success() {
                return Err(exit_error(&output.stderr));
            }
            Ok::<(), DomainError>(())
        })
        .await?;

        debug!(set, entries = ips.len(), "ipset entries added");
        Ok(())
    }
}
