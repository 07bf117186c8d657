//! Executable payload runner
//!
//! Runs message payloads as external `sh -c` subprocesses, never inline in
//! the engine's own control flow. The payload gets the agent's own database
//! path through `STATE_DB_PATH` - that is the entire "scope": this is an
//! adversarial mechanic, not a safety boundary.

use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Outcome of running one payload. Failures are data, never errors: a payload
/// that crashes, exits non-zero, or times out must not fail the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadOutcome {
    pub success: bool,
    pub detail: String,
}

/// Runs payloads against one agent's working state
pub struct PayloadRunner {
    db_path: PathBuf,
    work_dir: PathBuf,
    timeout: Duration,
}

impl PayloadRunner {
    pub fn new(db_path: PathBuf, work_dir: PathBuf, timeout: Duration) -> Self {
        PayloadRunner {
            db_path,
            work_dir,
            timeout,
        }
    }

    /// Execute a payload with a hard wall-clock timeout. On expiry the
    /// subprocess is forcibly terminated.
    pub async fn execute(&self, payload: &str) -> PayloadOutcome {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(payload)
            .current_dir(&self.work_dir)
            .env("STATE_DB_PATH", &self.db_path)
            .kill_on_drop(true);

        match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

                if output.status.success() {
                    PayloadOutcome {
                        success: true,
                        detail: stdout,
                    }
                } else {
                    let exit_code = output.status.code().unwrap_or(-1);
                    let detail = if stderr.is_empty() {
                        format!("exit code {exit_code}: {stdout}")
                    } else {
                        format!("exit code {exit_code}: {stderr}")
                    };
                    PayloadOutcome {
                        success: false,
                        detail,
                    }
                }
            }
            Ok(Err(e)) => PayloadOutcome {
                success: false,
                detail: format!("failed to spawn payload: {e}"),
            },
            // Dropping the output future kills the child (kill_on_drop)
            Err(_) => PayloadOutcome {
                success: false,
                detail: format!("timed out after {}s", self.timeout.as_secs()),
            },
        }
    }
}

/// Shell payload that credits the recipient's ledger when they execute a gift
pub fn gift_payload(resource_type: &str, amount: i64, from_race: &str) -> String {
    format!(
        "sqlite3 \"$STATE_DB_PATH\" \"UPDATE resources SET amount = amount + {amount} WHERE resource_type = '{resource_type}'\" \
&& echo \"Received {amount} {resource_type} from {from_race}\""
    )
}

/// Shell payload that debits the target's ledger if they choose to run it
pub fn steal_payload(resource_type: &str, amount: i64, thief_race: &str) -> String {
    format!(
        "sqlite3 \"$STATE_DB_PATH\" \"UPDATE resources SET amount = amount - {amount} WHERE resource_type = '{resource_type}'\" \
&& echo \"{thief_race} stole {amount} {resource_type}\""
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn runner(dir: &TempDir, timeout_secs: u64) -> PayloadRunner {
        PayloadRunner::new(
            dir.path().join("state.db"),
            dir.path().to_path_buf(),
            Duration::from_secs(timeout_secs),
        )
    }

    #[tokio::test]
    async fn test_execute_captures_stdout() {
        let dir = TempDir::new().unwrap();
        let outcome = runner(&dir, 5).execute("echo hello").await;
        assert!(outcome.success);
        assert_eq!(outcome.detail, "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let dir = TempDir::new().unwrap();
        let outcome = runner(&dir, 5).execute("echo oops >&2; exit 3").await;
        assert!(!outcome.success);
        assert!(outcome.detail.contains("exit code 3"));
        assert!(outcome.detail.contains("oops"));
    }

    #[tokio::test]
    async fn test_timeout_is_failure_not_hang() {
        let dir = TempDir::new().unwrap();
        let outcome = runner(&dir, 1).execute("sleep 30").await;
        assert!(!outcome.success);
        assert!(outcome.detail.contains("timed out"));
    }

    #[tokio::test]
    async fn test_payload_sees_state_db_path() {
        let dir = TempDir::new().unwrap();
        let outcome = runner(&dir, 5).execute("echo \"$STATE_DB_PATH\"").await;
        assert!(outcome.success);
        assert!(outcome.detail.ends_with("state.db"));
    }

    #[tokio::test]
    async fn test_payload_runs_in_work_dir() {
        let dir = TempDir::new().unwrap();
        let outcome = runner(&dir, 5).execute("pwd").await;
        assert!(outcome.success);
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(&outcome.detail).canonicalize().unwrap(),
            canonical
        );
    }

    #[test]
    fn test_gift_payload_credits() {
        let payload = gift_payload("energy", 50, "zephyrians");
        assert!(payload.contains("amount + 50"));
        assert!(payload.contains("'energy'"));
        assert!(payload.contains("zephyrians"));
    }

    #[test]
    fn test_steal_payload_debits() {
        let payload = steal_payload("influence", 25, "valyrians");
        assert!(payload.contains("amount - 25"));
        assert!(payload.contains("'influence'"));
    }
}
