//! Shell command execution for the WireGuard tools.
//!
//! Commands are run through `/bin/sh -c`; every variable argument is passed
//! through [`shellquote`] by the command builders.

use std::process::{Output, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use tunnelguard_core::{DriverError, DriverResult};

/// The `wg` configuration utility, resolved through `PATH`.
pub const WG_CMD: &str = "wg";

/// The `wg-quick` interface helper, resolved through `PATH`.
pub const WG_QUICK_CMD: &str = "wg-quick";

/// Characters still special inside double quotes.
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// Wraps the string in double quotes and escapes the characters that keep a
/// special meaning inside them.
///
/// ```
/// use tunnelguard_wg::shell::shellquote;
///
/// assert_eq!(shellquote("wg0"), "\"wg0\"");
/// assert_eq!(shellquote("a$b"), "\"a\\$b\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Exit status and trimmed output of a finished command.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Non-empty stdout and stderr joined by a newline.
    pub fn combined_output(&self) -> String {
        [self.stdout.as_str(), self.stderr.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Converts a non-zero exit into [`DriverError::CommandFailed`].
    pub fn into_result(self, cmd: &str) -> DriverResult<String> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(DriverError::CommandFailed {
                command: cmd.to_string(),
                exit_code: self.exit_code,
                output: self.combined_output(),
            })
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).trim().to_string();
        Self {
            // Killed by a signal.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: text(&output.stdout),
            stderr: text(&output.stderr),
        }
    }
}

/// Runs `cmd` under `/bin/sh -c` and collects its output.
///
/// Only a failure to spawn is an error; inspect [`ExecResult::exit_code`]
/// for the command's own status.
pub async fn exec(cmd: &str) -> DriverResult<ExecResult> {
    debug!(command = %cmd, "Running");

    let result: ExecResult = Command::new("/bin/sh")
        .args(["-c", cmd])
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| DriverError::CommandSpawn {
            command: cmd.to_string(),
            source: e,
        })?
        .into();

    if !result.success() {
        warn!(
            command = %cmd,
            exit_code = result.exit_code,
            stderr = %result.stderr,
            "Command exited with failure"
        );
    }

    Ok(result)
}

/// Runs `cmd` and returns its stdout, failing on a non-zero exit.
pub async fn exec_or_throw(cmd: &str) -> DriverResult<String> {
    exec(cmd).await?.into_result(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shellquote_simple() {
        assert_eq!(shellquote("wg0"), "\"wg0\"");
        assert_eq!(shellquote("my-endpoint:51820"), "\"my-endpoint:51820\"");
    }

    #[test]
    fn test_shellquote_public_key() {
        // Base64 keys contain '+', '/' and '=' which need no escaping
        let key = "xTIBA5rboUvnH4htodjb6e697QjLERt1NAB4mZqp8Dg=";
        assert_eq!(shellquote(key), format!("\"{}\"", key));
    }

    #[test]
    fn test_shellquote_special_chars() {
        assert_eq!(shellquote("$HOME"), "\"\\$HOME\"");
        assert_eq!(shellquote("`whoami`"), "\"\\`whoami\\`\"");
        assert_eq!(shellquote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(shellquote("path\\to"), "\"path\\\\to\"");
    }

    #[test]
    fn test_shellquote_empty() {
        assert_eq!(shellquote(""), "\"\"");
    }

    #[test]
    fn test_exec_result_combined() {
        let result = ExecResult {
            exit_code: 0,
            stdout: "stdout".to_string(),
            stderr: "stderr".to_string(),
        };
        assert!(result.success());
        assert_eq!(result.combined_output(), "stdout\nstderr");
    }

    #[test]
    fn test_into_result_failure() {
        let result = ExecResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: "Unable to access interface: No such device".to_string(),
        };
        match result.into_result("wg show wg0 latest-handshakes") {
            Err(DriverError::CommandFailed {
                exit_code, output, ..
            }) => {
                assert_eq!(exit_code, 1);
                assert!(output.contains("No such device"));
            }
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exec_echo() {
        let result = exec("echo hello").await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "hello");
    }

    #[tokio::test]
    async fn test_exec_or_throw_failure() {
        let result = exec_or_throw("exit 3").await;
        assert!(matches!(
            result,
            Err(DriverError::CommandFailed { exit_code: 3, .. })
        ));
    }
}
