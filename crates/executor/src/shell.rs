use async_trait::async_trait;
use sysaidmin_core::{CommandRunner, ExecutionResult};

/// Cap on captured output. Anything beyond this is dropped with a marker so
/// a pathological command cannot grow the conversation without bound.
const MAX_CAPTURE_BYTES: usize = 256 * 1024;

const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Runs one shell command string synchronously via `sh -c`.
///
/// The command is passed through verbatim; quoting and expansion are the
/// shell's business. stdout and stderr are merged into one blob, stdout
/// first, and the exit code is kept as a separate field.
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellExecutor {
    async fn run_command(&self, command: &str) -> ExecutionResult {
        tracing::info!("Executing command: {}", command);

        // kill_on_drop so an interrupted session does not leave the child
        // running behind it.
        let (output, exit_code) = match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => {
                let mut merged = String::from_utf8_lossy(&output.stdout).into_owned();
                merged.push_str(&String::from_utf8_lossy(&output.stderr));
                (truncate_output(merged), output.status.code())
            }
            Err(e) => {
                // Spawn failures are ordinary output by contract; the planner
                // decides what to do with them.
                tracing::warn!("Failed to start shell: {}", e);
                (format!("Failed to start shell: {}", e), None)
            }
        };

        ExecutionResult {
            command: command.to_string(),
            output,
            exit_code,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

fn truncate_output(mut output: String) -> String {
    if output.len() <= MAX_CAPTURE_BYTES {
        return output;
    }

    let mut cut = MAX_CAPTURE_BYTES;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }
    output.truncate(cut);
    output.push_str(TRUNCATION_MARKER);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let executor = ShellExecutor::new();
        let result = executor.run_command("echo hello").await;
        assert_eq!(result.output, "hello\n");
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.command, "echo hello");
    }

    #[tokio::test]
    async fn test_merges_stderr_into_output() {
        let executor = ShellExecutor::new();
        let result = executor.run_command("echo out; echo err >&2").await;
        assert!(result.output.contains("out\n"));
        assert!(result.output.contains("err\n"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let executor = ShellExecutor::new();
        let result = executor
            .run_command("echo broken >&2; exit 3")
            .await;
        assert_eq!(result.exit_code, Some(3));
        assert!(result.output.contains("broken"));
    }

    #[tokio::test]
    async fn test_shell_expansion_applies() {
        let executor = ShellExecutor::new();
        let result = executor.run_command("echo $((6 * 7))").await;
        assert_eq!(result.output, "42\n");
    }

    #[tokio::test]
    async fn test_pathological_output_is_bounded() {
        let executor = ShellExecutor::new();
        let result = executor
            .run_command("head -c 600000 /dev/zero | tr '\\0' 'x'")
            .await;
        assert!(result.output.len() <= MAX_CAPTURE_BYTES + TRUNCATION_MARKER.len());
        assert!(result.output.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(MAX_CAPTURE_BYTES);
        let truncated = truncate_output(long);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert!(truncated.len() <= MAX_CAPTURE_BYTES + TRUNCATION_MARKER.len());
    }
}
