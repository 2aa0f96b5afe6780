//! Subprocess helpers.

use std::process::Stdio;

use bstatus_framework::SampleError;
use tokio::process::Command;

/// Run `program` with `args` and return its trimmed standard output.
pub(crate) async fn run(program: &str, args: &[&str]) -> Result<String, SampleError> {
    let display = std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");
    output(Command::new(program).args(args), display).await
}

/// Run `command` through `sh -c` and return its trimmed standard output.
pub(crate) async fn shell(command: &str) -> Result<String, SampleError> {
    output(Command::new("sh").arg("-c").arg(command), command.to_string()).await
}

async fn output(command: &mut Command, display: String) -> Result<String, SampleError> {
    let output = command
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| SampleError::command(display.as_str(), e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => output.status.to_string(),
            stderr => stderr.to_string(),
        };
        return Err(SampleError::command(display, message));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shell_trims_output() {
        assert_eq!(shell("printf '  hi \\n'").await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_shell_failure_uses_stderr() {
        let err = shell("echo oops >&2; exit 3").await.unwrap_err();
        assert_eq!(err, SampleError::command("echo oops >&2; exit 3", "oops"));
    }

    #[tokio::test]
    async fn test_shell_failure_without_stderr() {
        let err = shell("exit 2").await.unwrap_err();
        assert!(err.to_string().starts_with("exit 2: exit status: 2"));
    }
}
