use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Lines of stderr kept for error messages
const STDERR_TAIL: usize = 20;

/// Which stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Exit status plus the last lines written to stderr
#[derive(Debug)]
pub struct StreamedOutput {
    pub status: ExitStatus,
    pub stderr_tail: Vec<String>,
}

/// Run a command and capture output, failing on non-zero exit
pub fn run_checked(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Command failed: {} {}: {}", cmd, args.join(" "), stderr.trim())
    }
}

/// Run a command in `cwd`, handing each output line to `on_line` as it arrives
///
/// stdout is read on the calling thread and stderr on a helper thread, so
/// `on_line` must be shareable between them.
pub fn run_streaming<F>(cmd: &str, args: &[String], cwd: &Path, on_line: F) -> Result<StreamedOutput>
where
    F: Fn(Stream, &str) + Sync,
{
    let mut child = Command::new(cmd)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    let stdout = child.stdout.take().context("Child stdout was not captured")?;
    let stderr = child.stderr.take().context("Child stderr was not captured")?;

    let stderr_tail = std::thread::scope(|scope| {
        let on_line = &on_line;
        let err_reader = scope.spawn(move || {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL);
            for_each_line(stderr, |line| {
                on_line(Stream::Stderr, line);
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line.to_string());
            });
            tail
        });

        for_each_line(stdout, |line| on_line(Stream::Stdout, line));

        err_reader.join().unwrap_or_default()
    });

    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for: {cmd}"))?;

    Ok(StreamedOutput {
        status,
        stderr_tail: stderr_tail.into(),
    })
}

fn for_each_line<R: Read>(reader: R, mut f: impl FnMut(&str)) {
    for line in BufReader::new(reader).lines() {
        match line {
            Ok(line) => f(line.trim_end()),
            Err(e) => {
                log::debug!("Stopped reading command output: {e}");
                break;
            }
        }
    }
}
