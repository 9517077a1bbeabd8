//! Subprocess agent bridge.
//!
//! Wraps any external agent program: the query is written to its stdin and
//! its stdout is the response. In streaming mode every stdout line is one
//! event; JSON object lines are passed through as-is and anything else is
//! yielded as a raw string (newline kept) so plain-text agents stream too.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use chatloop_core::agent::{ChatAgent, EventStream};
use chatloop_types::error::AgentError;

/// How often a blocking call checks whether its child has exited.
const WAIT_POLL: Duration = Duration::from_millis(20);

/// An agent backed by an external command.
#[derive(Debug, Clone)]
pub struct ProcessAgent {
    name: String,
    program: String,
    args: Vec<String>,
    streaming: bool,
    /// Child of the in-flight blocking call, so `cancel` can kill it.
    running: Arc<Mutex<Option<Child>>>,
}

impl ProcessAgent {
    /// `command` is the program followed by its arguments.
    pub fn new(name: impl Into<String>, command: &[String]) -> Result<Self, AgentError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AgentError::Spawn("no agent command given".to_string()))?;
        Ok(Self {
            name: name.into(),
            program: program.clone(),
            args: args.to_vec(),
            streaming: true,
            running: Arc::new(Mutex::new(None)),
        })
    }

    /// Disable streaming so every query goes through the blocking path.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn running(&self) -> MutexGuard<'_, Option<Child>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// One stdout line as an event.
fn line_event(line: String) -> Value {
    match serde_json::from_str::<Value>(&line) {
        Ok(value @ Value::Object(_)) => value,
        _ => Value::String(line + "\n"),
    }
}

/// The whole stdout as a response.
fn output_response(stdout: String) -> Value {
    match serde_json::from_str::<Value>(stdout.trim()) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(stdout),
    }
}

fn exit_error(status: std::process::ExitStatus, stderr: &str) -> AgentError {
    AgentError::Exit {
        status: status.to_string(),
        stderr: stderr.trim().to_string(),
    }
}

impl ChatAgent for ProcessAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn stream(&self, query: &str) -> Option<EventStream> {
        if !self.streaming {
            return None;
        }

        let program = self.program.clone();
        let args = self.args.clone();
        let query = query.to_string();

        let stream: EventStream = Box::pin(async_stream::try_stream! {
            let mut child = tokio::process::Command::new(&program)
                .args(&args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| AgentError::Spawn(format!("{program}: {e}")))?;
            debug!(program = %program, pid = ?child.id(), "Agent process started");

            if let Some(mut stdin) = child.stdin.take() {
                if let Err(err) = stdin.write_all(query.as_bytes()).await {
                    if err.kind() != ErrorKind::BrokenPipe {
                        Err(AgentError::from(err))?;
                    }
                }
                // Dropping stdin closes the pipe and signals EOF.
            }

            let stderr_task = child.stderr.take().map(|mut stderr| {
                tokio::spawn(async move {
                    let mut buf = String::new();
                    let _ = stderr.read_to_string(&mut buf).await;
                    buf
                })
            });

            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| AgentError::Io("agent stdout was not captured".to_string()))?;
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await.map_err(AgentError::from)? {
                yield line_event(line);
            }

            let status = child.wait().await.map_err(AgentError::from)?;
            if !status.success() {
                let stderr = match stderr_task {
                    Some(task) => task.await.unwrap_or_default(),
                    None => String::new(),
                };
                Err(exit_error(status, &stderr))?;
            }
        });
        Some(stream)
    }

    fn call(&self, query: &str) -> Result<Value, AgentError> {
        let mut child = std::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AgentError::Spawn(format!("{}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(query.as_bytes()) {
                if err.kind() != ErrorKind::BrokenPipe {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(err.into());
                }
            }
        }

        let stdout = read_pipe(child.stdout.take());
        let stderr = read_pipe(child.stderr.take());
        debug!(program = %self.program, pid = child.id(), "Agent process started");
        *self.running() = Some(child);

        let status = loop {
            {
                let mut slot = self.running();
                let Some(child) = slot.as_mut() else {
                    return Err(AgentError::Cancelled);
                };
                if let Some(status) = child.try_wait()? {
                    slot.take();
                    break status;
                }
            }
            thread::sleep(WAIT_POLL);
        };

        let stdout = stdout.join().unwrap_or_default();
        if !status.success() {
            let stderr = stderr.join().unwrap_or_default();
            return Err(exit_error(status, &stderr));
        }
        Ok(output_response(stdout))
    }

    /// Kill the child of an in-flight blocking call. Streaming children are
    /// killed when their stream is dropped.
    fn cancel(&self) {
        if let Some(mut child) = self.running().take() {
            let pid = child.id();
            if let Err(e) = child.kill() {
                debug!(pid, error = %e, "Agent process already gone");
            }
            let _ = child.wait();
            debug!(pid, "Agent process killed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use serde_json::json;

    fn sh(script: &str) -> ProcessAgent {
        let command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        ProcessAgent::new("Shell", &command).unwrap()
    }

    async fn collect(agent: &ProcessAgent, query: &str) -> Vec<Result<Value, AgentError>> {
        agent.stream(query).unwrap().collect().await
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = ProcessAgent::new("Nobody", &[]).unwrap_err();
        assert!(matches!(err, AgentError::Spawn(_)));
    }

    #[test]
    fn line_event_keeps_objects_and_wraps_text() {
        assert_eq!(line_event(r#"{"data": "hi"}"#.to_string()), json!({"data": "hi"}));
        assert_eq!(line_event("plain text".to_string()), json!("plain text\n"));
        assert_eq!(line_event("42".to_string()), json!("42\n"));
    }

    #[test]
    fn output_response_falls_back_to_string() {
        assert_eq!(output_response("{\"text\": \"x\"}\n".to_string()), json!({"text": "x"}));
        assert_eq!(output_response("hello\n".to_string()), json!("hello\n"));
    }

    #[test]
    fn streaming_can_be_disabled() {
        let agent = sh("cat").with_streaming(false);
        assert!(agent.stream("hi").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stream_yields_one_event_per_line() {
        let agent = sh(r#"read q; echo "{\"data\": \"got $q\"}"; echo done"#);
        let events = collect(&agent, "ping\n").await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap(), &json!({"data": "got ping"}));
        assert_eq!(events[1].as_ref().unwrap(), &json!("done\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stream_reports_non_zero_exit_with_stderr() {
        let agent = sh("echo partial; echo boom >&2; exit 3");
        let events = collect(&agent, "").await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap(), &json!("partial\n"));
        match &events[1] {
            Err(AgentError::Exit { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected exit error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stream_reports_spawn_failure() {
        let command = vec!["definitely-not-an-agent-xyz".to_string()];
        let agent = ProcessAgent::new("Ghost", &command).unwrap();
        let events = collect(&agent, "hi").await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(AgentError::Spawn(_))));
    }

    #[cfg(unix)]
    #[test]
    fn call_parses_json_output() {
        let agent = sh(r#"cat > /dev/null; echo '{"message": {"content": [{"text": "Hi"}]}}'"#);
        let response = agent.call("hello").unwrap();
        assert_eq!(response["message"]["content"][0]["text"], "Hi");
    }

    #[cfg(unix)]
    #[test]
    fn call_echoes_plain_text() {
        let agent = sh("cat");
        assert_eq!(agent.call("echo me").unwrap(), json!("echo me"));
    }

    #[cfg(unix)]
    #[test]
    fn cancel_kills_blocking_call() {
        let agent = Arc::new(sh("sleep 30"));
        let started = std::time::Instant::now();
        let worker = {
            let agent = Arc::clone(&agent);
            thread::spawn(move || agent.call("q"))
        };
        while agent.running().is_none() {
            thread::sleep(Duration::from_millis(5));
        }

        agent.cancel();

        assert!(matches!(worker.join().unwrap(), Err(AgentError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(agent.running().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn call_reports_exit_status() {
        let agent = sh("echo nope >&2; exit 1");
        assert!(matches!(agent.call("x"), Err(AgentError::Exit { .. })));
    }
}
