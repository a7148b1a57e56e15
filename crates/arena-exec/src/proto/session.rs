use std::{
    path::PathBuf,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use arena_model::EngineCommand;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    process::{Child, ChildStdin, ChildStdout, Command},
};
use tracing::{debug, trace, warn};

use crate::{Dialect, ExecError, ProcessLimits, Response, attach_limits, kill_graceful};

const READ_CHUNK: usize = 4096;

/// How sessions start, frame and stop their engine.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Byte sequence that ends every reply.
    pub terminator: String,
    /// Upper bound on waiting for one reply; `None` waits indefinitely.
    pub response_timeout: Option<Duration>,
    /// Upper bound on the quit exchange in [`Session::close`].
    pub quit_timeout: Duration,
    /// How long a closing engine may take to exit before it is signalled.
    pub exit_grace: Duration,
    pub dialect: Dialect,
    pub limits: ProcessLimits,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            terminator: "\n\n".into(),
            response_timeout: None,
            quit_timeout: Duration::from_secs(2),
            exit_grace: Duration::from_secs(2),
            dialect: Dialect::default(),
            limits: ProcessLimits::default(),
            cwd: None,
            env: Vec::new(),
        }
    }
}

/// One engine subprocess and the pipes used to drive it.
///
/// Owned by exactly one driver. Dropping a session kills the engine.
pub struct Session {
    name: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    pending: Vec<u8>,
    cfg: SessionConfig,
    broken: bool,
}

impl Session {
    pub fn open(name: impl Into<String>, command: &EngineCommand, cfg: &SessionConfig) -> Result<Self, ExecError> {
        let name = name.into();
        if command.program.is_empty() {
            return Err(ExecError::MissingProgram);
        }

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &cfg.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &cfg.env {
            cmd.env(k, v);
        }
        attach_limits(&mut cmd, &cfg.limits);

        let mut child = cmd.spawn().map_err(|e| ExecError::Spawn {
            program: command.program.clone(),
            reason: e.to_string(),
        })?;
        let stdin = child.stdin.take().ok_or(ExecError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(ExecError::MissingPipe("stdout"))?;

        debug!(target: "arena.exec.session", session = %name, %command, pid = ?child.id(), "engine started");
        Ok(Self {
            name,
            child,
            stdin: Some(stdin),
            stdout,
            pending: Vec::new(),
            cfg: cfg.clone(),
            broken: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> &Dialect {
        &self.cfg.dialect
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Send one command and wait for its framed reply.
    ///
    /// Never fails: transport problems come back as [`Response::broken`], and
    /// the session answers every later command the same way.
    pub async fn send(&mut self, command: &str) -> Response {
        if self.broken {
            return Response::broken("session is broken");
        }
        let command = command.trim();
        if command.is_empty() {
            return Response::success("");
        }

        trace!(target: "arena.exec.session", session = %self.name, %command, "send");
        if let Err(e) = self.write_line(command).await {
            return self.mark_broken(format!("write `{command}`: {e}"));
        }

        let read = match self.cfg.response_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.read_reply()).await {
                Ok(read) => read,
                Err(_) => return self.mark_broken(format!("no reply to `{command}` within {limit:?}")),
            },
            None => self.read_reply().await,
        };

        match read {
            Ok(raw) => {
                let response = Response::parse(&raw);
                trace!(target: "arena.exec.session", session = %self.name, %response, "reply");
                response
            }
            Err(reason) => self.mark_broken(format!("reply to `{command}`: {reason}")),
        }
    }

    /// Stop the engine: quit command, then closed stdin, then signals.
    pub async fn close(mut self) -> Result<ExitStatus, ExecError> {
        if !self.broken {
            let quit = self.cfg.dialect.quit.clone();
            if tokio::time::timeout(self.cfg.quit_timeout, self.send(&quit)).await.is_err() {
                debug!(target: "arena.exec.session", session = %self.name, "quit not acknowledged");
            }
        }
        drop(self.stdin.take());

        match tokio::time::timeout(self.cfg.exit_grace, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(target: "arena.exec.session", session = %self.name, %status, "engine exited");
                Ok(status)
            }
            Err(_) => {
                warn!(target: "arena.exec.session", session = %self.name, "engine ignored quit; terminating");
                Ok(kill_graceful(&mut self.child, self.cfg.exit_grace).await?)
            }
        }
    }

    async fn write_line(&mut self, command: &str) -> std::io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed"))?;
        stdin.write_all(command.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await
    }

    /// Read until the terminator; bytes past it stay buffered for the next reply.
    async fn read_reply(&mut self) -> Result<String, String> {
        let term = self.cfg.terminator.as_bytes();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(at) = find(&self.pending, term) {
                let rest = self.pending.split_off(at + term.len());
                let mut raw = std::mem::replace(&mut self.pending, rest);
                raw.truncate(at);
                return Ok(String::from_utf8_lossy(&raw).into_owned());
            }
            match self.stdout.read(&mut chunk).await {
                Ok(0) => return Err("engine closed its output".into()),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) => return Err(e.to_string()),
            }
        }
    }

    fn mark_broken(&mut self, reason: String) -> Response {
        warn!(target: "arena.exec.session", session = %self.name, %reason, "session broken");
        self.broken = true;
        Response::broken(reason)
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
