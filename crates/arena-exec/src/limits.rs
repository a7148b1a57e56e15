//! rlimit-based resource limits for engine subprocesses.
//!
//! On Unix the limits are applied in a `pre_exec` hook, in the child after
//! `fork()` and before `execve()`, so the engine never runs unrestricted.
//! Elsewhere a non-empty request is logged and ignored.
use tokio::process::Command;
#[cfg(not(unix))]
use tracing::warn;

/// Per-process limits applied to every engine a session starts.
///
/// `None` leaves the inherited limit unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProcessLimits {
    /// Address space in bytes (`RLIMIT_AS`). Engines that build large
    /// transposition tables are the usual reason to set this.
    pub max_memory_bytes: Option<u64>,
    /// CPU time in seconds (`RLIMIT_CPU`). The kernel sends `SIGXCPU` once exceeded.
    pub max_cpu_seconds: Option<u64>,
    /// `RLIMIT_CORE = 0`.
    pub disable_core_dumps: bool,
}

impl ProcessLimits {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_memory_bytes.is_none() && self.max_cpu_seconds.is_none() && !self.disable_core_dumps
    }
}

/// Install `limits` on `cmd`. No-op for an empty set.
pub fn attach_limits(cmd: &mut Command, limits: &ProcessLimits) {
    if limits.is_empty() {
        return;
    }

    #[cfg(unix)]
    {
        unix_impl::attach(cmd, limits);
    }

    #[cfg(not(unix))]
    {
        let _ = cmd;
        warn!(
            target: "arena.exec.limits",
            ?limits,
            "process limits requested on a non-Unix OS; ignored"
        );
    }
}

#[cfg(unix)]
mod unix_impl {
    use std::io;

    use tokio::process::Command;

    use super::ProcessLimits;

    // The resource type differs between libc targets, so no typed helper.
    macro_rules! set_limit {
        ($resource:expr, $value:expr) => {{
            let rlim = libc::rlimit {
                rlim_cur: $value as libc::rlim_t,
                rlim_max: $value as libc::rlim_t,
            };
            if libc::setrlimit($resource, &rlim) != 0 {
                return Err(io::Error::last_os_error());
            }
        }};
    }

    pub fn attach(cmd: &mut Command, limits: &ProcessLimits) {
        let memory = limits.max_memory_bytes;
        let cpu = limits.max_cpu_seconds;
        let no_core = limits.disable_core_dumps;

        // SAFETY: the hook only calls setrlimit, which is async-signal-safe.
        unsafe {
            cmd.pre_exec(move || {
                if let Some(bytes) = memory {
                    set_limit!(libc::RLIMIT_AS, bytes);
                }
                if let Some(secs) = cpu {
                    set_limit!(libc::RLIMIT_CPU, secs);
                }
                if no_core {
                    set_limit!(libc::RLIMIT_CORE, 0);
                }
                Ok(())
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(ProcessLimits::default().is_empty());
        let limits = ProcessLimits {
            disable_core_dumps: true,
            ..Default::default()
        };
        assert!(!limits.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn child_sees_the_limits() {
        let limits = ProcessLimits {
            max_memory_bytes: None,
            max_cpu_seconds: Some(7),
            disable_core_dumps: true,
        };
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "ulimit -c; ulimit -t"]);
        attach_limits(&mut cmd, &limits);

        let out = cmd.output().await.unwrap();
        assert!(out.status.success());
        let text = String::from_utf8_lossy(&out.stdout);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["0", "7"]);
    }
}
