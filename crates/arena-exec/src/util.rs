use std::{process::ExitStatus, time::Duration};

use tokio::process::Child;

/// Ask the child to terminate, give it `grace` to exit, then kill it.
pub async fn kill_graceful(child: &mut Child, grace: Duration) -> std::io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        if let Some(id) = child.id() {
            // SAFETY: signals a pid this process spawned and has not reaped yet.
            unsafe {
                libc::kill(id as libc::pid_t, libc::SIGTERM);
            }
        }
    }

    if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
        return status;
    }
    child.kill().await?;
    child.wait().await
}
