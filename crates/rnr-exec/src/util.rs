use std::time::Duration;

use tokio::process::Child;

/// Ask the child to exit with SIGTERM, then kill it if it is still alive after `grace`.
#[cfg(unix)]
pub async fn kill_graceful(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    if let Some(id) = child.id() {
        // SAFETY: signals our own child; a stale pid only yields ESRCH.
        unsafe {
            libc::kill(id as libc::pid_t, libc::SIGTERM);
        }
        if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
            return status.map(|_| ());
        }
    }
    child.kill().await
}

#[cfg(not(unix))]
pub async fn kill_graceful(child: &mut Child, _grace: Duration) -> std::io::Result<()> {
    child.kill().await
}
