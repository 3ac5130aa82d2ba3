use std::borrow::Cow;
use std::ffi::OsStr;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam::channel::{bounded, RecvTimeoutError};
use log::Level::Debug;
use log::{debug, log_enabled};

pub struct CmdOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CmdOutput {
    #[inline]
    pub fn ok(&self) -> bool {
        self.status.success()
    }

    #[inline]
    pub fn stdout_utf8_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    #[inline]
    pub fn stderr_utf8_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// Run a command, killing it if it doesn't finish within [timeout].
///
/// A killed child yields [crate::Error::CommandTimeout]; whatever it wrote
/// before the kill is discarded with it.
pub fn run_cmd_timeout<C, S>(cmd: C, args: &[S], timeout: Duration) -> crate::Result<CmdOutput>
where
    C: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    if log_enabled!(Debug) {
        log_cmd(&cmd, args);
    }

    let mut child = Command::new(cmd)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .spawn()?;

    let out = child.stdout.take().expect("stdout was piped");
    let err = child.stderr.take().expect("stderr was piped");

    let child = Arc::new(Mutex::new(child));
    let reaped = Arc::new(AtomicBool::new(false));
    let killed = Arc::new(AtomicBool::new(false));

    // The sender is only ever dropped; the watchdog unblocks on either the
    // drop or the timeout, whichever comes first.
    let (done_tx, done_rx) = bounded::<()>(0);
    {
        let child = Arc::clone(&child);
        let reaped = Arc::clone(&reaped);
        let killed = Arc::clone(&killed);
        std::thread::spawn(move || match done_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                if !reaped.load(Ordering::Relaxed) {
                    killed.store(true, Ordering::Relaxed);
                    if let Err(e) = child.lock().expect("poisoned").kill() {
                        debug!("failed to kill timed out child: {}", e);
                    }
                }
            }
            _ => {}
        });
    }

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    // Blocks until both pipes hit EOF, which a kill guarantees
    read2(out, err, &mut stdout, &mut stderr)?;

    let status = { child.lock().expect("poisoned").wait()? };
    reaped.store(true, Ordering::Relaxed);
    drop(done_tx);

    if killed.load(Ordering::Relaxed) {
        return Err(crate::Error::CommandTimeout(timeout));
    }

    Ok(CmdOutput {
        status,
        stdout,
        stderr,
    })
}

pub fn log_cmd<C, S>(cmd: &C, args: &[S])
where
    C: AsRef<OsStr>,
    S: AsRef<OsStr>,
{
    let nargs = args.len();
    if nargs > 0 {
        let mut args_string = String::new();
        for (i, e) in args.iter().enumerate() {
            args_string.push_str(&e.as_ref().to_string_lossy());
            if i < nargs - 1 {
                args_string.push(' ');
            }
        }
        debug!(
            "Running command: `{} {}`",
            cmd.as_ref().to_string_lossy(),
            args_string
        );
    } else {
        debug!("Running command: `{}`", cmd.as_ref().to_string_lossy());
    }
}

use self::imp::read2;

#[cfg(unix)]
mod imp {
    use std::io;
    use std::io::prelude::*;
    use std::mem;
    use std::os::unix::prelude::*;
    use std::process::{ChildStderr, ChildStdout};

    /// Drain both child pipes to EOF without risking a deadlock when one of
    /// them fills while the other is being read.
    pub fn read2(
        mut out_pipe: ChildStdout,
        mut err_pipe: ChildStderr,
        out: &mut Vec<u8>,
        err: &mut Vec<u8>,
    ) -> io::Result<()> {
        unsafe {
            libc::fcntl(out_pipe.as_raw_fd(), libc::F_SETFL, libc::O_NONBLOCK);
            libc::fcntl(err_pipe.as_raw_fd(), libc::F_SETFL, libc::O_NONBLOCK);
        }

        let mut out_done = false;
        let mut err_done = false;

        let mut fds: [libc::pollfd; 2] = unsafe { mem::zeroed() };
        fds[0].fd = out_pipe.as_raw_fd();
        fds[0].events = libc::POLLIN;
        fds[1].fd = err_pipe.as_raw_fd();
        fds[1].events = libc::POLLIN;

        // read_to_end on a non-blocking fd keeps what it read so far in the
        // buffer when it hits EWOULDBLOCK; Ok means EOF.
        let handle = |res: io::Result<usize>| match res {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.kind() == io::ErrorKind::WouldBlock {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        };

        while !out_done || !err_done {
            let r = unsafe { libc::poll(fds.as_mut_ptr(), 2, -1) };
            if r == -1 {
                let e = io::Error::last_os_error();
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e);
            }

            if !out_done && fds[0].revents != 0 && handle(out_pipe.read_to_end(out))? {
                out_done = true;
                fds[0].fd = -1;
            }
            if !err_done && fds[1].revents != 0 && handle(err_pipe.read_to_end(err))? {
                err_done = true;
                fds[1].fd = -1;
            }
        }

        Ok(())
    }
}
