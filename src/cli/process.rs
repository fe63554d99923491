use std::{env, path::PathBuf, process::Stdio};

use anyhow::Result;
use sysinfo::{get_current_pid, Signal, System};

/// Resolves the daemon binary, which is expected to live next to the cli
/// binary.
fn daemon_binary_path() -> PathBuf {
    let mut path = env::current_exe().expect("Can't operate without an executable");
    path.set_file_name("shamewatch-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

/// Terminates every running daemon started from our binary.
pub fn kill_running_daemons() {
    let name = daemon_binary_path();
    let system = System::new_all();
    let current_id = get_current_pid().unwrap();
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
        {
            // This will forcefully terminate the process on Windows. Anything better will require a
            // lot more work.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
        }
    }
}

/// Intended for shutting down the previous daemon and starting a new one.
/// Currently for simplicity sake it operates using a detached process. This
/// is not great but it's not as hard to configure.
pub fn restart_daemon(dir: Option<PathBuf>) -> Result<()> {
    let daemon = daemon_binary_path();
    kill_running_daemons();

    let mut command = std::process::Command::new(&daemon);
    if let Some(dir) = dir {
        command.arg("--dir");
        command.arg(dir);
    }

    #[cfg(feature = "win")]
    {
        use std::os::windows::process::CommandExt;
        use windows::Win32::System::Threading::DETACHED_PROCESS;
        command.creation_flags(DETACHED_PROCESS.0);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
        command.stdin(Stdio::null());
        command.stdout(Stdio::null());
    }

    println!("Spawning daemon");
    #[allow(clippy::zombie_processes)]
    let _ = command.spawn()?;
    println!("Success");
    Ok(())
}
