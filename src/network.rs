use std::{
    env,
    net::{SocketAddr, TcpStream},
    time::Duration,
};

use dialoguer::Select;

use crate::{cmd, error::InstallerError, ui};

const PROBE_ADDR: ([u8; 4], u16) = ([8, 8, 8, 8], 53);
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// True when a TCP connection to `addr` opens within `timeout`.
pub fn reachable(addr: SocketAddr, timeout: Duration) -> bool {
    TcpStream::connect_timeout(&addr, timeout).is_ok()
}

pub fn check_internet() -> bool {
    let online = reachable(SocketAddr::from(PROBE_ADDR), PROBE_TIMEOUT);
    tracing::info!(online, "connectivity check");
    online
}

/// KDE's network module under a graphical session, `nmtui` on a bare console.
pub fn open_network_settings() -> Result<(), InstallerError> {
    if env::var_os("DISPLAY").is_some() || env::var_os("WAYLAND_DISPLAY").is_some() {
        cmd::spawn_detached("kcmshell6", &["kcm_networkmanagement"])
    } else {
        cmd::run_interactive("nmtui", &[])
    }
}

/// Blocks until the machine is online or the user gives up.
pub fn ensure_online() -> Result<(), InstallerError> {
    loop {
        let pb = ui::spinner("Checking internet connection...");
        let online = check_internet();
        pb.finish_and_clear();

        if online {
            ui::print_success("Internet connection detected.");
            return Ok(());
        }

        ui::print_warning("No internet connection found.");
        let choice = Select::new()
            .with_prompt("An internet connection is required")
            .items(&["Retry", "Open network settings", "Cancel"])
            .default(1)
            .interact()?;

        match choice {
            0 => continue,
            1 => {
                if let Err(e) = open_network_settings() {
                    ui::print_error(&format!("Could not open network settings: {e}"));
                } else {
                    ui::print_info("Connect to a network, then choose Retry.");
                }
            }
            _ => return Err(InstallerError::Cancelled),
        }
    }
}
