//! `SumoLauncher`: start the engine as a child process and connect to it.

use std::env;
use std::net::{Ipv4Addr, TcpListener};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::{GatewayError, GatewayResult, Launcher, ScenarioSpec, TraciGateway};

/// Spawns `<binary> -c <config> --remote-port <port>` for each session.
///
/// The binary is looked up under `$SUMO_HOME/bin` when that variable is set,
/// otherwise on `PATH`.
#[derive(Clone, Debug)]
pub struct SumoLauncher {
    /// Connection attempts before giving up.
    pub connect_attempts: u32,
    /// Pause between connection attempts.
    pub retry_delay: Duration,
    /// Keep the engine's own console output.
    pub inherit_output: bool,
}

impl Default for SumoLauncher {
    fn default() -> Self {
        Self {
            connect_attempts: 60,
            retry_delay:      Duration::from_millis(250),
            inherit_output:   false,
        }
    }
}

impl SumoLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the executable for `binary`.
    pub fn resolve_binary(binary: &str) -> PathBuf {
        match env::var_os("SUMO_HOME") {
            Some(home) => PathBuf::from(home).join("bin").join(binary),
            None => PathBuf::from(binary),
        }
    }
}

/// Ask the OS for a port nobody is listening on.
fn free_port() -> GatewayResult<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .map_err(|e| GatewayError::Launch(format!("no free port: {e}")))?;
    Ok(listener.local_addr()?.port())
}

impl Launcher for SumoLauncher {
    type Session = TraciGateway;

    fn launch(&self, scenario: &ScenarioSpec) -> GatewayResult<TraciGateway> {
        if !scenario.config_file.is_file() {
            return Err(GatewayError::Launch(format!(
                "scenario file {} does not exist",
                scenario.config_file.display()
            )));
        }

        let program = Self::resolve_binary(&scenario.binary);
        let port = free_port()?;
        let (stdout, stderr) = if self.inherit_output {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };

        info!(
            "launching {} -c {} on port {port}",
            program.display(),
            scenario.config_file.display()
        );
        let mut child = Command::new(&program)
            .arg("-c")
            .arg(&scenario.config_file)
            .arg("--remote-port")
            .arg(port.to_string())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| GatewayError::Launch(format!("{}: {e}", program.display())))?;

        let mut last_error = None;
        for attempt in 1..=self.connect_attempts {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(GatewayError::Launch(format!(
                    "{} exited before accepting connections ({status})",
                    program.display()
                )));
            }
            match TraciGateway::connect((Ipv4Addr::LOCALHOST, port)) {
                Ok(gateway) => {
                    debug!("connected to port {port} after {attempt} attempt(s)");
                    return Ok(gateway.with_child(child));
                }
                Err(e) => last_error = Some(e),
            }
            thread::sleep(self.retry_delay);
        }

        // Never reached a live session; do not leave the process behind.
        let _ = child.kill();
        let _ = child.wait();
        Err(GatewayError::Launch(format!(
            "could not connect to {} on port {port}: {}",
            program.display(),
            last_error.map_or_else(|| "no attempts made".to_string(), |e| e.to_string())
        )))
    }
}
