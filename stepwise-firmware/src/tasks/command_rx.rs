//! Command UART receive task
//!
//! Reads re-arm commands from the host, one per line:
//!
//! ```text
//! 16384 0.10          # every experiment
//! motor_b: -8192 0.25 # one experiment by name
//! ```

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;
use heapless::Vec;

use stepwise_core::command::parse_command;

use crate::channels::REARM_PARAMS;
use crate::config::experiments;

/// Longest accepted command line
const MAX_COMMAND_LEN: usize = 64;

/// Command RX task - parses re-arm lines and routes them to experiments
#[embassy_executor::task]
pub async fn command_rx_task(mut rx: BufferedUartRx) {
    info!("Command RX task started");

    let mut buf = [0u8; 32];
    let mut line: Vec<u8, MAX_COMMAND_LEN> = Vec::new();
    let mut overflowed = false;

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
        };

        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                if overflowed {
                    warn!("Command line too long, dropped");
                } else if !line.is_empty() {
                    handle_line(&line);
                }
                line.clear();
                overflowed = false;
            } else if line.push(byte).is_err() {
                overflowed = true;
            }
        }
    }
}

/// Parse one line and hand the parameters to the matching experiments
fn handle_line(line: &[u8]) {
    let Ok(text) = core::str::from_utf8(line) else {
        warn!("Command is not UTF-8");
        return;
    };

    let command = match parse_command(text) {
        Ok(command) => command,
        Err(e) => {
            warn!("Bad command '{}': {:?}", text, e);
            return;
        }
    };

    let mut routed = false;
    for (index, config) in experiments().iter().enumerate() {
        if command.applies_to(config.name.as_str()) {
            info!("Re-arm {}: {:?}", config.name.as_str(), command.params);
            REARM_PARAMS[index].signal(command.params);
            routed = true;
        }
    }

    if !routed {
        warn!("No experiment named '{}'", command.target.unwrap_or(""));
    }
}
