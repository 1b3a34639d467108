//! Remote code input: `--press` codes and an optional stdin reader thread.

use std::io::BufRead;

use crossbeam_channel as xch;
use stepguard_traits::CommandSource;

/// Command source fed through a channel; never blocks the control loop.
pub struct ChannelCommands {
    rx: xch::Receiver<u32>,
}

impl CommandSource for ChannelCommands {
    fn poll(&mut self) -> Option<u32> {
        self.rx.try_recv().ok()
    }
}

/// Queue `press` codes, then optionally follow stdin (one code per line).
///
/// The stdin thread is detached; it ends at EOF or when the loop is gone.
pub fn command_channel(press: &[u32], follow_stdin: bool) -> ChannelCommands {
    let (tx, rx) = xch::unbounded();
    for &code in press {
        let _ = tx.send(code);
    }
    if follow_stdin {
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match stepguard_config::parse_code(line) {
                    Ok(code) => {
                        if tx.send(code).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "ignoring stdin line"),
                }
            }
            tracing::debug!("stdin closed");
        });
    }
    ChannelCommands { rx }
}
