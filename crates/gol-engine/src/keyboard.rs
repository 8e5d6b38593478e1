//! Keyboard reader feeding control keys to the controller.
//!
//! Stdin is read line by line on a dedicated OS thread, since a blocking
//! read can hold up runtime shutdown if it runs on tokio's blocking pool.
//! Every character of every line is forwarded as one key; the controller
//! decides which keys mean something.

use std::io::BufRead;
use std::thread;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Start the reader thread.
///
/// When stdin reaches end of file the thread keeps `keys` open until the
/// controller drops its receiver, so a closed stdin does not end the run.
pub fn spawn_keyboard(keys: mpsc::Sender<char>) -> std::io::Result<thread::JoinHandle<()>> {
    let runtime = Handle::current();
    thread::Builder::new()
        .name(String::from("keyboard"))
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, "Failed to read stdin");
                        break;
                    }
                };
                for key in line.chars() {
                    if keys.blocking_send(key).is_err() {
                        debug!("Controller stopped, keyboard reader exiting");
                        return;
                    }
                }
            }
            debug!("Stdin closed, holding control stream open");
            runtime.block_on(keys.closed());
        })
}
