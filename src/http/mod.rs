use std::{sync::mpsc::Sender, thread::JoinHandle};

pub mod error;
mod page;
pub mod proxy;
pub mod server;

/// A rouille server running on its own thread.
pub struct RunningServer {
    handle: JoinHandle<()>,
    stop: Sender<()>,
}

impl From<(JoinHandle<()>, Sender<()>)> for RunningServer {
    fn from((handle, stop): (JoinHandle<()>, Sender<()>)) -> Self {
        Self { handle, stop }
    }
}

impl RunningServer {
    /// Blocks until the server thread exits.
    pub fn join(self) {
        let Self { handle, stop } = self;
        if handle.join().is_err() {
            log::error!("server thread panicked");
        }
        drop(stop);
    }

    pub fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            log::error!("server thread panicked");
        }
    }
}
