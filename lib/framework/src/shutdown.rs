use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

pub struct Shutdown {
    token: CancellationToken,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> CancellationToken {
        self.token.clone()
    }

    // must be called within tokio runtime
    pub fn listen(&self) {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!(error = ?e, "failed to listen for ctrl_c");
                        return;
                    }
                    info!("received ctrl_c, shutting down");
                    token.cancel();
                }
                () = token.cancelled() => {}
            }
        });
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}
