use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{backend::TaggingBackend, error::BackendError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECHECK_ATTEMPTS: u32 = 3;

/// Connect to the tagging backend and keep the shared state in degraded mode while it is unreachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn TaggingBackend>, BackendError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(backend) => {
                state.set_backend(backend.clone()).await;
                info!("tagging backend reachable; leaving degraded mode");
                delay = INITIAL_DELAY;

                if !watch_health(&state, backend.as_ref()).await {
                    warn!("exhausted backend health rechecks; dropping the connection");
                    state.clear_backend().await;
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "tagging backend connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the backend until it stays unhealthy for every recheck. Returns `false` then.
async fn watch_health(state: &SharedState, backend: &dyn TaggingBackend) -> bool {
    loop {
        match backend.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("tagging backend healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "tagging backend health check failed; entering degraded mode");
                state.update_degraded(true).await;

                let mut attempt = 0;
                let mut recheck_delay = INITIAL_DELAY;
                let mut recovered = false;

                while attempt < MAX_RECHECK_ATTEMPTS {
                    sleep(recheck_delay).await;
                    match backend.health_check().await {
                        Ok(()) => {
                            info!(attempt, "tagging backend recovered");
                            recovered = true;
                            break;
                        }
                        Err(err) => {
                            warn!(attempt, error = %err, "tagging backend recheck failed");
                            attempt += 1;
                            recheck_delay = (recheck_delay * 2).min(MAX_DELAY);
                        }
                    }
                }

                if !recovered {
                    return false;
                }
                state.update_degraded(false).await;
                sleep(HEALTH_POLL_INTERVAL).await;
            }
        }
    }
}
