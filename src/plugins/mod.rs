pub mod discord;
pub mod scheduler;
pub mod sweep;

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::state::AppState;

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(
    &self,
    app: Arc<AppState>,
    shutdown: CancellationToken,
  ) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Arc<dyn Plugin>>,
  shutdown: CancellationToken,
}

impl App {
  pub fn new(shutdown: CancellationToken) -> Self {
    Self { plugins: Vec::new(), shutdown }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Arc::new(plugin));
    self
  }

  pub async fn run(self, app: Arc<AppState>) {
    for plugin in self.plugins {
      let app = app.clone();
      let shutdown = self.shutdown.clone();

      tokio::spawn(async move {
        let name = plugin.name();
        info!("SYSTEM: Service `{}` initialized", name);

        loop {
          let app = app.clone();
          let plugin = plugin.clone();
          let token = shutdown.clone();

          let handle =
            tokio::spawn(async move { plugin.start(app, token).await });

          match handle.await {
            Ok(Ok(())) => {
              if shutdown.is_cancelled() {
                info!("Service `{}` shutdown.", name);
                break;
              }
              warn!("Service `{name}` stopped unexpectedly (Ok).",);
            }
            Ok(Err(err)) => {
              error!("Service `{name}` crashed with error: {err:#}.",);
            }
            Err(join_err) => {
              if join_err.is_cancelled() {
                info!("Service `{}` shutdown.", name);
                break;
              } else {
                error!("Service `{}` PANICKED!", name);
              }
            }
          }

          tokio::select! {
            _ = shutdown.cancelled() => {
              info!("Service `{}` shutdown.", name);
              break;
            }
            _ = sleep(Duration::from_secs(5)) => {}
          }
          info!("SYSTEM: Restarting service `{}`...", name);
        }
      });
    }
  }
}
