//! Bookshelf application library
//!
//! Wires the backend clients into the application modules and runs the
//! HTTP server through the module lifecycle.

pub mod modules;

use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Register, initialize and start every module, then serve until shutdown.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &settings)?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = bookshelf_http::start_server(&registry, &settings).await;
    registry.stop_all().await?;
    served
}
