pub mod books;

use std::sync::Arc;

use anyhow::Context;
use bookshelf_authz::{GoTrueVerifier, IdentityVerifier};
use bookshelf_db::{BookStore, PostgrestBookStore};
use bookshelf_kernel::{settings::Settings, ModuleRegistry};

/// Build the backend clients once and register every module with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let verifier: Arc<dyn IdentityVerifier> = Arc::new(
        GoTrueVerifier::new(&settings.identity)
            .with_context(|| "failed to build identity verifier")?,
    );
    let store: Arc<dyn BookStore> = Arc::new(
        PostgrestBookStore::new(&settings.store).with_context(|| "failed to build book store")?,
    );

    registry.register(books::create_module(verifier, store));
    Ok(())
}
