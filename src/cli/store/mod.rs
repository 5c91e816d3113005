//! Store maintenance commands

use tracing::info;

use crate::create_facade_with_config;

/// Ping the configured store
pub async fn ping() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let facade = create_facade_with_config(&config).await?;

    facade.store().ping().await?;

    info!(cache_type = %config.cache.cache_type, "Store is reachable");
    println!("PONG");

    Ok(())
}

/// Remove cached entries
///
/// With a namespace configured only that namespace is cleared; otherwise the
/// whole store is.
pub async fn clear() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let facade = create_facade_with_config(&config).await?;

    match &config.cache.namespace {
        Some(namespace) => {
            let removed = facade.invalidate_namespace().await?;
            info!(namespace = %namespace, removed, "Namespace cleared");
            println!("Removed {} entries from namespace '{}'", removed, namespace);
        }
        None => {
            facade.store().clear().await?;
            info!("Store cleared");
            println!("Store cleared");
        }
    }

    Ok(())
}
