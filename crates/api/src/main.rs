use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;

use campus_api::identity::StaticTokenProvider;
use campus_core::IdentityId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    campus_observability::init();

    let admin_identity = match std::env::var("CAMPUS_ADMIN_IDENTITY") {
        Ok(raw) => IdentityId::from_str(&raw).context("CAMPUS_ADMIN_IDENTITY is not a UUID")?,
        Err(_) => {
            let generated = IdentityId::new();
            tracing::warn!(identity_id = %generated, "CAMPUS_ADMIN_IDENTITY not set; generated one");
            generated
        }
    };

    let admin_token = std::env::var("CAMPUS_ADMIN_TOKEN").unwrap_or_else(|_| {
        tracing::warn!("CAMPUS_ADMIN_TOKEN not set; using insecure dev default");
        "dev-admin-token".to_string()
    });

    let provider = Arc::new(StaticTokenProvider::new().with_token(admin_token, admin_identity));

    let app = campus_api::app::build_app(provider, Some(admin_identity)).await?;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .context("failed to bind 0.0.0.0:8080")?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
