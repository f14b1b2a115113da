use std::fs;
use std::sync::Arc;
use tokio::signal;
use turnstile::api;
use turnstile::logger::*;
use turnstile::server::*;
use turnstile::settings::*;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&project_settings.log.config(project_settings.env))?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    let server = Arc::new(Server::try_new(&project_settings).await?);

    let routes = api::routes(server).with(warp::trace::request());
    let shutdown = async {
        signal::ctrl_c().await.expect("Could not register SIGINT");
    };

    match (&project_settings.http.cert_path, &project_settings.http.key_path) {
        (Some(cert_path), Some(key_path)) => {
            if !fs::metadata(cert_path)?.is_file() {
                return Err(anyhow::anyhow!(
                    "TLS cert is not a regular file: {:?}",
                    cert_path
                ));
            }
            if !fs::metadata(key_path)?.is_file() {
                return Err(anyhow::anyhow!(
                    "TLS key is not a regular file: {:?}",
                    key_path
                ));
            }
            info!(%address, "serving over TLS");
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .bind_with_graceful_shutdown(address, shutdown)
                .1
                .await;
        }
        (None, None) => {
            warn!(%address, "TLS is not configured, serving plain HTTP");
            warp::serve(routes)
                .bind_with_graceful_shutdown(address, shutdown)
                .1
                .await;
        }
        _ => {
            return Err(anyhow::anyhow!(
                "http.cert_path and http.key_path must be set together"
            ));
        }
    }

    info!("server stopped");
    Ok(())
}
