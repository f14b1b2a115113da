use turnstile::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    debug!("hidden: bootstrap filter is info");
    info!("bootstrap info log");

    logger.reload_from_config(&LogConfig {
        filter: "turnstile=debug".to_string(),
        format: LogFormat::Text,
    })?;
    debug!(user_id = "11111111-1111-1111-1111-111111111111", "refresh token rotated");
    warn!("refresh token does not match any stored credential");

    // same events, as the dev and prod profiles print them
    logger.reload_from_config(&LogConfig {
        filter: "turnstile=debug".to_string(),
        format: LogFormat::Json,
    })?;
    let span = tracing::info_span!("request", op = "api.v1.refresh", request_id = "V1StGXR8_Z5j");
    let _entered = span.enter();
    info!(user_id = "11111111-1111-1111-1111-111111111111", "refresh token rotated");

    // malformed directives leave the previous filter in place
    let is_err = logger
        .reload_from_config(&LogConfig {
            filter: "turnstile=loud".to_string(),
            format: LogFormat::Json,
        })
        .is_err();
    info!(is_err, "reload with a bad filter");

    Ok(())
}
