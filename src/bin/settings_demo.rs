use turnstile::settings::*;

fn main() -> anyhow::Result<()> {
    // $ cargo run --bin settings_demo -- --settings=settings/dev.toml
    let cli = Cli::parse();
    let settings = parse_settings(cli.settings.as_deref())?;

    // the signing secret must never show up here
    println!("Loaded settings: {:?}", settings);
    println!(
        "access ttl {:?}, store timeout {:?}, entropy timeout {:?}",
        settings.auth.access_ttl(),
        settings.auth.store_timeout(),
        settings.auth.entropy_timeout(),
    );
    println!(
        "log filter: {}, format: {:?}, request timeout {:?}",
        settings.log.effective_filter(settings.env),
        settings.log.effective_format(settings.env),
        settings.http.timeout(),
    );

    // An empty path is rejected
    println!("Error on invalid path: {:?}", parse_settings(Some("")).is_err());
    Ok(())
}
