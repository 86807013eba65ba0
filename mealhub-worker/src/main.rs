mod bootstrap;
mod cli;
mod tracing_setup;

use std::path::Path;

use cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    if args.help_requested {
        CliArgs::print_help();
        return Ok(());
    }

    let config_path = args
        .config_path
        .or_else(|| std::env::var("MEALHUB_CONFIG_PATH").ok());
    let mut config = mealhub_config::AppConfig::load(config_path.as_deref().map(Path::new))?;
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    tracing_setup::install_tracing(&config.logging);
    bootstrap::run(config).await
}
