use clap::Parser;
use technav_cli::{App, Cli, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.connection.log_format {
        LogFormat::Json => technav_telemetry::init_json_telemetry("technav")?,
        LogFormat::Text => technav_telemetry::init_telemetry("technav")?,
    }

    let scope = cli.scope()?;
    let app = App::connect(&cli.connection).await?;
    let mut stdout = std::io::stdout();
    technav_cli::run(&app, &scope, cli.command, cli.output, &mut stdout).await
}
