use clap::Parser;
use calcwire::cli::{Cli, Commands};
use calcwire::client::RequestOptions;
use calcwire::types::config::Config;
use calcwire::CalcResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> CalcResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default_config()
    };

    // Determine log level: CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("calcwire={}", log_level)
            .parse()
            .unwrap_or_else(|_| "calcwire=info".parse().expect("fallback directive is valid")),
    );

    let json = config.general.log_format.eq_ignore_ascii_case("json");
    tracing_subscriber::registry()
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .with(filter)
        .init();

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Serve { host, port } => {
            calcwire::cli::commands::serve(host, port, &config).await?;
        }
        Commands::Proxy {
            host,
            port,
            upstream_host,
            upstream_port,
        } => {
            calcwire::cli::commands::proxy(host, port, upstream_host, upstream_port, &config)
                .await?;
        }
        Commands::Client {
            host,
            port,
            expr,
            no_steps,
            no_cache,
            cache_control,
        } => {
            let defaults = RequestOptions::from_config(&config.client);
            let options = RequestOptions {
                show_steps: defaults.show_steps && !no_steps,
                cache_result: defaults.cache_result && !no_cache,
                cache_control: cache_control.unwrap_or(defaults.cache_control),
            };
            calcwire::cli::commands::client(host, port, expr, options, &config).await?;
        }
        Commands::Eval { name } => {
            calcwire::cli::commands::eval(&name)?;
        }
        Commands::Init { path } => {
            calcwire::cli::commands::init(path).await?;
        }
        Commands::Version => {
            calcwire::cli::commands::version();
        }
    }

    Ok(())
}
