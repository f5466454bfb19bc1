pub mod api;
pub mod clients;
pub mod config;
pub mod constants;
pub mod copilot;
pub mod db;
pub mod entities;
pub mod services;

use anyhow::Context;
pub use config::Config;
use db::{Role, Store};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let mut log_level = config.general.log_level.clone();
    if config.general.suppress_connection_errors {
        log_level.push_str(",reqwest::retry=off,hyper_util=off");
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "sitesmith")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "daemon" | "-d" | "--daemon" => run_daemon(config, prometheus_handle).await,

        "init" | "--init" => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        "account" => {
            if args.len() < 3 {
                println!("Usage: sitesmith account <subcommand>");
                println!("Subcommands: list, credits, role");
                return Ok(());
            }
            match args[2].as_str() {
                "list" | "ls" => cmd_account_list(&config).await,
                "credits" => {
                    if args.len() < 5 {
                        println!("Usage: sitesmith account credits <email> <amount>");
                        println!("Example: sitesmith account credits user@example.com 100");
                        return Ok(());
                    }
                    cmd_account_credits(&config, &args[3], &args[4]).await
                }
                "role" => {
                    if args.len() < 5 {
                        println!("Usage: sitesmith account role <email> <role>");
                        println!("Roles: user, staff, admin, owner");
                        return Ok(());
                    }
                    cmd_account_role(&config, &args[3], &args[4]).await
                }
                _ => {
                    println!("Unknown account subcommand: {}", args[2]);
                    println!("Use: list, credits, role");
                    Ok(())
                }
            }
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        unknown => {
            println!("Unknown command: {unknown}");
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Sitesmith - Website Builder Platform");
    println!("Host account-owned sites with an AI copilot for editing");
    println!();
    println!("USAGE:");
    println!("  sitesmith <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  daemon            Run the web server");
    println!("  init              Create default config file");
    println!("  account <subcmd>  Manage accounts (list, credits, role)");
    println!("  help              Show this help message");
    println!();
    println!("ACCOUNT SUBCOMMANDS:");
    println!("  account list                      List all accounts");
    println!("  account credits <email> <amount>  Set an account's credit balance");
    println!("  account role <email> <role>       Set an account's role");
    println!();
    println!("EXAMPLES:");
    println!("  sitesmith daemon                              # Start the server");
    println!("  sitesmith account list                        # Show all accounts");
    println!("  sitesmith account credits user@example.com 50 # Top up credits");
    println!("  sitesmith account role user@example.com staff # Promote to staff");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the server, copilot upstream, etc.");
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Sitesmith v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("🌐 Web Server running at http://0.0.0.0:{port}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Daemon stopped");

    Ok(())
}

async fn cmd_account_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let accounts = store.list_accounts().await?;

    if accounts.is_empty() {
        println!("No accounts registered.");
        return Ok(());
    }

    println!("Accounts ({} total)", accounts.len());
    println!("{:-<70}", "");

    for account in accounts {
        let role_indicator = match account.role {
            Role::Owner => "👑",
            Role::Admin | Role::Staff => "🛠",
            Role::User => "•",
        };

        println!("{} {} [{}]", role_indicator, account.email, account.role.as_str());
        println!(
            "  ID: {} | Credits: {} | Site limit: {}",
            account.id, account.credits, account.site_limit
        );
    }

    Ok(())
}

async fn cmd_account_credits(
    config: &Config,
    email: &str,
    amount_str: &str,
) -> anyhow::Result<()> {
    let credits: i64 = match amount_str.parse() {
        Ok(n) if n >= 0 => n,
        _ => {
            println!("Invalid credit amount: {amount_str}");
            return Ok(());
        }
    };

    let store = Store::new(&config.general.database_path).await?;

    let Some(account) = store.get_account_by_email(email).await? else {
        println!("No account found for {email}");
        return Ok(());
    };

    store.set_account_credits(account.id, credits).await?;
    println!("✓ Credits for {email} set to {credits}");

    Ok(())
}

async fn cmd_account_role(config: &Config, email: &str, role_str: &str) -> anyhow::Result<()> {
    let Some(role) = Role::parse(role_str) else {
        println!("Invalid role: {role_str}");
        println!("Roles: user, staff, admin, owner");
        return Ok(());
    };

    let store = Store::new(&config.general.database_path).await?;

    let Some(account) = store.get_account_by_email(email).await? else {
        println!("No account found for {email}");
        return Ok(());
    };

    store.set_account_role(account.id, role).await?;
    println!("✓ Role for {email} set to {}", role.as_str());

    Ok(())
}
