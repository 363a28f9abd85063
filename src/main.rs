use kultura_booking::config::GatewayConfig;
use kultura_booking::shell;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = GatewayConfig::from_env()?;

    eprintln!("🎟  Kultura Booking v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", config.base_url);
    eprintln!("   Institution: {}", config.institution_id);
    eprintln!("   Language: {}", config.language);
    eprintln!("   Type 'help' for commands, 'quit' to exit.\n");

    let (wizard, driver) = shell::connect(&config).await?;
    if let Some(footer) = &wizard.session().theme.footer_text {
        eprintln!("   {footer}\n");
    }

    shell::run(wizard, driver).await
}
