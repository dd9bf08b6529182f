use beta_signup::configuration::get_configuration;
use beta_signup::startup::Application;
use beta_signup::telemetry::get_subscriber;
use beta_signup::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("beta-signup", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;
    let app = Application::build(cfg).await?;
    tracing::info!("Listening on port {}", app.get_port());

    app.run_until_stopped().await?;
    Ok(())
}
