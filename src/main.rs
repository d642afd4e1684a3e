use chronology_lib::core::config::AppConfig;

#[tokio::main]
async fn main() {
    chronology_lib::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(code = err.code(), "{err}");
            std::process::exit(2);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    if let Err(err) = chronology_lib::run(config).await {
        tracing::error!(code = err.code(), "{err}");
        std::process::exit(1);
    }
}
