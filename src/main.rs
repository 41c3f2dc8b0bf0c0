use calcweb::{Config, app};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional first argument: path to a JSON config file
    let args: Vec<String> = env::args().collect();
    let config = Config::load(args.get(1).map(String::as_str))?;

    app::run(config).await
}
