use std::env;

use holiday_counter::{cli, server};

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "holiday_counter=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());

    setup_logging();

    server::serve(args).await
}
