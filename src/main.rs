use std::io::{self, Write};

use clap::Parser;
use lyca_balance::api::LycaClient;
use lyca_balance::app::run;
use lyca_balance::config::{exit_code, Opts};
use lyca_balance::printer::print_report;
use lyca_balance::usage_tracker::FileCacheStore;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            std::process::exit(exit_code(&e));
        }
    };
    if let Err(e) = try_main(&opts).await {
        print!("\n(!) {e:#}\n  ");
        let _ = io::stdout().flush();
        std::process::exit(1);
    }
}

async fn try_main(opts: &Opts) -> anyhow::Result<()> {
    let client = LycaClient::new(&opts.domain)?;
    let cache = match &opts.cache_dir {
        Some(dir) => FileCacheStore::new(dir),
        None => FileCacheStore::in_temp_dir(),
    };
    let report = run(&client, &cache, &opts.credentials(), &opts.run_config()).await?;
    print_report(&report)?;
    Ok(())
}
