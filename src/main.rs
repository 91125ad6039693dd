use aniflow::{Config, load_dotenv, run};

fn main() -> anyhow::Result<()> {
    load_dotenv();
    let config = Config::load()?;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    // 0 means one worker per core
    if config.general.worker_threads > 0 {
        builder.worker_threads(config.general.worker_threads);
    }

    builder.build()?.block_on(run(config))
}
