mod config;
mod pipeline;
mod tui;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = config::Config::from_args(&args)?;

    if config.headless {
        // Headless mode: console output and a per-game summary
        pipeline::run(&config)
    } else {
        tui::run(config)
    }
}
