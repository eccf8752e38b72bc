use anyhow::{Result, bail};
use pgn_tree::loader::Source;
use std::time::Duration;

pub const USAGE: &str = "usage: pgn_tree [--headless] [--no-watch] [--watch-ms N] <FILE|URL>";

/// Command-line configuration for the browser and headless modes.
#[derive(Debug)]
pub struct Config {
    /// Where the PGN text is read from.
    pub source: Source,
    /// Print a summary to the console instead of opening the browser.
    pub headless: bool,
    /// Re-parse when a local file changes on disk.
    pub watch: bool,
    /// How often the file's modification time is checked.
    pub watch_interval: Duration,
}

impl Config {
    /// Build from the arguments after the program name.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut source = None;
        let mut headless = false;
        let mut watch = true;
        let mut watch_interval = Duration::from_millis(500);

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--headless" => headless = true,
                "--no-watch" => watch = false,
                "--watch-ms" => {
                    let Some(value) = iter.next() else {
                        bail!("--watch-ms needs a value\n{}", USAGE);
                    };
                    let ms: u64 = match value.parse() {
                        Ok(ms) if ms > 0 => ms,
                        _ => bail!("--watch-ms must be a positive integer, got '{}'", value),
                    };
                    watch_interval = Duration::from_millis(ms);
                }
                "-h" | "--help" => bail!("{}", USAGE),
                flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
                path => {
                    if source.is_some() {
                        bail!("only one source can be given\n{}", USAGE);
                    }
                    source = Some(Source::parse(path));
                }
            }
        }

        let Some(source) = source else {
            bail!("missing source\n{}", USAGE);
        };

        Ok(Self {
            source,
            headless,
            watch,
            watch_interval,
        })
    }

    /// Watching only makes sense for local files.
    pub fn watches_file(&self) -> bool {
        self.watch && matches!(self.source, Source::File(_))
    }
}
