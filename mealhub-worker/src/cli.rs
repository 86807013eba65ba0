/// Command-line options for the worker process.
///
/// Flags take a value either inline (`--config-path=worker.toml`) or as the
/// next argument. Unknown arguments are ignored so wrappers can pass extras
/// through.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Configuration file, from `--config-path` / `-c`.
    pub config_path: Option<String>,
    /// Database URL override, from `--database-url`. Wins over both the
    /// config file and `MEALHUB_DATABASE_URL`.
    pub database_url: Option<String>,
    pub help_requested: bool,
}

impl CliArgs {
    pub fn parse() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_owned(), Some(value.to_owned())),
                None => (arg, None),
            };
            match flag.as_str() {
                "--help" | "-h" => parsed.help_requested = true,
                "--config-path" | "-c" => parsed.config_path = inline.or_else(|| args.next()),
                "--database-url" => parsed.database_url = inline.or_else(|| args.next()),
                _ => {}
            }
        }
        parsed
    }

    pub fn print_help() {
        eprintln!(
            "Usage: mealhub-worker [OPTIONS]\n\n\
             Options:\n\
             \x20 -c, --config-path PATH   Configuration file (JSON or TOML);\n\
             \x20                          falls back to MEALHUB_CONFIG_PATH\n\
             \x20     --database-url URL   Override the configured database URL\n\
             \x20 -h, --help               Print this help"
        );
    }
}
