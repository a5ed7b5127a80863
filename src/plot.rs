use super::{Granularity, VERSION};
use clap::{App, Arg, ArgMatches};
use std::ffi::OsString;
use std::path::PathBuf;

/// What one run of the plotter works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotConfig {
    pub input: PathBuf,
    pub granularity: Granularity,
}

fn cli_app() -> App<'static, 'static> {
    let arg_input = Arg::with_name("input")
        .help("Path to YouTube analytics CSV file.")
        .short("i")
        .long("input")
        .takes_value(true)
        .required(true);
    App::new("plot-youtube-analytics")
        .version(VERSION.unwrap_or("unknown"))
        .about("Plot YouTube analytics")
        .arg(arg_input)
}

fn config_from(cli_args: &ArgMatches) -> PlotConfig {
    PlotConfig {
        input: PathBuf::from(cli_args.value_of_os("input").unwrap_or_default()),
        granularity: Granularity::Daily,
    }
}

/// Takes the CLI arguments of the process; prints usage and exits on bad arguments.
pub fn parse_cli() -> PlotConfig {
    config_from(&cli_app().get_matches())
}

/// Same as `parse_cli` over the given arguments, returning clap's error instead of exiting.
pub fn parse_cli_from<I, T>(args: I) -> Result<PlotConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli_args = cli_app().get_matches_from_safe(args)?;
    Ok(config_from(&cli_args))
}
