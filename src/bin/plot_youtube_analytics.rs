use env_logger::Env;
use log::{debug, error, info, log_enabled, Level};
use youtube_analytics::aggregate::filter_table;
use youtube_analytics::load::load_csv;
use youtube_analytics::plot::{parse_cli, PlotConfig};
use youtube_analytics::render::render;

fn run(config: &PlotConfig) -> youtube_analytics::Result<()> {
    info!("read data from {}", config.input.display());
    let table = load_csv(&config.input)?;
    info!("{} rows, {:?} lines", table.len(), table.variant());
    let series = filter_table(&table, config.granularity)?;
    debug!("aggregated series:\n{}", series);
    let chart = render(&series)?;
    chart.show()
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = parse_cli();
    if let Err(e) = run(&config) {
        if log_enabled!(Level::Error) {
            error!("{}", e);
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(1);
    }
}
