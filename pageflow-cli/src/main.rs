use std::fs::File;

use clap::{crate_version, App, Arg, ArgMatches};
use log::Level;
use simplelog::{
    ColorChoice, CombinedLogger, Config as LogConfig, TermLogger, TerminalMode, WriteLogger,
};

use pageflow::prelude::v1::*;

const LOGFILE: &str = "oss.log";

fn main() -> Result<()> {
    let matches = parse_args();

    // validate the whole configuration before touching any resource
    let (cfg, seed) = match build_config(&matches) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("oss: {}", e);
            print_usage();
            return Err(e);
        }
    };

    init_logging(&matches)?;

    let region = SharedClock::new();
    let pool = DummyPool::with_seed(region.clone(), seed);
    let mut coordinator = Coordinator::new(cfg, region, pool)?;
    coordinator.run()
}

fn parse_args() -> ArgMatches<'static> {
    App::new("oss")
        .version(crate_version!())
        .about("demand-paging coordinator with LRU global replacement")
        .arg(Arg::with_name("verbose").short("v").multiple(true))
        .arg(
            Arg::with_name("workers")
                .short("n")
                .long("workers")
                .help("total number of workers to launch over the run")
                .takes_value(true)
                .default_value("1"),
        )
        .arg(
            Arg::with_name("simul")
                .short("s")
                .long("simul")
                .help("maximum number of workers running simultaneously")
                .takes_value(true)
                .default_value("1"),
        )
        .arg(
            Arg::with_name("interval")
                .short("i")
                .long("interval")
                .help("virtual milliseconds between worker launches")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::with_name("logfile")
                .short("f")
                .long("logfile")
                .help("mirror all output into oss.log"),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .help("seed for the worker population rng")
                .takes_value(true)
                .default_value("1"),
        )
        .get_matches()
}

fn print_usage() {
    eprintln!("usage: oss [-h] [-n workers] [-s simul] [-i intervalms] [-f] [--seed seed] [-v]");
}

fn build_config(matches: &ArgMatches) -> Result<(Config, u64)> {
    let cfg = Config {
        quota: parse_flag(matches, "workers", "worker count must be numeric")?,
        simul: parse_flag(matches, "simul", "simultaneous worker count must be numeric")?,
        spawn_interval: time::ms(parse_flag(matches, "interval", "interval must be numeric")?),
        ..Config::default()
    };
    cfg.validate()?;

    let seed = parse_flag(matches, "seed", "seed must be numeric")?;
    Ok((cfg, seed))
}

fn parse_flag<T: std::str::FromStr>(
    matches: &ArgMatches,
    name: &str,
    msg: &'static str,
) -> Result<T> {
    matches
        .value_of(name)
        .ok_or(Error::Config(msg))?
        .parse()
        .map_err(|_| Error::Config(msg))
}

fn init_logging(matches: &ArgMatches) -> Result<()> {
    let level = match matches.occurrences_of("verbose") {
        0 => Level::Info,
        1 => Level::Debug,
        _ => Level::Trace,
    };
    let filter = level.to_level_filter();

    if matches.is_present("logfile") {
        let file = File::create(LOGFILE).map_err(|e| {
            eprintln!("oss: unable to create {}: {}", LOGFILE, e);
            Error::Setup("failed to open logfile")
        })?;
        CombinedLogger::init(vec![
            TermLogger::new(
                filter,
                LogConfig::default(),
                TerminalMode::Stdout,
                ColorChoice::Auto,
            ),
            WriteLogger::new(filter, LogConfig::default(), file),
        ])
        .map_err(|_| Error::Setup("logger already installed"))
    } else {
        TermLogger::init(
            filter,
            LogConfig::default(),
            TerminalMode::Stdout,
            ColorChoice::Auto,
        )
        .map_err(|_| Error::Setup("logger already installed"))
    }
}
