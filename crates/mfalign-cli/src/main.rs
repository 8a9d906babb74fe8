use anyhow::Result;
use clap::{Arg, Command, ValueHint};
use mfalign_cli::input::Input;
use mfalign_cli::Runner;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("MFALIGN_LOG", "error,mfalign=info"))
        .init();

    // Define CLI arguments
    let matches = Command::new("mfalign")
        .version(clap::crate_version!())
        .about("Graph-based alignment of mass spectrometry features across runs")
        .arg(
            Arg::new("parameters")
                .required(true)
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Path to configuration parameters (JSON file)")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("feature_paths")
                .num_args(1..)
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Paths to feature files to process. Appended to the files listed in the configuration file.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(clap::value_parser!(u16).range(1..))
                .help("Number of threads for parallel file loading (default = # of CPUs)")
                .value_hint(ValueHint::Other),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    if let Some(threads) = matches.get_one::<u16>("threads") {
        rayon::ThreadPoolBuilder::new()
            .num_threads(*threads as usize)
            .build_global()?;
    }

    // Load parameters from JSON file
    let input = Input::from_arguments(&matches)?;

    // Initialize the runner
    let mut runner = Runner::new(input)?;

    // Run the main logic
    runner.run()?;

    Ok(())
}
