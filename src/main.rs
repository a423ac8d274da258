use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, warn, LevelFilter};

use raman_identify::data::loader::load_spectrum;
use raman_identify::data::model::name_from_path;
use raman_identify::stream::serve;
use raman_identify::{Config, Coordinate, Library, Pixel, Wavenumber};

/// Identify Raman spectra by matching their peaks against a reference library.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Directory of reference spectra, one CSV file per compound
    #[arg(long)]
    library: PathBuf,

    /// Sample spectra to identify
    #[arg(required_unless_present = "streaming")]
    samples: Vec<PathBuf>,

    /// Read line-delimited JSON requests from stdin, answer on stdout
    #[arg(long)]
    streaming: bool,

    /// Include debugging output
    #[arg(long)]
    verbose: bool,

    /// Write log output to this file instead of stderr
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// Compare peaks as detector pixels instead of wavenumbers
    #[arg(long)]
    pixel: bool,

    /// JSON file overriding detection and matching settings
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    }
    .with_verbose(cli.verbose);

    if cli.pixel {
        run::<Pixel>(&cli, config)
    } else {
        run::<Wavenumber>(&cli, config)
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    if let Some(path) = &cli.logfile {
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn run<C: Coordinate>(cli: &Cli, config: Config) -> Result<()> {
    let library = Library::<C>::from_dir(&cli.library, config)
        .context("unable to instantiate library")?;
    for set in library.iter() {
        debug!("library: {} peaks {:?}", set.name(), set.peaks());
    }

    if cli.streaming {
        let stdout = io::stdout();
        serve(&library, io::stdin().lock(), BufWriter::new(stdout.lock()))
            .context("streaming requests")?;
        return Ok(());
    }

    let stdout = io::stdout();
    let failed = identify_files(&library, &cli.samples, &mut stdout.lock())?;
    if failed > 0 {
        bail!("{failed} of {} samples could not be read", cli.samples.len());
    }
    Ok(())
}

/// Print one result line per sample file. A file that cannot be loaded is
/// reported as NO MATCH and counted; the rest of the batch still runs.
fn identify_files<C: Coordinate, W: Write>(
    library: &Library<C>,
    paths: &[PathBuf],
    out: &mut W,
) -> io::Result<usize> {
    let mut failed = 0;
    for path in paths {
        if path.is_dir() {
            debug!("skipping directory {}", path.display());
            continue;
        }
        let sample = match load_spectrum(path) {
            Ok(sample) => sample,
            Err(err) => {
                warn!("{:#}", anyhow::Error::from(err));
                writeln!(out, "sample {}: NO MATCH", name_from_path(path))?;
                failed += 1;
                continue;
            }
        };
        match library.identify(&sample) {
            Some(hit) => writeln!(
                out,
                "sample {}: matched library {} (score {:.2})",
                sample.name(),
                hit.name,
                hit.score
            )?,
            None => writeln!(out, "sample {}: NO MATCH", sample.name())?,
        }
    }
    Ok(failed)
}
