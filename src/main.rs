extern crate clap;
extern crate mandelbrot;
extern crate num;
extern crate tracing_subscriber;

use clap::{App, Arg, ArgMatches};
use mandelbrot::bmp::write_image;
use mandelbrot::{Kernel, OutputMode, Palette, RenderParameters, Schedule};
use num::Complex;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Given a string and a separator, returns the two values
/// separated by the separator.
fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A specific implementation of parse_pair using a comma and expecting
/// floating point numbers.
fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_at_least<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const THREADS: &str = "threads";
const GRANULARITY: &str = "granularity";
const ITERATIONS: &str = "iterations";
const SCHEDULE: &str = "schedule";
const KERNEL: &str = "kernel";
const PALETTE: &str = "palette";
const INDEXED: &str = "indexed";
const MEASURE: &str = "measure";

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandelbrot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Multi-threaded Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value(mandelbrot::params::DEFAULT_OUTPUT)
                .help("Output file, in BMP format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("3840x2160")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, as WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(CENTER)
                .long(CENTER)
                .short("p")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Point of the complex plane at the center of the image, as RE,IM"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("1.0")
                .validator(|s| {
                    validate_at_least(
                        &s,
                        ::std::f64::MIN_POSITIVE,
                        "Could not parse zoom level",
                        "Zoom level must be greater than zero",
                    )
                })
                .help("Zoom level; 1.0 shows -2 to 2 along the real axis"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_at_least(
                        &s,
                        1usize,
                        "Could not parse thread count",
                        "Thread count must be at least 1",
                    )
                })
                .help("Number of threads to use in solver [default: number of CPUs]"),
        )
        .arg(
            Arg::with_name(GRANULARITY)
                .long(GRANULARITY)
                .short("g")
                .takes_value(true)
                .default_value("1")
                .validator(|s| {
                    validate_at_least(
                        &s,
                        1usize,
                        "Could not parse granularity",
                        "Granularity must be at least 1",
                    )
                })
                .help("Number of chunks of work per thread"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("c")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_at_least(
                        &s,
                        1usize,
                        "Could not parse iteration count",
                        "Iteration count must be at least 1",
                    )
                })
                .help("Maximum iterations per point"),
        )
        .arg(
            Arg::with_name(SCHEDULE)
                .long(SCHEDULE)
                .takes_value(true)
                .possible_values(&["static", "dynamic"])
                .default_value("static")
                .help("How chunks are handed out to threads"),
        )
        .arg(
            Arg::with_name(KERNEL)
                .long(KERNEL)
                .takes_value(true)
                .possible_values(&["scalar", "batched"])
                .default_value("batched")
                .help("Escape-time kernel"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .long(PALETTE)
                .takes_value(true)
                .help("Render palette indices and color them from this file of 256 colors"),
        )
        .arg(
            Arg::with_name(INDEXED)
                .long(INDEXED)
                .help("Render palette indices and color them with the built-in palette"),
        )
        .arg(
            Arg::with_name(MEASURE)
                .long(MEASURE)
                .help("Log render timings to stderr"),
        )
        .get_matches()
}

fn init_logging(measure: bool) {
    let fallback = if measure { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(::std::io::stderr)
        .init();
}

// Every value was checked by a validator, so the parses below cannot
// fail on well-formed input.
fn parameters(matches: &ArgMatches) -> Option<RenderParameters> {
    let (width, height) = parse_pair(matches.value_of(SIZE)?, 'x')?;
    let center = parse_complex(matches.value_of(CENTER)?)?;
    let schedule = match matches.value_of(SCHEDULE)? {
        "dynamic" => Schedule::Dynamic,
        _ => Schedule::Static,
    };
    let kernel = match matches.value_of(KERNEL)? {
        "scalar" => Kernel::Scalar,
        _ => Kernel::Batched,
    };
    let mode = if matches.is_present(PALETTE) || matches.is_present(INDEXED) {
        OutputMode::Palette
    } else {
        OutputMode::Rgb
    };
    let mut params = RenderParameters::new(width, height);
    if let Some(threads) = matches.value_of(THREADS) {
        params = params.with_threads(usize::from_str(threads).ok()?);
    }
    Some(
        params
            .with_center(center)
            .with_zoom(f64::from_str(matches.value_of(ZOOM)?).ok()?)
            .with_granularity(usize::from_str(matches.value_of(GRANULARITY)?).ok()?)
            .with_iterations(usize::from_str(matches.value_of(ITERATIONS)?).ok()?)
            .with_schedule(schedule)
            .with_kernel(kernel)
            .with_mode(mode)
            .with_output(matches.value_of(OUTPUT)?),
    )
}

fn main() {
    let matches = args();
    init_logging(matches.is_present(MEASURE));

    let params = match parameters(&matches) {
        Some(params) => params,
        None => {
            eprintln!("Could not parse the render parameters");
            std::process::exit(1);
        }
    };

    let palette = match matches.value_of(PALETTE) {
        Some(path) => match Palette::load(path) {
            Ok(palette) => palette,
            Err(e) => {
                eprintln!("Render failure: {}", e);
                std::process::exit(1);
            }
        },
        None => Palette::default(),
    };

    match mandelbrot::render(&params) {
        Err(e) => {
            eprintln!("Render failure: {}", e);
            std::process::exit(1);
        }
        Ok(image) => {
            if let Err(e) = write_image(&params.output, &image, &palette) {
                eprintln!("Could not write {}: {}", params.output.display(), e);
                std::process::exit(1);
            }
        }
    }
}
