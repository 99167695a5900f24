//! A thin command-line driver over [`snzip::formats::Format`].
//!
//! This is the "Driver" component from the crate's design: it does nothing
//! a format codec doesn't already do for it. Argument parsing, suffix-based
//! file renaming, and mtime preservation are deliberately minimal here --
//! they're product-level concerns for a distribution's `.sz`-style tool,
//! not part of the framing codecs themselves.

use std::error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;
use std::result;

use snzip::formats::Format;

type Result<T> = result::Result<T, Error>;
type Error = Box<dyn error::Error + Send + Sync>;

macro_rules! fail {
    ($($tt:tt)*) => {
        return Err(From::from(format!($($tt)*)));
    }
}

macro_rules! errln {
    ($($tt:tt)*) => { let _ = writeln!(&mut std::io::stderr(), $($tt)*); }
}

const ABOUT: &str = "\
snzip streams a file (or stdin/stdout) through one of the Snappy stream
framing formats: framing2 (the canonical .sz format, the default),
framing, snzip, snappy-java, snappy-in-java, hadoop-snappy, comment-43,
iwa, or raw.

With no --format given, compression defaults to framing2 and decompression
autodetects the format from the input's leading bytes.";

struct Args {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    decompress: bool,
    format: Option<Format>,
    block_size: usize,
}

fn main() {
    if let Err(err) = try_main() {
        errln!("snzip: {}", err);
        process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse()?;

    let reader: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin()),
    };
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };

    if args.decompress {
        run_decompress(args.format, reader, writer)
    } else {
        let format = args.format.unwrap_or(Format::Framing2);
        format.compress(reader, writer, args.block_size).map_err(Error::from)
    }
}

/// With no explicit `--format`, autodetect from the input's header bytes;
/// `Format::detect` consumes exactly the header, so the returned format's
/// `decompress` is told `skip_magic = true`.
fn run_decompress(format: Option<Format>, mut reader: Box<dyn Read>, writer: Box<dyn Write>) -> Result<()> {
    match format {
        Some(format) => format.decompress(reader, writer, false).map_err(Error::from),
        None => {
            let format = Format::detect(&mut reader)?;
            format.decompress(reader, writer, true).map_err(Error::from)
        }
    }
}

impl Args {
    fn parse() -> Result<Args> {
        use clap::{crate_version, App, Arg};

        let parsed = App::new("snzip")
            .about(ABOUT)
            .version(crate_version!())
            .max_term_width(100)
            .arg(Arg::with_name("input").help("Input file; omit (or pass \"-\") to read stdin."))
            .arg(
                Arg::with_name("output")
                    .long("output")
                    .short("o")
                    .takes_value(true)
                    .help("Output file; omit to write stdout."),
            )
            .arg(
                Arg::with_name("decompress")
                    .long("decompress")
                    .short("d")
                    .help("Decompress (default is compression)."),
            )
            .arg(
                Arg::with_name("format")
                    .long("format")
                    .short("f")
                    .takes_value(true)
                    .help("Stream format to use; see --help for the list. Decompression autodetects when omitted."),
            )
            .arg(
                Arg::with_name("block-size")
                    .long("block-size")
                    .takes_value(true)
                    .help("Uncompressed block size in bytes; 0 selects the format's default."),
            )
            .get_matches();

        let input = match parsed.value_of_os("input") {
            None => None,
            Some(p) if p == "-" => None,
            Some(p) => Some(PathBuf::from(p)),
        };
        let output = parsed.value_of_os("output").map(PathBuf::from);
        let format = match parsed.value_of("format") {
            None => None,
            Some(name) => match Format::by_name(name) {
                Some(format) => Some(format),
                None => fail!(
                    "unknown format {:?}; known formats are: {}",
                    name,
                    Format::all().iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
                ),
            },
        };
        let block_size = match parsed.value_of("block-size") {
            None => 0,
            Some(s) => s.parse::<usize>().map_err(|e| format!("invalid --block-size {:?}: {}", s, e))?,
        };

        Ok(Args {
            input,
            output,
            decompress: parsed.is_present("decompress"),
            format,
            block_size,
        })
    }
}
