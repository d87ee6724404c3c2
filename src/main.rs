use std::process;

use clap::{Args, Parser, Subcommand};

use parsetab::io::{read_data, validate_input, validate_output, STDIO_SENTINEL};
use parsetab::{base, parse_with_options, ParseOptions, Scanner, TabError};

/// CLI TabCode parser and serialiser.
#[derive(Parser)]
#[command(name = "parsetab", version, about)]
struct Cli {
    /// Output extra debugging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Terminate on parsing error
    #[arg(long, global = true)]
    halt_on_error: bool,

    /// Default number of main courses
    #[arg(long, global = true, default_value_t = base::DEFAULT_MAIN_COURSE_COUNT)]
    main_course_count: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a TabCode file and write the events as JSON (default)
    Tc2json(Tc2jsonArgs),
    /// Check that each input file parses, tallying failures
    Validate {
        /// Input file(s)
        #[arg(required = true)]
        input_files: Vec<String>,
    },
    /// Print the token stream
    Scan {
        /// Input file or stdin
        #[arg(default_value = STDIO_SENTINEL)]
        input: String,
    },
    /// Print the parsed events
    Parse {
        /// Input file or stdin
        #[arg(default_value = STDIO_SENTINEL)]
        input: String,
        /// Suppress parser output
        #[arg(short, long)]
        silent: bool,
        /// Do not include comments in output
        #[arg(long)]
        no_comments: bool,
    },
}

#[derive(Args)]
struct Tc2jsonArgs {
    /// Input file or stdin
    #[arg(default_value = STDIO_SENTINEL)]
    input: String,
    /// Output file or stdout
    #[arg(default_value = STDIO_SENTINEL)]
    output: String,
    /// Overwrite output file if it exists
    #[arg(short, long)]
    overwrite: bool,
    /// Suppress parser output
    #[arg(short, long)]
    silent: bool,
    /// Pretty-print output
    #[arg(short, long)]
    pretty: bool,
    /// Do not attempt to resolve encoding errors
    #[arg(long)]
    strict: bool,
    /// Do not include comments in output
    #[arg(long)]
    no_comments: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    if let Err(err) = run(cli) {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), TabError> {
    let options = ParseOptions {
        main_course_count: cli.main_course_count,
        debug: cli.debug,
        ..Default::default()
    };

    match cli.command {
        Some(Command::Tc2json(args)) => tc2json(&args, options),
        None => tc2json(
            &Tc2jsonArgs {
                input: STDIO_SENTINEL.to_string(),
                output: STDIO_SENTINEL.to_string(),
                overwrite: false,
                silent: false,
                pretty: false,
                strict: false,
                no_comments: false,
            },
            options,
        ),
        Some(Command::Validate { input_files }) => {
            validate(&input_files, cli.halt_on_error, options)
        }
        Some(Command::Scan { input }) => scan(&input, options),
        Some(Command::Parse {
            input,
            silent,
            no_comments,
        }) => parse_cmd(&input, silent, no_comments, options),
    }
}

/// Parse one TabCode input and serialise the events to JSON.
fn tc2json(args: &Tc2jsonArgs, mut options: ParseOptions) -> Result<(), TabError> {
    validate_input(&args.input)?;
    validate_output(&args.output, args.overwrite)?;

    options.comments = !args.no_comments;
    options.strict = args.strict;

    let data = read_data(&args.input)?;
    let events = parse_with_options(&data, &options)?;

    if args.silent {
        return Ok(());
    }

    let mut json = if args.pretty {
        serde_json::to_string_pretty(&events)
    } else {
        serde_json::to_string(&events)
    }
    .map_err(|e| std::io::Error::other(e.to_string()))?;
    json.push('\n');

    if args.output == STDIO_SENTINEL {
        print!("{json}");
    } else {
        std::fs::write(&args.output, json)?;
    }
    Ok(())
}

/// Parse every input file, either halting at the first failure or
/// tallying pass/fail counts.
fn validate(
    input_files: &[String],
    halt_on_error: bool,
    options: ParseOptions,
) -> Result<(), TabError> {
    let mut pass = 0usize;
    let mut fail = 0usize;

    for file in input_files {
        let outcome = read_data(file).and_then(|data| parse_with_options(&data, &options));
        match outcome {
            Ok(_) => pass += 1,
            Err(err) => {
                if halt_on_error {
                    eprintln!("Failed to parse {file}");
                    return Err(err);
                }
                eprintln!("{file} {err}");
                fail += 1;
            }
        }
    }

    println!("Passed: {pass}");
    println!("Failed: {fail}");
    println!("Total: {}", input_files.len());
    Ok(())
}

/// Dump the raw token stream.
fn scan(input: &str, options: ParseOptions) -> Result<(), TabError> {
    validate_input(input)?;
    let data = read_data(input)?;
    for token in Scanner::with_course_count(&data, options.main_course_count) {
        println!("{:?}", token?);
    }
    Ok(())
}

/// Parse and print the event sequence in debug form.
fn parse_cmd(
    input: &str,
    silent: bool,
    no_comments: bool,
    mut options: ParseOptions,
) -> Result<(), TabError> {
    validate_input(input)?;
    options.comments = !no_comments;
    let data = read_data(input)?;
    let events = parse_with_options(&data, &options)?;
    if !silent {
        println!("{events:#?}");
    }
    Ok(())
}
