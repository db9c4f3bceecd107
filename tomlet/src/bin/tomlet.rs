use std::io::{stdin, Read};
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;

use tomlet::{run, run_file, Error, Format};

/// Evaluate a tomlet program and print the result.
///
/// The program is read from PATH, from the -c option, or from standard input
/// if neither is given.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Program text to evaluate
    #[arg(short = 'c')]
    code: Option<String>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Toml)]
    format: Format,

    /// File to read the program from
    path: Option<PathBuf>,
}

fn read_stdin() -> Result<String, Error> {
    let mut contents = String::new();
    stdin().read_to_string(&mut contents).map_err(|err| Error::from(err).render(None))?;
    Ok(contents)
}

fn main() {
    let args = Cli::parse();

    let result = if let Some(path) = args.path {
        run_file(&path, args.format)
    } else if let Some(code) = args.code {
        run(&code, args.format)
    } else {
        read_stdin().and_then(|code| run(&code, args.format))
    };

    match result {
        Ok(text) => println!("{}", text.trim_end()),
        Err(error) => {
            eprintln!("{}", error);
            exit(error.kind().exit_code());
        }
    }
}
