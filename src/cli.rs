//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::convert::CliError;

/// json2yaml converts JSON files to YAML format.
///
/// Without arguments it starts a local web interface that shuts itself
/// down once the browser tab is closed.
#[derive(Parser, Debug)]
#[command(name = "json2yaml")]
#[command(version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Input JSON file path
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output YAML file path (optional, defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Input JSON file
    #[arg(value_name = "INPUT")]
    pub input_pos: Option<PathBuf>,

    /// Output YAML file
    #[arg(value_name = "OUTPUT")]
    pub output_pos: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start web interface
    Web(WebArgs),
}

#[derive(Parser, Debug)]
pub struct WebArgs {
    /// Port to run web server on
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// What the invocation asks for once flags and positionals are merged.
#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Web { port: Option<u16> },
    Convert { input: PathBuf, output: Option<PathBuf> },
}

impl Cli {
    pub fn mode(self) -> Result<Mode, CliError> {
        if let Some(Command::Web(args)) = self.command {
            return Ok(Mode::Web { port: args.port });
        }
        match self.input.or(self.input_pos) {
            Some(input) => Ok(Mode::Convert {
                input,
                output: self.output.or(self.output_pos),
            }),
            None if self.output.is_none() => Ok(Mode::Web { port: None }),
            None => Err(CliError::MissingInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("json2yaml").chain(args.iter().copied())).unwrap()
    }

    fn mode(args: &[&str]) -> Mode {
        parse(args).mode().unwrap()
    }

    #[test]
    fn no_arguments_starts_web_mode() {
        assert_eq!(mode(&[]), Mode::Web { port: None });
    }

    #[test]
    fn web_subcommand_takes_port() {
        assert_eq!(mode(&["web", "--port", "9000"]), Mode::Web { port: Some(9000) });
        assert_eq!(mode(&["web", "-p", "9001"]), Mode::Web { port: Some(9001) });
        assert_eq!(mode(&["web"]), Mode::Web { port: None });
    }

    #[test]
    fn one_positional_converts_to_stdout() {
        assert_eq!(
            mode(&["in.json"]),
            Mode::Convert { input: "in.json".into(), output: None }
        );
    }

    #[test]
    fn two_positionals_convert_file_to_file() {
        assert_eq!(
            mode(&["in.json", "out.yaml"]),
            Mode::Convert { input: "in.json".into(), output: Some("out.yaml".into()) }
        );
    }

    #[test]
    fn flags_take_precedence_over_positionals() {
        assert_eq!(
            mode(&["-i", "flag.json", "-o", "flag.yaml", "pos.json", "pos.yaml"]),
            Mode::Convert { input: "flag.json".into(), output: Some("flag.yaml".into()) }
        );
    }

    #[test]
    fn output_without_input_is_rejected() {
        let err = parse(&["-o", "out.yaml"]).mode().unwrap_err();
        assert!(matches!(err, CliError::MissingInput));
    }

    #[test]
    fn too_many_positionals_fail_to_parse() {
        let result = Cli::try_parse_from(["json2yaml", "a.json", "b.yaml", "c"]);
        assert!(result.is_err());
    }
}
