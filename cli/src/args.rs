//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fxn::RemoteAcceleration;

#[derive(Parser, Debug)]
#[command(name = "fxn")]
#[command(about = "Run Function predictors locally or remotely")]
#[command(version)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(long, short = 'c', env = "FXN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Function API URL
    #[arg(long, env = "FXN_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Function access key
    #[arg(long, env = "FXN_ACCESS_KEY", hide_env_values = true, global = true)]
    pub access_key: Option<String>,

    /// Native engine library for local predictions
    #[arg(long, env = "FXN_LIBRARY_PATH", global = true)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a prediction
    Predict(PredictArgs),

    /// Encode or decode data URLs
    #[command(subcommand)]
    DataUrl(DataUrlCommand),
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Predictor tag, e.g. @fxn/greeting
    pub tag: String,

    /// Prediction input as name=value. JSON values are parsed, `@path`
    /// reads a file as binary, anything else is a string.
    #[arg(long = "input", short = 'i', value_name = "NAME=VALUE")]
    pub inputs: Vec<String>,

    /// Run on the local engine instead of Function's servers
    #[arg(long)]
    pub local: bool,

    /// Remote acceleration (auto, cpu, a40, a100)
    #[arg(long, short = 'a')]
    pub acceleration: Option<RemoteAcceleration>,

    /// Print only the results
    #[arg(long)]
    pub raw: bool,
}

#[derive(Subcommand, Debug)]
pub enum DataUrlCommand {
    /// Encode a file as a data URL
    Encode {
        file: PathBuf,
        /// MIME type to embed in the URL
        #[arg(long)]
        mime: Option<String>,
    },
    /// Decode a data URL into a file
    Decode {
        url: String,
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predict() {
        let args = CliArgs::try_parse_from([
            "fxn", "predict", "@fxn/area", "-i", "radius=3.0", "--input", "unit=\"cm\"", "-a", "a40",
        ])
        .unwrap();
        let Command::Predict(predict) = args.command else {
            panic!("expected predict");
        };
        assert_eq!(predict.tag, "@fxn/area");
        assert_eq!(predict.inputs, vec!["radius=3.0", "unit=\"cm\""]);
        assert_eq!(predict.acceleration, Some(RemoteAcceleration::A40));
        assert!(!predict.local);
    }

    #[test]
    fn test_parse_data_url() {
        let args = CliArgs::try_parse_from(["fxn", "data-url", "decode", "data:,hi", "-o", "out.txt"]).unwrap();
        assert!(matches!(
            args.command,
            Command::DataUrl(DataUrlCommand::Decode { ref output, .. }) if output == &PathBuf::from("out.txt")
        ));
    }
}
