//! `fxn` command-line client.

use anyhow::{Context, Result};
use clap::Parser;
use fxn::serde_json::{self, json, Value as JsonValue};
use fxn::{Function, FunctionConfig, Prediction};
use fxn_values::wire::{decode_data_url, encode_data_url};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;
mod input;

use args::{CliArgs, Command, DataUrlCommand, PredictArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fxn=info,fxn_engine=info,fxn_remote=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    match args.command {
        Command::Predict(ref predict) => run_predict(&args, predict).await,
        Command::DataUrl(ref command) => run_data_url(command),
    }
}

/// Config file and environment, then flags.
fn load_config(args: &CliArgs) -> Result<FunctionConfig> {
    let mut config = FunctionConfig::load(args.config.as_deref())?;
    if let Some(url) = &args.api_url {
        config.api_url = url.clone();
    }
    if let Some(key) = &args.access_key {
        config.access_key = Some(key.clone());
    }
    if let Some(library) = &args.library {
        config.library_path = Some(library.clone());
    }
    Ok(config)
}

async fn run_predict(args: &CliArgs, predict: &PredictArgs) -> Result<()> {
    let config = load_config(args)?;
    let inputs = input::parse_inputs(&predict.inputs)?;
    let fxn = Function::new(config).context("Failed to create Function client")?;

    info!("Creating {} prediction for {}", if predict.local { "local" } else { "remote" }, predict.tag);
    let prediction = if predict.local {
        fxn.create_prediction(&predict.tag, &inputs).await?
    } else {
        fxn.create_remote_prediction(&predict.tag, &inputs, predict.acceleration).await?
    };

    let output = if predict.raw { results_json(&prediction) } else { prediction_json(&prediction) };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if let Some(error) = prediction.error() {
        anyhow::bail!("Prediction failed: {}", error);
    }
    Ok(())
}

fn results_json(prediction: &Prediction) -> JsonValue {
    prediction
        .results()
        .map(|results| JsonValue::Array(results.iter().map(|value| value.to_json()).collect()))
        .unwrap_or(JsonValue::Null)
}

fn prediction_json(prediction: &Prediction) -> JsonValue {
    json!({
        "id": prediction.id,
        "tag": prediction.tag,
        "created": prediction.created.to_rfc3339(),
        "latency": prediction.latency,
        "results": results_json(prediction),
        "error": prediction.error(),
        "logs": prediction.logs,
    })
}

fn run_data_url(command: &DataUrlCommand) -> Result<()> {
    match command {
        DataUrlCommand::Encode { file, mime } => {
            let data = std::fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
            println!("{}", encode_data_url(&data, mime.as_deref()));
        }
        DataUrlCommand::Decode { url, output } => {
            let data = decode_data_url(url)?;
            std::fs::write(output, &data).with_context(|| format!("Failed to write {:?}", output))?;
            info!("Wrote {} bytes to {}", data.len(), output.display());
        }
    }
    Ok(())
}
