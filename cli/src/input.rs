//! Parsing `name=value` prediction inputs.

use std::path::Path;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use fxn::serde_json::{self, Value as JsonValue};
use fxn::{Value, ValueMap};

/// Parse every `name=value` argument, keeping argument order.
///
/// Numbers become `int32` when they fit, `int64` when they don't and
/// `float32` when fractional.
pub fn parse_inputs(args: &[String]) -> Result<ValueMap> {
    let mut inputs = ValueMap::new();
    for arg in args {
        let (name, value) = parse_input(arg)?;
        if inputs.insert(name.clone(), value).is_some() {
            bail!("Input '{}' given more than once", name);
        }
    }
    Ok(inputs)
}

fn parse_input(arg: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = arg.split_once('=') else {
        bail!("Input '{}' is not of the form name=value", arg);
    };
    if name.is_empty() {
        bail!("Input '{}' has no name", arg);
    }

    let value = if let Some(path) = raw.strip_prefix('@') {
        read_binary(Path::new(path))?
    } else {
        match serde_json::from_str::<JsonValue>(raw) {
            Ok(json) => Value::from_json(json),
            Err(_) => Value::from(raw),
        }
    };
    Ok((name.to_string(), value))
}

fn read_binary(path: &Path) -> Result<Value> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read input file {:?}", path))?;
    Ok(Value::Binary(Bytes::from(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxn::Dtype;

    #[test]
    fn test_json_kinds() {
        let args: Vec<String> = ["radius=3.5", "steps=30", "big=9000000000", "flag=true", "tags=[1,2]", "opts={\"a\":1}", "none=null"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let inputs = parse_inputs(&args).unwrap();
        let dtypes: Vec<_> = inputs.values().map(Value::dtype).collect();
        assert_eq!(
            dtypes,
            vec![Dtype::Float32, Dtype::Int32, Dtype::Int64, Dtype::Bool, Dtype::List, Dtype::Dict, Dtype::Null]
        );
        assert_eq!(inputs["radius"], Value::from(3.5f32));
    }

    #[test]
    fn test_plain_text_is_string() {
        let inputs = parse_inputs(&["name=Ada Lovelace".to_string(), "quoted=\"x=y\"".to_string()]).unwrap();
        assert_eq!(inputs["name"], Value::from("Ada Lovelace"));
        assert_eq!(inputs["quoted"], Value::from("x=y"));
    }

    #[test]
    fn test_file_input_is_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let inputs = parse_inputs(&[format!("clip=@{}", path.display())]).unwrap();
        assert_eq!(inputs["clip"], Value::Binary(Bytes::from_static(&[1, 2, 3])));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_inputs(&["radius".to_string()]).is_err());
        assert!(parse_inputs(&["=3".to_string()]).is_err());
        assert!(parse_inputs(&["a=1".to_string(), "a=2".to_string()]).is_err());
    }
}
