//! # Function
//!
//! Run Function predictors from Rust, either on the local engine or on
//! Function's servers.
//!
//! ```rust,no_run
//! use fxn::{Function, FunctionConfig, Value, ValueMap};
//!
//! # async fn run() -> fxn::FunctionResult<()> {
//! let fxn = Function::new(FunctionConfig::from_env()?)?;
//!
//! let mut inputs = ValueMap::new();
//! inputs.insert("radius".into(), Value::from(3.0f32));
//! let prediction = fxn.create_remote_prediction("@fxn/area", &inputs, None).await?;
//! println!("{:?}", prediction.results());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod function;
pub mod source;

pub use config::FunctionConfig;
pub use error::{FunctionError, FunctionResult};
pub use function::Function;
pub use source::ApiPredictionSource;

pub use fxn_engine::{Engine, PredictionStream};
pub use fxn_remote::RemoteAcceleration;
pub use fxn_values::{
    aliased_enum, serde_json, Acceleration, Dtype, Half, Image, Prediction, Tensor, Value, ValueMap,
};
