//! Sampled sine curve.
//!
//! For `samples = n` the curve is sampled at `t = i / (n - 1)` for
//! `i in 0..n`, so `t` covers `[0, 1]` inclusive:
//!
//! ```text
//! x[i] = t * 2π
//! y[i] = amplitude * sin(2π * frequency * t + phase)
//! ```

use std::f64::consts::PI;

use lodestone_proto::{Envelope, MessageType, XySineRequest, XySineResponse};

use crate::dispatch::{HandlerContext, Response};
use crate::error::RequestError;

pub const DEFAULT_FREQUENCY: f64 = 1.0;
pub const DEFAULT_AMPLITUDE: f64 = 1.0;
pub const DEFAULT_SAMPLES: i32 = 1000;
pub const MIN_SAMPLES: i32 = 2;
pub const MAX_SAMPLES: i32 = 10_000_000;

const STATUS_OK: &str = "OK";

/// Validated parameters, defaults applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineParams {
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
    pub samples: usize,
}

impl SineParams {
    /// Apply defaults for zero fields, then validate.
    pub fn from_request(request: &XySineRequest) -> Result<Self, RequestError> {
        let frequency = or_default(request.frequency, DEFAULT_FREQUENCY);
        let amplitude = or_default(request.amplitude, DEFAULT_AMPLITUDE);
        let phase = request.phase;
        let samples = if request.samples == 0 {
            DEFAULT_SAMPLES
        } else {
            request.samples
        };

        if !(MIN_SAMPLES..=MAX_SAMPLES).contains(&samples) {
            return Err(RequestError::invalid_parameter(format!(
                "samples must be between {MIN_SAMPLES} and {MAX_SAMPLES} (got {samples})"
            )));
        }
        require_finite("frequency", frequency)?;
        require_finite("amplitude", amplitude)?;
        require_finite("phase", phase)?;

        Ok(Self {
            frequency,
            amplitude,
            phase,
            samples: samples as usize,
        })
    }
}

fn or_default(value: f64, default: f64) -> f64 {
    if value == 0.0 {
        default
    } else {
        value
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), RequestError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RequestError::invalid_parameter(format!(
            "{field} must be finite (got {value})"
        )))
    }
}

/// Sample the curve. `params.samples` must be at least 2.
pub fn generate(params: &SineParams) -> XySineResponse {
    let last = (params.samples - 1) as f64;
    let mut x = Vec::with_capacity(params.samples);
    let mut y = Vec::with_capacity(params.samples);

    for i in 0..params.samples {
        let t = i as f64 / last;
        x.push(t * 2.0 * PI);
        y.push(params.amplitude * (2.0 * PI * params.frequency * t + params.phase).sin());
    }

    XySineResponse {
        x,
        y,
        status: STATUS_OK.to_string(),
    }
}

pub fn handle(_ctx: &HandlerContext, envelope: &Envelope) -> Result<Response, RequestError> {
    let request = envelope
        .decode_payload::<XySineRequest>()
        .map_err(|err| RequestError::payload_parse(MessageType::XySineRequest, err))?;
    let params = SineParams::from_request(&request)?;
    Ok(Response::XySine(generate(&params)))
}
