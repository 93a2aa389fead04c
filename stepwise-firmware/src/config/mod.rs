//! Experiment table
//!
//! Built from experiments.toml by build.rs, which has already rejected
//! anything [`ExperimentConfig::validate`] would.

use heapless::String;
use stepwise_core::config::{EndBehavior, ExperimentConfig, MAX_LABEL_LEN};
use stepwise_core::traits::Gain;

include!(concat!(env!("OUT_DIR"), "/experiments.rs"));

#[allow(clippy::too_many_arguments)]
fn experiment(
    name: &str,
    priority: u8,
    period_ms: u32,
    sample_limit: u32,
    setpoint: i32,
    gain: Gain,
    recording: bool,
    end: EndBehavior,
) -> ExperimentConfig {
    let mut label: String<MAX_LABEL_LEN> = String::new();
    let _ = label.push_str(name);
    ExperimentConfig {
        name: label,
        priority,
        period_ms,
        sample_limit,
        setpoint,
        gain,
        recording,
        end,
    }
}
