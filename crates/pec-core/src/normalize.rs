//! Parameter normalizer: `ExtractedDesign` → fully defaulted `DesignParameters`.

use pec_types::design::{DesignParameters, ExtractedDesign, OptimizationWeights, Priority};

pub const DEFAULT_AMBIENT_TEMP_C: f64 = 50.0;
pub const DEFAULT_JUNCTION_TEMP_C: f64 = 125.0;
pub const DEFAULT_CORE_TEMP_C: f64 = 100.0;
pub const DEFAULT_RIPPLE_PERCENT: f64 = 1.0;
pub const DEFAULT_SWITCHING_FREQ_HZ: f64 = 50_000.0;
pub const DEFAULT_INDUCTANCE_H: f64 = 20e-6;
pub const DEFAULT_INDUCTOR_MARGIN: f64 = 0.75;
pub const INPUT_VOLTAGE_POINTS: u32 = 4;
pub const OUTPUT_POWER_POINTS: u32 = 5;
/// Sweep half-width relative to the point value
pub const SWEEP_SPAN: f64 = 0.15;

const DOMINANT_WEIGHT: f64 = 60.0;
const MINOR_WEIGHT: f64 = 20.0;
const EQUAL_WEIGHT: f64 = 33.3;

/// Total over any extracted record.
pub fn normalize(extracted: &ExtractedDesign) -> DesignParameters {
    let vin = extracted.input_voltage;
    let pout = extracted.output_power;
    let (vin_min, vin_max) =
        sweep_bounds(vin, extracted.input_voltage_min, extracted.input_voltage_max);
    let (pout_min, pout_max) =
        sweep_bounds(pout, extracted.output_power_min, extracted.output_power_max);

    DesignParameters {
        topology: extracted.topology,
        input_voltage: vin,
        input_voltage_min: vin_min,
        input_voltage_max: vin_max,
        input_voltage_points: INPUT_VOLTAGE_POINTS,
        output_voltage: extracted.output_voltage,
        output_power: pout,
        output_power_min: pout_min,
        output_power_max: pout_max,
        output_power_points: OUTPUT_POWER_POINTS,
        weights: weights_for(extracted.priority),
        switching_frequency_hz: extracted
            .switching_freq_min
            .unwrap_or(DEFAULT_SWITCHING_FREQ_HZ),
        inductance_h: DEFAULT_INDUCTANCE_H,
        max_ambient_temp: extracted.max_ambient_temp.unwrap_or(DEFAULT_AMBIENT_TEMP_C),
        max_junction_temp: extracted.max_junction_temp.unwrap_or(DEFAULT_JUNCTION_TEMP_C),
        max_core_temp: DEFAULT_CORE_TEMP_C,
        ripple_percent: extracted.ripple_max.unwrap_or(DEFAULT_RIPPLE_PERCENT),
        inductor_margin_ratio: DEFAULT_INDUCTOR_MARGIN,
    }
}

/// Explicit bounds win; otherwise ±15 % of the point value, rounded.
pub fn sweep_bounds(point: f64, min: Option<f64>, max: Option<f64>) -> (f64, f64) {
    (
        min.unwrap_or_else(|| (point * (1.0 - SWEEP_SPAN)).round()),
        max.unwrap_or_else(|| (point * (1.0 + SWEEP_SPAN)).round()),
    )
}

pub fn weights_for(priority: Priority) -> OptimizationWeights {
    let (efficiency, cost, volume) = match priority {
        Priority::Efficiency => (DOMINANT_WEIGHT, MINOR_WEIGHT, MINOR_WEIGHT),
        Priority::Cost => (MINOR_WEIGHT, DOMINANT_WEIGHT, MINOR_WEIGHT),
        Priority::Volume => (MINOR_WEIGHT, MINOR_WEIGHT, DOMINANT_WEIGHT),
        Priority::Balanced => (EQUAL_WEIGHT, EQUAL_WEIGHT, EQUAL_WEIGHT),
    };
    OptimizationWeights { efficiency, cost, volume }
}
