//! Result synthesis.
//!
//! [`MockSynthesizer`] is a PLACEHOLDER. Its numbers are affine functions of
//! output power with bounded random jitter and a fixed two-tier part
//! lookup; they are not derived from device physics and must not be
//! presented as a certified engineering calculation.

use std::cell::RefCell;
use rand::{Rng, SeedableRng, rngs::StdRng};
use pec_types::design::{
    CapacitorSelection, DesignParameters, DesignResult, DiodeSelection, HeatsinkSelection,
    InductorSelection, LossBreakdown, MosfetSelection, PartRecord, ThermalEstimate, Topology,
};

/// Seam for the optimization engine. A real solver replaces the mock
/// without touching extraction or reporting.
pub trait ResultSynthesizer {
    fn synthesize(&self, params: &DesignParameters) -> DesignResult;

    /// Short label for logs and report footers
    fn name(&self) -> &str;
}

/// Output power above which the higher-rated MOSFET pair is selected
const HIGH_POWER_THRESHOLD_W: f64 = 300.0;

pub struct MockSynthesizer {
    rng: RefCell<StdRng>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self { rng: RefCell::new(StdRng::from_entropy()) }
    }

    /// Reproducible jitter for tests
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: RefCell::new(StdRng::seed_from_u64(seed)) }
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fraction of the period the main switch conducts.
pub fn duty_ratio(topology: Topology, vin: f64, vout: f64) -> f64 {
    match topology {
        Topology::Boost => 1.0 - vin / vout,
        Topology::Buck => vout / vin,
        Topology::BuckBoost => vout / (vin + vout),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

fn part(model: &str, manufacturer: &str, quantity: u32, unit_price: f64) -> PartRecord {
    PartRecord {
        model: model.to_string(),
        manufacturer: manufacturer.to_string(),
        quantity,
        unit_price,
    }
}

impl ResultSynthesizer for MockSynthesizer {
    fn synthesize(&self, params: &DesignParameters) -> DesignResult {
        let mut rng = self.rng.borrow_mut();
        let p = params.output_power;
        let high_power = p > HIGH_POWER_THRESHOLD_W;

        let duty = duty_ratio(params.topology, params.input_voltage, params.output_voltage);
        log::debug!(
            "[synth] {} duty ratio {:.3} at {} W",
            params.topology.label(),
            duty,
            p
        );

        let mosfet = if high_power {
            MosfetSelection {
                part: part("IPP65R045C7", "Infineon", 2, 8.5),
                vds: "650V".to_string(),
                rds_on: "45mΩ".to_string(),
            }
        } else {
            MosfetSelection {
                part: part("IPP60R099C6", "Infineon", 1, 4.2),
                vds: "600V".to_string(),
                rds_on: "99mΩ".to_string(),
            }
        };

        let losses = LossBreakdown {
            mosfet_conduction: round_to(p * 0.005, 2),
            mosfet_switching: round_to(p * 0.003, 2),
            diode: round_to(p * 0.004, 2),
            inductor_core: round_to(p * 0.002, 2),
            inductor_copper: round_to(p * 0.003, 2),
            capacitor: round_to(p * 0.001, 2),
            total: round_to(p * 0.018, 2),
        };

        DesignResult {
            efficiency: 98.2 + rng.gen_range(0.0..=0.5),
            cost: (25.0 + p * 0.02 + rng.gen_range(0.0..10.0)).round(),
            volume: round_to(0.1 + p * 0.0001, 3),
            mosfet,
            diode: DiodeSelection {
                part: part("C3D10065A", "Wolfspeed (Cree)", 1, 5.8),
                vrrm: "650V".to_string(),
                forward_current: "10A".to_string(),
            },
            inductor: InductorSelection {
                part: part("PQ35/35-3C95", "Custom Wound", 1, 6.5),
                turns: (15.0 + p * 0.01).round() as u32,
                wire: "AWG14 Litz x 3".to_string(),
                air_gap: "1.2mm".to_string(),
                dcr: "15mΩ".to_string(),
            },
            input_capacitor: CapacitorSelection {
                part: part("EKY-500ELL471MK20S", "Nippon Chemi-Con", 2, 2.1),
                capacitance: "470μF".to_string(),
                voltage_rating: "100V".to_string(),
            },
            output_capacitor: CapacitorSelection {
                part: part("EKY-160ELL102MK20S", "Nippon Chemi-Con", 2, 3.2),
                capacitance: "1000μF".to_string(),
                voltage_rating: "160V".to_string(),
            },
            heatsink: HeatsinkSelection {
                part: part("SK104-50.8mm", "Fischer Elektronik", 1, 4.5),
                thermal_resistance: "3.5°C/W".to_string(),
            },
            losses,
            thermal: ThermalEstimate {
                mosfet_junction: (85.0 + rng.gen_range(0.0f64..20.0)).round(),
                diode_junction: (80.0 + rng.gen_range(0.0f64..15.0)).round(),
                inductor_core: (70.0 + rng.gen_range(0.0f64..15.0)).round(),
            },
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
