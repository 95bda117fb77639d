//! Design records flowing through the pipeline:
//! `ExtractedDesign` → `DesignParameters` → `DesignResult`.

use serde::{Deserialize, Serialize};

/// Converter circuit family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    Boost,
    Buck,
    BuckBoost,
}

impl Topology {
    /// Map a free-text keyword (English or Chinese) to a topology.
    /// Buck-boost is tested first so it is never read as plain boost.
    pub fn from_keyword(word: &str) -> Option<Self> {
        let lower = word.to_lowercase();
        if lower.contains("buck-boost") || lower.contains("升降压") {
            Some(Topology::BuckBoost)
        } else if lower.contains("boost") || lower.contains("升压") {
            Some(Topology::Boost)
        } else if lower.contains("buck") || lower.contains("降压") {
            Some(Topology::Buck)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Topology::Boost => "Boost",
            Topology::Buck => "Buck",
            Topology::BuckBoost => "Buck-Boost",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Topology::Boost => "升压变换器 (Boost)",
            Topology::Buck => "降压变换器 (Buck)",
            Topology::BuckBoost => "升降压变换器 (Buck-Boost)",
        }
    }
}

/// Optimization priority chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Efficiency,
    Cost,
    Volume,
    Balanced,
}

impl Priority {
    pub fn from_keyword(word: &str) -> Option<Self> {
        if word.contains("效率") || word.contains("高效") {
            Some(Priority::Efficiency)
        } else if word.contains("成本")
            || word.contains("便宜")
            || word.contains("低价")
        {
            Some(Priority::Cost)
        } else if word.contains("体积") || word.contains("紧凑") || word.contains("小型") {
            Some(Priority::Volume)
        } else if word.contains("均衡") {
            Some(Priority::Balanced)
        } else {
            None
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Priority::Efficiency => "效率优先",
            Priority::Cost => "成本优先",
            Priority::Volume => "体积优先",
            Priority::Balanced => "均衡设计",
        }
    }
}

/// Core fields whose absence lowers extraction confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingField {
    InputVoltage,
    OutputVoltage,
    OutputPower,
}

/// Best-effort design record recovered from the conversation.
///
/// Core values always hold a number: when the conversation did not supply
/// one, the default is filled in and the field is listed in
/// `missing_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDesign {
    pub topology: Topology,
    pub input_voltage: f64,
    pub input_voltage_min: Option<f64>,
    pub input_voltage_max: Option<f64>,
    pub output_voltage: f64,
    pub output_power: f64,
    pub output_power_min: Option<f64>,
    pub output_power_max: Option<f64>,
    pub priority: Priority,
    pub max_ambient_temp: Option<f64>,
    pub max_junction_temp: Option<f64>,
    pub ripple_max: Option<f64>,
    pub switching_freq_min: Option<f64>,
    pub switching_freq_max: Option<f64>,
    pub confidence: f64,
    pub missing_fields: Vec<MissingField>,
}

impl ExtractedDesign {
    pub const HIGH_CONFIDENCE: f64 = 0.9;
    pub const MEDIUM_CONFIDENCE: f64 = 0.6;
    pub const LOW_CONFIDENCE: f64 = 0.3;

    /// Confidence tier for a count of missing core fields.
    pub fn confidence_for(missing: usize) -> f64 {
        match missing {
            0 => Self::HIGH_CONFIDENCE,
            1 => Self::MEDIUM_CONFIDENCE,
            _ => Self::LOW_CONFIDENCE,
        }
    }

    pub fn has_input_range(&self) -> bool {
        self.input_voltage_min.is_some() && self.input_voltage_max.is_some()
    }

    pub fn is_missing(&self, field: MissingField) -> bool {
        self.missing_fields.contains(&field)
    }
}

impl Default for ExtractedDesign {
    /// Fallback record: boost, 48 V → 100 V, 500 W, balanced, with every
    /// core field reported missing and zero confidence.
    fn default() -> Self {
        Self {
            topology: Topology::Boost,
            input_voltage: 48.0,
            input_voltage_min: None,
            input_voltage_max: None,
            output_voltage: 100.0,
            output_power: 500.0,
            output_power_min: None,
            output_power_max: None,
            priority: Priority::Balanced,
            max_ambient_temp: None,
            max_junction_temp: None,
            ripple_max: None,
            switching_freq_min: None,
            switching_freq_max: None,
            confidence: 0.0,
            missing_fields: vec![
                MissingField::InputVoltage,
                MissingField::OutputVoltage,
                MissingField::OutputPower,
            ],
        }
    }
}

/// Relative weights of the three optimization axes, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationWeights {
    pub efficiency: f64,
    pub cost: f64,
    pub volume: f64,
}

/// Fully-populated configuration consumed by synthesis and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignParameters {
    pub topology: Topology,
    pub input_voltage: f64,
    pub input_voltage_min: f64,
    pub input_voltage_max: f64,
    pub input_voltage_points: u32,
    pub output_voltage: f64,
    pub output_power: f64,
    pub output_power_min: f64,
    pub output_power_max: f64,
    pub output_power_points: u32,
    pub weights: OptimizationWeights,
    pub switching_frequency_hz: f64,
    pub inductance_h: f64,
    pub max_ambient_temp: f64,
    pub max_junction_temp: f64,
    pub max_core_temp: f64,
    pub ripple_percent: f64,
    pub inductor_margin_ratio: f64,
}

/// Catalog-like part record shared by every component slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub model: String,
    pub manufacturer: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl PartRecord {
    pub fn subtotal(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosfetSelection {
    pub part: PartRecord,
    pub vds: String,
    pub rds_on: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiodeSelection {
    pub part: PartRecord,
    pub vrrm: String,
    pub forward_current: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InductorSelection {
    /// `model` holds the core designation
    pub part: PartRecord,
    pub turns: u32,
    pub wire: String,
    pub air_gap: String,
    pub dcr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitorSelection {
    pub part: PartRecord,
    pub capacitance: String,
    pub voltage_rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatsinkSelection {
    pub part: PartRecord,
    pub thermal_resistance: String,
}

/// Per-component losses in watts at the nominal operating point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub mosfet_conduction: f64,
    pub mosfet_switching: f64,
    pub diode: f64,
    pub inductor_core: f64,
    pub inductor_copper: f64,
    pub capacitor: f64,
    pub total: f64,
}

/// Temperature estimates in °C
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalEstimate {
    pub mosfet_junction: f64,
    pub diode_junction: f64,
    pub inductor_core: f64,
}

/// Fabricated outcome of the (mock) optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignResult {
    /// Percent
    pub efficiency: f64,
    /// Currency units
    pub cost: f64,
    /// dm³
    pub volume: f64,
    pub mosfet: MosfetSelection,
    pub diode: DiodeSelection,
    pub inductor: InductorSelection,
    pub input_capacitor: CapacitorSelection,
    pub output_capacitor: CapacitorSelection,
    pub heatsink: HeatsinkSelection,
    pub losses: LossBreakdown,
    pub thermal: ThermalEstimate,
}
