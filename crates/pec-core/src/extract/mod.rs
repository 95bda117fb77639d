//! Regex parameter extractor.
//!
//! Assistant replies and user messages are scanned separately against the
//! rule table in [`rules`]. The two partial records are merged under an
//! explicit [`MergePolicy`], then missing core fields are detected and the
//! defaults filled in.

pub mod rules;

use pec_types::{
    PecError, Result,
    design::{ExtractedDesign, MissingField, Priority, Topology},
    message::{ChatMessage, Role},
};
use rules::{Aggregate, CompiledRule, Field, TextSource, COMPILED_RULES, FIELD_ORDER};

/// Values recovered from one side of the conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialDesign {
    pub topology: Option<Topology>,
    pub input_voltage: Option<f64>,
    pub input_voltage_min: Option<f64>,
    pub input_voltage_max: Option<f64>,
    pub output_voltage: Option<f64>,
    pub output_power: Option<f64>,
    pub priority: Option<Priority>,
    pub max_ambient_temp: Option<f64>,
    pub max_junction_temp: Option<f64>,
    pub ripple_max: Option<f64>,
    pub switching_freq_min: Option<f64>,
}

impl PartialDesign {
    /// Fields set in `top` replace the ones in `self`.
    pub fn overlay(self, top: PartialDesign) -> PartialDesign {
        PartialDesign {
            topology: top.topology.or(self.topology),
            input_voltage: top.input_voltage.or(self.input_voltage),
            input_voltage_min: top.input_voltage_min.or(self.input_voltage_min),
            input_voltage_max: top.input_voltage_max.or(self.input_voltage_max),
            output_voltage: top.output_voltage.or(self.output_voltage),
            output_power: top.output_power.or(self.output_power),
            priority: top.priority.or(self.priority),
            max_ambient_temp: top.max_ambient_temp.or(self.max_ambient_temp),
            max_junction_temp: top.max_junction_temp.or(self.max_junction_temp),
            ripple_max: top.ripple_max.or(self.ripple_max),
            switching_freq_min: top.switching_freq_min.or(self.switching_freq_min),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PartialDesign::default()
    }

    /// Core fields the conversation did not supply
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.input_voltage.is_none() && self.input_voltage_min.is_none() {
            missing.push(MissingField::InputVoltage);
        }
        if self.output_voltage.is_none() {
            missing.push(MissingField::OutputVoltage);
        }
        if self.output_power.is_none() {
            missing.push(MissingField::OutputPower);
        }
        missing
    }

    /// Fill defaults and grade confidence.
    pub fn into_extracted(self) -> ExtractedDesign {
        let missing_fields = self.missing_fields();
        let defaults = ExtractedDesign::default();
        ExtractedDesign {
            topology: self.topology.unwrap_or(defaults.topology),
            input_voltage: self
                .input_voltage
                .or(self.input_voltage_min)
                .unwrap_or(defaults.input_voltage),
            input_voltage_min: self.input_voltage_min,
            input_voltage_max: self.input_voltage_max,
            output_voltage: self.output_voltage.unwrap_or(defaults.output_voltage),
            output_power: self.output_power.unwrap_or(defaults.output_power),
            output_power_min: None,
            output_power_max: None,
            priority: self.priority.unwrap_or(defaults.priority),
            max_ambient_temp: self.max_ambient_temp,
            max_junction_temp: self.max_junction_temp,
            ripple_max: self.ripple_max,
            switching_freq_min: self.switching_freq_min,
            switching_freq_max: None,
            confidence: ExtractedDesign::confidence_for(missing_fields.len()),
            missing_fields,
        }
    }
}

/// Which side wins when both supplied the same field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// The assistant restates confirmed values in a structured summary,
    /// so its reading replaces loose user phrasing.
    #[default]
    AssistantOverridesUser,
    UserOverridesAssistant,
}

impl MergePolicy {
    pub fn merge(&self, assistant: PartialDesign, user: PartialDesign) -> PartialDesign {
        match self {
            MergePolicy::AssistantOverridesUser => user.overlay(assistant),
            MergePolicy::UserOverridesAssistant => assistant.overlay(user),
        }
    }
}

/// Extract a design from the conversation. Never fails: on an empty
/// history or any internal error the default record is returned.
pub fn extract(history: &[ChatMessage]) -> ExtractedDesign {
    if history.is_empty() {
        return ExtractedDesign::default();
    }
    match try_extract(history, MergePolicy::default()) {
        Ok(design) => design,
        Err(e) => {
            log::error!("[extract] falling back to defaults: {}", e);
            ExtractedDesign::default()
        }
    }
}

/// Fallible core of [`extract`].
pub fn try_extract(history: &[ChatMessage], policy: MergePolicy) -> Result<ExtractedDesign> {
    let rules = COMPILED_RULES
        .as_ref()
        .map_err(|e| PecError::Other(format!("extraction rules unavailable: {}", e)))?;

    let assistant_text = joined(history, Role::Assistant);
    let user_text = joined(history, Role::User);

    let from_assistant = scan(rules, TextSource::Assistant, &assistant_text)?;
    let from_user = scan(rules, TextSource::User, &user_text)?;
    log::debug!("[extract] assistant: {:?}", from_assistant);
    log::debug!("[extract] user: {:?}", from_user);

    let merged = policy.merge(from_assistant, from_user);
    let design = merged.into_extracted();
    log::debug!("[extract] merged: {:?}", design);
    Ok(design)
}

fn joined(history: &[ChatMessage], role: Role) -> String {
    history
        .iter()
        .filter(|m| m.role == role)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply every rule of one source to `text`.
pub fn scan(rules: &[CompiledRule], source: TextSource, text: &str) -> Result<PartialDesign> {
    let mut out = PartialDesign::default();
    if text.trim().is_empty() {
        return Ok(out);
    }
    for field in FIELD_ORDER {
        let mut candidates: Vec<&CompiledRule> = rules
            .iter()
            .filter(|c| c.rule.source == source && c.rule.field == *field)
            .collect();
        candidates.sort_by_key(|c| c.rule.precedence);

        for candidate in candidates {
            if apply_rule(candidate, text, &mut out)? {
                break;
            }
        }
    }
    Ok(out)
}

/// Run one rule; returns whether it set anything.
fn apply_rule(compiled: &CompiledRule, text: &str, out: &mut PartialDesign) -> Result<bool> {
    let re = &compiled.regex;
    let rule = &compiled.rule;

    match rule.field {
        Field::Topology => {
            if out.topology.is_some() {
                return Ok(false);
            }
            let topology = re
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| Topology::from_keyword(m.as_str()));
            out.topology = topology;
            Ok(topology.is_some())
        }
        Field::Priority => {
            if out.priority.is_some() {
                return Ok(false);
            }
            let priority = re
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| Priority::from_keyword(m.as_str()));
            out.priority = priority;
            Ok(priority.is_some())
        }
        Field::InputRange => {
            if out.input_voltage_min.is_some() {
                return Ok(false);
            }
            let Some(caps) = re.captures(text) else {
                return Ok(false);
            };
            let (Some(lo), Some(hi)) = (caps.get(1), caps.get(2)) else {
                return Ok(false);
            };
            let (Some(lo), Some(hi)) = (number(rule.name, lo.as_str()), number(rule.name, hi.as_str()))
            else {
                return Ok(false);
            };
            if lo <= 0.0 || hi <= 0.0 {
                return Ok(false);
            }
            out.input_voltage_min = Some(lo);
            out.input_voltage_max = Some(hi);
            out.input_voltage.get_or_insert(lo);
            Ok(true)
        }
        Field::VoltagePair => {
            // A recognized range already claims the input side.
            if out.input_voltage_min.is_some() {
                return Ok(false);
            }
            let mut volts = Vec::new();
            for caps in re.captures_iter(text) {
                if let Some(v) = caps.get(1).and_then(|m| number(rule.name, m.as_str())) {
                    if v > 0.0 && v < 1000.0 {
                        volts.push(v);
                    }
                }
            }
            if volts.len() < 2 {
                return Ok(false);
            }
            volts.sort_by(f64::total_cmp);
            let (low, high) = (volts[0], volts[volts.len() - 1]);
            // Boost semantics unless buck is named explicitly.
            let (vin, vout) = match out.topology {
                Some(Topology::Buck) => (high, low),
                _ => (low, high),
            };
            let mut changed = false;
            if out.input_voltage.is_none() {
                out.input_voltage = Some(vin);
                changed = true;
            }
            if out.output_voltage.is_none() {
                out.output_voltage = Some(vout);
                changed = true;
            }
            Ok(changed)
        }
        Field::OutputPower | Field::SwitchingFreq => {
            let slot = if rule.field == Field::OutputPower {
                &mut out.output_power
            } else {
                &mut out.switching_freq_min
            };
            if slot.is_some() {
                return Ok(false);
            }
            let value = scaled_value(compiled, text);
            *slot = value;
            Ok(value.is_some())
        }
        Field::InputVoltage
        | Field::OutputVoltage
        | Field::AmbientTemp
        | Field::JunctionTemp
        | Field::Ripple => {
            let slot = match rule.field {
                Field::InputVoltage => &mut out.input_voltage,
                Field::OutputVoltage => &mut out.output_voltage,
                Field::AmbientTemp => &mut out.max_ambient_temp,
                Field::JunctionTemp => &mut out.max_junction_temp,
                _ => &mut out.ripple_max,
            };
            if slot.is_some() {
                return Ok(false);
            }
            let value = re
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| number(rule.name, m.as_str()))
                .filter(|v| *v > 0.0);
            *slot = value;
            Ok(value.is_some())
        }
    }
}

/// Number in capture 1 times 1000 when capture 2 holds a `k` prefix,
/// combined across matches per the rule's aggregate.
fn scaled_value(compiled: &CompiledRule, text: &str) -> Option<f64> {
    let mut values = Vec::new();
    for caps in compiled.regex.captures_iter(text) {
        let Some(m) = caps.get(1) else { continue };
        let Some(mut v) = number(compiled.rule.name, m.as_str()) else {
            continue;
        };
        if caps
            .get(2)
            .is_some_and(|k| k.as_str().eq_ignore_ascii_case("k"))
        {
            v *= 1000.0;
        }
        if v > 0.0 {
            values.push(v);
        }
        if compiled.rule.aggregate == Aggregate::First {
            break;
        }
    }
    match compiled.rule.aggregate {
        Aggregate::Max | Aggregate::All => values.into_iter().reduce(f64::max),
        Aggregate::First => values.into_iter().next(),
    }
}

/// A capture that does not parse is skipped on its own.
fn number(rule: &str, raw: &str) -> Option<f64> {
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("[extract] rule {} captured {:?}: {}", rule, raw, e);
            None
        }
    }
}
