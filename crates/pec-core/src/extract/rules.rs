//! Extraction rule table.
//!
//! Each rule is a `(pattern, field, precedence)` triple scoped to one side
//! of the conversation. Within a source and field, rules are tried in
//! ascending precedence and the first one that yields a value wins.
//!
//! Digits are matched as `[0-9]`. The `regex` crate's `\d` also accepts
//! fullwidth and other Unicode digits, which `f64::from_str` rejects.

use std::sync::LazyLock;
use regex::Regex;

/// Which side of the conversation a rule reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// Concatenated assistant replies (structured confirmation summaries)
    Assistant,
    /// Concatenated user messages (loose phrasing)
    User,
}

/// What a rule's captures populate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Capture 1 is a topology keyword
    Topology,
    /// Captures 1 and 2 are the lower and upper input voltage
    InputRange,
    /// Capture 1 is the nominal input voltage
    InputVoltage,
    OutputVoltage,
    /// Capture 1 is a number, capture 2 an optional `k` multiplier
    OutputPower,
    /// Capture 1 is a priority keyword
    Priority,
    AmbientTemp,
    JunctionTemp,
    Ripple,
    /// Capture 1 is a number, capture 2 an optional `k` multiplier
    SwitchingFreq,
    /// Every match is a bare voltage; the set is split into input and
    /// output by topology
    VoltagePair,
}

/// How repeated matches of one rule combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    First,
    Max,
    All,
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractionRule {
    pub name: &'static str,
    pub source: TextSource,
    pub field: Field,
    pub precedence: u8,
    pub aggregate: Aggregate,
    pub pattern: &'static str,
}

const fn rule(
    name: &'static str,
    source: TextSource,
    field: Field,
    precedence: u8,
    pattern: &'static str,
) -> ExtractionRule {
    ExtractionRule { name, source, field, precedence, aggregate: Aggregate::First, pattern }
}

const fn rule_agg(
    name: &'static str,
    source: TextSource,
    field: Field,
    precedence: u8,
    aggregate: Aggregate,
    pattern: &'static str,
) -> ExtractionRule {
    ExtractionRule { name, source, field, precedence, aggregate, pattern }
}

use Field::*;
use TextSource::{Assistant, User};

pub static RULE_TABLE: &[ExtractionRule] = &[
    // ── assistant summary ──
    rule("assistant.topology.labelled", Assistant, Topology, 0,
        r"(?i)拓扑[结构型]*[：:]\s*(Buck-Boost|Boost|Buck)"),
    rule("assistant.topology.recommended", Assistant, Topology, 1,
        r"(?i)推荐拓扑[：:]\s*(Buck-Boost|Boost|Buck)"),
    rule("assistant.topology.ccm", Assistant, Topology, 2,
        r"(?i)(Buck-Boost|Boost|Buck)\s*[（(]?CCM[)）]?"),
    rule("assistant.topology.adopt", Assistant, Topology, 3,
        r"(?i)采用\s*(Buck-Boost|Boost|Buck|升降压|升压|降压)"),
    rule("assistant.topology.choose", Assistant, Topology, 4,
        r"(?i)选择\s*(Buck-Boost|Boost|Buck|升降压|升压|降压)"),
    rule("assistant.input.range.vin", Assistant, InputRange, 0,
        r"(?i)输入电压[范围]*[（(]?Vin[)）]?[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*V?\s*[-~到至]\s*([0-9]+(?:\.[0-9]+)?)\s*V?"),
    rule("assistant.input.range", Assistant, InputRange, 1,
        r"(?i)输入电压[范围]*[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*V?\s*[-~到至]\s*([0-9]+(?:\.[0-9]+)?)\s*V?"),
    rule("assistant.input.range.short", Assistant, InputRange, 2,
        r"(?i)Vin[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*V?\s*[-~到至]\s*([0-9]+(?:\.[0-9]+)?)\s*V?"),
    rule("assistant.input.single", Assistant, InputVoltage, 0,
        r"(?i)输入电压[（(]?(?:Vin)?[)）]?[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*V"),
    rule("assistant.output.vout", Assistant, OutputVoltage, 0,
        r"(?i)输出电压[（(]?Vout[)）]?[：:]\s*([0-9]+(?:\.[0-9]+)?)"),
    rule("assistant.output", Assistant, OutputVoltage, 1,
        r"(?i)输出电压[：:]\s*([0-9]+(?:\.[0-9]+)?)"),
    rule("assistant.output.short", Assistant, OutputVoltage, 2,
        r"(?i)Vout[：:]\s*([0-9]+(?:\.[0-9]+)?)"),
    rule("assistant.power.pout", Assistant, OutputPower, 0,
        r"(?i)输出功率[（(]?Pout[)）]?[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*(k?)W?"),
    rule("assistant.power", Assistant, OutputPower, 1,
        r"(?i)输出功率[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*(k?)W?"),
    rule("assistant.power.max", Assistant, OutputPower, 2,
        r"(?i)最大输出功率[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*(k?)W?"),
    rule("assistant.power.bare", Assistant, OutputPower, 3,
        r"(?i)功率[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*(k?)W?"),
    rule("assistant.power.short", Assistant, OutputPower, 4,
        r"(?i)Pout[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*(k?)W?"),
    rule("assistant.priority.goal", Assistant, Priority, 0,
        r"优化目标[：:]\s*(效率优先|成本优先|体积优先|均衡设计|均衡)"),
    rule("assistant.priority.design", Assistant, Priority, 1,
        r"设计目标[：:]\s*(效率优先|成本优先|体积优先|均衡设计|均衡)"),
    rule("assistant.ambient", Assistant, AmbientTemp, 0,
        r"(?i)环境温度[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*°?C"),
    rule("assistant.junction", Assistant, JunctionTemp, 0,
        r"(?i)结温[^：:\n]*[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*°?C"),
    rule("assistant.ripple", Assistant, Ripple, 0,
        r"纹波[要求]*[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*%"),
    rule("assistant.frequency", Assistant, SwitchingFreq, 0,
        r"(?i)开关频率[：:]\s*([0-9]+(?:\.[0-9]+)?)\s*(k?)Hz"),
    // ── user phrasing ──
    rule("user.topology.buck_boost", User, Topology, 0, r"(?i)(buck-boost|升降压)"),
    rule("user.topology.boost", User, Topology, 1, r"(?i)(boost|升压)"),
    rule("user.topology.buck", User, Topology, 2, r"(?i)(buck|降压)"),
    rule("user.input.range", User, InputRange, 0,
        r"([0-9]+(?:\.[0-9]+)?)\s*[Vv]?\s*[-~到至]\s*([0-9]+(?:\.[0-9]+)?)\s*[Vv]"),
    rule_agg("user.voltages", User, VoltagePair, 0, Aggregate::All,
        r"([0-9]+(?:\.[0-9]+)?)\s*[Vv]"),
    rule_agg("user.power.kilowatt", User, OutputPower, 0, Aggregate::Max,
        r"([0-9]+(?:\.[0-9]+)?)\s*([kK])[Ww]"),
    rule_agg("user.power", User, OutputPower, 1, Aggregate::Max,
        r"([0-9]+(?:\.[0-9]+)?)\s*[Ww瓦]"),
    rule("user.priority.efficiency", User, Priority, 0, r"(效率优先|高效)"),
    rule("user.priority.cost", User, Priority, 1, r"(成本优先|便宜|低价|成本低)"),
    rule("user.priority.volume", User, Priority, 2, r"(体积优先|紧凑|小型)"),
    rule("user.priority.balanced", User, Priority, 3, r"(均衡)"),
];

/// A rule with its pattern compiled
#[derive(Debug)]
pub struct CompiledRule {
    pub rule: ExtractionRule,
    pub regex: Regex,
}

/// The compiled table in declaration order. Compilation failure is kept as
/// an error so extraction can degrade instead of panicking.
pub static COMPILED_RULES: LazyLock<Result<Vec<CompiledRule>, String>> =
    LazyLock::new(|| compile(RULE_TABLE));

pub fn compile(table: &[ExtractionRule]) -> Result<Vec<CompiledRule>, String> {
    table
        .iter()
        .map(|rule| {
            Regex::new(rule.pattern)
                .map(|regex| CompiledRule { rule: *rule, regex })
                .map_err(|e| format!("rule {}: {}", rule.name, e))
        })
        .collect()
}

/// Order in which fields are applied for one source. A field already set
/// from the same source is never overwritten, so the input range must come
/// before the single input voltage and the voltage pair.
pub const FIELD_ORDER: &[Field] = &[
    Field::Topology,
    Field::InputRange,
    Field::InputVoltage,
    Field::OutputVoltage,
    Field::VoltagePair,
    Field::OutputPower,
    Field::Priority,
    Field::AmbientTemp,
    Field::JunctionTemp,
    Field::Ripple,
    Field::SwitchingFreq,
];
