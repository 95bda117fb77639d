//! Plain-text design summary, also used as the Q&A design context.

use pec_types::design::{DesignResult, ExtractedDesign};
use crate::report::layout::num;

pub fn design_summary(extracted: &ExtractedDesign, result: &DesignResult) -> String {
    let input = match (extracted.input_voltage_min, extracted.input_voltage_max) {
        (Some(lo), Some(hi)) => format!("{}V ~ {}V", num(lo), num(hi)),
        _ => format!("{}V", num(extracted.input_voltage)),
    };
    format!(
        "设计方案摘要\n\n\
         系统规格\n\
         - 拓扑结构: {}\n\
         - 输入电压: {}\n\
         - 输出电压: {}V\n\
         - 输出功率: {}W\n\n\
         优化目标\n\
         - 策略: {}\n\n\
         性能指标\n\
         - 效率: {:.2}%\n\
         - 成本: ¥{}\n\
         - 体积: {} dm³",
        extracted.topology.display_name(),
        input,
        num(extracted.output_voltage),
        num(extracted.output_power),
        extracted.priority.display_name(),
        result.efficiency,
        num(result.cost),
        num(result.volume),
    )
}

/// Enough was extracted to trust a generated design.
pub fn has_valid_design(extracted: &ExtractedDesign) -> bool {
    extracted.confidence > ExtractedDesign::LOW_CONFIDENCE && extracted.missing_fields.len() <= 1
}
