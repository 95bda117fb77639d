//! Bill of materials as CSV.

use pec_types::design::{DesignParameters, DesignResult, PartRecord};
use super::layout::micro_henry;

/// Byte-order marker prefixed to exported CSV so spreadsheet tools detect UTF-8
pub const BOM_MARKER: char = '\u{FEFF}';

pub const BOM_HEADERS: [&str; 8] = [
    "No.",
    "Category",
    "Part Number",
    "Manufacturer",
    "Key Parameters",
    "Qty",
    "Unit Price ($)",
    "Subtotal ($)",
];

/// One component line of the BOM
#[derive(Debug, Clone, PartialEq)]
pub struct BomLine {
    pub category: &'static str,
    pub part_number: String,
    pub manufacturer: String,
    pub key_parameters: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl BomLine {
    /// Rounded to cents so the total row adds up exactly
    pub fn subtotal(&self) -> f64 {
        cents(self.quantity as f64 * self.unit_price)
    }
}

fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn bom_lines(params: &DesignParameters, result: &DesignResult) -> Vec<BomLine> {
    let line = |category, part: &PartRecord, key_parameters: String| BomLine {
        category,
        part_number: part.model.clone(),
        manufacturer: part.manufacturer.clone(),
        key_parameters,
        quantity: part.quantity,
        unit_price: part.unit_price,
    };
    vec![
        line(
            "MOSFET",
            &result.mosfet.part,
            format!("Vds={}, Rds(on)={}", result.mosfet.vds, result.mosfet.rds_on),
        ),
        line(
            "Diode (SiC)",
            &result.diode.part,
            format!("Vrrm={}, If={}", result.diode.vrrm, result.diode.forward_current),
        ),
        line(
            "Inductor",
            &result.inductor.part,
            format!("L={}, DCR={}", micro_henry(params.inductance_h), result.inductor.dcr),
        ),
        line(
            "Input Cap",
            &result.input_capacitor.part,
            format!("{}/{}", result.input_capacitor.capacitance, result.input_capacitor.voltage_rating),
        ),
        line(
            "Output Cap",
            &result.output_capacitor.part,
            format!("{}/{}", result.output_capacitor.capacitance, result.output_capacitor.voltage_rating),
        ),
        line(
            "Heatsink",
            &result.heatsink.part,
            format!("Rth={}", result.heatsink.thermal_resistance),
        ),
    ]
}

/// Quote a field when it carries a delimiter, quote or line break.
pub fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Header, six component rows and a trailing TOTAL row. No marker; see
/// [`BOM_MARKER`] for the exported form.
pub fn render_bom(params: &DesignParameters, result: &DesignResult) -> String {
    let lines = bom_lines(params, result);
    let mut rows = vec![csv_row(&BOM_HEADERS)];

    let mut total = 0.0;
    for (i, line) in lines.iter().enumerate() {
        let subtotal = line.subtotal();
        total += subtotal;
        rows.push(csv_row(&[
            (i + 1).to_string(),
            line.category.to_string(),
            line.part_number.clone(),
            line.manufacturer.clone(),
            line.key_parameters.clone(),
            line.quantity.to_string(),
            format!("{:.2}", line.unit_price),
            format!("{:.2}", subtotal),
        ]));
    }
    let total = format!("{:.2}", cents(total));
    rows.push(csv_row(&["", "", "", "", "", "", "TOTAL", total.as_str()]));
    rows.join("\n")
}

/// CSV bytes as downloaded: UTF-8 with the leading marker.
pub fn bom_bytes(params: &DesignParameters, result: &DesignResult) -> Vec<u8> {
    let mut out = String::new();
    out.push(BOM_MARKER);
    out.push_str(&render_bom(params, result));
    out.into_bytes()
}
