//! Three-page design report: summary and KPIs, component selection,
//! loss and thermal analysis.

use pec_types::design::{DesignParameters, DesignResult};
use pec_types::document::{PaginatedDocument, Rgb};
use super::layout::*;
use super::BRAND;

pub fn design_report(params: &DesignParameters, result: &DesignResult) -> PaginatedDocument {
    let mut doc = DocumentBuilder::new(format!("{} Design Report", BRAND));
    summary_page(&mut doc, params, result);
    doc.new_page();
    components_page(&mut doc, result);
    doc.new_page();
    losses_page(&mut doc, params, result);
    doc.footers(BRAND);
    doc.finish()
}

fn summary_page(doc: &mut DocumentBuilder, params: &DesignParameters, result: &DesignResult) {
    let topology = params.topology.label();
    doc.centered(format!("{} Design Report", BRAND), 22.0, TITLE_COLOR);
    doc.advance(8.0);
    doc.centered(format!("DC/DC {} Converter Design", topology), 14.0, MUTED_COLOR);
    doc.advance(10.0);
    doc.centered(
        format!("Powered by {} Multi-Objective Optimization Engine", BRAND),
        10.0,
        Rgb::gray(120),
    );
    doc.advance(10.0);
    doc.divider();

    doc.advance(12.0);
    doc.heading("Executive Summary");
    doc.advance(10.0);
    doc.lines(
        [
            format!("This report presents the optimized design of a DC/DC {} converter. Candidate", topology),
            "component combinations were scored against the weights below and the".to_string(),
            "best-ranked solution is recommended. Figures come from a placeholder model".to_string(),
            "and must be verified before the design is committed to hardware.".to_string(),
        ],
        LEAD_COLOR,
        LINE_STEP,
    );

    doc.advance(10.0);
    doc.heading("Key Performance Indicators");
    doc.advance(10.0);
    let (width, gap, x0) = (50.0, 10.0, INDENT);
    doc.kpi_box(x0, width, Rgb(240, 245, 255), "Efficiency", format!("{:.2}%", result.efficiency), HEADING_COLOR);
    doc.kpi_box(x0 + width + gap, width, Rgb(240, 255, 240), "Est. Cost", format!("${}", num(result.cost)), PASS_COLOR);
    doc.kpi_box(
        x0 + 2.0 * (width + gap),
        width,
        Rgb(255, 245, 238),
        "Volume",
        format!("{} dm³", num(result.volume)),
        Rgb(210, 105, 30),
    );

    let (col1, col2) = (INDENT, 110.0);
    doc.advance(35.0);
    doc.heading("1. System Specifications");
    doc.advance(10.0);
    doc.text(col1, "Electrical Specifications:", 10.0, LEAD_COLOR);
    doc.text(col2, "Operating Range:", 10.0, LEAD_COLOR);
    doc.advance(7.0);
    let pairs = [
        (
            format!("Input Voltage (Vin): {} V", num(params.input_voltage)),
            format!("Vin Range: {} - {} V", num(params.input_voltage_min), num(params.input_voltage_max)),
        ),
        (
            format!("Output Voltage (Vout): {} V", num(params.output_voltage)),
            format!("Pout Range: {} - {} W", num(params.output_power_min), num(params.output_power_max)),
        ),
        (
            format!("Output Power (Pout): {} W", num(params.output_power)),
            format!("Switching Freq: {} Hz", num(params.switching_frequency_hz)),
        ),
        (
            format!("Main Inductance: {}", micro_henry(params.inductance_h)),
            format!("Output Ripple: <{}%", num(params.ripple_percent)),
        ),
    ];
    for (left, right) in pairs {
        doc.text(col1, left, 10.0, BODY_COLOR);
        doc.text(col2, right, 10.0, BODY_COLOR);
        doc.advance(LINE_STEP);
    }

    doc.advance(8.0);
    doc.heading("2. Optimization Weights");
    doc.advance(10.0);
    doc.lines(
        [
            format!("Efficiency Weight: {}%", num(params.weights.efficiency)),
            format!("Cost Weight: {}%", num(params.weights.cost)),
            format!("Volume Weight: {}%", num(params.weights.volume)),
        ],
        BODY_COLOR,
        LINE_STEP,
    );

    doc.advance(8.0);
    doc.heading("3. Design Constraints");
    doc.advance(10.0);
    doc.text(col1, "Thermal Constraints:", 10.0, LEAD_COLOR);
    doc.text(col2, "Other Constraints:", 10.0, LEAD_COLOR);
    doc.advance(7.0);
    doc.text(col1, format!("Max Ambient Temp: {}°C", num(params.max_ambient_temp)), 10.0, BODY_COLOR);
    doc.text(col2, format!("Inductor Margin: {}", num(params.inductor_margin_ratio)), 10.0, BODY_COLOR);
    doc.advance(LINE_STEP);
    doc.text(col1, format!("Max Junction Temp: {}°C", num(params.max_junction_temp)), 10.0, BODY_COLOR);
    doc.advance(LINE_STEP);
    doc.text(col1, format!("Max Core Temp: {}°C", num(params.max_core_temp)), 10.0, BODY_COLOR);
}

fn components_page(doc: &mut DocumentBuilder, result: &DesignResult) {
    doc.heading("4. Component Selection Summary");
    doc.advance(10.0);
    doc.text(INDENT, "Based on the ranked candidates, the following components are recommended:", 10.0, LEAD_COLOR);

    let m = &result.mosfet;
    doc.advance(15.0);
    doc.subheading("4.1 Power MOSFET");
    doc.advance(8.0);
    doc.lines(
        [
            format!("Part Number: {}", m.part.model),
            format!("Manufacturer: {}", m.part.manufacturer),
            format!("Drain-Source Voltage (Vds): {}", m.vds),
            format!("On-Resistance Rds(on): {}", m.rds_on),
            format!("Quantity: {}", m.part.quantity),
            format!("Unit Price: ${}", num(m.part.unit_price)),
        ],
        BODY_COLOR,
        LINE_STEP,
    );

    let d = &result.diode;
    doc.advance(8.0);
    doc.subheading("4.2 Rectifier Diode (SiC Schottky)");
    doc.advance(8.0);
    doc.lines(
        [
            format!("Part Number: {}", d.part.model),
            format!("Manufacturer: {}", d.part.manufacturer),
            format!("Reverse Voltage (Vrrm): {}", d.vrrm),
            format!("Forward Current (If): {}", d.forward_current),
            format!("Quantity: {}", d.part.quantity),
            format!("Unit Price: ${}", num(d.part.unit_price)),
        ],
        BODY_COLOR,
        LINE_STEP,
    );

    let l = &result.inductor;
    doc.advance(8.0);
    doc.subheading("4.3 Main Inductor");
    doc.advance(8.0);
    doc.lines(
        [
            format!("Core: {}", l.part.model),
            "Core Material: 3C95 Ferrite".to_string(),
            format!("Turns: {}", l.turns),
            format!("Wire: {}", l.wire),
            format!("Air Gap: {}", l.air_gap),
            format!("DC Resistance: {}", l.dcr),
        ],
        BODY_COLOR,
        LINE_STEP,
    );

    let (ci, co) = (&result.input_capacitor, &result.output_capacitor);
    doc.advance(8.0);
    doc.subheading("4.4 Capacitors");
    doc.advance(8.0);
    doc.lines(
        [
            "Input Capacitor:".to_string(),
            format!("  {}, {}/{}, Qty: {}", ci.part.model, ci.capacitance, ci.voltage_rating, ci.part.quantity),
            "Output Capacitor:".to_string(),
            format!("  {}, {}/{}, Qty: {}", co.part.model, co.capacitance, co.voltage_rating, co.part.quantity),
        ],
        BODY_COLOR,
        LINE_STEP,
    );
}

fn losses_page(doc: &mut DocumentBuilder, params: &DesignParameters, result: &DesignResult) {
    let l = &result.losses;
    doc.heading("5. Loss Analysis");
    doc.advance(10.0);
    doc.text(INDENT, "Detailed power loss breakdown at nominal operating point:", 10.0, LEAD_COLOR);
    doc.advance(12.0);

    let share = |w: f64| {
        if l.total > 0.0 {
            format!("{:.1}", w / l.total * 100.0)
        } else {
            "0.0".to_string()
        }
    };
    let rows = [
        ("MOSFET Conduction Loss", l.mosfet_conduction),
        ("MOSFET Switching Loss", l.mosfet_switching),
        ("Diode Conduction Loss", l.diode),
        ("Inductor Core Loss", l.inductor_core),
        ("Inductor Copper Loss", l.inductor_copper),
        ("Capacitor ESR Loss", l.capacitor),
    ];
    for (name, watts) in rows {
        doc.text(INDENT, format!("{}: {:.2} W ({}%)", name, watts, share(watts)), 11.0, BODY_COLOR);
        doc.advance(7.0);
    }
    doc.advance(5.0);
    doc.text(INDENT, format!("Total Power Loss: {:.2} W", l.total), 12.0, HEADING_COLOR);
    doc.advance(7.0);
    doc.text(INDENT, format!("System Efficiency: {:.2}%", result.efficiency), 12.0, HEADING_COLOR);

    let t = &result.thermal;
    let tj = num(params.max_junction_temp);
    doc.advance(20.0);
    doc.heading("6. Thermal Analysis");
    doc.advance(10.0);
    doc.text(INDENT, "Junction temperature estimates at worst-case operating conditions:", 10.0, LEAD_COLOR);
    doc.advance(10.0);
    doc.text(INDENT, format!("Ambient Temperature: {}°C", num(params.max_ambient_temp)), 10.0, BODY_COLOR);
    doc.advance(7.0);
    doc.text(
        INDENT,
        format!("Heatsink: {} (Rth = {})", result.heatsink.part.model, result.heatsink.thermal_resistance),
        10.0,
        BODY_COLOR,
    );
    doc.advance(10.0);
    doc.lines(
        [
            format!(
                "MOSFET Junction Temp: {}°C (Limit: {}°C) - {}",
                num(t.mosfet_junction),
                tj,
                verdict(t.mosfet_junction, params.max_junction_temp)
            ),
            format!(
                "Diode Junction Temp: {}°C (Limit: {}°C) - {}",
                num(t.diode_junction),
                tj,
                verdict(t.diode_junction, params.max_junction_temp)
            ),
            format!(
                "Inductor Core Temp: {}°C (Limit: {}°C) - {}",
                num(t.inductor_core),
                num(params.max_core_temp),
                verdict(t.inductor_core, params.max_core_temp)
            ),
        ],
        BODY_COLOR,
        7.0,
    );
}

/// PASS when the estimate stays at or below the limit
pub fn verdict(estimate: f64, limit: f64) -> &'static str {
    if estimate <= limit { "PASS" } else { "FAIL" }
}
