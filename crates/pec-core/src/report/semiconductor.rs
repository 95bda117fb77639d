//! MOSFET and diode selection with the thermal check.

use pec_types::design::{DesignParameters, DesignResult};
use pec_types::document::{PaginatedDocument, Rgb};
use super::layout::*;
use super::BRAND;

pub fn semiconductor_report(params: &DesignParameters, result: &DesignResult) -> PaginatedDocument {
    let mut doc = DocumentBuilder::new("Semiconductor Selection & Thermal Analysis");
    doc.banner(
        "Semiconductor Selection & Thermal Analysis",
        18.0,
        &format!("{} Technical Report", BRAND),
    );

    let m = &result.mosfet;
    doc.advance(15.0);
    doc.heading("1. MOSFET Selection");
    doc.advance(10.0);
    doc.text(INDENT, "Selection Criteria: Vds > 1.5x Max Switch Voltage, Low Rds(on), Low Qg", 10.0, LEAD_COLOR);
    doc.advance(10.0);
    doc.lines(
        [
            format!("Selected Part: {}", m.part.model),
            format!("Manufacturer: {}", m.part.manufacturer),
            "Technology: CoolMOS C7 (Superjunction)".to_string(),
            format!("Drain-Source Voltage: {}", m.vds),
            format!("On-Resistance @ 25°C: {}", m.rds_on),
            "Gate Charge Qg: 45nC (typ)".to_string(),
            "Package: TO-247".to_string(),
            format!("Quantity Required: {}", m.part.quantity),
            format!("Unit Cost: ${}", num(m.part.unit_price)),
        ],
        BODY_COLOR,
        LINE_STEP,
    );

    let l = &result.losses;
    doc.advance(10.0);
    doc.subheading("MOSFET Loss Analysis:");
    doc.advance(8.0);
    doc.lines(
        [
            format!("Conduction Loss: Pcond = Irms² x Rds(on) = {:.2} W", l.mosfet_conduction),
            format!(
                "Switching Loss: Psw = 0.5 x Vds x Id x (tr + tf) x fsw = {:.2} W",
                l.mosfet_switching
            ),
            format!("Total MOSFET Loss: {:.2} W", l.mosfet_conduction + l.mosfet_switching),
        ],
        BODY_COLOR,
        LINE_STEP,
    );

    let d = &result.diode;
    doc.advance(9.0);
    doc.heading("2. Rectifier Diode Selection");
    doc.advance(10.0);
    doc.text(
        INDENT,
        "Selection Criteria: SiC Schottky for low reverse recovery, Vrrm > Vout + margin",
        10.0,
        LEAD_COLOR,
    );
    doc.advance(10.0);
    doc.lines(
        [
            format!("Selected Part: {}", d.part.model),
            format!("Manufacturer: {}", d.part.manufacturer),
            "Technology: SiC Schottky Barrier Diode".to_string(),
            format!("Reverse Voltage: {}", d.vrrm),
            format!("Forward Current Rating: {}", d.forward_current),
            "Forward Voltage Drop: 1.5V (typ @ 10A)".to_string(),
            "Reverse Recovery: ~0 (SiC advantage)".to_string(),
            "Package: TO-220".to_string(),
            format!("Unit Cost: ${}", num(d.part.unit_price)),
        ],
        BODY_COLOR,
        LINE_STEP,
    );

    let t = &result.thermal;
    doc.advance(9.0);
    doc.heading("3. Thermal Management");
    doc.advance(10.0);
    doc.lines(
        [
            format!("Heatsink Selected: {}", result.heatsink.part.model),
            format!("Heatsink Thermal Resistance: {}", result.heatsink.thermal_resistance),
            format!("Ambient Temperature: {}°C", num(params.max_ambient_temp)),
        ],
        BODY_COLOR,
        LINE_STEP,
    );
    doc.advance(4.0);
    doc.text(INDENT, "Junction Temperature Calculation:", 11.0, BODY_COLOR);
    doc.advance(8.0);
    doc.lines(
        [
            format!("Tj(MOSFET) = Ta + Ploss x (Rth_jc + Rth_cs + Rth_sa) = {}°C", num(t.mosfet_junction)),
            format!("Tj(Diode) = Ta + Ploss x (Rth_jc + Rth_cs + Rth_sa) = {}°C", num(t.diode_junction)),
        ],
        BODY_COLOR,
        LINE_STEP,
    );
    doc.advance(4.0);
    if t.mosfet_junction.max(t.diode_junction) <= params.max_junction_temp {
        doc.text(
            INDENT,
            format!("All junction temperatures within safe limits (< {}°C)", num(params.max_junction_temp)),
            10.0,
            PASS_COLOR,
        );
    } else {
        doc.text(
            INDENT,
            format!("Junction temperature exceeds the {}°C limit", num(params.max_junction_temp)),
            10.0,
            Rgb(200, 40, 40),
        );
    }
    doc.finish()
}
