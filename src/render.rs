// src/render.rs
//
// HTML snippets for chat clients that understand <b>/<i> markup.

use crate::countries;
use crate::shipment::{Shipment, TaskSection};
use std::fmt::Write;
use time::PrimitiveDateTime;
use time::macros::format_description;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `YYYY-MM-DD HH:MM`, empty when unset.
pub fn format_date(date: Option<PrimitiveDateTime>) -> String {
    date.and_then(|d| {
        d.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
            .ok()
    })
    .unwrap_or_default()
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "<b>{label}</b>: {}", escape_html(value));
}

fn line_if(out: &mut String, label: &str, value: &str) {
    if !value.is_empty() {
        line(out, label, value);
    }
}

/// Short per-task summary sent when the driver starts the task.
pub fn task_summary(task: &TaskSection) -> String {
    let mut out = String::new();

    if !task.address.is_empty() {
        let country = countries::extract_country(&task.address)
            .map(|c| format!("; {} {}", c.name, c.flag))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "<b>Address</b>: {}{}",
            escape_html(&task.address),
            country
        );
    }

    line_if(&mut out, "Customer", &task.customer_reference);
    line_if(&mut out, "Load", &task.load_reference);
    line_if(&mut out, "Unload", &task.unload_reference);

    if !task.load_reference.is_empty() {
        line(&mut out, "Expected load start", &format_date(task.load_start_date));
        line(&mut out, "Expected load end", &format_date(task.load_end_date));
    } else if !task.unload_reference.is_empty() {
        line_if(&mut out, "Expected unload start", &format_date(task.unload_start_date));
        line_if(&mut out, "Expected unload end", &format_date(task.unload_end_date));
    }

    if !task.product.is_empty() {
        line(&mut out, "Product", &task.product);
        line(&mut out, "Weight", &task.weight);
        line(&mut out, "Volume", &task.volume);
        line_if(&mut out, "Temperature", &task.temperature);
    }

    out
}

fn task_details(task: &TaskSection) -> String {
    let mut out = String::new();

    line_if(&mut out, "Address", &task.address);
    line_if(&mut out, "Destination", &task.destination_address);
    line_if(&mut out, "Tank status", &task.tank_status);

    if !task.customer_reference.is_empty() {
        line(&mut out, "Customer reference", &task.customer_reference);
        line(&mut out, "In order of", &task.company);
    }
    if !task.load_reference.is_empty() {
        line(&mut out, "Load reference", &task.load_reference);
        line(&mut out, "Expected start", &format_date(task.load_start_date));
        line(&mut out, "Expected end", &format_date(task.load_end_date));
    }
    if !task.unload_reference.is_empty() {
        line(&mut out, "Unload reference", &task.unload_reference);
        line(&mut out, "Expected start", &format_date(task.unload_start_date));
        line(&mut out, "Expected end", &format_date(task.unload_end_date));
    }
    if !task.product.is_empty() {
        line(&mut out, "Product", &task.product);
        line(&mut out, "Weight", &task.weight);
        line(&mut out, "Volume", &task.volume);
        line_if(&mut out, "Temperature", &task.temperature);
        if let Some(compartment) = task.compartment {
            line(&mut out, "Compartments", &compartment.to_string());
        }
    }
    line_if(&mut out, "Remark", &task.remark);

    out
}

/// Full readout: header block, then every task in document order.
pub fn shipment_readout(shipment: &Shipment) -> String {
    let mut out = String::new();

    line(&mut out, "Shipment", &shipment.shipment_id.to_string());
    line(
        &mut out,
        "Instruction",
        shipment.instruction_type.map(|t| t.label()).unwrap_or_default(),
    );
    line(
        &mut out,
        "Language",
        shipment.doc_lang.map(|l| l.code()).unwrap_or_default(),
    );
    line(&mut out, "Truck", &shipment.car_id);
    line(&mut out, "Driver", &shipment.driver_name);
    line(&mut out, "Container", &shipment.container);
    line_if(&mut out, "Chassis", &shipment.chassis);
    line(&mut out, "Tank details", &shipment.tank_details);
    line(&mut out, "General remark", &shipment.general_remark);
    out.push('\n');

    for (idx, task) in shipment.tasks.iter().enumerate() {
        let body = task_details(task);
        if body.is_empty() {
            continue;
        }
        let _ = writeln!(out, "<i><b>Task {}: {}</b></i>\n", idx + 1, task.task_type);
        out.push_str(&body);
        out.push('\n');
    }

    if !shipment.warnings.is_empty() {
        let _ = writeln!(
            out,
            "<i>{} fields could not be parsed, please review</i>",
            shipment.warnings.len()
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipment::{ParseWarning, TaskType};
    use time::macros::datetime;

    fn load_task() -> TaskSection {
        let mut task = TaskSection::new(TaskType::Load, "LOAD BASF SE");
        task.address = "BASF SE, DE 67056 Ludwigshafen".to_string();
        task.load_reference = "LR-1".to_string();
        task.load_start_date = Some(datetime!(2025-11-03 12:00));
        task.load_end_date = Some(datetime!(2025-11-03 14:00));
        task.product = "ACID & WATER".to_string();
        task.weight = "24000 kg".to_string();
        task
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some(datetime!(2025-11-03 07:05))), "2025-11-03 07:05");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn test_task_summary() {
        let summary = task_summary(&load_task());
        assert!(summary.starts_with(
            "<b>Address</b>: BASF SE, DE 67056 Ludwigshafen; Germany \u{1F1E9}\u{1F1EA}\n"
        ));
        assert!(summary.contains("<b>Expected load start</b>: 2025-11-03 12:00\n"));
        assert!(summary.contains("<b>Product</b>: ACID &amp; WATER\n"));
        assert!(!summary.contains("Temperature"));
    }

    #[test]
    fn test_readout_keeps_order_and_flags_warnings() {
        let mut unload = TaskSection::new(TaskType::Unload, "UNLOAD Port");
        unload.address = "Port".to_string();
        let shipment = Shipment {
            shipment_id: 42,
            tasks: vec![load_task(), unload],
            warnings: vec![ParseWarning::ShipmentIdNotFound, ParseWarning::InstructionNotDetected],
            ..Shipment::default()
        };

        let readout = shipment_readout(&shipment);
        assert!(readout.starts_with("<b>Shipment</b>: 42\n"));
        let first = readout.find("Task 1: load").unwrap();
        let second = readout.find("Task 2: unload").unwrap();
        assert!(first < second);
        assert!(!readout.contains("<b>Compartments</b>"));
        assert!(readout.ends_with("<i>2 fields could not be parsed, please review</i>\n"));
    }
}
