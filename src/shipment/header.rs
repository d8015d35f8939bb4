use super::keywords::{self, Dictionary};
use super::{InstructionKind, InstructionType, Language, ParseWarning, ParserOptions, Shipment};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Weight printed under the tank details, e.g. `Tare 3800 kg`.
static KG_VALUE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d.,]*)\s*kg").ok());

/// Result of checking a line for an instruction title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
    Instruction(Language, InstructionKind),
    /// French title whose description keyword sits on the next line.
    ContinuesOnNextLine,
}

/// `after_french_title` is set when the previous line was a French title
/// without its keyword.
pub(crate) fn identify_marker(
    line: &str,
    dict: &Dictionary,
    after_french_title: bool,
) -> Option<Marker> {
    let language = match dict.marker_language(line) {
        Some(language) => language,
        None if after_french_title => Language::French,
        None => return None,
    };

    match dict.instruction_kind(language, line) {
        Some(kind) => Some(Marker::Instruction(language, kind)),
        None if language == Language::French && !after_french_title => {
            Some(Marker::ContinuesOnNextLine)
        }
        None => {
            debug!(
                language = language.code(),
                line = line.trim(),
                "Instruction keyword not in dictionary"
            );
            None
        }
    }
}

/// The part of `text` starting at line `index` (zero based).
pub(crate) fn lines_from(text: &str, index: usize) -> &str {
    let offset: usize = text.split_inclusive('\n').take(index).map(str::len).sum();
    &text[offset..]
}

/// Ends a single-value header field at the next column of the layout.
/// Built once per document from [`ParserOptions::column_gap`].
pub(crate) struct ColumnCut(Option<Regex>);

impl ColumnCut {
    pub(crate) fn new(gap: usize) -> Self {
        Self(Regex::new(&format!(r"\s{{{},}}", gap.max(1))).ok())
    }

    /// Text up to the first run of `gap` or more whitespace characters.
    pub(crate) fn apply<'a>(&self, text: &'a str) -> &'a str {
        match self.0.as_ref().and_then(|re| re.find(text)) {
            Some(m) => text[..m.start()].trim(),
            None => text.trim(),
        }
    }
}

/// Look for the instruction title in the first two lines. Returns the text
/// after the title.
pub(crate) fn detect_instruction<'a>(
    shipment: &mut Shipment,
    text: &'a str,
    dict: &Dictionary,
) -> &'a str {
    let mut after_french_title = false;

    for (idx, line) in text.lines().take(2).enumerate() {
        match identify_marker(line, dict, after_french_title) {
            Some(Marker::Instruction(language, kind)) => {
                shipment.doc_lang = Some(language);
                match InstructionType::new(language, kind) {
                    Some(instruction) => {
                        info!(
                            instruction = instruction.label(),
                            language = language.code(),
                            "Instruction detected"
                        );
                        shipment.instruction_type = Some(instruction);
                    }
                    None => {
                        warn!(
                            language = language.code(),
                            instruction = ?kind,
                            "Instruction title not in the known list"
                        );
                        shipment.warnings.push(ParseWarning::UnrecognizedInstruction {
                            language,
                            instruction: kind,
                        });
                    }
                }
                return lines_from(text, idx + 1);
            }
            Some(Marker::ContinuesOnNextLine) => after_french_title = true,
            None => after_french_title = false,
        }
    }

    warn!("No instruction title in the first two lines");
    shipment.warnings.push(ParseWarning::InstructionNotDetected);
    text
}

/// Read the id from the first line starting with `Shipment`.
pub(crate) fn detect_shipment_id(
    shipment: &mut Shipment,
    text: &str,
    options: &ParserOptions,
    cut: &ColumnCut,
) {
    let Some(rest) = text
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("Shipment"))
    else {
        warn!("No shipment id line found");
        shipment.warnings.push(ParseWarning::ShipmentIdNotFound);
        return;
    };

    let mut value = keywords::label_value(rest);
    for suffix in &options.vendor_suffixes {
        if let Some(stripped) = value.strip_suffix(suffix.as_str()) {
            value = stripped.trim_end();
            break;
        }
    }
    let raw = cut.apply(value);

    match raw.parse::<i64>() {
        Ok(id) => {
            info!(shipment_id = id, "Shipment id detected");
            shipment.shipment_id = id;
        }
        Err(e) => {
            warn!(raw = %raw, error = %e, "Shipment id is not a number");
            shipment.warnings.push(ParseWarning::MalformedShipmentId {
                raw: raw.to_string(),
            });
        }
    }
}

fn header_value<'a>(line: &'a str, labels: &[String], cut: &ColumnCut) -> Option<&'a str> {
    keywords::match_label(line, labels).map(|rest| cut.apply(keywords::label_value(rest)))
}

fn is_container_line(line: &str, dict: &Dictionary) -> bool {
    let lower = line.to_lowercase();
    !dict
        .container_exclusions
        .iter()
        .any(|exclusion| lower.contains(exclusion.as_str()))
        && keywords::match_label(line, &dict.tank_details).is_none()
}

/// Single pass over the whole document for the vehicle and tank metadata
/// and the general remark. Returns the text where the task sections begin.
pub(crate) fn scan_delivery_details<'a>(
    shipment: &mut Shipment,
    text: &'a str,
    dict: &Dictionary,
    cut: &ColumnCut,
) -> &'a str {
    let mut tasks_start: Option<usize> = None;
    let mut after_french_title = false;
    let mut general_remark_found = false;
    let mut in_general_remark = false;
    let mut tank_weight_added = false;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();

        let is_title = match identify_marker(raw, dict, after_french_title) {
            Some(marker) => {
                after_french_title = marker == Marker::ContinuesOnNextLine;
                true
            }
            None => {
                after_french_title = false;
                false
            }
        };
        let starts_task = !is_title && dict.starts_task(line);

        if in_general_remark {
            if starts_task {
                return lines_from(text, idx);
            }
            if !line.is_empty() {
                if !shipment.general_remark.is_empty() {
                    shipment.general_remark.push(' ');
                }
                shipment.general_remark.push_str(line);
            }
            continue;
        }

        if tasks_start.is_none() && starts_task {
            tasks_start = Some(idx);
        }

        if shipment.car_id.is_empty() {
            if let Some(value) = header_value(line, &dict.truck, cut) {
                shipment.car_id = value.to_uppercase();
            }
        }
        if shipment.driver_name.is_empty() {
            if let Some(value) = header_value(line, &dict.driver, cut) {
                shipment.driver_name = value.to_uppercase();
            }
        }
        if shipment.chassis.is_empty() {
            if let Some(value) = header_value(line, &dict.chassis, cut) {
                shipment.chassis = value.to_uppercase();
            }
        }
        if shipment.container.is_empty() && is_container_line(line, dict) {
            if let Some(value) = header_value(line, &dict.container, cut) {
                shipment.container = value.to_uppercase();
            }
        }
        if shipment.tank_details.is_empty() {
            if let Some(value) = header_value(line, &dict.tank_details, cut) {
                shipment.tank_details = value.to_string();
            }
        } else if !tank_weight_added {
            if let Some(caps) = KG_VALUE.as_ref().and_then(|re| re.captures(line)) {
                shipment.tank_details.push_str(&format!(" - {}Kg", &caps[1]));
                tank_weight_added = true;
            }
        }
        if !general_remark_found {
            if let Some(rest) = keywords::match_label(line, &dict.general_remark) {
                shipment.general_remark = keywords::label_value(rest).to_string();
                general_remark_found = true;
                in_general_remark = true;
            }
        }
    }

    match tasks_start {
        Some(idx) => lines_from(text, idx),
        None => {
            warn!("No task section found");
            ""
        }
    }
}
