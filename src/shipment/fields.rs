use super::keywords::{self, Dictionary, Field};
use super::{DateField, ParseWarning, TaskSection};
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::warn;

const DATE_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[day]/[month]/[year] [hour padding:none]:[minute]");

/// Number of leading lines read as the task address.
const ADDRESS_LINES: usize = 3;

#[derive(Debug, thiserror::Error)]
pub(crate) enum DateRangeError {
    #[error("expected \"DD/MM/YYYY HH:MM - HH:MM\"")]
    Shape,
    #[error(transparent)]
    Time(#[from] time::error::Parse),
}

/// Parse `DD/MM/YYYY HH:MM - HH:MM`. The end shares the start's date.
pub(crate) fn parse_date_range(
    value: &str,
) -> Result<(PrimitiveDateTime, PrimitiveDateTime), DateRangeError> {
    let mut parts = value.split(" - ");
    let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(DateRangeError::Shape);
    };
    let start = start.trim();
    let end = end.split_whitespace().next().ok_or(DateRangeError::Shape)?;

    let from = PrimitiveDateTime::parse(start, DATE_TIME)?;
    let date = start.get(..11).ok_or(DateRangeError::Shape)?;
    let to = PrimitiveDateTime::parse(&format!("{date}{end}"), DATE_TIME)?;
    Ok((from, to))
}

/// Fill address, company and detail fields of a segmented section.
pub(crate) fn parse_details(
    section: &mut TaskSection,
    task: usize,
    dict: &Dictionary,
    warnings: &mut Vec<ParseWarning>,
) {
    section.address = find_address(section, dict);
    section.company = find_company(&section.lines, dict).unwrap_or_default();
    fill_details(section, task, dict, warnings);
}

fn find_address(section: &TaskSection, dict: &Dictionary) -> String {
    let task_keywords = dict.task_keywords(section.task_type);
    section
        .lines
        .iter()
        .take(ADDRESS_LINES)
        .enumerate()
        .map(|(idx, line)| {
            let line = line.trim();
            if idx > 0 {
                return line;
            }
            task_keywords
                .iter()
                .filter_map(|keyword| {
                    line.strip_prefix(keyword.to_uppercase().as_str())
                        .map(|rest| (keyword.len(), rest))
                })
                .max_by_key(|(len, _)| *len)
                .map_or(line, |(_, rest)| keywords::label_value(rest))
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn find_company(lines: &[String], dict: &Dictionary) -> Option<String> {
    lines.iter().find_map(|line| {
        dict.company
            .iter()
            .find_map(|keyword| keywords::find_keyword(line, keyword))
            .map(|rest| keywords::label_value(rest).to_string())
    })
}

/// A value that may run on over indented lines.
#[derive(Default)]
struct Continuation {
    parts: Vec<String>,
    open: bool,
    started: bool,
}

impl Continuation {
    fn start(&mut self, value: &str) {
        if self.started {
            return;
        }
        self.started = true;
        self.open = true;
        if !value.is_empty() {
            self.parts.push(value.to_string());
        }
    }

    /// Consumes `line` when it continues the open value. Any other line closes it.
    fn feed(&mut self, line: &str) -> bool {
        if !self.open {
            return false;
        }
        if !line.starts_with(char::is_whitespace) {
            self.open = false;
            return false;
        }
        let part = line.trim();
        if !part.is_empty() {
            self.parts.push(part.to_string());
        }
        true
    }

    fn join(&self, separator: &str) -> String {
        self.parts.join(separator)
    }
}

fn set_once(slot: &mut String, value: impl Into<String>) {
    if slot.is_empty() {
        *slot = value.into();
    }
}

fn fill_details(
    section: &mut TaskSection,
    task: usize,
    dict: &Dictionary,
    warnings: &mut Vec<ParseWarning>,
) {
    let lines = std::mem::take(&mut section.lines);
    let mut product = Continuation::default();
    let mut remark = Continuation::default();

    for line in &lines {
        if product.feed(line) || remark.feed(line) {
            continue;
        }
        let Some((field, rest)) = dict.field_label(line) else {
            continue;
        };
        let value = keywords::label_value(rest);

        match field {
            Field::TankStatus => set_once(&mut section.tank_status, value.to_uppercase()),
            Field::CustomerReference => {
                set_once(&mut section.customer_reference, value.to_uppercase())
            }
            Field::LoadReference => set_once(&mut section.load_reference, value.to_uppercase()),
            Field::UnloadReference => {
                set_once(&mut section.unload_reference, value.to_uppercase())
            }
            Field::LoadDate if section.load_start_date.is_none() => {
                match parse_date_range(value) {
                    Ok((from, to)) => {
                        section.load_start_date = Some(from);
                        section.load_end_date = Some(to);
                    }
                    Err(e) => warnings.push(date_warning(task, DateField::Load, value, &e)),
                }
            }
            Field::UnloadDate if section.unload_start_date.is_none() => {
                match parse_date_range(value) {
                    Ok((from, to)) => {
                        section.unload_start_date = Some(from);
                        section.unload_end_date = Some(to);
                    }
                    Err(e) => warnings.push(date_warning(task, DateField::Unload, value, &e)),
                }
            }
            Field::LoadDate | Field::UnloadDate => {}
            Field::Product => product.start(value),
            Field::Remark => remark.start(value),
            Field::Weight => set_once(&mut section.weight, value),
            Field::Volume => set_once(&mut section.volume, value),
            Field::Temperature => set_once(&mut section.temperature, value),
            Field::Destination => set_once(&mut section.destination_address, value),
            Field::Compartment if section.compartment.is_none() => match value.parse::<u32>() {
                Ok(count) => section.compartment = Some(count),
                Err(e) => {
                    warn!(task, raw = %value, error = %e, "Compartment is not a number");
                    warnings.push(ParseWarning::MalformedCompartment {
                        task,
                        raw: value.to_string(),
                    });
                }
            },
            Field::Compartment => {}
        }
    }

    section.product = product.join(", ").to_uppercase();
    // Separator between lines only, never after the last one.
    section.remark = remark.join(" -\n");
    section.lines = lines;
}

fn date_warning(task: usize, field: DateField, raw: &str, error: &DateRangeError) -> ParseWarning {
    warn!(task, field = ?field, raw = %raw, error = %error, "Unreadable date range");
    ParseWarning::MalformedDateRange {
        task,
        field,
        raw: raw.to_string(),
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipment::TaskType;
    use time::macros::datetime;

    fn section(task_type: TaskType, lines: &[&str]) -> TaskSection {
        let mut section = TaskSection::new(task_type, lines[0]);
        for line in &lines[1..] {
            section.push_line(line);
        }
        section
    }

    fn parse(task_type: TaskType, lines: &[&str]) -> (TaskSection, Vec<ParseWarning>) {
        let mut section = section(task_type, lines);
        let mut warnings = Vec::new();
        parse_details(&mut section, 0, &Dictionary::standard(), &mut warnings);
        (section, warnings)
    }

    #[test]
    fn test_date_range() {
        let (from, to) = parse_date_range("03/11/2025 12:00 - 14:00").unwrap();
        assert_eq!(from, datetime!(2025-11-03 12:00));
        assert_eq!(to, datetime!(2025-11-03 14:00));
    }

    #[test]
    fn test_date_range_ignores_trailing_columns() {
        let (_, to) = parse_date_range("03/11/2025 06:00 - 08:30     Slot 4").unwrap();
        assert_eq!(to, datetime!(2025-11-03 08:30));
    }

    #[test]
    fn test_date_range_single_digit_hours() {
        let (from, to) = parse_date_range("10/12/2025 7:00 - 9:00").unwrap();
        assert_eq!(from, datetime!(2025-12-10 07:00));
        assert_eq!(to, datetime!(2025-12-10 09:00));

        let (from, to) = parse_date_range("10/12/2025 7:30 - 11:05").unwrap();
        assert_eq!(from, datetime!(2025-12-10 07:30));
        assert_eq!(to, datetime!(2025-12-10 11:05));
    }

    #[test]
    fn test_date_range_errors() {
        assert!(matches!(
            parse_date_range("03/11/2025 12:00"),
            Err(DateRangeError::Shape)
        ));
        assert!(matches!(
            parse_date_range("03/11/2025 12:00 - 25:00"),
            Err(DateRangeError::Time(_))
        ));
        assert!(matches!(
            parse_date_range("2025-11-03 12:00 - 14:00"),
            Err(DateRangeError::Time(_))
        ));
    }

    #[test]
    fn test_product_continuation() {
        let (section, _) = parse(
            TaskType::Load,
            &[
                "LOAD BASF SE",
                "PRODUCT: Sulphuric acid",
                "  98% concentration",
                "CUSTOMER REF: X1",
            ],
        );
        assert_eq!(section.product, "SULPHURIC ACID, 98% CONCENTRATION");
        assert_eq!(section.lines.len(), 4);
    }

    #[test]
    fn test_remark_continuation_keeps_case() {
        let (section, _) = parse(
            TaskType::Unload,
            &["UNLOAD Port", "Remark: Ring the bell", "   twice at gate 3", "Weight: 20 t"],
        );
        assert_eq!(section.remark, "Ring the bell -\ntwice at gate 3");
        assert_eq!(section.weight, "20 t");
    }

    #[test]
    fn test_address_strips_task_keyword() {
        let (section, _) = parse(
            TaskType::Unload,
            &["DÉCHARGEMENT Lyon Terminal", "12 Rue du Port", "FR-69007 Lyon", "Poids: 20 t"],
        );
        assert_eq!(section.address, "Lyon Terminal, 12 Rue du Port, FR-69007 Lyon");
        assert_eq!(section.weight, "20 t");
    }

    #[test]
    fn test_short_address() {
        let (section, _) = parse(TaskType::Cleaning, &["CLEANING Station 9", "Gate 2"]);
        assert_eq!(section.address, "Station 9, Gate 2");
    }

    #[test]
    fn test_company_mid_line() {
        let (section, _) = parse(
            TaskType::Load,
            &["LOAD Plant", "Ref 1     In order of: ACME Chemicals", "Weight: 1 t"],
        );
        assert_eq!(section.company, "ACME Chemicals");
    }

    #[test]
    fn test_first_match_wins() {
        let (section, _) = parse(
            TaskType::Load,
            &[
                "LOAD Plant",
                "Load reference: abc-1",
                "Load reference: xyz-2",
                "Volume: 30 m3",
                "Volume: 31 m3",
            ],
        );
        assert_eq!(section.load_reference, "ABC-1");
        assert_eq!(section.volume, "30 m3");
    }

    #[test]
    fn test_malformed_values_become_warnings() {
        let (section, warnings) = parse(
            TaskType::Load,
            &[
                "LOAD Plant",
                "Load date: 03/11/2025 12:00 to 14:00",
                "Compartment: two",
                "Unload date: 04/11/2025 10:00 - 11:00",
            ],
        );
        assert_eq!(section.load_start_date, None);
        assert_eq!(section.compartment, None);
        assert_eq!(section.unload_end_date, Some(datetime!(2025-11-04 11:00)));
        assert_eq!(warnings.len(), 2);
        assert!(matches!(
            warnings[0],
            ParseWarning::MalformedDateRange {
                field: DateField::Load,
                ..
            }
        ));
        assert_eq!(
            warnings[1],
            ParseWarning::MalformedCompartment {
                task: 0,
                raw: "two".to_string()
            }
        );
    }

    #[test]
    fn test_compartment_and_refs() {
        let (section, warnings) = parse(
            TaskType::Unload,
            &[
                "UNLOAD Port",
                "Kammer: 3",
                "Entladereferenz: er-5",
                "Kundenreferenz: k-9",
                "Tank status: clean",
                "Destination: Rotterdam",
            ],
        );
        assert!(warnings.is_empty());
        assert_eq!(section.compartment, Some(3));
        assert_eq!(section.unload_reference, "ER-5");
        assert_eq!(section.customer_reference, "K-9");
        assert_eq!(section.tank_status, "CLEAN");
        assert_eq!(section.destination_address, "Rotterdam");
    }
}
