use super::TaskSection;
use super::header::{self, Marker};
use super::keywords::Dictionary;
use tracing::debug;

/// Cut the task part of a document into sections, one per task-start line.
///
/// Instruction titles repeated on later pages are skipped. Lines are kept
/// verbatim, indentation included, because the field parser relies on it.
pub(crate) fn split_sections(text: &str, dict: &Dictionary) -> Vec<TaskSection> {
    let mut sections = Vec::new();
    let mut current: Option<TaskSection> = None;
    let mut after_french_title = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        match header::identify_marker(line, dict, after_french_title) {
            Some(Marker::ContinuesOnNextLine) => {
                after_french_title = true;
                continue;
            }
            Some(Marker::Instruction(..)) => {
                after_french_title = false;
                continue;
            }
            None => after_french_title = false,
        }

        if let Some(task_type) = dict.task_type_of(line) {
            if let Some(done) = current.replace(TaskSection::new(task_type, line)) {
                sections.push(done);
            }
            continue;
        }

        match current.as_mut() {
            Some(section) => section.push_line(line),
            None => debug!(line = line.trim(), "Line before first task skipped"),
        }
    }

    sections.extend(current);
    sections
}
