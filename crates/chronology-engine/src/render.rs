//! Markdown rendering of a chronology
//!
//! One level-1 title naming the covered report range, then one section per
//! subject with a four-column table.

use minutes_types::{format_date, CompressedAction};

pub struct ChronologyRenderer;

impl ChronologyRenderer {
    pub fn to_markdown(actions: &[CompressedAction]) -> String {
        let mut out = format!("# {}\n", Self::title(actions));

        for (subject, rows) in Self::by_subject(actions) {
            out.push_str(&format!("\n## {}\n\n", escape(subject)));
            out.push_str("| Action | Dates | Report numbers | Pages |\n");
            out.push_str("|---|---|---|---|\n");
            for action in rows {
                let dates: Vec<String> = action.dates.iter().map(|d| format_date(*d)).collect();
                out.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    escape(&action.text),
                    dates.join(", "),
                    join(&action.report_numbers),
                    join(&action.pages)
                ));
            }
        }
        out
    }

    /// `Chronology CR <min>-<max>` over every report number present
    pub fn title(actions: &[CompressedAction]) -> String {
        let numbers = actions.iter().flat_map(|a| a.report_numbers.iter().copied());
        match (numbers.clone().min(), numbers.max()) {
            (Some(min), Some(max)) => format!("Chronology CR {}-{}", min, max),
            _ => "Chronology".to_string(),
        }
    }

    fn by_subject(actions: &[CompressedAction]) -> Vec<(&str, Vec<&CompressedAction>)> {
        let mut subjects: Vec<(&str, Vec<&CompressedAction>)> = Vec::new();
        for action in actions {
            match subjects
                .iter_mut()
                .find(|(title, _)| *title == action.subject_title)
            {
                Some((_, rows)) => rows.push(action),
                None => subjects.push((action.subject_title.as_str(), vec![action])),
            }
        }
        subjects
    }
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(text: &str) -> String {
    text.trim().replace('|', "\\|").replace('\n', "<br>")
}
