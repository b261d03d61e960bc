//! Text rules applied to values read from the applicant pages.

const NAME_SUFFIXES: [&str; 2] = ["\u{2019}s application", "'s application"];

/// Total page count from the pagination state text (`Page <n> of <m>`).
///
/// Falls back to a single page when the text is absent or does not match.
pub fn parse_total_pages(state_text: Option<&str>) -> u32 {
    state_text
        .and_then(|text| parse_page_state(text).map(|(_, total)| total))
        .unwrap_or(1)
}

/// Current page number from the pagination state text.
pub fn parse_current_page(state_text: &str) -> Option<u32> {
    parse_page_state(state_text).map(|(current, _)| current)
}

fn parse_page_state(text: &str) -> Option<(u32, u32)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.windows(4).find_map(|w| {
        if !w[0].ends_with("Page") || w[2] != "of" {
            return None;
        }
        if w[1].is_empty() || !w[1].chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let total_digits: String = w[3].chars().take_while(char::is_ascii_digit).collect();
        let current = w[1].parse().ok()?;
        let total = total_digits.parse().ok()?;
        Some((current, total))
    })
}

/// Strips the possessive "'s application for ..." tail from the detail heading.
pub fn clean_applicant_name(heading: &str) -> String {
    let cut = NAME_SUFFIXES
        .iter()
        .filter_map(|suffix| heading.find(suffix))
        .min()
        .unwrap_or(heading.len());
    heading[..cut].trim().to_string()
}

pub fn placeholder_name(captured_at_ms: i64) -> String {
    format!("Candidate {captured_at_ms}")
}

pub fn resume_filename(captured_at_ms: i64) -> String {
    format!("candidate_resume_{captured_at_ms}.pdf")
}

/// One line per item; the lines inside an item are joined with ` | `.
pub fn format_experiences(items: &[String]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&collapse_newlines(item.trim()));
        out.push('\n');
    }
    out.trim().to_string()
}

pub fn format_screening(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (question, answer) in pairs {
        out.push_str(&format!("Q: {} | A: {}\n", question.trim(), answer.trim()));
    }
    out.trim().to_string()
}

fn collapse_newlines(text: &str) -> String {
    text.split('\n')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_merges_newline_runs() {
        assert_eq!(collapse_newlines("a\n\n\nb\nc"), "a | b | c");
        assert_eq!(collapse_newlines("single"), "single");
    }

    #[test]
    fn page_state_requires_numeric_current_page() {
        assert_eq!(parse_page_state("Page x of 4"), None);
        assert_eq!(parse_page_state("Page 2 of"), None);
        assert_eq!(parse_page_state("Page 2 of 7,"), Some((2, 7)));
    }
}
