const FALLBACK_NAME: &str = "download";
const MAX_NAME_BYTES: usize = 120;

/// Makes a requester-supplied filename safe to create inside the output directory.
///
/// Only path separators and reserved characters become `_`, so the result can never
/// leave the directory and every other name is kept as requested.
pub fn sanitize_filename(input: &str) -> String {
    let mut name: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();

    if matches!(name.as_str(), "" | "." | "..") {
        return FALLBACK_NAME.to_string();
    }
    if name.len() > MAX_NAME_BYTES {
        let mut end = MAX_NAME_BYTES;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(sanitize_filename("candidates.csv"), "candidates.csv");
        assert_eq!(
            sanitize_filename("candidate_resume_1700000000000.pdf"),
            "candidate_resume_1700000000000.pdf"
        );
    }

    #[test]
    fn harmless_names_are_untouched() {
        assert_eq!(sanitize_filename("a__b.pdf"), "a__b.pdf");
        assert_eq!(sanitize_filename("_cv.pdf"), "_cv.pdf");
        assert_eq!(sanitize_filename(" resume. "), " resume. ");
    }

    #[test]
    fn cannot_escape_output_dir() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("a\\b/c.pdf"), "a_b_c.pdf");
    }

    #[test]
    fn empty_and_reserved_names() {
        assert_eq!(sanitize_filename(""), "download");
        assert_eq!(sanitize_filename(".."), "download");
        assert_eq!(sanitize_filename("con.pdf"), "con.pdf_");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let long = "é".repeat(100);
        let name = sanitize_filename(&long);
        assert!(name.len() <= MAX_NAME_BYTES);
        assert!(name.chars().all(|c| c == 'é'));
    }
}
