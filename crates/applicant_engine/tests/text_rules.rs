use applicant_engine::{
    clean_applicant_name, format_experiences, format_screening, parse_current_page,
    parse_total_pages, placeholder_name, resume_filename,
};
use pretty_assertions::assert_eq;

#[test]
fn total_pages_reads_the_pagination_state() {
    assert_eq!(parse_total_pages(Some("Page 1 of 5")), 5);
    assert_eq!(parse_total_pages(Some("  Page 3 of 12 results ")), 12);
}

#[test]
fn total_pages_defaults_to_one() {
    assert_eq!(parse_total_pages(None), 1);
    assert_eq!(parse_total_pages(Some("")), 1);
    assert_eq!(parse_total_pages(Some("Showing all applicants")), 1);
}

#[test]
fn current_page_comes_from_the_same_text() {
    assert_eq!(parse_current_page("Page 4 of 9"), Some(4));
    assert_eq!(parse_current_page("no pagination"), None);
}

#[test]
fn applicant_name_drops_the_application_suffix() {
    assert_eq!(
        clean_applicant_name("Jane Doe\u{2019}s application for Senior Engineer"),
        "Jane Doe"
    );
    assert_eq!(
        clean_applicant_name("  Bob Smith's application "),
        "Bob Smith"
    );
    assert_eq!(clean_applicant_name("Plain Name"), "Plain Name");
}

#[test]
fn generated_names_embed_capture_time() {
    assert_eq!(placeholder_name(42), "Candidate 42");
    assert_eq!(resume_filename(42), "candidate_resume_42.pdf");
}

#[test]
fn experiences_are_one_line_per_item() {
    let items = vec![
        "Engineer\nAcme\n\n2019 - 2023".to_string(),
        "  Intern\nBeta  ".to_string(),
    ];
    assert_eq!(
        format_experiences(&items),
        "Engineer | Acme | 2019 - 2023\nIntern | Beta"
    );
    assert_eq!(format_experiences(&[]), "");
}

#[test]
fn screening_pairs_become_q_and_a_lines() {
    let pairs = vec![
        ("Do you need sponsorship?".to_string(), " No ".to_string()),
        ("Years of Rust?".to_string(), "5".to_string()),
    ];
    assert_eq!(
        format_screening(&pairs),
        "Q: Do you need sponsorship? | A: No\nQ: Years of Rust? | A: 5"
    );
}
