use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::profile::{SiteProfile, SiteSelectors};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];
const SKIPPED_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// Candidate list side of a page snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListPage {
    pub page_state: Option<String>,
    pub candidate_count: usize,
}

impl ListPage {
    pub fn parse(html: &str, selectors: &SiteSelectors) -> Self {
        let doc = Html::parse_document(html);
        let page_state = doc.select(&selectors.page_state).next().map(inner_text);
        let candidate_count = doc.select(&selectors.candidate_link).count();
        Self {
            page_state,
            candidate_count,
        }
    }
}

/// Detail panel of the selected candidate, as read from a page snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailPanel {
    pub virus_scan: bool,
    pub resume_href: Option<String>,
    /// Label of the collapsed "show more" control, if one is present.
    pub show_more_label: Option<String>,
    pub experiences: Vec<String>,
    pub screening: Vec<(String, String)>,
    pub heading: Option<String>,
}

impl DetailPanel {
    pub fn parse(html: &str, selectors: &SiteSelectors, profile: &SiteProfile) -> Self {
        let doc = Html::parse_document(html);

        let virus_scan = doc
            .select(&selectors.virus_card)
            .any(|card| inner_text(card).contains(&profile.virus_marker));

        let resume_href = doc
            .select(&selectors.resume_link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .filter(|href| !href.is_empty())
            .map(ToOwned::to_owned);

        let show_more_label = doc.select(&selectors.show_more_button).next().map(inner_text);

        // Hidden items match both selectors, so they appear again after the visible ones.
        let experiences = doc
            .select(&selectors.experience_item)
            .chain(doc.select(&selectors.experience_hidden_item))
            .map(inner_text)
            .collect();

        let screening = doc
            .select(&selectors.screening_item)
            .filter_map(|item| {
                let question = item.select(&selectors.screening_question).next()?;
                let answer = item.select(&selectors.screening_answer).next()?;
                Some((inner_text(question), inner_text(answer)))
            })
            .collect();

        let heading = doc.select(&selectors.name_heading).next().map(inner_text);

        Self {
            virus_scan,
            resume_href,
            show_more_label,
            experiences,
            screening,
            heading,
        }
    }

    pub fn should_expand(&self, marker: &str) -> bool {
        self.show_more_label
            .as_deref()
            .is_some_and(|label| label.contains(marker))
    }
}

/// Approximates the browser's `innerText`: block elements and `<br>` break
/// lines, whitespace runs inside a line collapse to one space, blank lines drop.
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for child in element.children() {
        collect_text(child, &mut raw);
    }
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            // Source newlines are layout whitespace, not line breaks.
            for (i, part) in text.split(|c: char| c == '\n' || c == '\r').enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(part);
            }
        }
        Node::Element(element) => {
            let name = element.name();
            if SKIPPED_TAGS.contains(&name) {
                return;
            }
            if name == "br" {
                out.push('\n');
                return;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            for child in node.children() {
                collect_text(child, out);
            }
            if block {
                out.push('\n');
            }
        }
        _ => {}
    }
}
