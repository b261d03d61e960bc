use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PAGE_PLACEHOLDER: &str = "{page}";

/// Markup contract with the applicant-review pages.
///
/// Every selector the crawler depends on lives here so a markup change is a
/// configuration edit. Defaults match the current recruiting site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Text node reading `Page <n> of <m>`.
    pub page_state: String,
    /// Pagination button; `{page}` is replaced by the page number.
    pub page_button: String,
    pub candidate_link: String,
    pub virus_card: String,
    pub virus_marker: String,
    pub resume_link: String,
    pub show_more_button: String,
    pub show_more_marker: String,
    pub experience_item: String,
    pub experience_hidden_item: String,
    pub screening_item: String,
    pub screening_question: String,
    pub screening_answer: String,
    pub name_heading: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            page_state: ".artdeco-pagination__page-state".to_string(),
            page_button: r#"li[data-test-pagination-page-btn="{page}"] button"#.to_string(),
            candidate_link: r#"li.hiring-applicants__list-item[data-view-name="job-applicant-list-profile-card"] a.ember-view"#.to_string(),
            virus_card: ".p0.mt4.artdeco-card".to_string(),
            virus_marker: "Scanning resume for viruses".to_string(),
            resume_link: r#"div.hiring-resume-viewer__resume-wrapper--collapsed a[aria-label^="Download"]"#.to_string(),
            show_more_button: r#"button.artdeco-button--icon-right.artdeco-button--tertiary[aria-expanded="false"]"#.to_string(),
            show_more_marker: "Show".to_string(),
            experience_item: ".artdeco-card.mt4.p0 ul.list-style-none.mt2 li.display-flex.align-items-center.mb3".to_string(),
            experience_hidden_item: ".artdeco-card.mt4.p0 ul.list-style-none.mt2 li.display-flex.align-items-center.mb3.visually-hidden".to_string(),
            screening_item: ".job-posting-shared-screening-question-list__list-item".to_string(),
            screening_question: "p.t-14".to_string(),
            screening_answer: "p.t-14.t-bold.mt1".to_string(),
            name_heading: ".hiring-applicant-header h1".to_string(),
        }
    }
}

impl SiteProfile {
    pub fn page_button_for(&self, page: u32) -> String {
        self.page_button.replace(PAGE_PLACEHOLDER, &page.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("selector `{field}` is invalid ({selector}): {reason}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        reason: String,
    },
}

/// Parsed form of the selectors that are evaluated against page snapshots.
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    pub page_state: Selector,
    pub candidate_link: Selector,
    pub virus_card: Selector,
    pub resume_link: Selector,
    pub show_more_button: Selector,
    pub experience_item: Selector,
    pub experience_hidden_item: Selector,
    pub screening_item: Selector,
    pub screening_question: Selector,
    pub screening_answer: Selector,
    pub name_heading: Selector,
}

impl SiteSelectors {
    pub fn compile(profile: &SiteProfile) -> Result<Self, ProfileError> {
        // Only clicked, never parsed locally; still reject it early if malformed.
        compile("page_button", &profile.page_button_for(1))?;

        Ok(Self {
            page_state: compile("page_state", &profile.page_state)?,
            candidate_link: compile("candidate_link", &profile.candidate_link)?,
            virus_card: compile("virus_card", &profile.virus_card)?,
            resume_link: compile("resume_link", &profile.resume_link)?,
            show_more_button: compile("show_more_button", &profile.show_more_button)?,
            experience_item: compile("experience_item", &profile.experience_item)?,
            experience_hidden_item: compile(
                "experience_hidden_item",
                &profile.experience_hidden_item,
            )?,
            screening_item: compile("screening_item", &profile.screening_item)?,
            screening_question: compile("screening_question", &profile.screening_question)?,
            screening_answer: compile("screening_answer", &profile.screening_answer)?,
            name_heading: compile("name_heading", &profile.name_heading)?,
        })
    }
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ProfileError> {
    Selector::parse(selector).map_err(|err| ProfileError::InvalidSelector {
        field,
        selector: selector.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_compiles() {
        assert!(SiteSelectors::compile(&SiteProfile::default()).is_ok());
    }

    #[test]
    fn page_button_substitutes_page_number() {
        let profile = SiteProfile::default();
        assert_eq!(
            profile.page_button_for(3),
            r#"li[data-test-pagination-page-btn="3"] button"#
        );
    }

    #[test]
    fn malformed_selector_names_the_field() {
        let profile = SiteProfile {
            name_heading: "h1[".to_string(),
            ..SiteProfile::default()
        };
        match SiteSelectors::compile(&profile) {
            Err(ProfileError::InvalidSelector { field, .. }) => assert_eq!(field, "name_heading"),
            other => panic!("expected invalid selector, got {other:?}"),
        }
    }
}
