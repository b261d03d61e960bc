use std::sync::Arc;

use url::Url;

use crate::driver::{DriverError, PageDriver};
use crate::extract::{DetailPanel, ListPage};
use crate::profile::{ProfileError, SiteProfile, SiteSelectors};
use crate::text::{parse_current_page, parse_total_pages};

/// Site adapter for the applicant-review UI: a page driver plus the markup profile.
pub struct ApplicantSite {
    driver: Arc<dyn PageDriver>,
    profile: SiteProfile,
    selectors: SiteSelectors,
}

impl ApplicantSite {
    pub fn new(driver: Arc<dyn PageDriver>, profile: SiteProfile) -> Result<Self, ProfileError> {
        let selectors = SiteSelectors::compile(&profile)?;
        Ok(Self {
            driver,
            profile,
            selectors,
        })
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    pub async fn list_page(&self) -> Result<ListPage, DriverError> {
        let html = self.driver.content().await?;
        Ok(ListPage::parse(&html, &self.selectors))
    }

    pub async fn total_pages(&self) -> Result<u32, DriverError> {
        let list = self.list_page().await?;
        Ok(parse_total_pages(list.page_state.as_deref()))
    }

    pub async fn current_page(&self) -> Result<Option<u32>, DriverError> {
        let list = self.list_page().await?;
        Ok(list.page_state.as_deref().and_then(parse_current_page))
    }

    /// Clicks the pagination control for `page`; `false` if the control is missing.
    pub async fn open_page(&self, page: u32) -> Result<bool, DriverError> {
        self.driver
            .click(&self.profile.page_button_for(page), 0)
            .await
    }

    pub async fn candidate_count(&self) -> Result<usize, DriverError> {
        Ok(self.list_page().await?.candidate_count)
    }

    pub async fn open_candidate(&self, index: usize) -> Result<bool, DriverError> {
        self.driver.click(&self.profile.candidate_link, index).await
    }

    pub async fn detail(&self) -> Result<DetailPanel, DriverError> {
        let html = self.driver.content().await?;
        Ok(DetailPanel::parse(&html, &self.selectors, &self.profile))
    }

    pub async fn expand_experience(&self) -> Result<bool, DriverError> {
        self.driver.click(&self.profile.show_more_button, 0).await
    }

    /// Absolute form of a link found on the page; `None` if it cannot be resolved.
    pub async fn resolve_link(&self, href: &str) -> Result<Option<String>, DriverError> {
        match Url::parse(href) {
            Ok(_) => Ok(Some(href.to_string())),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.driver.current_url().await?;
                Ok(base
                    .and_then(|base| Url::parse(&base).ok())
                    .and_then(|base| base.join(href).ok())
                    .map(String::from))
            }
            Err(_) => Ok(None),
        }
    }

    pub async fn reload(&self) -> Result<(), DriverError> {
        self.driver.reload().await
    }
}
