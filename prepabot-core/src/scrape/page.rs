// File: src/scrape/page.rs

use regex::Regex;
use tracing::debug;

use prepabot_common::Error;

/// Upload links look like `…/wp-content/uploads/<yyyy>/<mm>/<name>.jpg`;
/// the file name prefix tells menus and allergen sheets apart.
const IMAGE_PATTERN: &str = r#"https://[^\s"'<>]+/wp-content/uploads/\d{4}/\d{2}/([^\s"'<>.]+)\.jpg"#;

/// Image links found on the menu page, split by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuImages {
    pub menus: Vec<String>,
    pub allergens: Vec<String>,
}

/// Fetches the school restauration page and extracts the posted images.
pub struct MenuScraper {
    client: reqwest::Client,
    page_url: String,
    image_pattern: Regex,
}

impl MenuScraper {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            page_url: page_url.into(),
            image_pattern: Regex::new(IMAGE_PATTERN).expect("valid image pattern"),
        }
    }

    /// GET the page and extract its menu/allergen image links.
    pub async fn fetch_images(&self) -> Result<MenuImages, Error> {
        let page = self
            .client
            .get(&self.page_url)
            .send()
            .await?
            .text()
            .await?;
        let images = self.extract_images(&page);
        debug!(
            "menu page yielded {} menus / {} allergen sheets",
            images.menus.len(),
            images.allergens.len()
        );
        Ok(images)
    }

    /// Pull every matching image link out of raw HTML. Duplicate anchors to
    /// the same image collapse to one entry; first occurrence wins the order.
    pub fn extract_images(&self, page: &str) -> MenuImages {
        let mut images = MenuImages::default();

        for captures in self.image_pattern.captures_iter(page) {
            let link = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
            let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

            let name = name.to_lowercase();
            if name.starts_with("menu") {
                if !images.menus.iter().any(|l| l == link) {
                    images.menus.push(link.to_string());
                }
            } else if name.starts_with("allergenes") {
                if !images.allergens.iter().any(|l| l == link) {
                    images.allergens.push(link.to_string());
                }
            }
        }

        images
    }
}
