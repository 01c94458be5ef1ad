//! 固定版面目录：整期报刊的六个版面

use crate::newspaper::Section;

pub const LOCAL_NEWS: &str = "Local News";
pub const US_NEWS: &str = "US News";
pub const WORLD_NEWS: &str = "World News";
pub const BUSINESS: &str = "Business and Financial";
pub const TECHNOLOGY: &str = "Technology";
pub const HEALTH_SCIENCE: &str = "Health and Science";

/// 整期报刊的版面；只有本地版面与地点绑定
pub fn create_sections(location: &str) -> Vec<Section> {
    let local = if location.trim().is_empty() {
        "Local news stories at a state level.".to_string()
    } else {
        format!("Local news stories focused on {} at a state level.", location.trim())
    };

    vec![
        Section::new(LOCAL_NEWS, local),
        Section::new(US_NEWS, "Major news stories from across the United States."),
        Section::new(WORLD_NEWS, "Significant international events and developments."),
        Section::new(BUSINESS, "Business, markets, and financial news."),
        Section::new(TECHNOLOGY, "Technology industry, innovation, and digital trends."),
        Section::new(HEALTH_SCIENCE, "Health, medicine, and scientific discoveries."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog() {
        let sections = create_sections("Ohio");
        assert_eq!(sections.len(), 6);
        assert!(sections.iter().all(|s| !s.title.is_empty()));
        assert!(sections[0].description.contains("Ohio"));
        assert!(!sections[1].description.contains("Ohio"));
    }
}
