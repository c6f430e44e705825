pub mod birthday;
pub mod menu_scrape;
