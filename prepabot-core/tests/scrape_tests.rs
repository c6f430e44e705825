// File: prepabot-core/tests/scrape_tests.rs

use prepabot_core::scrape::{MenuScraper, PostedMenuRegistry};
use prepabot_core::tasks::menu_scrape::register_new_menus;

const PAGE: &str = r#"
<html><body>
<a href="https://school.example.fr/wp-content/uploads/2024/05/menu-semaine-20.jpg">
  https://school.example.fr/wp-content/uploads/2024/05/menu-semaine-20.jpg</a>
<a href="https://school.example.fr/wp-content/uploads/2024/05/allergenes-semaine-20.jpg">
  https://school.example.fr/wp-content/uploads/2024/05/allergenes-semaine-20.jpg</a>
<a href="https://school.example.fr/wp-content/uploads/2024/04/Menu-semaine-19.jpg">
  https://school.example.fr/wp-content/uploads/2024/04/Menu-semaine-19.jpg</a>
<a href="https://school.example.fr/wp-content/uploads/2024/05/banner.png">unrelated</a>
<a href="https://school.example.fr/other/2024/05/menu-fake.jpg">wrong path</a>
</body></html>
"#;

#[test]
fn extraction_partitions_by_name_prefix() {
    let scraper = MenuScraper::new("https://school.example.fr/restauration");
    let images = scraper.extract_images(PAGE);

    assert_eq!(
        images.menus,
        vec![
            "https://school.example.fr/wp-content/uploads/2024/05/menu-semaine-20.jpg",
            "https://school.example.fr/wp-content/uploads/2024/04/Menu-semaine-19.jpg",
        ]
    );
    assert_eq!(
        images.allergens,
        vec!["https://school.example.fr/wp-content/uploads/2024/05/allergenes-semaine-20.jpg"]
    );
}

#[test]
fn duplicate_links_collapse_to_one() {
    let scraper = MenuScraper::new("https://school.example.fr/restauration");
    let page = r#"
        <a href="https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg">x</a>
        <a href="https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg">x</a>
    "#;
    let images = scraper.extract_images(page);
    assert_eq!(images.menus.len(), 1);
}

#[test]
fn registry_self_heals_when_file_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("restauration.json");

    let registry = PostedMenuRegistry::load(&path).unwrap();
    assert!(registry.is_empty());
    // The file now exists and holds an empty array.
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
}

#[test]
fn registry_insert_is_write_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restauration.json");

    let mut registry = PostedMenuRegistry::load(&path).unwrap();
    registry.insert("https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg").unwrap();
    assert!(registry.contains("https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg"));

    // A fresh load sees the entry: it was persisted immediately.
    let reloaded = PostedMenuRegistry::load(&path).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.contains("https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg"));
}

#[test]
fn new_links_register_and_announce_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restauration.json");

    let menu1 = "https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg".to_string();
    let menu2 = "https://s.example.fr/wp-content/uploads/2024/05/menu2.jpg".to_string();

    let mut registry = PostedMenuRegistry::load(&path).unwrap();
    let announced = register_new_menus(vec![menu1.clone(), menu2.clone()], &mut registry);
    assert_eq!(announced, vec![menu1.clone(), menu2.clone()]);

    // The same scrape result on the next cycle announces nothing more, even
    // after a restart reloads the registry from disk.
    let mut reloaded = PostedMenuRegistry::load(&path).unwrap();
    let announced = register_new_menus(vec![menu1.clone(), menu2.clone()], &mut reloaded);
    assert!(announced.is_empty());

    // And a later page revision only surfaces the genuinely new link.
    let menu3 = "https://s.example.fr/wp-content/uploads/2024/06/menu3.jpg".to_string();
    let announced = register_new_menus(vec![menu1.clone(), menu3.clone()], &mut reloaded);
    assert_eq!(announced, vec![menu3.clone()]);

    // Each link was persisted once.
    let raw = std::fs::read_to_string(&path).unwrap();
    assert_eq!(raw.matches(&menu1).count(), 1);
    assert_eq!(raw.matches(&menu3).count(), 1);
}

#[test]
fn already_registered_links_produce_no_new_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restauration.json");

    let mut registry = PostedMenuRegistry::load(&path).unwrap();
    registry.insert("https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg").unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    // The poller's diff: duplicate page links collapse in extraction, and
    // links already in the registry are filtered out, so nothing remains.
    let scraper = MenuScraper::new("https://s.example.fr/restauration");
    let page = r#"
        <a href="https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg">x</a>
        <a href="https://s.example.fr/wp-content/uploads/2024/05/menu1.jpg">x</a>
    "#;
    let new_menus = register_new_menus(scraper.extract_images(page).menus, &mut registry);

    assert!(new_menus.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}
