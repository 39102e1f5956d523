use lazy_static::lazy_static;
use scraper::{Html, Selector};

lazy_static! {
    static ref H1: Selector = Selector::parse("h1").unwrap();
    static ref TITLE: Selector = Selector::parse("title").unwrap();
}

pub const UNTITLED: &str = "Untitled";

/// Detach every subtree matching one of `noise` so later text passes never
/// see navigation chrome, scripts or ads.
pub fn remove_noise(document: &mut Html, noise: &[Selector]) {
    let ids: Vec<_> = noise
        .iter()
        .flat_map(|selector| document.select(selector).map(|el| el.id()).collect::<Vec<_>>())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// First `h1`, else the document `<title>`, else "Untitled".
pub fn extract_title(document: &Html) -> String {
    let first_text = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    };
    first_text(&H1)
        .or_else(|| first_text(&TITLE))
        .unwrap_or_else(|| UNTITLED.to_string())
}
