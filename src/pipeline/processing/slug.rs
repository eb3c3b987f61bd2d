use crate::types::Item;

/// `"{marca}-{modelo}"` with spaces turned into dashes, lowercased.
pub fn product_slug(marca: &str, modelo: &str) -> String {
    format!("{}-{}", slug_part(marca), slug_part(modelo))
}

/// Slug for an item whose brand and model are both resolved.
pub fn item_slug(item: &Item) -> Option<String> {
    match (item.marca.as_deref(), item.modelo.as_deref()) {
        (Some(marca), Some(modelo)) => Some(product_slug(marca, modelo)),
        _ => None,
    }
}

fn slug_part(value: &str) -> String {
    value.replace(' ', "-").to_lowercase()
}
