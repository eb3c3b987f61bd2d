use serde_json::{Number, Value};
use tracing::debug;

use crate::pipeline::processing::normalize::strategies::find_float;
use crate::types::{value_text, Item};

/// Parse the listing price the same way numeric attributes are parsed.
///
/// Returns `None` when no usable price is found (missing, unparseable or
/// zero); such listings are dropped from the catalog.
pub fn normalize_price(mut item: Item) -> Option<Item> {
    let raw = item.precio.as_ref().and_then(value_text);
    let price = raw
        .as_deref()
        .and_then(|text| find_float(text, None, true).number())
        .map(|n| n.as_f64())
        .filter(|p| *p != 0.0);

    match price.and_then(Number::from_f64) {
        Some(number) => {
            item.precio = Some(Value::Number(number));
            Some(item)
        }
        None => {
            debug!("Dropping item without price: {:?}", item.title);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn priced(precio: Value) -> Item {
        Item {
            precio: Some(precio),
            ..Item::with_title("Lavarropas Drean")
        }
    }

    #[test]
    fn test_price_is_parsed() {
        let item = normalize_price(priced(json!("$ 45.999,90"))).unwrap();
        assert_eq!(item.precio, Some(json!(45999.9)));

        let item = normalize_price(priced(json!(1200))).unwrap();
        assert_eq!(item.precio, Some(json!(1200.0)));
    }

    #[test]
    fn test_items_without_price_are_dropped() {
        assert!(normalize_price(Item::with_title("Sin precio")).is_none());
        assert!(normalize_price(priced(json!("consultar"))).is_none());
        assert!(normalize_price(priced(json!("$ 0"))).is_none());
        assert!(normalize_price(priced(Value::Null)).is_none());
    }
}
