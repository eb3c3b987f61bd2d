use shopper_catalog::{FieldRegistry, FieldRule, Item, NormalizationEngine, NormalizedValue, Outcome};
use std::io::Write;
use tempfile::NamedTempFile;

fn text(s: &str) -> Option<NormalizedValue> {
    Some(NormalizedValue::Text(s.to_string()))
}

#[test]
fn test_boolean_fields_follow_first_token() {
    let engine = NormalizationEngine::default();
    let boolean_fields: Vec<&str> = engine
        .registry()
        .fields()
        .filter(|(_, rule)| **rule == FieldRule::Boolean)
        .map(|(field, _)| field)
        .collect();
    assert_eq!(boolean_fields.len(), 20);

    for field in boolean_fields {
        assert_eq!(engine.normalize(field, Some("Si, incluye")), None, "{}", field);
        assert_eq!(engine.normalize(field, Some("incluye si")), Some(NormalizedValue::Bool(true)), "{}", field);
        assert_eq!(engine.normalize(field, Some("No tiene")), Some(NormalizedValue::Bool(false)), "{}", field);
        assert_eq!(engine.normalize(field, Some("quizas")), None, "{}", field);
    }
}

#[test]
fn test_documented_examples() {
    let engine = NormalizationEngine::default();

    assert_eq!(engine.normalize("resolucion", Some("1920 x 1080")), text("1920x1080"));
    assert_eq!(engine.normalize("resolucion", Some("1920")), None);
    assert_eq!(engine.normalize("peso", Some("1.234,56")), Some(NormalizedValue::Float(1234.56)));
    assert_eq!(engine.normalize("pantalla", Some("3,14")), Some(NormalizedValue::Float(3.14)));
    assert_eq!(engine.normalize("tipo_disco", Some("hdd")), text("hdd"));
    assert_eq!(engine.normalize("puertos_hdmi", Some("HDMI x3, USB x2")), Some(NormalizedValue::Int(3)));
}

#[test]
fn test_declared_order_breaks_ties() {
    let engine = NormalizationEngine::default();

    // "acero" is declared before "negro"
    assert_eq!(engine.normalize("color", Some("Negro con acero")), text("gris"));
    // "superior e inferior" must win over the plain "superior"
    assert_eq!(engine.normalize("conexion", Some("Superior e inferior")), text("superior e inferior"));
    assert_eq!(engine.normalize("conexion", Some("Dual")), text("superior e inferior"));
    // "hielo" precedes "agua"
    assert_eq!(engine.normalize("dispenser_liquidos", Some("Agua y hielo")), text("hielo y agua"));
}

#[test]
fn test_overrides_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[fields.inverter]
strategy = "contains_keyword"
keyword = "Inverter"

[fields.pulgadas]
strategy = "float"
limit = 120.0
keep_right_zeros = false
"#
    )
    .unwrap();

    let registry = FieldRegistry::builtin().with_overrides_file(file.path()).unwrap();
    let engine = NormalizationEngine::new(registry);

    assert_eq!(engine.normalize("inverter", Some("Tecnología INVERTER")), Some(NormalizedValue::Bool(true)));
    assert_eq!(engine.normalize("inverter", Some("On/Off")), Some(NormalizedValue::Bool(false)));
    assert_eq!(engine.normalize("pulgadas", Some("55\"")), Some(NormalizedValue::Int(55)));
    assert_eq!(engine.resolve("pulgadas", Some("150")), Outcome::OutOfRange);
    // built-in rules are still there
    assert_eq!(engine.normalize("red", Some("LTE")), text("4g"));
}

#[test]
fn test_normalize_item_from_scraped_json() {
    let engine = NormalizationEngine::default();
    let mut item: Item = serde_json::from_str(
        r#"{
            "title": "Heladera Whirlpool No Frost 375L",
            "marca": "Whirlpool",
            "modelo": "WRM45",
            "precio": "$ 89.999",
            "enfriamiento": "No Frost",
            "capacidad": "375 litros",
            "eficiencia": "A+",
            "color": "Blanca",
            "dispenser_liquidos": null,
            "garantia": "12 meses"
        }"#,
    )
    .unwrap();

    assert_eq!(engine.normalize_item(&mut item), 4);

    let out = serde_json::to_value(&item).unwrap();
    assert_eq!(out["normalized"]["enfriamiento"], "no frost");
    assert_eq!(out["normalized"]["capacidad"], 375);
    assert_eq!(out["normalized"]["eficiencia"], "a+");
    assert_eq!(out["normalized"]["color"], "blanco");
    assert_eq!(out["garantia"], "12 meses");
}
