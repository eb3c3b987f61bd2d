use async_trait::async_trait;
use serde_json::Value;
use shopper_catalog::app::ports::ItemSource;
use shopper_catalog::app::ProcessItemsUseCase;
use shopper_catalog::config::Config;
use shopper_catalog::infra::{InMemoryQueue, JsonLinesSink, JsonLinesSource, LogNotifier};
use shopper_catalog::{engine_from_config, ProductMatcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use shopper_catalog::Item;
use tempfile::TempDir;
use tokio::sync::Mutex;

const INPUT: &str = r#"{"title": "Celular Samsung Galaxy A10 32GB", "marca": "Samsung", "modelo": "Galaxy A10", "precio": "$ 12.999,00", "red": "4G LTE", "memoria_ram": "2 GB"}
{"title": "Celular Galaxy A10 Samsung Negro", "marca": null, "modelo": null, "precio": "$ 11.500", "operador": "Libre"}
not a json line
{"title": "Notebook HP 14", "marca": "HP", "modelo": "14-CK0061", "precio": "consultar"}
{"title": "Notebook HP 14", "marca": "HP", "modelo": "14-CK0061", "precio": 45999, "tipo_disco": "Disco rígido", "voltaje": "220V 50/60Hz"}
"#;

fn setup(dir: &Path) -> Config {
    std::fs::write(dir.join("skip_list.json"), r#"{"brands": ["n/a"], "models": ["-"]}"#).unwrap();
    std::fs::write(dir.join("brand_aliases.json"), r#"{"Hewlett Packard": ["HP"]}"#).unwrap();
    std::fs::write(
        dir.join("field_rules.toml"),
        "[fields.voltaje]\nstrategy = \"integer\"\ncount = 2\n",
    )
    .unwrap();
    std::fs::write(dir.join("items.jsonl"), INPUT).unwrap();

    Config::from_toml_str(&format!(
        r#"
[knowledge_base]
dir = "{dir}/kb"

[matcher]
skip_list = "{dir}/skip_list.json"
brand_aliases = "{dir}/brand_aliases.json"
save_every = 2

[normalization]
field_rules = "{dir}/field_rules.toml"
"#,
        dir = dir.display()
    ))
    .unwrap()
}

#[tokio::test]
async fn test_process_jsonl_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let output = dir.path().join("out/processed.jsonl");

    let mut use_case = ProcessItemsUseCase::new(
        ProductMatcher::from_config(&config).await.unwrap(),
        Arc::new(engine_from_config(&config).unwrap()),
        Box::new(JsonLinesSource::open(dir.path().join("items.jsonl")).await.unwrap()),
        Box::new(JsonLinesSink::create(&output).await.unwrap()),
        Box::new(LogNotifier),
    )
    .with_save_every(config.matcher.save_every);

    let summary = use_case.run().await.unwrap();

    assert_eq!(summary.items_read, 4);
    assert_eq!(summary.items_malformed, 1);
    assert_eq!(summary.items_dropped, 1);
    assert_eq!(summary.items_written, 3);
    assert_eq!(summary.learning.brands_added, 2);
    assert_eq!(summary.learning.models_added, 2);
    assert_eq!(summary.snapshots_saved, 2);
    assert!(summary.finished_at >= summary.started_at);

    let lines: Vec<Value> = std::fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0]["slug"], "samsung-galaxy-a10");
    assert_eq!(lines[0]["precio"], 12999.0);
    assert_eq!(lines[0]["normalized"]["red"], "4g");
    assert_eq!(lines[0]["normalized"]["memoria_ram"], 2.0);

    // inferred from the title using what the first line taught
    assert_eq!(lines[1]["marca"], "samsung");
    assert_eq!(lines[1]["modelo"], "galaxy a10");
    assert_eq!(lines[1]["normalized"]["operador"], "libre");

    assert_eq!(lines[2]["marca"], "hewlett packard");
    assert_eq!(lines[2]["slug"], "hewlett-packard-14-ck0061");
    assert_eq!(lines[2]["normalized"]["tipo_disco"], "hdd");
    assert_eq!(lines[2]["normalized"]["voltaje"], serde_json::json!([220, 50]));

    // the snapshot on disk matches what the matcher holds
    let reopened = ProductMatcher::from_config(&config).await.unwrap();
    assert_eq!(reopened.knowledge_base(), use_case.matcher().knowledge_base());
    assert!(reopened.knowledge_base().contains_model("hp", "14-ck0061"));
}

#[tokio::test]
async fn test_invalid_utf8_line_is_skipped_and_run_completes() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let input = dir.path().join("mixed.jsonl");
    let mut content = br#"{"title": "Sony Xperia Z", "marca": "Sony", "modelo": "Xperia Z", "precio": "100"}"#.to_vec();
    content.extend_from_slice(b"\n{\"title\": \"bad \xff\xfe\"}\n");
    content.extend_from_slice(br#"{"title": "LG K10", "marca": "LG", "modelo": "K10", "precio": "200"}"#);
    content.push(b'\n');
    std::fs::write(&input, content).unwrap();
    let output = dir.path().join("out/processed.jsonl");

    let mut use_case = ProcessItemsUseCase::new(
        ProductMatcher::from_config(&config).await.unwrap(),
        Arc::new(engine_from_config(&config).unwrap()),
        Box::new(JsonLinesSource::open(&input).await.unwrap()),
        Box::new(JsonLinesSink::create(&output).await.unwrap()),
        Box::new(LogNotifier),
    );

    let summary = use_case.run().await.unwrap();
    assert_eq!(summary.items_malformed, 1);
    assert_eq!(summary.items_written, 2);

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 2);

    let reopened = ProductMatcher::from_config(&config).await.unwrap();
    assert!(reopened.knowledge_base().contains_model("sony", "xperia z"));
    assert!(reopened.knowledge_base().contains_model("lg", "k10"));
}

/// Hands out items and rewrites the alias file once the first one is taken.
struct AliasEditingSource {
    items: Mutex<VecDeque<Item>>,
    aliases: PathBuf,
}

#[async_trait]
impl ItemSource for AliasEditingSource {
    async fn dequeue(&self) -> shopper_catalog::Result<Option<Item>> {
        let mut items = self.items.lock().await;
        let item = items.pop_front();
        if items.len() == 1 {
            std::fs::write(&self.aliases, r#"{"HP Inc": ["HP"]}"#)?;
        }
        Ok(item)
    }
}

#[tokio::test]
async fn test_alias_edits_apply_after_checkpoint() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let hp = |title: &str| Item {
        precio: Some(serde_json::json!("45999")),
        ..Item::with_title(title).marca("HP").modelo("14-CK0061")
    };
    let sink = InMemoryQueue::new();

    let mut use_case = ProcessItemsUseCase::new(
        ProductMatcher::from_config(&config).await.unwrap(),
        Arc::new(engine_from_config(&config).unwrap()),
        Box::new(AliasEditingSource {
            items: Mutex::new(VecDeque::from(vec![hp("Notebook HP 14"), hp("Notebook HP 14 gris")])),
            aliases: config.matcher.brand_aliases.clone(),
        }),
        Box::new(sink.clone()),
        Box::new(LogNotifier),
    )
    .with_save_every(1);

    use_case.run().await.unwrap();

    let written = sink.drain().await;
    assert_eq!(written[0].marca.as_deref(), Some("hewlett packard"));
    assert_eq!(written[1].marca.as_deref(), Some("hp inc"));
}
