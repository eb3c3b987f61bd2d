use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::common::text::fold;
use crate::error::{CatalogError, Result};

/// How a field's raw value is parsed, together with the rule's fixed arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FieldRule {
    /// First pattern (in declared order) contained in the folded value
    Canonical { mapping: Vec<(String, String)> },
    /// `true` iff the keyword is contained in the folded value
    ContainsKeyword { keyword: String },
    /// si/true → true, no/false → false
    Boolean,
    /// First `count` digit runs
    Integer {
        #[serde(default = "default_integer_count")]
        count: usize,
    },
    /// First decimal number, optionally bounded
    Float {
        #[serde(default)]
        limit: Option<f64>,
        #[serde(default = "default_keep_right_zeros")]
        keep_right_zeros: bool,
    },
    /// Exactly `count` integers joined with `join_char`
    JoinedIntegers {
        #[serde(default = "default_joined_count")]
        count: usize,
        #[serde(default = "default_join_char")]
        join_char: String,
    },
    /// Known field without a parser; always unnormalized
    Unparsed,
}

fn default_integer_count() -> usize { 1 }
fn default_keep_right_zeros() -> bool { true }
fn default_joined_count() -> usize { 2 }
fn default_join_char() -> String { "x".to_string() }

impl FieldRule {
    pub fn integer() -> Self {
        FieldRule::Integer { count: default_integer_count() }
    }

    pub fn float() -> Self {
        FieldRule::Float { limit: None, keep_right_zeros: default_keep_right_zeros() }
    }

    pub fn joined_integers() -> Self {
        FieldRule::JoinedIntegers { count: default_joined_count(), join_char: default_join_char() }
    }

    pub fn canonical(pairs: &[(&str, &str)]) -> Self {
        FieldRule::Canonical {
            mapping: pairs.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect(),
        }
    }

    /// Short strategy identifier, as written in override files.
    pub fn strategy_name(&self) -> &'static str {
        match self {
            FieldRule::Canonical { .. } => "canonical",
            FieldRule::ContainsKeyword { .. } => "contains_keyword",
            FieldRule::Boolean => "boolean",
            FieldRule::Integer { .. } => "integer",
            FieldRule::Float { .. } => "float",
            FieldRule::JoinedIntegers { .. } => "joined_integers",
            FieldRule::Unparsed => "unparsed",
        }
    }

    // Patterns are compared against folded input, so fold them too.
    fn folded(self) -> Self {
        match self {
            FieldRule::Canonical { mapping } => FieldRule::Canonical {
                mapping: mapping.into_iter().map(|(p, c)| (fold(&p), c)).collect(),
            },
            FieldRule::ContainsKeyword { keyword } => FieldRule::ContainsKeyword { keyword: fold(&keyword) },
            other => other,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FieldRulesFile {
    #[serde(default)]
    fields: BTreeMap<String, FieldRule>,
}

/// Immutable table of field rules, built once at startup and handed to the
/// [`NormalizationEngine`](super::NormalizationEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRegistry {
    rules: BTreeMap<String, FieldRule>,
}

impl FieldRegistry {
    /// Version of the built-in table. Bump when a built-in rule changes.
    pub const VERSION: u32 = 1;

    pub fn empty() -> Self {
        Self { rules: BTreeMap::new() }
    }

    /// Register (or replace) the rule for a field
    pub fn register(&mut self, field: impl Into<String>, rule: FieldRule) {
        self.rules.insert(field.into(), rule);
    }

    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.get(field)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered fields in name order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.rules.iter().map(|(f, r)| (f.as_str(), r))
    }

    /// Layer TOML overrides (`[fields.<name>] strategy = "..."`) on top of this table.
    pub fn with_overrides_str(mut self, source_name: &str, content: &str) -> Result<Self> {
        let file: FieldRulesFile = toml::from_str(content)
            .map_err(|e| CatalogError::malformed("field rules", source_name, e.to_string()))?;

        for (field, rule) in file.fields {
            debug!("Overriding field rule for {} with strategy {}", field, rule.strategy_name());
            self.rules.insert(field, rule.folded());
        }
        Ok(self)
    }

    pub fn with_overrides_file(self, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("Failed to read field rules '{}': {}", path.display(), e))
        })?;
        let registry = self.with_overrides_str(&path.display().to_string(), &content)?;
        info!("Loaded field rule overrides from {}", path.display());
        Ok(registry)
    }

    /// The built-in field table.
    pub fn builtin() -> Self {
        use FieldRule::{Boolean, Unparsed};

        let energy_class = FieldRule::canonical(&[
            ("a+++", "a+++"),
            ("a++", "a++"),
            ("a+", "a+"),
            ("a", "a"),
            ("b", "b"),
            ("c", "c"),
            ("d", "d"),
        ]);

        let rules: Vec<(&str, FieldRule)> = vec![
            ("tipo_disco", FieldRule::canonical(&[
                ("rigido", "hdd"),
                ("hdd", "hdd"),
                ("solido", "ssd"),
                ("ssd", "ssd"),
            ])),
            ("motor_reversible", Boolean),
            ("resolucion", FieldRule::joined_integers()),
            ("diametro", FieldRule::float()),
            ("micro_SD", Boolean),
            ("wifi", Boolean),
            ("conveccion", Boolean),
            ("ventilacion", FieldRule::canonical(&[
                ("derecha", "derecha"),
                ("izquierda", "izquierda"),
                ("natural", "natural"),
                ("superior", "superior"),
                ("posterior", "posterior"),
            ])),
            ("peso", FieldRule::float()),
            ("enfriamiento", FieldRule::canonical(&[
                ("no frost", "no frost"),
                ("neo frost", "neo frost"),
                ("ciclica", "ciclico"),
                ("ciclico", "ciclico"),
                ("cycle", "ciclico"),
            ])),
            ("tipo_PC", FieldRule::canonical(&[
                ("all in one", "all in one"),
                ("aio", "all in one"),
                ("cpu", "escritorio"),
                ("escritorio", "escritorio"),
                ("desktop", "escritorio"),
            ])),
            ("puertos_usb3", FieldRule::integer()),
            ("velocidad_procesador", FieldRule::float()),
            ("tipo_de_ventilador", FieldRule::canonical(&[
                ("pared", "de pared"),
                ("turbo", "turbo"),
                ("piso", "de piso"),
                ("techo", "de techo"),
                ("climatizador", "climatizador"),
            ])),
            ("velocidades", FieldRule::integer()),
            ("tipo_de_producto", FieldRule::canonical(&[
                ("natural", "tiro natural"),
                ("balanceado", "tiro balanceado"),
                ("gas", "a gas"),
                ("electrico", "electrico"),
                ("automatico", "automatico"),
            ])),
            ("sensor", Boolean),
            ("camara_delantera", FieldRule::float()),
            ("material_de_aspas", FieldRule::canonical(&[
                ("plastico", "plastico"),
                ("plastica", "plastico"),
                ("metal", "metal"),
                ("metalica", "metal"),
                ("metalico", "metal"),
                ("chapa", "chapa"),
                ("acero", "acero"),
                ("madera", "madera"),
                ("pvc", "pvc"),
                ("abs", "abs"),
                ("aluminio", "aluminio"),
            ])),
            ("control_remoto", Boolean),
            ("puertos_usb", FieldRule::integer()),
            ("RPM_centrifugado", FieldRule::integer()),
            ("capacidad", FieldRule::integer()),
            ("display", Boolean),
            ("tamano_disco", FieldRule::integer()),
            ("flash_trasera", Boolean),
            ("tamano", FieldRule::float()),
            ("color", FieldRule::canonical(&[
                ("blanca", "blanco"),
                ("blanco", "blanco"),
                ("acero", "gris"),
                ("inoxidable", "gris"),
                ("gris", "gris"),
                ("plata", "gris"),
                ("negro", "negro"),
                ("negra", "negro"),
            ])),
            ("tipo", Unparsed),
            ("tarjeta_SD", Boolean),
            ("red", FieldRule::canonical(&[
                ("4g", "4g"),
                ("lte", "4g"),
                ("3g", "3g"),
                ("edge", "edge"),
                ("gprs", "gprs"),
            ])),
            ("genero", FieldRule::canonical(&[
                ("nena", "nena"),
                ("nene", "nene"),
                ("mujer", "mujer"),
                ("hombre", "hombre"),
            ])),
            ("eficiencia", energy_class.clone()),
            ("comando", FieldRule::canonical(&[
                ("manual", "analogico"),
                ("digital", "digital"),
                ("perilla", "analogico"),
                ("mecanico", "analogico"),
                ("analogico", "analogico"),
            ])),
            ("numero_Sim", FieldRule::integer()),
            ("recuperacion_por_hora", FieldRule::float()),
            ("dispenser_liquidos", FieldRule::canonical(&[
                ("hielo", "hielo y agua"),
                ("agua", "agua"),
                ("si", "agua"),
                ("no", "no"),
            ])),
            ("tipo_de_montaje", FieldRule::canonical(&[
                ("colgar", "de colgar"),
                ("apoyar", "de apoyar"),
                ("dual", "dual"),
                ("pie", "de pie"),
            ])),
            ("encendido_electrico", Boolean),
            ("forma_de_calentamiento", FieldRule::canonical(&[
                ("multigas", "multigas"),
                ("envasado", "gas envasado"),
                ("natural", "gas natural"),
                ("gas", "gas natural"),
                ("electrico", "electrico"),
            ])),
            ("alta_recuperacion", Boolean),
            ("clase_energia", energy_class),
            ("pantalla", FieldRule::float()),
            ("valvula_de_seguridad", Unparsed),
            ("sistema_operativo", FieldRule::canonical(&[
                ("ubuntu", "ubuntu"),
                ("w10", "windows 10"),
                ("windows 10", "windows 10"),
                ("windows 8.1", "windows 8.1"),
                ("windows 8", "windows 8"),
                ("windows 7", "windows 7"),
                ("android", "android"),
                ("ios", "ios"),
            ])),
            ("camara_trasera", FieldRule::float()),
            ("memoria_ram", FieldRule::float()),
            ("tipo_equipo", FieldRule::canonical(&[
                ("ventana", "ventana"),
                ("split", "split"),
                ("techo", "techo"),
                ("portatil", "portatil"),
            ])),
            ("cantidad_programas", FieldRule::integer()),
            ("tipo_de_coccion", Unparsed),
            ("tiraje", FieldRule::canonical(&[
                ("balanceado", "tiro balanceado"),
                ("superior", "superior"),
                ("posterior", "posterior"),
                ("natural", "tiro natural"),
            ])),
            ("autolimpiante", Boolean),
            ("alto", FieldRule::float()),
            ("pantalla_touch", Boolean),
            ("profundo", FieldRule::float()),
            ("bateria", FieldRule::integer()),
            ("potencia", FieldRule::integer()),
            ("procesador", Unparsed),
            ("tresd", Boolean),
            ("conexion", FieldRule::canonical(&[
                ("dual", "superior e inferior"),
                ("superior e inferior", "superior e inferior"),
                ("superior - inferior", "superior e inferior"),
                ("superior (e inferior)", "superior e inferior"),
                ("superior", "superior"),
                ("inferior", "inferior"),
            ])),
            ("placa_grafica", Unparsed),
            ("frigorias", FieldRule::integer()),
            ("operador", FieldRule::canonical(&[
                ("libre", "libre"),
                ("movistar", "movistar"),
                ("claro", "claro"),
                ("personal", "personal"),
                ("nextel", "nextel"),
                ("tuenti", "tuenti"),
            ])),
            ("timer", Boolean),
            ("luz_interna", Boolean),
            ("ancho", FieldRule::float()),
            ("puertos_hdmi", FieldRule::integer()),
            ("control", Unparsed),
            ("grill", Boolean),
            ("smart", Boolean),
            ("tipo_de_conexion", Unparsed),
            ("almacenamiento", FieldRule::integer()),
            ("tambor", Unparsed),
            ("spiedo", Boolean),
            ("termostato", Boolean),
            ("tipo_carga", FieldRule::canonical(&[
                ("frontal", "frontal"),
                ("superior", "superior"),
            ])),
        ];

        let mut registry = Self::empty();
        for (field, rule) in rules {
            registry.register(field, rule);
        }
        registry
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
