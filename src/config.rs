use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub download: Download,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub parser: Parser,
    #[serde(default)]
    pub binder: Binder,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: Default::default(),
            download: Default::default(),
            extraction: Default::default(),
            parser: Default::default(),
            binder: Default::default(),
            validation: Default::default(),
            output: Default::default(),
            logging: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    pub url: String,
    pub filename: String,
    pub timeout_seconds: u64,
}
impl Default for Download {
    fn default() -> Self {
        Self {
            url: "https://cestina-pro-cizince.cz/obcanstvi/wp-content/uploads/2025/12/OBC_databanka_testovychuloh_251215.pdf".into(),
            filename: "OBC_databanka_testovychuloh_251215.pdf".into(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    /// Persisted images smaller than this are scan artifacts and get deleted.
    pub min_image_bytes: u64,
    /// Top-edge coordinates within one band count as the same visual row.
    pub row_band: f64,
}
impl Default for Extraction {
    fn default() -> Self {
        Self {
            min_image_bytes: 200,
            row_band: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parser {
    pub skip_headers: Vec<String>,
    pub answer_marker: String,
    pub date_prefix: String,
    pub placeholder_section: String,
    /// Numbered lines above this are only questions when they contain '?'.
    pub inline_number_cutoff: u32,
    pub normalize_unicode: bool,
}
impl Default for Parser {
    fn default() -> Self {
        Self {
            skip_headers: vec!["TESTOVÉ ÚLOHY".into(), "OBČANSKÝ ZÁKLAD".into()],
            answer_marker: "SPRÁVNÉ ŘEŠENÍ".into(),
            date_prefix: "Datum aktualizace testové úlohy:".into(),
            placeholder_section: "(Pokračování)".into(),
            inline_number_cutoff: crate::parse::INLINE_NUMBER_CUTOFF,
            normalize_unicode: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binder {
    /// A question "mentions an image" when its lowercased text contains any of these.
    pub keywords: Vec<String>,
    /// (section id, question id) pairs that match keywords without having a figure.
    pub exclude: Vec<[u32; 2]>,
    pub grid_options: usize,
    pub short_option_max_len: usize,
}
impl Default for Binder {
    fn default() -> Self {
        Self {
            keywords: vec![
                "obrázku".into(),
                "obrázek".into(),
                "obrázků".into(),
                "na obrázku".into(),
                "na mapě".into(),
                "bankovce".into(),
                "tato socha".into(),
                "této sochy".into(),
                "tato panovnice".into(),
                "tato budova".into(),
                "této budovy".into(),
                "tato stavba".into(),
                "tato hora".into(),
            ],
            exclude: vec![[17, 8]],
            grid_options: 4,
            short_option_max_len: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    /// Cover pages and decorative headers are extracted but never referenced.
    pub expected_orphans: usize,
}
impl Default for Validation {
    fn default() -> Self {
        Self {
            expected_orphans: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub pretty: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
