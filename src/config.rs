// src/config.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_ASSETS_PATH: &str = "ASSETS_CONFIG_PATH";
pub const ENV_HISTORY_PATH: &str = "NEWS_HISTORY_PATH";
pub const ENV_INDEX_PATH: &str = "VECTOR_DB_PATH";

const DEFAULT_HISTORY_PATH: &str = "data/news_history.csv";
const DEFAULT_INDEX_PATH: &str = "data/vectordb.sqlite3";

/// Everything one ingestion or query run needs to locate its inputs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tracked asset queries, in fetch order. Not mutated by the pipeline.
    pub assets: Vec<String>,
    pub history_path: PathBuf,
    pub index_path: PathBuf,
}

impl PipelineConfig {
    pub fn load() -> Result<Self> {
        Ok(Self {
            assets: load_assets_default()?,
            history_path: env_path(ENV_HISTORY_PATH, DEFAULT_HISTORY_PATH),
            index_path: env_path(ENV_INDEX_PATH, DEFAULT_INDEX_PATH),
        })
    }
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

/// OpenAI credentials + model names, read once at startup and passed to each
/// collaborator at construction time.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub chat_model: String,
    pub embed_model: String,
}

impl OpenAiConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("OPENAI_API_KEY is not set"))?;
        let chat_model =
            std::env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let embed_model = std::env::var("OPENAI_EMBED_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());
        Ok(Self {
            api_key,
            chat_model,
            embed_model,
        })
    }
}

/// Load the tracked-asset list from an explicit path. Supports TOML or JSON.
pub fn load_assets_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading assets from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_assets(&content, ext.as_str())
}

/// Load the asset list using env var + fallbacks:
/// 1) $ASSETS_CONFIG_PATH
/// 2) config/assets.toml
/// 3) config/assets.json
pub fn load_assets_default() -> Result<Vec<String>> {
    if let Ok(p) = std::env::var(ENV_ASSETS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_assets_from(&pb);
        } else {
            return Err(anyhow!("ASSETS_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/assets.toml");
    if toml_p.exists() {
        return load_assets_from(&toml_p);
    }
    let json_p = PathBuf::from("config/assets.json");
    if json_p.exists() {
        return load_assets_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_assets(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    let try_toml = hint_ext == "toml" || s.contains("assets");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported assets format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlAssets {
        assets: Vec<String>,
    }
    let v: TomlAssets = toml::from_str(s)?;
    Ok(clean_list(v.assets))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn dedup_trim_and_formats_work() {
        let toml = r#"assets = [" Bitcoin ", "", "Ethereum", "Ethereum"]"#;
        let json = r#"["Solana", "  Bitcoin  ", ""]"#;
        let toml_out = parse_toml(toml).unwrap();
        assert_eq!(
            toml_out,
            vec!["Bitcoin".to_string(), "Ethereum".to_string()]
        );
        let json_out = parse_json(json).unwrap();
        assert_eq!(json_out, vec!["Bitcoin".to_string(), "Solana".to_string()]);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_ASSETS_PATH);

        // no files in the temp CWD -> empty
        let v = load_assets_default().unwrap();
        assert!(v.is_empty());

        // env takes precedence
        let p_json = tmp.path().join("assets.json");
        fs::write(&p_json, r#"["Bitcoin"]"#).unwrap();
        env::set_var(ENV_ASSETS_PATH, p_json.display().to_string());
        let v2 = load_assets_default().unwrap();
        assert_eq!(v2, vec!["Bitcoin".to_string()]);
        env::remove_var(ENV_ASSETS_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
