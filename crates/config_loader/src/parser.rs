//! 配置解析模块
//!
//! 支持 TOML、JSON 与 YAML 格式，场景蓝图与传感器配置共用。

use std::path::Path;

use contracts::ContractError;
use serde::de::DeserializeOwned;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (场景蓝图推荐)
    Toml,
    /// JSON 格式
    Json,
    /// YAML 格式 (传感器配置)
    Yaml,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// 从路径推断格式
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// 解析 TOML
pub fn parse_toml<T: DeserializeOwned>(content: &str, origin: &Path) -> Result<T, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        path: origin.to_path_buf(),
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON
pub fn parse_json<T: DeserializeOwned>(content: &str, origin: &Path) -> Result<T, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        path: origin.to_path_buf(),
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 YAML
pub fn parse_yaml<T: DeserializeOwned>(content: &str, origin: &Path) -> Result<T, ContractError> {
    serde_yaml::from_str(content).map_err(|e| ContractError::ConfigParse {
        path: origin.to_path_buf(),
        message: format!("YAML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
///
/// 空文档视为格式错误，而不是空配置。
pub fn parse<T: DeserializeOwned>(
    content: &str,
    format: ConfigFormat,
    origin: &Path,
) -> Result<T, ContractError> {
    if content.trim().is_empty() {
        return Err(ContractError::config_parse(origin, "document is empty"));
    }

    match format {
        ConfigFormat::Toml => parse_toml(content, origin),
        ConfigFormat::Json => parse_json(content, origin),
        ConfigFormat::Yaml => parse_yaml(content, origin),
    }
}
