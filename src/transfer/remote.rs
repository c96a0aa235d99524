//! # 远端配置
//!
//! 解析 rclone remote 的 endpoint 与公钥，用于对象元数据。
//!
//! ## 查找顺序
//! 1. 环境变量 `RCLONE_CONFIG_<REMOTE>_ENDPOINT` / `RCLONE_CONFIG_<REMOTE>_ACCESS_KEY_ID`
//! 2. `rclone.conf` 中 `[<remote>]` 段的 `endpoint` / `access_key_id`（或 `client_id`）
//!
//! ## 依赖关系
//! - 被 `commands/upload.rs` 使用
//! - 使用 `regex` 解析 INI 格式

use crate::error::{Result, UploadError};
use crate::models::join_key;

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认 remote 名称
pub const DEFAULT_REMOTE: &str = "CLMS";

/// 远端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// rclone remote 名称
    pub remote: String,
    /// 可选 bucket，置于所有目标键之前
    pub bucket: Option<String>,
    pub endpoint: String,
    pub access_key_id: String,
}

impl RemoteConfig {
    /// 从环境变量和配置文件解析
    pub fn resolve(remote: &str, bucket: Option<String>, config_path: Option<&Path>) -> Self {
        let conf_path = config_path
            .map(Path::to_path_buf)
            .or_else(default_config_path);
        let conf_text = conf_path.and_then(|p| fs::read_to_string(p).ok());

        Self::resolve_with(remote, bucket, conf_text.as_deref(), |key| {
            std::env::var(key).ok()
        })
    }

    /// 使用给定的环境查找函数和配置文本解析
    pub fn resolve_with<F>(
        remote: &str,
        bucket: Option<String>,
        conf_text: Option<&str>,
        env: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = conf_text
            .and_then(|text| parse_rclone_conf(text, remote).ok())
            .unwrap_or_default();

        let endpoint = env(&env_key(remote, "ENDPOINT"))
            .or_else(|| section.get("endpoint").cloned())
            .unwrap_or_default();
        let access_key_id = env(&env_key(remote, "ACCESS_KEY_ID"))
            .or_else(|| section.get("access_key_id").cloned())
            .or_else(|| section.get("client_id").cloned())
            .unwrap_or_default();

        RemoteConfig {
            remote: remote.to_string(),
            bucket: bucket.filter(|b| !b.trim_matches('/').is_empty()),
            endpoint,
            access_key_id,
        }
    }

    /// bucket 内的完整对象路径
    pub fn object_path(&self, key: &str) -> String {
        match &self.bucket {
            Some(bucket) => join_key(bucket, key),
            None => join_key("", key),
        }
    }

    /// rclone 目标（`REMOTE:bucket/key`）
    pub fn rclone_target(&self, key: &str) -> String {
        format!("{}:{}", self.remote, self.object_path(key))
    }

    /// 对象的 s3:// 地址
    pub fn s3_url(&self, key: &str) -> String {
        format!("s3://{}", self.object_path(key))
    }
}

/// rclone 环境变量名：`RCLONE_CONFIG_<REMOTE>_<FIELD>`
pub fn env_key(remote: &str, field: &str) -> String {
    format!(
        "RCLONE_CONFIG_{}_{}",
        remote.to_uppercase().replace('-', "_"),
        field
    )
}

fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("rclone")
            .join("rclone.conf")
    })
}

/// 解析 rclone.conf 中指定段的键值
pub fn parse_rclone_conf(text: &str, remote: &str) -> Result<HashMap<String, String>> {
    let section_re =
        Regex::new(r"^\s*\[([^\]]+)\]\s*$").map_err(|e| UploadError::Other(e.to_string()))?;
    let kv_re = Regex::new(r"^\s*([A-Za-z0-9_\-]+)\s*=\s*(.*?)\s*$")
        .map_err(|e| UploadError::Other(e.to_string()))?;

    let mut values = HashMap::new();
    let mut in_section = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(caps) = section_re.captures(line) {
            in_section = caps[1].trim() == remote;
            continue;
        }

        if in_section {
            if let Some(caps) = kv_re.captures(line) {
                values.insert(caps[1].to_lowercase(), caps[2].to_string());
            }
        }
    }

    Ok(values)
}
