//! 配置模块
//!
//! # 设计思路
//!
//! 配置以 JSON 持久化，字段全部带默认值：文件缺失或损坏时直接回退默认配置，
//! 不阻断启动。
//!
//! 引擎库位置按以下顺序解析：
//! 1. 配置中的 `library_path`
//! 2. 环境变量 `PIXEL_BRIDGE_LIBRARY`
//! 3. 当前可执行文件同目录下的平台库文件名（存在时）
//! 4. 平台库文件名本身，交给系统加载器搜索

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bridge::ResampleFilter;
use crate::error::BridgeError;

pub const LIBRARY_ENV: &str = "PIXEL_BRIDGE_LIBRARY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// 显式指定的引擎库路径
    pub library_path: Option<PathBuf>,
    /// 不含平台前后缀的库名（默认 `rs_image`）
    pub library_name: String,
    pub default_filter: ResampleFilter,
    pub zoom_step: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            library_name: "rs_image".to_string(),
            default_filter: ResampleFilter::Triangle,
            zoom_step: 0.1,
            min_zoom: 0.1,
            max_zoom: 10.0,
        }
    }
}

impl BridgeConfig {
    /// 读取配置；文件缺失或内容无效时返回默认配置。
    pub fn load_from_path(path: &Path) -> Self {
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                match serde_json::from_str::<Self>(&content) {
                    Ok(config) if config.validate().is_ok() => return config,
                    Ok(_) => log::warn!("⚠️ 配置取值非法，使用默认配置: {}", path.display()),
                    Err(err) => log::warn!("⚠️ 配置解析失败，使用默认配置: {err}"),
                }
            }
        }
        Self::default()
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), BridgeError> {
        self.validate()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        let finite = [self.zoom_step, self.min_zoom, self.max_zoom]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.zoom_step <= 0.0 || self.min_zoom <= 0.0 {
            return Err(BridgeError::Config(format!(
                "缩放参数必须为正数：step={} min={}",
                self.zoom_step, self.min_zoom
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(BridgeError::Config(format!(
                "最小缩放 {} 大于最大缩放 {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.library_name.trim().is_empty() {
            return Err(BridgeError::Config("库名不能为空".to_string()));
        }
        Ok(())
    }

    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// 按当前进程环境解析引擎库路径。
    pub fn resolve_library_path(&self) -> PathBuf {
        let env = std::env::var_os(LIBRARY_ENV).map(PathBuf::from);
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        self.resolve_library_path_with(env, exe_dir.as_deref())
    }

    /// 解析逻辑本体，环境输入由调用方提供。
    pub fn resolve_library_path_with(&self, env: Option<PathBuf>, exe_dir: Option<&Path>) -> PathBuf {
        if let Some(path) = self.library_path.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            return path.clone();
        }
        if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
            return path;
        }

        let file_name = libloading::library_filename(&self.library_name);
        if let Some(dir) = exe_dir {
            let beside = dir.join(&file_name);
            if beside.is_file() {
                return beside;
            }
        }
        PathBuf::from(file_name)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("pixel-bridge-config-test-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = unique_temp_dir();
        let path = dir.join("nested").join("config.json");

        let config = BridgeConfig {
            library_path: Some(PathBuf::from("/opt/engine/librs_image.so")),
            default_filter: ResampleFilter::Lanczos3,
            max_zoom: 4.0,
            ..BridgeConfig::default()
        };
        config.save_to_path(&path).expect("save config");

        assert_eq!(BridgeConfig::load_from_path(&path), config);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn bad_or_missing_file_falls_back_to_default() {
        let dir = unique_temp_dir();
        let path = dir.join("config.json");
        assert_eq!(BridgeConfig::load_from_path(&path), BridgeConfig::default());

        fs::write(&path, "not-json").expect("write invalid config");
        assert_eq!(BridgeConfig::load_from_path(&path), BridgeConfig::default());

        fs::write(&path, r#"{"min_zoom": 5.0, "max_zoom": 1.0}"#).expect("write config");
        assert_eq!(BridgeConfig::load_from_path(&path), BridgeConfig::default());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = unique_temp_dir();
        let path = dir.join("config.json");
        fs::write(&path, r#"{"default_filter": "gaussian"}"#).expect("write config");

        let loaded = BridgeConfig::load_from_path(&path);
        assert_eq!(loaded.default_filter, ResampleFilter::Gaussian);
        assert_eq!(loaded.library_name, "rs_image");
        assert_eq!(loaded.zoom_step, 0.1);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn validate_rejects_inverted_zoom_bounds() {
        let config = BridgeConfig {
            min_zoom: 2.0,
            max_zoom: 1.0,
            ..BridgeConfig::default()
        };
        assert!(matches!(config.validate(), Err(BridgeError::Config(_))));
        assert!(BridgeConfig::default().validate().is_ok());
    }

    #[test]
    fn library_resolution_order() {
        let dir = unique_temp_dir();
        let file_name = libloading::library_filename("rs_image");

        let explicit = BridgeConfig {
            library_path: Some(PathBuf::from("/explicit/engine")),
            ..BridgeConfig::default()
        };
        assert_eq!(
            explicit.resolve_library_path_with(Some(PathBuf::from("/env/engine")), Some(dir.as_path())),
            PathBuf::from("/explicit/engine")
        );

        let config = BridgeConfig::default();
        assert_eq!(
            config.resolve_library_path_with(Some(PathBuf::from("/env/engine")), Some(dir.as_path())),
            PathBuf::from("/env/engine")
        );

        // 可执行文件旁没有库文件时交给系统加载器
        assert_eq!(
            config.resolve_library_path_with(None, Some(dir.as_path())),
            PathBuf::from(&file_name)
        );

        fs::write(dir.join(&file_name), b"").expect("write fake library");
        assert_eq!(
            config.resolve_library_path_with(None, Some(dir.as_path())),
            dir.join(&file_name)
        );

        let _ = fs::remove_dir_all(dir);
    }
}
