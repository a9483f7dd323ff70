//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `COUNSELLOR__*` 覆盖（双下划线表示嵌套，如 `COUNSELLOR__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 对话历史条数的硬上限
pub const MAX_HISTORY_LIMIT: usize = 20;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub database: DatabaseSection,
    pub llm: LlmSection,
    pub counsellor: CounsellorSection,
    pub directory: DirectorySection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [database] 段：SQLite 文件路径；为空时使用内存存储
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_database_path")]
    pub path: Option<PathBuf>,
}

fn default_database_path() -> Option<PathBuf> {
    Some(PathBuf::from("counsellor.db"))
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl DatabaseSection {
    /// 空字符串视为未配置
    pub fn sqlite_path(&self) -> Option<&std::path::Path> {
        self.path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// [llm] 段：后端选择、模型、采样温度与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：gemini / openai；未设置对应 API Key 时退回 Mock
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            temperature: default_temperature(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次生成超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

/// [counsellor] 段：对话编排
#[derive(Debug, Clone, Deserialize)]
pub struct CounsellorSection {
    /// 发给模型的历史条数（超过 20 按 20 处理）
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// 同一用户的并发对话是否串行执行
    #[serde(default = "default_serialize_user_turns")]
    pub serialize_user_turns: bool,
    /// 覆盖内置提示词模板的文件
    pub system_prompt_path: Option<PathBuf>,
}

fn default_history_limit() -> usize {
    MAX_HISTORY_LIMIT
}

fn default_serialize_user_turns() -> bool {
    true
}

impl Default for CounsellorSection {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            serialize_user_turns: default_serialize_user_turns(),
            system_prompt_path: None,
        }
    }
}

impl CounsellorSection {
    pub fn effective_history_limit(&self) -> usize {
        self.history_limit.min(MAX_HISTORY_LIMIT)
    }
}

/// [directory] 段：大学目录服务
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorySection {
    #[serde(default = "default_directory_url")]
    pub base_url: String,
    #[serde(default = "default_directory_timeout_secs")]
    pub timeout_secs: u64,
    /// 单次查询最多处理的原始记录数
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_directory_url() -> String {
    "http://universities.hipolabs.com/search".to_string()
}

fn default_directory_timeout_secs() -> u64 {
    30
}

fn default_max_records() -> usize {
    80
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            base_url: default_directory_url(),
            timeout_secs: default_directory_timeout_secs(),
            max_records: default_max_records(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 COUNSELLOR__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 COUNSELLOR__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("COUNSELLOR")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.provider, "gemini");
        assert_eq!(cfg.llm.timeouts.request, 60);
        assert_eq!(cfg.counsellor.effective_history_limit(), 20);
        assert!(cfg.counsellor.serialize_user_turns);
        assert_eq!(cfg.directory.max_records, 80);
        assert_eq!(
            cfg.database.sqlite_path(),
            Some(std::path::Path::new("counsellor.db"))
        );
    }

    #[test]
    fn test_history_limit_is_clamped() {
        let section = CounsellorSection {
            history_limit: 50,
            ..Default::default()
        };
        assert_eq!(section.effective_history_limit(), 20);
    }

    #[test]
    fn test_explicit_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[llm]\nprovider = \"openai\"\n[llm.timeouts]\nrequest = 5\n[counsellor]\nhistory_limit = 8\n[database]\npath = \"\""
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.timeouts.request, 5);
        assert_eq!(cfg.counsellor.history_limit, 8);
        assert!(cfg.database.sqlite_path().is_none());
    }
}
