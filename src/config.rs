//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `NEWSROOM__*` 覆盖（双下划线表示嵌套，如 `NEWSROOM__LLM__PROVIDER=mock`）。
//! 命令行参数最后覆盖（见 main.rs）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::newspaper::Depth;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub newspaper: NewspaperSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：deepseek / openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "deepseek".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    120
}

/// [newspaper] 段：一期报刊的默认参数
#[derive(Debug, Clone, Deserialize)]
pub struct NewspaperSection {
    /// 文档作者（可选）
    pub author: Option<String>,
    /// 本地版面对应的地点
    #[serde(default)]
    pub location: String,
    /// 文档字节预算
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub depth: Depth,
    /// 时间窗口：往前追溯的天数
    #[serde(default = "default_days_back")]
    pub days_back: u32,
    /// 编辑器随机回退的种子；不设则每次运行不同
    pub seed: Option<u64>,
    /// 编辑器被要求尽量不删除的版面
    #[serde(default = "default_protected_sections")]
    pub protected_sections: Vec<String>,
}

impl Default for NewspaperSection {
    fn default() -> Self {
        Self {
            author: None,
            location: String::new(),
            max_length: default_max_length(),
            depth: Depth::default(),
            days_back: default_days_back(),
            seed: None,
            protected_sections: default_protected_sections(),
        }
    }
}

fn default_max_length() -> usize {
    60_000
}

fn default_days_back() -> u32 {
    1
}

fn default_protected_sections() -> Vec<String> {
    vec![
        "Local News".into(),
        "US News".into(),
        "World News".into(),
    ]
}

/// [pipeline] 段：队列容量（背压）与各阶段并发
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// 阶段间队列容量
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_plan_concurrency")]
    pub plan_concurrency: usize,
    #[serde(default = "default_research_concurrency")]
    pub research_concurrency: usize,
    #[serde(default = "default_synthesize_concurrency")]
    pub synthesize_concurrency: usize,
    #[serde(default = "default_edit_concurrency")]
    pub edit_concurrency: usize,
    /// 是否启用逐篇润色阶段
    #[serde(default)]
    pub polish: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            plan_concurrency: default_plan_concurrency(),
            research_concurrency: default_research_concurrency(),
            synthesize_concurrency: default_synthesize_concurrency(),
            edit_concurrency: default_edit_concurrency(),
            polish: false,
        }
    }
}

fn default_capacity() -> usize {
    1
}

fn default_plan_concurrency() -> usize {
    3
}

fn default_research_concurrency() -> usize {
    10
}

fn default_synthesize_concurrency() -> usize {
    10
}

fn default_edit_concurrency() -> usize {
    5
}

/// 从 config 目录加载配置，环境变量 NEWSROOM__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 NEWSROOM__*（双下划线表示嵌套键）
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
        config::Environment::with_prefix("NEWSROOM")
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
        assert_eq!(cfg.pipeline.capacity, 1);
        assert_eq!(cfg.newspaper.depth, Depth::Short);
        assert_eq!(cfg.newspaper.protected_sections.len(), 3);
        assert_eq!(cfg.llm.timeouts.request, 120);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[llm]
provider = "mock"

[newspaper]
location = "Ohio"
max_length = 500
depth = "medium"
seed = 7

[pipeline]
capacity = 4
polish = true
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.newspaper.location, "Ohio");
        assert_eq!(cfg.newspaper.max_length, 500);
        assert_eq!(cfg.newspaper.depth, Depth::Medium);
        assert_eq!(cfg.newspaper.seed, Some(7));
        assert_eq!(cfg.pipeline.capacity, 4);
        assert!(cfg.pipeline.polish);
        assert_eq!(cfg.pipeline.research_concurrency, 10);
    }
}
