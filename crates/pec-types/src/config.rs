use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    /// Prefix used for exported file names and report headers
    pub product_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            storage: StorageConfig::default(),
            product_name: "PEC-AI".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Use the incremental event stream instead of a single completion
    pub stream: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::ModelScope,
            model: "deepseek-ai/DeepSeek-V3.2".to_string(),
            api_key: String::new(),
            api_base: None,
            max_tokens: 8000,
            temperature: 0.7,
            stream: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProvider {
    ModelScope,
    DeepSeek,
    OpenAI,
    Custom,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &str {
        match self {
            LlmProvider::ModelScope => "https://api-inference.modelscope.cn",
            LlmProvider::DeepSeek => "https://api.deepseek.com",
            LlmProvider::OpenAI => "https://api.openai.com",
            LlmProvider::Custom => "",
        }
    }

    pub fn all() -> &'static [LlmProvider] {
        &[
            LlmProvider::ModelScope,
            LlmProvider::DeepSeek,
            LlmProvider::OpenAI,
            LlmProvider::Custom,
        ]
    }

    pub fn label(&self) -> &str {
        match self {
            LlmProvider::ModelScope => "ModelScope",
            LlmProvider::DeepSeek => "DeepSeek",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackendType,
    /// Key under which the whole session collection is stored
    pub history_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Auto,
            history_key: HISTORY_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// Local storage when available, memory otherwise
    Auto,
    Memory,
    LocalStorage,
}

pub const HISTORY_STORAGE_KEY: &str = "pec-ai-chat-history";
pub const CONFIG_STORAGE_KEY: &str = "pec-ai:config";

/// Which system prompt a turn is sent with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Guide the user towards a confirmed parameter set
    #[default]
    Design,
    /// Answer questions about an already generated design
    Qa,
}

impl ChatMode {
    /// System prompt for this mode. In `Qa` mode the design context, when
    /// present, is appended under its own heading.
    pub fn system_prompt(&self, design_context: Option<&str>) -> String {
        match (self, design_context) {
            (ChatMode::Design, _) => DESIGN_GUIDE_PROMPT.to_string(),
            (ChatMode::Qa, Some(ctx)) if !ctx.trim().is_empty() => {
                format!("{}\n\n【当前设计方案详情】\n{}", QA_PROMPT, ctx)
            }
            (ChatMode::Qa, _) => QA_PROMPT.to_string(),
        }
    }
}

const DESIGN_GUIDE_PROMPT: &str = r#"你是 PEC-AI，电力电子变换器设计助手。通过多轮对话帮助用户明确设计需求。

格式要求：
1. 不使用 Markdown 符号，只输出纯文本
2. 列表使用 1. 2. 3. 编号
3. 每次只问一到两个问题

对话步骤：
1. 依次确认拓扑（Boost/Buck/Buck-Boost）、输入电压或范围、输出电压、输出功率
2. 询问优化目标（效率优先/成本优先/体积优先/均衡设计），不确定时默认均衡设计
3. 信息足够后按以下格式总结参数并请用户确认：

设计参数确认
------------------
拓扑结构：Boost (CCM)
输入电压：XX V - XX V
输出电压：XX V
输出功率：XX W
优化目标：均衡设计
环境温度：50°C（默认值）
纹波要求：1%（默认值）
------------------

4. 用户确认后必须询问："请问是否需要我立即生成可下载的设计方案？"
5. 用户同意生成时回复："好的，正在为您生成设计方案，请稍候..."
"#;

const QA_PROMPT: &str = r#"你是 PEC-AI，电力电子变换器设计问答助手。用户已经生成了一份设计方案（BOM、设计报告、元器件选型），现在进入问答阶段。

格式要求：
1. 不使用 Markdown 符号，只输出纯文本
2. 列表使用 1. 2. 3. 编号

可回答的问题：控制实现（PWM、PI 参数、补偿网络）、元器件替换及其对效率与温升的影响、设计原理、效率/成本/体积优化建议、PCB 布局与调试。
回答要具体、可操作，涉及计算时给出数值。
"#;
