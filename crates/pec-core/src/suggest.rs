//! Canned quick replies offered under the input box.

use pec_types::message::ChatMessage;

const MAX_SUGGESTIONS: usize = 3;
const QUESTION: &str = "？";

struct SuggestionRule {
    matches: fn(&str) -> bool,
    replies: &'static [&'static str],
}

fn has(text: &str, needles: &[&str]) -> bool {
    needles.iter().all(|n| text.contains(n))
}

fn any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Ordered: the first matching question wins.
const RULES: &[SuggestionRule] = &[
    SuggestionRule {
        matches: |t| any(t, &["功率是多少", "功率需求", "多少瓦", "功率等级"]) || has(t, &["输出功率", QUESTION]),
        replies: &["输出功率 500W", "1kW", "200W"],
    },
    SuggestionRule {
        matches: |t| has(t, &["输入电压", QUESTION]) || t.contains("电压范围是多少"),
        replies: &["输入电压 36V - 60V", "输入电压 48V", "电压范围 40V 到 55V"],
    },
    SuggestionRule {
        matches: |t| has(t, &["输出电压", QUESTION]) || any(t, &["输出电压是多少", "需要输出多少伏"]),
        replies: &["输出电压 100V", "输出 48V", "输出电压 400V"],
    },
    SuggestionRule {
        matches: |t| has(t, &["拓扑", QUESTION]) || any(t, &["什么类型", "哪种电路", "选择什么拓扑"]),
        replies: &["升压变换器 (Boost)", "降压变换器 (Buck)", "升降压变换器 (Buck-Boost)"],
    },
    SuggestionRule {
        matches: |t| {
            any(t, &["优化目标", "设计偏好", "优先考虑"])
                || has(t, &["侧重", QUESTION])
                || has(t, &["效率", "成本", QUESTION])
        },
        replies: &["效率优先", "成本优先", "均衡设计"],
    },
    SuggestionRule {
        matches: |t| has(t, &["确认", "参数"]) || any(t, &["是否正确", "请确认", "以上参数"]),
        replies: &["确认，没问题", "参数正确", "我想修改一下"],
    },
    SuggestionRule {
        matches: |t| {
            has(t, &["是否需要", "生成"])
                || has(t, &["生成", "方案", QUESTION])
                || any(t, &["是否立即生成", "可以为您生成"])
        },
        replies: &["好的，请生成方案", "是的，生成吧", "我想再调整一下"],
    },
    SuggestionRule {
        matches: |t| t.contains("应用场景") || has(t, &["用途", QUESTION]) || t.contains("用在哪"),
        replies: &["光伏储能系统", "电动汽车充电", "工业电源"],
    },
    SuggestionRule {
        matches: |t| any(t, &["环境温度", "工作温度", "温度范围"]),
        replies: &["环境温度 50°C", "常温 25°C", "高温环境 70°C"],
    },
    SuggestionRule {
        matches: |t| has(t, &["单相", "三相"]) || t.contains("几相"),
        replies: &["单相", "三相"],
    },
    SuggestionRule {
        matches: |t| any(t, &["并网", "离网"]),
        replies: &["并网型", "离网型"],
    },
    SuggestionRule {
        matches: |t| t.contains("开关频率") || has(t, &["频率", QUESTION]),
        replies: &["100kHz", "50kHz", "使用默认频率"],
    },
    SuggestionRule {
        matches: |t| has(t, &["纹波", QUESTION]),
        replies: &["纹波小于 1%", "纹波小于 5%", "使用默认值"],
    },
    SuggestionRule {
        matches: |t| any(t, &["还有什么", "其他问题", "帮您的"]),
        replies: &["没有了，谢谢", "我想了解更多细节"],
    },
];

/// Suggestions for answering the last assistant message; empty when the
/// conversation does not end with the assistant.
pub fn suggest_replies(history: &[ChatMessage]) -> Vec<String> {
    let Some(last) = history.last().filter(|m| m.is_assistant()) else {
        return Vec::new();
    };
    let text = last.content.to_lowercase();

    if let Some(rule) = RULES.iter().find(|r| (r.matches)(&text)) {
        return rule
            .replies
            .iter()
            .take(MAX_SUGGESTIONS)
            .map(|s| s.to_string())
            .collect();
    }

    if !text.contains(QUESTION) {
        return Vec::new();
    }

    // Fall back to the first core fact not yet mentioned anywhere.
    let all = history
        .iter()
        .map(|m| m.content.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let mentions = |unit: &[char]| {
        all.char_indices().any(|(i, c)| {
            unit.contains(&c)
                && all[..i]
                    .trim_end()
                    .chars()
                    .last()
                    .is_some_and(|p| p.is_ascii_digit())
        })
    };
    let has_topology = any(&all, &["boost", "buck", "升压", "降压"]);

    let fallback = if !has_topology {
        "升压变换器"
    } else if !mentions(&['v']) {
        "输入 48V，输出 100V"
    } else if !mentions(&['w', '瓦']) {
        "输出功率 500W"
    } else {
        return Vec::new();
    };
    vec![fallback.to_string()]
}
