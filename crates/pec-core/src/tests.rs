#[cfg(test)]
mod tests {
    use crate::event_bus::EventBus;
    use crate::extract::{self, rules, MergePolicy, PartialDesign};
    use crate::markdown::clean_markdown;
    use crate::normalize::{normalize, sweep_bounds, weights_for};
    use crate::ports::*;
    use crate::report::{self, bom, layout::num};
    use crate::runtime::{ChatRuntime, StopSlot};
    use crate::session_store::SessionStore;
    use crate::state_machine::{ConversationDesignState, Transition};
    use crate::suggest::suggest_replies;
    use crate::summary::{design_summary, has_valid_design};
    use crate::synth::{duty_ratio, MockSynthesizer, ResultSynthesizer};
    use crate::triggers;
    use pec_types::config::*;
    use pec_types::design::*;
    use pec_types::document::*;
    use pec_types::event::*;
    use pec_types::message::*;
    use pec_types::{PecError, Result};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use futures::future::AbortHandle;
    use futures::Stream;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};
    use std::pin::Pin;
    use std::rc::Rc;

    const SCENARIO_REQUEST: &str = "帮我设计48V转100V 500W的升压变换器";

    const CONFIRMATION_SUMMARY: &str = "设计参数确认\n\
        ------------------\n\
        拓扑结构：Boost (CCM)\n\
        输入电压：48 V\n\
        输出电压：100 V\n\
        输出功率：500 W\n\
        优化目标：均衡设计\n\
        环境温度：50°C（默认值）\n\
        纹波要求：1%（默认值）\n\
        ------------------\n\
        请问是否需要我立即生成可下载的设计方案？";

    const RANGE_SUMMARY: &str = "设计参数确认\n\
        拓扑结构：Boost\n\
        输入电压：40 V - 55 V\n\
        输出电压：100 V\n\
        输出功率：500 W\n\
        优化目标：均衡设计";

    // ─── Helpers ─────────────────────────────────────────────

    fn block_on<F: std::future::Future<Output = T>, T>(f: F) -> T {
        use std::task::{Context, Poll, Wake, Waker};
        use std::sync::Arc;

        struct NoopWaker;
        impl Wake for NoopWaker {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(val) => return val,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    fn history(pairs: &[(Role, &str)]) -> Vec<ChatMessage> {
        pairs
            .iter()
            .map(|(role, text)| match role {
                Role::User => ChatMessage::user(*text),
                Role::Assistant => ChatMessage::assistant(*text),
                Role::System => ChatMessage::system(*text),
            })
            .collect()
    }

    fn scenario_history() -> Vec<ChatMessage> {
        history(&[
            (Role::User, SCENARIO_REQUEST),
            (Role::Assistant, CONFIRMATION_SUMMARY),
            (Role::User, "好的，生成吧"),
        ])
    }

    fn sample_outcome(power: f64) -> (DesignParameters, DesignResult) {
        let extracted = ExtractedDesign {
            output_power: power,
            ..ExtractedDesign::default()
        };
        let params = normalize(&extracted);
        let result = MockSynthesizer::with_seed(42).synthesize(&params);
        (params, result)
    }

    /// Split one CSV record, honouring double-quoted fields
    fn split_csv(line: &str) -> Vec<String> {
        let mut fields = vec![String::new()];
        let mut quoted = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' if quoted && chars.peek() == Some(&'"') => {
                    chars.next();
                    fields.last_mut().unwrap().push('"');
                }
                '"' => quoted = !quoted,
                ',' if !quoted => fields.push(String::new()),
                _ => fields.last_mut().unwrap().push(c),
            }
        }
        fields
    }

    // ─── Mock ports ──────────────────────────────────────────

    /// Chat transport replaying scripted replies and recording requests
    struct ScriptedChat {
        replies: RefCell<VecDeque<Vec<ChatStreamEvent>>>,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl ScriptedChat {
        fn new(replies: Vec<Vec<ChatStreamEvent>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn text(reply: &str) -> Vec<ChatStreamEvent> {
            vec![
                ChatStreamEvent::ContentDelta(reply.to_string()),
                ChatStreamEvent::Done,
            ]
        }

        fn next_reply(&self, req: ChatRequest) -> Vec<ChatStreamEvent> {
            self.requests.borrow_mut().push(req);
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| vec![ChatStreamEvent::Error("script exhausted".to_string())])
        }
    }

    #[async_trait(?Send)]
    impl ChatPort for ScriptedChat {
        async fn complete(&self, req: ChatRequest) -> Result<String> {
            let mut out = String::new();
            for event in self.next_reply(req) {
                match event {
                    ChatStreamEvent::ContentDelta(t) => out.push_str(&t),
                    ChatStreamEvent::Error(e) => return Err(PecError::Llm(e)),
                    _ => {}
                }
            }
            Ok(out)
        }

        fn stream(&self, req: ChatRequest) -> Pin<Box<dyn Stream<Item = ChatStreamEvent>>> {
            Box::pin(futures::stream::iter(self.next_reply(req)))
        }
    }

    #[derive(Default)]
    struct MemStore {
        data: RefCell<HashMap<String, Vec<u8>>>,
        writes: Cell<usize>,
    }

    #[async_trait(?Send)]
    impl StoragePort for MemStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.data.borrow().get(key).cloned())
        }
        async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            self.writes.set(self.writes.get() + 1);
            self.data.borrow_mut().insert(key.to_string(), value.to_vec());
            Ok(())
        }
        async fn delete(&self, key: &str) -> Result<()> {
            self.data.borrow_mut().remove(key);
            Ok(())
        }
        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
            Ok(self.data.borrow().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
        }
        fn backend_name(&self) -> &str {
            "test-memory"
        }
    }

    /// Storage whose every operation fails, as with an exhausted quota
    struct BrokenStore;

    #[async_trait(?Send)]
    impl StoragePort for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(PecError::Storage("unavailable".to_string()))
        }
        async fn set(&self, _key: &str, _value: &[u8]) -> Result<()> {
            Err(PecError::Storage("quota exceeded".to_string()))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(PecError::Storage("unavailable".to_string()))
        }
        async fn list_keys(&self, _prefix: &str) -> Result<Vec<String>> {
            Err(PecError::Storage("unavailable".to_string()))
        }
        fn backend_name(&self) -> &str {
            "broken"
        }
    }

    struct MockRenderer {
        available: bool,
        rendered: RefCell<Vec<String>>,
    }

    impl MockRenderer {
        fn new(available: bool) -> Self {
            Self { available, rendered: RefCell::new(Vec::new()) }
        }
    }

    #[async_trait(?Send)]
    impl DocumentRenderer for MockRenderer {
        async fn ensure_loaded(&self) -> Result<()> {
            if self.available {
                Ok(())
            } else {
                Err(PecError::RenderingUnavailable("script failed to load".to_string()))
            }
        }
        fn render(&self, doc: &PaginatedDocument) -> Result<Vec<u8>> {
            self.rendered.borrow_mut().push(doc.title.clone());
            Ok(serde_json::to_vec(doc)?)
        }
        fn backend_name(&self) -> &str {
            "mock-renderer"
        }
    }

    fn runtime_with(storage: Rc<dyn StoragePort>) -> (ChatRuntime, EventBus) {
        let bus = EventBus::new();
        let store = SessionStore::new(storage, HISTORY_STORAGE_KEY);
        let runtime = ChatRuntime::new(
            AppConfig::default(),
            bus.clone(),
            store,
            Box::new(MockSynthesizer::with_seed(7)),
        );
        (runtime, bus)
    }

    fn registration() -> futures::future::AbortRegistration {
        AbortHandle::new_pair().1
    }

    fn phase_changes(events: &[ChatEvent]) -> Vec<(DesignPhase, DesignPhase)> {
        events
            .iter()
            .filter_map(|e| match e {
                ChatEvent::PhaseChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_new_is_empty() {
        let bus = EventBus::new();
        assert!(!bus.has_pending());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_clone_shares_state() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        bus1.emit(ChatEvent::SessionsChanged);
        assert!(bus2.has_pending());

        let events = bus2.drain();
        assert_eq!(events.len(), 1);
        assert!(!bus1.has_pending());
    }

    #[test]
    fn test_event_bus_merges_adjacent_deltas() {
        let bus = EventBus::new();
        bus.emit(ChatEvent::ReasoningDelta { text: "先".to_string() });
        bus.emit(ChatEvent::ReasoningDelta { text: "想".to_string() });
        bus.emit(ChatEvent::ContentDelta { text: "您".to_string() });
        bus.emit(ChatEvent::ContentDelta { text: "好".to_string() });
        bus.emit(ChatEvent::SessionsChanged);
        bus.emit(ChatEvent::ContentDelta { text: "！".to_string() });
        assert_eq!(bus.len(), 4);

        let events = bus.drain();
        assert!(matches!(&events[0], ChatEvent::ReasoningDelta { text } if text == "先想"));
        assert!(matches!(&events[1], ChatEvent::ContentDelta { text } if text == "您好"));
        assert!(matches!(events[2], ChatEvent::SessionsChanged));
        assert!(matches!(&events[3], ChatEvent::ContentDelta { text } if text == "！"));
        assert!(bus.is_empty());
    }

    #[test]
    fn test_event_bus_does_not_merge_across_drain() {
        let bus = EventBus::new();
        bus.emit(ChatEvent::ContentDelta { text: "a".to_string() });
        assert_eq!(bus.drain().len(), 1);
        bus.emit(ChatEvent::ContentDelta { text: "b".to_string() });
        let events = bus.drain();
        assert!(matches!(&events[0], ChatEvent::ContentDelta { text } if text == "b"));
    }

    #[test]
    fn test_event_bus_emit_all_keeps_order() {
        let bus = EventBus::new();
        bus.emit_all([
            ChatEvent::PhaseChanged { from: DesignPhase::Idle, to: DesignPhase::ParamsConfirmed },
            ChatEvent::PhaseChanged {
                from: DesignPhase::ParamsConfirmed,
                to: DesignPhase::AskingGeneration,
            },
        ]);
        assert_eq!(
            phase_changes(&bus.drain()),
            vec![
                (DesignPhase::Idle, DesignPhase::ParamsConfirmed),
                (DesignPhase::ParamsConfirmed, DesignPhase::AskingGeneration),
            ]
        );
    }

    // ─── Extractor Tests ─────────────────────────────────────

    #[test]
    fn test_rule_table_compiles_with_unique_names() {
        let compiled = rules::COMPILED_RULES.as_ref().unwrap();
        assert_eq!(compiled.len(), rules::RULE_TABLE.len());

        let mut names: Vec<&str> = rules::RULE_TABLE.iter().map(|r| r.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), rules::RULE_TABLE.len());
    }

    #[test]
    fn test_extract_empty_history_is_default() {
        let design = extract::extract(&[]);
        assert_eq!(design, ExtractedDesign::default());
        assert_eq!(design.confidence, 0.0);
        assert_eq!(design.missing_fields.len(), 3);
    }

    #[test]
    fn test_extract_scenario_conversation() {
        let design = extract::extract(&scenario_history());
        assert_eq!(design.topology, Topology::Boost);
        assert!((design.input_voltage - 48.0).abs() < 1e-9);
        assert_eq!(design.output_voltage, 100.0);
        assert_eq!(design.output_power, 500.0);
        assert_eq!(design.priority, Priority::Balanced);
        assert_eq!(design.max_ambient_temp, Some(50.0));
        assert_eq!(design.ripple_max, Some(1.0));
        assert!(design.missing_fields.is_empty());
        assert_eq!(design.confidence, ExtractedDesign::HIGH_CONFIDENCE);
    }

    #[test]
    fn test_extract_idempotent_on_confirmation_block() {
        let msgs = history(&[
            (Role::User, "输入40到55V，输出100V，500W"),
            (Role::Assistant, RANGE_SUMMARY),
        ]);
        let first = extract::extract(&msgs);
        let second = extract::extract(&msgs);
        assert_eq!(first, second);
        assert_eq!(first.input_voltage_min, Some(40.0));
        assert_eq!(first.input_voltage_max, Some(55.0));
        assert_eq!(first.input_voltage, 40.0);
        assert_eq!(first.output_voltage, 100.0);
        assert_eq!(first.output_power, 500.0);
        assert_eq!(first.priority, Priority::Balanced);
    }

    #[test]
    fn test_extract_bare_range_is_input_range() {
        let msgs = history(&[(Role::User, "输入40V-55V，升压")]);
        let design = extract::extract(&msgs);
        assert_eq!(design.input_voltage_min, Some(40.0));
        assert_eq!(design.input_voltage_max, Some(55.0));
        // The range never turns into an output voltage.
        assert!(design.is_missing(MissingField::OutputVoltage));
    }

    #[test]
    fn test_extract_two_voltages_default_to_boost_order() {
        let msgs = history(&[(Role::User, "24V 和 12V 之间转换，100W")]);
        let design = extract::extract(&msgs);
        assert_eq!(design.input_voltage, 12.0);
        assert_eq!(design.output_voltage, 24.0);
    }

    #[test]
    fn test_extract_two_voltages_buck_order() {
        let msgs = history(&[(Role::User, "做一个buck，48V和12V，200W")]);
        let design = extract::extract(&msgs);
        assert_eq!(design.topology, Topology::Buck);
        assert_eq!(design.input_voltage, 48.0);
        assert_eq!(design.output_voltage, 12.0);
    }

    #[test]
    fn test_extract_buck_boost_not_read_as_boost() {
        let user = history(&[(Role::User, "我需要一个buck-boost电源")]);
        assert_eq!(extract::extract(&user).topology, Topology::BuckBoost);

        let assistant = history(&[(Role::Assistant, "拓扑结构：Buck-Boost\n输出功率：300 W")]);
        assert_eq!(extract::extract(&assistant).topology, Topology::BuckBoost);
    }

    #[test]
    fn test_extract_assistant_overrides_user() {
        let msgs = history(&[
            (Role::User, "60V转120V，800W，降压"),
            (Role::Assistant, CONFIRMATION_SUMMARY),
        ]);
        let design = extract::extract(&msgs);
        assert_eq!(design.topology, Topology::Boost);
        assert_eq!(design.input_voltage, 48.0);
        assert_eq!(design.output_voltage, 100.0);
        assert_eq!(design.output_power, 500.0);
    }

    #[test]
    fn test_merge_policy_is_explicit() {
        let assistant = PartialDesign { output_power: Some(500.0), ..Default::default() };
        let user = PartialDesign { output_power: Some(800.0), ..Default::default() };

        let merged = MergePolicy::AssistantOverridesUser.merge(assistant.clone(), user.clone());
        assert_eq!(merged.output_power, Some(500.0));

        let merged = MergePolicy::UserOverridesAssistant.merge(assistant, user);
        assert_eq!(merged.output_power, Some(800.0));
    }

    #[test]
    fn test_missing_fields_reflect_conversation_not_defaults() {
        let msgs = history(&[(Role::User, "我想设计一个升压变换器")]);
        let design = extract::extract(&msgs);
        assert_eq!(design.missing_fields.len(), 3);
        assert_eq!(design.confidence, ExtractedDesign::LOW_CONFIDENCE);
        // Defaults still populate the numbers.
        assert_eq!(design.output_power, 500.0);

        let msgs = history(&[(Role::User, "升压，输出100V，功率300W，输入电压还没定")]);
        let design = extract::extract(&msgs);
        assert_eq!(design.missing_fields, vec![MissingField::InputVoltage, MissingField::OutputVoltage]);
    }

    #[test]
    fn test_confidence_tiers_ordered_by_missing_count() {
        let tiers: Vec<f64> = (0..=3).map(ExtractedDesign::confidence_for).collect();
        assert!(tiers[0] > tiers[1]);
        assert!(tiers[1] > tiers[2]);
        assert_eq!(tiers[2], tiers[3]);

        let one_missing = history(&[(Role::Assistant, "输入电压：48 V\n输出功率：500 W")]);
        let design = extract::extract(&one_missing);
        assert_eq!(design.missing_fields, vec![MissingField::OutputVoltage]);
        assert_eq!(design.confidence, ExtractedDesign::MEDIUM_CONFIDENCE);
    }

    #[test]
    fn test_extract_kilowatt_and_max_power() {
        let msgs = history(&[(Role::User, "先按200W设计，最终要到1.5kW")]);
        assert_eq!(extract::extract(&msgs).output_power, 1500.0);

        let msgs = history(&[(Role::User, "200W 或者 350W 都行")]);
        assert_eq!(extract::extract(&msgs).output_power, 350.0);
    }

    #[test]
    fn test_extract_thermal_and_frequency_rules() {
        let msgs = history(&[(
            Role::Assistant,
            "最高结温：110°C\n开关频率：100 kHz\n环境温度：60°C\n纹波要求：0.5%",
        )]);
        let design = extract::extract(&msgs);
        assert_eq!(design.max_junction_temp, Some(110.0));
        assert_eq!(design.switching_freq_min, Some(100_000.0));
        assert_eq!(design.max_ambient_temp, Some(60.0));
        assert_eq!(design.ripple_max, Some(0.5));
    }

    #[test]
    fn test_extract_priority_keywords() {
        let cost = history(&[(Role::User, "希望成本低一点")]);
        assert_eq!(extract::extract(&cost).priority, Priority::Cost);

        let volume = history(&[(Role::Assistant, "优化目标：体积优先")]);
        assert_eq!(extract::extract(&volume).priority, Priority::Volume);
    }

    #[test]
    fn test_extract_ignores_fullwidth_digits() {
        let ascii = history(&[(Role::User, SCENARIO_REQUEST)]);
        let baseline = extract::extract(&ascii);
        assert!(baseline.missing_fields.is_empty());

        let msgs = history(&[
            (Role::User, SCENARIO_REQUEST),
            (Role::User, "环境大概４０V左右的波动"),
        ]);
        let design = extract::extract(&msgs);
        assert!(design.missing_fields.is_empty());
        assert_eq!(design.confidence, ExtractedDesign::HIGH_CONFIDENCE);
        assert_eq!(design.input_voltage, 48.0);
        assert_eq!(design.output_voltage, 100.0);
        assert_eq!(design.output_power, 500.0);
    }

    #[test]
    fn test_unparseable_capture_skips_only_that_match() {
        let table = [rules::ExtractionRule {
            name: "unicode.power",
            source: rules::TextSource::User,
            field: rules::Field::OutputPower,
            precedence: 0,
            aggregate: rules::Aggregate::Max,
            pattern: r"(\d+)\s*W",
        }];
        let compiled = rules::compile(&table).unwrap();
        let partial = extract::scan(&compiled, rules::TextSource::User, "４０W 或者 300W").unwrap();
        assert_eq!(partial.output_power, Some(300.0));

        let partial = extract::scan(&compiled, rules::TextSource::User, "只有４０W").unwrap();
        assert_eq!(partial.output_power, None);
    }

    // ─── Normalizer Tests ────────────────────────────────────

    #[test]
    fn test_weights_by_priority() {
        let cost = weights_for(Priority::Cost);
        assert_eq!((cost.efficiency, cost.cost, cost.volume), (20.0, 60.0, 20.0));

        let balanced = weights_for(Priority::Balanced);
        for w in [balanced.efficiency, balanced.cost, balanced.volume] {
            assert!((w - 33.3).abs() < 0.05);
        }
    }

    #[test]
    fn test_normalize_defaults_and_sweep() {
        let params = normalize(&ExtractedDesign::default());
        assert_eq!(params.input_voltage_min, 41.0);
        assert_eq!(params.input_voltage_max, 55.0);
        assert_eq!(params.output_power_min, 425.0);
        assert_eq!(params.output_power_max, 575.0);
        assert_eq!(params.input_voltage_points, 4);
        assert_eq!(params.output_power_points, 5);
        assert_eq!(params.switching_frequency_hz, 50_000.0);
        assert_eq!(params.inductance_h, 20e-6);
        assert_eq!(params.max_ambient_temp, 50.0);
        assert_eq!(params.max_junction_temp, 125.0);
        assert_eq!(params.max_core_temp, 100.0);
        assert_eq!(params.ripple_percent, 1.0);
        assert_eq!(params.inductor_margin_ratio, 0.75);
    }

    #[test]
    fn test_normalize_keeps_extracted_values() {
        let extracted = extract::extract(&history(&[
            (Role::Assistant, RANGE_SUMMARY),
            (Role::Assistant, "开关频率：80kHz\n最高结温：150°C"),
        ]));
        let params = normalize(&extracted);
        assert_eq!((params.input_voltage_min, params.input_voltage_max), (40.0, 55.0));
        assert_eq!(params.switching_frequency_hz, 80_000.0);
        assert_eq!(params.max_junction_temp, 150.0);
    }

    #[test]
    fn test_normalize_total_over_extractor_outputs() {
        let cases = vec![
            Vec::new(),
            scenario_history(),
            history(&[(Role::User, "随便聊聊")]),
            history(&[(Role::User, "0V 0W")]),
        ];
        for msgs in cases {
            let params = normalize(&extract::extract(&msgs));
            for v in [
                params.input_voltage,
                params.input_voltage_min,
                params.input_voltage_max,
                params.output_voltage,
                params.output_power,
                params.switching_frequency_hz,
                params.ripple_percent,
            ] {
                assert!(v.is_finite() && v > 0.0);
            }
        }
    }

    #[test]
    fn test_sweep_bounds_explicit_wins() {
        assert_eq!(sweep_bounds(48.0, Some(36.0), Some(60.0)), (36.0, 60.0));
        assert_eq!(sweep_bounds(100.0, None, None), (85.0, 115.0));
    }

    // ─── Synthesizer Tests ───────────────────────────────────

    #[test]
    fn test_synth_efficiency_bounds() {
        let synth = MockSynthesizer::with_seed(1);
        let params = normalize(&ExtractedDesign::default());
        for _ in 0..200 {
            let r = synth.synthesize(&params);
            assert!(r.efficiency >= 98.2 && r.efficiency <= 98.7, "{}", r.efficiency);
            assert!(r.cost > 0.0 && r.volume > 0.0);
            let t = &r.thermal;
            assert!((85.0..=105.0).contains(&t.mosfet_junction));
            assert!((80.0..=95.0).contains(&t.diode_junction));
            assert!((70.0..=85.0).contains(&t.inductor_core));
            assert_eq!(t.mosfet_junction, t.mosfet_junction.round());
        }
    }

    #[test]
    fn test_synth_cost_and_volume_increase_with_power() {
        let synth = MockSynthesizer::new();
        for _ in 0..50 {
            let small = synth.synthesize(&sample_outcome(50.0).0);
            let large = synth.synthesize(&sample_outcome(5000.0).0);
            assert!(large.cost > small.cost);
            assert!(large.volume > small.volume);
        }
    }

    #[test]
    fn test_synth_power_tier_selects_mosfet() {
        let (_, low) = sample_outcome(200.0);
        assert_eq!(low.mosfet.part.model, "IPP60R099C6");
        assert_eq!(low.mosfet.part.quantity, 1);

        let (_, high) = sample_outcome(500.0);
        assert_eq!(high.mosfet.part.model, "IPP65R045C7");
        assert_eq!(high.mosfet.part.quantity, 2);
    }

    #[test]
    fn test_synth_seeded_is_reproducible() {
        let params = normalize(&ExtractedDesign::default());
        let a = MockSynthesizer::with_seed(9).synthesize(&params);
        let b = MockSynthesizer::with_seed(9).synthesize(&params);
        assert_eq!(a, b);
        assert_eq!(a.losses.total, 9.0);
        assert!(a.thermal.mosfet_junction >= 85.0 && a.thermal.mosfet_junction <= 105.0);
    }

    #[test]
    fn test_duty_ratio_by_topology() {
        assert!((duty_ratio(Topology::Boost, 48.0, 100.0) - 0.52).abs() < 1e-9);
        assert!((duty_ratio(Topology::Buck, 48.0, 12.0) - 0.25).abs() < 1e-9);
        assert!((duty_ratio(Topology::BuckBoost, 50.0, 50.0) - 0.5).abs() < 1e-9);
    }

    // ─── BOM Tests ───────────────────────────────────────────

    #[test]
    fn test_bom_total_equals_sum_of_lines() {
        for power in [50.0, 500.0, 5000.0] {
            let (params, result) = sample_outcome(power);
            let csv = bom::render_bom(&params, &result);
            let rows: Vec<Vec<String>> = csv.lines().map(split_csv).collect();
            assert_eq!(rows.len(), 8);

            let sum: f64 = rows[1..7].iter().map(|r| r[7].parse::<f64>().unwrap()).sum();
            let total = rows[7].last().unwrap().parse::<f64>().unwrap();
            assert_eq!(rows[7][6], "TOTAL");
            assert_eq!(format!("{:.2}", sum), format!("{:.2}", total));
        }
    }

    #[test]
    fn test_bom_rows_have_eight_fields() {
        let (params, result) = sample_outcome(500.0);
        let csv = bom::render_bom(&params, &result);
        for line in csv.lines() {
            assert_eq!(split_csv(line).len(), 8, "{}", line);
        }
        assert!(csv.starts_with("No.,Category,Part Number"));
        assert!(csv.contains("\"Vds=650V, Rds(on)=45mΩ\""));
    }

    #[test]
    fn test_bom_line_subtotals() {
        let (params, result) = sample_outcome(500.0);
        let lines = bom::bom_lines(&params, &result);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0].subtotal(), 17.0);
        assert_eq!(lines[3].category, "Input Cap");
        assert_eq!(lines[3].subtotal(), 4.2);
    }

    #[test]
    fn test_bom_bytes_carry_utf8_marker() {
        let (params, result) = sample_outcome(500.0);
        let bytes = bom::bom_bytes(&params, &result);
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(bom::csv_field("plain"), "plain");
        assert_eq!(bom::csv_field("a,b"), "\"a,b\"");
        assert_eq!(bom::csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    // ─── Document Report Tests ───────────────────────────────

    #[test]
    fn test_design_report_pages_and_footers() {
        let (params, result) = sample_outcome(500.0);
        let doc = report::design_report(&params, &result);
        assert_eq!(doc.page_count(), 3);
        assert!(doc.contains_text("Page 1 of 3"));
        assert!(doc.contains_text("Page 3 of 3"));
        assert!(doc.contains_text("DC/DC Boost Converter Design"));
        assert!(doc.contains_text("Vin Range: 41 - 55 V"));
        assert!(doc.contains_text("Efficiency Weight: 33.3%"));
        assert!(doc.contains_text(&format!("System Efficiency: {:.2}%", result.efficiency)));

        let boxes = doc.pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::RoundedRect { .. }))
            .count();
        assert_eq!(boxes, 3);
    }

    #[test]
    fn test_reports_are_deterministic() {
        let (params, result) = sample_outcome(800.0);
        for kind in ReportKind::all().iter().filter(|k| k.is_document()) {
            let a = report::build_document(*kind, &params, &result);
            let b = report::build_document(*kind, &params, &result);
            assert!(a.is_some());
            assert_eq!(a, b);
        }
        assert!(report::build_document(ReportKind::Bom, &params, &result).is_none());
    }

    #[test]
    fn test_component_reports_content() {
        let (params, result) = sample_outcome(500.0);

        let semi = report::semiconductor_report(&params, &result);
        assert!(semi.contains_text("Selected Part: IPP65R045C7"));
        assert!(semi.contains_text("Total MOSFET Loss: 4.00 W"));

        let inductor = report::inductor_report(&params, &result);
        assert!(inductor.contains_text("Target Inductance: 20 µH"));
        assert!(inductor.contains_text("Number of Turns: 20"));
        assert!(inductor.contains_text("Max Temperature Rise: 50°C"));

        let caps = report::capacitor_report(&params, &result);
        assert!(caps.contains_text("Part Number: EKY-500ELL471MK20S"));
        assert!(caps.contains_text("Ripple Voltage: ~0.70 Vpp"));
    }

    #[test]
    fn test_report_text_stays_on_page() {
        let (params, result) = sample_outcome(500.0);
        for kind in ReportKind::all().iter().filter(|k| k.is_document()) {
            let doc = report::build_document(*kind, &params, &result).unwrap();
            for page in &doc.pages {
                for op in &page.ops {
                    if let DrawOp::Text { y, .. } = op {
                        assert!(*y > 0.0 && *y < PAGE_HEIGHT_MM, "{:?} overflows", kind);
                    }
                }
            }
        }
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(48.0), "48");
        assert_eq!(num(33.3), "33.3");
        assert_eq!(num(0.75), "0.75");
        assert_eq!(num(0.15), "0.15");
    }

    #[test]
    fn test_export_all_in_order() {
        let (params, result) = sample_outcome(500.0);
        let renderer = MockRenderer::new(true);
        let files = block_on(report::export_all("PEC-AI", &params, &result, &renderer)).unwrap();

        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "PEC-AI_设计报告.pdf",
                "PEC-AI_物料清单(BOM).csv",
                "PEC-AI_半导体选型与热分析.pdf",
                "PEC-AI_磁性元件设计报告.pdf",
                "PEC-AI_电容选型报告.pdf",
            ]
        );
        assert_eq!(renderer.rendered.borrow().len(), 4);
        assert_eq!(files[1].mime_type, "text/csv;charset=utf-8");
    }

    #[test]
    fn test_export_rendering_unavailable_is_retryable() {
        let (params, result) = sample_outcome(500.0);
        let renderer = MockRenderer::new(false);

        let err = block_on(report::export_report(
            ReportKind::DesignReport,
            "PEC-AI",
            &params,
            &result,
            &renderer,
        ))
        .unwrap_err();
        assert!(matches!(err, PecError::RenderingUnavailable(_)));
        assert!(err.is_retryable());

        // CSV needs no renderer.
        let csv = block_on(report::export_report(ReportKind::Bom, "PEC-AI", &params, &result, &renderer));
        assert!(csv.is_ok());

        // Download-all stops at the first document.
        assert!(block_on(report::export_all("PEC-AI", &params, &result, &renderer)).is_err());
    }

    // ─── Trigger & State Machine Tests ───────────────────────

    #[test]
    fn test_trigger_lists() {
        assert!(triggers::is_asking_for_generation("请问是否需要我立即生成可下载的设计方案？"));
        assert!(triggers::is_asking_for_generation("是否需要现在为您生成报告"));
        assert!(!triggers::is_asking_for_generation("请告诉我输出功率"));

        assert!(triggers::wants_generation("好的，生成吧"));
        assert!(triggers::wants_generation("是的"));
        assert!(!triggers::wants_generation("再想想"));

        assert!(triggers::is_confirmation("确认，没问题"));
        assert!(triggers::is_confirmation("ok"));
        assert!(!triggers::is_confirmation("输出改成200V"));
    }

    #[test]
    fn test_state_machine_scenario() {
        let mut state = ConversationDesignState::new();
        let mut msgs = history(&[(Role::User, SCENARIO_REQUEST)]);

        assert!(state.on_user_message(SCENARIO_REQUEST).is_empty());
        msgs.push(ChatMessage::assistant(CONFIRMATION_SUMMARY));
        let t = state.on_assistant_reply(CONFIRMATION_SUMMARY, SCENARIO_REQUEST, &msgs, ChatMode::Design);
        assert_eq!(
            t,
            vec![
                Transition { from: DesignPhase::Idle, to: DesignPhase::ParamsConfirmed },
                Transition { from: DesignPhase::ParamsConfirmed, to: DesignPhase::AskingGeneration },
            ]
        );

        let t = state.on_user_message("好的，生成吧");
        assert_eq!(t, vec![Transition { from: DesignPhase::AskingGeneration, to: DesignPhase::DownloadRequested }]);
        assert!(state.download_requested());

        // The go-ahead reply mentions generation but changes nothing now.
        msgs.push(ChatMessage::user("好的，生成吧"));
        let reply = "好的，正在为您生成设计方案，请稍候...";
        msgs.push(ChatMessage::assistant(reply));
        assert!(state.on_assistant_reply(reply, "好的，生成吧", &msgs, ChatMode::Design).is_empty());
        assert_eq!(state.phase(), DesignPhase::DownloadRequested);
    }

    #[test]
    fn test_confirmation_needs_power_and_voltage() {
        let mut state = ConversationDesignState::new();
        let msgs = history(&[(Role::User, "确认")]);
        assert!(state.on_assistant_reply("好的。", "确认", &msgs, ChatMode::Design).is_empty());
        assert_eq!(state.phase(), DesignPhase::Idle);

        let msgs = history(&[
            (Role::User, "48V转100V，500W"),
            (Role::Assistant, "请确认以上参数"),
            (Role::User, "确认"),
        ]);
        let t = state.on_assistant_reply("参数已记录。", "确认", &msgs, ChatMode::Design);
        assert_eq!(t, vec![Transition { from: DesignPhase::Idle, to: DesignPhase::ParamsConfirmed }]);
    }

    #[test]
    fn test_confirmation_precedes_generation_request() {
        // "好的" is in both lists; while Idle it can only confirm.
        let mut state = ConversationDesignState::new();
        assert!(state.on_user_message("好的，生成吧").is_empty());
        assert_eq!(state.phase(), DesignPhase::Idle);

        // While asking, a confirmation word does not fall back to ParamsConfirmed.
        let msgs = scenario_history();
        state.on_assistant_reply(CONFIRMATION_SUMMARY, "x", &msgs, ChatMode::Design);
        assert!(state.is_asking_for_generation());
        assert!(state.on_assistant_reply("嗯", "确认", &msgs, ChatMode::Design).is_empty());
        assert!(state.is_asking_for_generation());
    }

    #[test]
    fn test_qa_mode_ignores_asking_phrase() {
        let mut state = ConversationDesignState::new();
        state.mark_design_generated();
        assert_eq!(state.mode(), ChatMode::Qa);
        let t = state.on_assistant_reply(CONFIRMATION_SUMMARY, "好的", &scenario_history(), state.mode());
        assert!(t.is_empty());
        assert_eq!(state.phase(), DesignPhase::Idle);
    }

    #[test]
    fn test_reset_clears_flags() {
        let mut state = ConversationDesignState::new();
        state.on_assistant_reply(CONFIRMATION_SUMMARY, "", &scenario_history(), ChatMode::Design);
        state.mark_design_generated();
        state.reset();
        assert_eq!(state, ConversationDesignState::new());
        assert_eq!(state.mode(), ChatMode::Design);
    }

    // ─── Text Helpers ────────────────────────────────────────

    #[test]
    fn test_clean_markdown() {
        let raw = "## 参数\n**输入电压**：48V\n- 项目一\n* 项目二\n使用 `PWM` 控制\n```\ncode\n```\n*斜体*";
        let cleaned = clean_markdown(raw);
        assert_eq!(cleaned, "参数\n输入电压：48V\n· 项目一\n· 项目二\n使用 PWM 控制\n\n斜体");
    }

    #[test]
    fn test_clean_markdown_keeps_summary_dividers() {
        assert_eq!(clean_markdown(CONFIRMATION_SUMMARY), CONFIRMATION_SUMMARY);
    }

    #[test]
    fn test_suggestions() {
        let msgs = history(&[(Role::Assistant, "请问您的输出功率是多少？")]);
        assert_eq!(suggest_replies(&msgs), vec!["输出功率 500W", "1kW", "200W"]);

        let msgs = history(&[(Role::Assistant, "是否需要我现在为您生成设计方案？")]);
        assert_eq!(suggest_replies(&msgs)[0], "好的，请生成方案");

        let msgs = history(&[(Role::User, "你好")]);
        assert!(suggest_replies(&msgs).is_empty());

        let msgs = history(&[(Role::User, "升压 48V转100V"), (Role::Assistant, "还需要什么信息呢？")]);
        assert_eq!(suggest_replies(&msgs), vec!["输出功率 500W"]);
    }

    #[test]
    fn test_design_summary_and_validity() {
        let extracted = extract::extract(&history(&[(Role::Assistant, RANGE_SUMMARY)]));
        let result = MockSynthesizer::with_seed(3).synthesize(&normalize(&extracted));
        let summary = design_summary(&extracted, &result);
        assert!(summary.starts_with("设计方案摘要"));
        assert!(summary.contains("- 拓扑结构: 升压变换器 (Boost)"));
        assert!(summary.contains("- 输入电压: 40V ~ 55V"));
        assert!(summary.contains("- 策略: 均衡设计"));
        assert!(has_valid_design(&extracted));
        assert!(!has_valid_design(&ExtractedDesign::default()));
    }

    // ─── Session Store Tests ─────────────────────────────────

    #[test]
    fn test_session_store_persists_and_reloads() {
        let storage = Rc::new(MemStore::default());
        block_on(async {
            let mut store = SessionStore::new(storage.clone(), HISTORY_STORAGE_KEY);
            store.load().await;
            assert!(store.current().is_none());

            store.append_messages([ChatMessage::user("第一个会话"), ChatMessage::assistant("好")]).await;
            let first = store.current_id().unwrap().to_string();
            store.create_session().await;
            store.append_message(ChatMessage::user("第二个会话")).await;
            let second = store.current_id().unwrap().to_string();
            assert_ne!(first, second);
            assert_eq!(store.sessions()[0].id, second);

            let mut reloaded = SessionStore::new(storage.clone(), HISTORY_STORAGE_KEY);
            reloaded.load().await;
            assert_eq!(reloaded.sessions(), store.sessions());
            assert_eq!(reloaded.current_id(), Some(second.as_str()));
            assert_eq!(reloaded.current().unwrap().title, "第二个会话");
        });
    }

    #[test]
    fn test_session_store_corrupt_history_is_empty() {
        let storage = Rc::new(MemStore::default());
        block_on(async {
            storage.set(HISTORY_STORAGE_KEY, b"{not json").await.unwrap();
            let mut store = SessionStore::new(storage.clone(), HISTORY_STORAGE_KEY);
            store.load().await;
            assert!(store.sessions().is_empty());
            assert!(store.messages().is_empty());
        });
    }

    #[test]
    fn test_session_store_survives_broken_storage() {
        block_on(async {
            let mut store = SessionStore::new(Rc::new(BrokenStore), HISTORY_STORAGE_KEY);
            store.load().await;
            assert!(store.sessions().is_empty());

            store.append_message(ChatMessage::user("仍然可以聊天")).await;
            assert_eq!(store.messages().len(), 1);
            store.clear_all().await;
            assert!(store.sessions().is_empty());
        });
    }

    #[test]
    fn test_session_store_switch_and_delete() {
        let storage = Rc::new(MemStore::default());
        block_on(async {
            let mut store = SessionStore::new(storage.clone(), HISTORY_STORAGE_KEY);
            let a = store.create_session().await;
            let b = store.create_session().await;
            let c = store.create_session().await;

            assert!(matches!(store.switch_session("missing"), Err(PecError::SessionNotFound(_))));
            store.switch_session(&a).unwrap();
            assert_eq!(store.current_id(), Some(a.as_str()));

            // Deleting the current session selects the first remaining one.
            store.delete_session(&a).await.unwrap();
            assert_eq!(store.current_id(), Some(c.as_str()));

            // Deleting another session leaves the selection alone.
            store.delete_session(&b).await.unwrap();
            assert_eq!(store.current_id(), Some(c.as_str()));
            assert!(store.delete_session(&b).await.is_err());

            store.clear_all().await;
            assert!(storage.get(HISTORY_STORAGE_KEY).await.unwrap().is_none());
            assert!(store.current().is_none());
        });
    }

    #[test]
    fn test_session_store_grouping() {
        let storage = Rc::new(MemStore::default());
        block_on(async {
            let mut store = SessionStore::new(storage, HISTORY_STORAGE_KEY);
            store.create_session().await;
            let groups = store.grouped(Utc::now() + Duration::days(10));
            assert_eq!(groups.within_30_days.len(), 1);
            assert!(groups.within_7_days.is_empty());
        });
    }

    // ─── Runtime Tests ───────────────────────────────────────

    #[test]
    fn test_runtime_design_conversation_end_to_end() {
        let storage = Rc::new(MemStore::default());
        let (mut runtime, bus) = runtime_with(storage.clone());
        let chat = ScriptedChat::new(vec![
            vec![
                ChatStreamEvent::ReasoningDelta("用户需要升压".to_string()),
                ChatStreamEvent::ContentDelta("设计参数确认\n".to_string()),
                ChatStreamEvent::ContentDelta(
                    CONFIRMATION_SUMMARY.trim_start_matches("设计参数确认\n").to_string(),
                ),
                ChatStreamEvent::Done,
            ],
            ScriptedChat::text("好的，正在为您生成设计方案，请稍候..."),
            ScriptedChat::text("可以换成 IPP60R040C7，导通损耗略低。"),
        ]);

        block_on(async {
            runtime.load().await;
            runtime.send(SCENARIO_REQUEST, &chat, registration()).await.unwrap();
            runtime.send("好的，生成吧", &chat, registration()).await.unwrap();
        });

        let events = bus.drain();
        assert_eq!(
            phase_changes(&events),
            vec![
                (DesignPhase::Idle, DesignPhase::ParamsConfirmed),
                (DesignPhase::ParamsConfirmed, DesignPhase::AskingGeneration),
                (DesignPhase::AskingGeneration, DesignPhase::DownloadRequested),
            ]
        );
        assert!(events.iter().any(|e| matches!(e, ChatEvent::ReasoningDelta { .. })));

        let extracted = extract::extract(runtime.messages());
        assert_eq!(extracted.topology, Topology::Boost);
        assert!((extracted.input_voltage - 48.0).abs() < 1e-9);
        assert_eq!(extracted.output_voltage, 100.0);
        assert_eq!(extracted.output_power, 500.0);
        assert!(extracted.missing_fields.is_empty());

        let first_reply = &runtime.messages()[1];
        assert_eq!(first_reply.reasoning.as_deref(), Some("用户需要升压"));
        assert!(first_reply.thinking_secs.is_some());

        assert!(runtime.design_state().download_requested());
        let outcome = runtime.generate_design().clone();
        assert!(outcome.result.efficiency >= 98.2 && outcome.result.efficiency <= 98.7);
        assert_eq!(runtime.design_state().phase(), DesignPhase::Idle);
        assert_eq!(runtime.mode(), ChatMode::Qa);
        let events = bus.drain();
        assert!(events.iter().any(|e| matches!(e, ChatEvent::DesignReady { .. })));

        // Later turns carry the design context.
        block_on(runtime.send("MOSFET 可以换成什么型号？", &chat, registration())).unwrap();
        let requests = chat.requests.borrow();
        let last = requests.last().unwrap();
        assert_eq!(last.mode, ChatMode::Qa);
        assert_eq!(last.design_context.as_deref(), Some(outcome.summary.as_str()));
        assert!(last.system_prompt.contains("【当前设计方案详情】"));
        assert_eq!(requests[0].mode, ChatMode::Design);
        assert_eq!(runtime.messages().len(), 6);
        assert_eq!(runtime.design_state().phase(), DesignPhase::Idle);

        let files = block_on(runtime.export_all(&MockRenderer::new(true))).unwrap();
        assert_eq!(files.len(), 5);
    }

    #[test]
    fn test_runtime_rejects_send_while_busy() {
        let (mut runtime, bus) = runtime_with(Rc::new(MemStore::default()));
        let chat = ScriptedChat::new(vec![ScriptedChat::text("hi")]);

        let gate = runtime.gate();
        let permit = gate.try_acquire().unwrap();
        let err = block_on(runtime.send("你好", &chat, registration())).unwrap_err();
        assert_eq!(err, PecError::Busy);
        assert!(runtime.messages().is_empty());
        assert!(chat.requests.borrow().is_empty());
        assert!(bus.drain().is_empty());

        drop(permit);
        block_on(runtime.send("你好", &chat, registration())).unwrap();
        assert_eq!(runtime.messages().len(), 2);
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_runtime_cancellation_commits_nothing() {
        let storage = Rc::new(MemStore::default());
        let (mut runtime, bus) = runtime_with(storage.clone());
        let chat = ScriptedChat::new(vec![ScriptedChat::text("不会送达")]);

        let (handle, reg) = AbortHandle::new_pair();
        handle.abort();
        let err = block_on(runtime.send("你好", &chat, reg)).unwrap_err();
        assert_eq!(err, PecError::Cancelled);
        assert!(runtime.messages().is_empty());
        assert_eq!(storage.writes.get(), 0);
        assert!(bus.drain().iter().any(|e| matches!(e, ChatEvent::TurnCancelled { .. })));
        assert_eq!(runtime.last_failed_input(), Some("你好"));
    }

    #[test]
    fn test_runtime_stream_error_discards_partial_and_retries() {
        let storage = Rc::new(MemStore::default());
        let (mut runtime, bus) = runtime_with(storage.clone());
        let chat = ScriptedChat::new(vec![
            vec![
                ChatStreamEvent::ContentDelta("写到一半".to_string()),
                ChatStreamEvent::Error("connection reset".to_string()),
            ],
            ScriptedChat::text("完整回复"),
        ]);

        let err = block_on(runtime.send("你好", &chat, registration())).unwrap_err();
        assert!(matches!(err, PecError::Llm(_)));
        assert!(runtime.messages().is_empty());
        let failed = bus.drain().into_iter().find_map(|e| match e {
            ChatEvent::TurnFailed { retryable, .. } => Some(retryable),
            _ => None,
        });
        assert_eq!(failed, Some(true));

        block_on(runtime.retry(&chat, registration())).unwrap();
        let msgs = runtime.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "你好");
        assert_eq!(msgs[1].content, "完整回复");
        assert!(runtime.last_failed_input().is_none());
    }

    #[test]
    fn test_runtime_retry_resends_last_user_message() {
        let (mut runtime, _bus) = runtime_with(Rc::new(MemStore::default()));
        let chat = ScriptedChat::new(vec![
            ScriptedChat::text("第一版"),
            ScriptedChat::text("第二版"),
        ]);
        block_on(runtime.send("问题", &chat, registration())).unwrap();
        block_on(runtime.retry(&chat, registration())).unwrap();

        let msgs = runtime.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].content, "第二版");
    }

    #[test]
    fn test_runtime_cancelled_retry_keeps_stored_exchange() {
        let storage = Rc::new(MemStore::default());
        let (mut runtime, _bus) = runtime_with(storage.clone());
        let chat = ScriptedChat::new(vec![
            ScriptedChat::text("第一版"),
            ScriptedChat::text("被取消"),
            ScriptedChat::text("第二版"),
        ]);
        block_on(runtime.send("问题", &chat, registration())).unwrap();
        let writes = storage.writes.get();

        let (handle, reg) = AbortHandle::new_pair();
        handle.abort();
        let err = block_on(runtime.retry(&chat, reg)).unwrap_err();
        assert_eq!(err, PecError::Cancelled);
        assert_eq!(runtime.messages().len(), 2);
        assert_eq!(runtime.messages()[1].content, "第一版");
        assert_eq!(storage.writes.get(), writes);

        let (mut reloaded, _bus) = runtime_with(storage.clone());
        block_on(reloaded.load());
        assert_eq!(reloaded.messages().len(), 2);

        // Retrying again replays the same exchange on the earlier history.
        block_on(runtime.retry(&chat, registration())).unwrap();
        let msgs = runtime.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "问题");
        assert_eq!(msgs[1].content, "第二版");
        let requests = chat.requests.borrow();
        assert_eq!(requests.last().unwrap().messages.len(), 1);
    }

    #[test]
    fn test_runtime_cancelled_generation_request_restores_phase() {
        let (mut runtime, bus) = runtime_with(Rc::new(MemStore::default()));
        let chat = ScriptedChat::new(vec![ScriptedChat::text(CONFIRMATION_SUMMARY)]);
        block_on(runtime.send(SCENARIO_REQUEST, &chat, registration())).unwrap();
        assert!(runtime.design_state().is_asking_for_generation());
        bus.drain();

        let (handle, reg) = AbortHandle::new_pair();
        handle.abort();
        let err = block_on(runtime.send("好的，生成吧", &chat, reg)).unwrap_err();
        assert_eq!(err, PecError::Cancelled);
        assert!(!runtime.design_state().download_requested());
        assert!(runtime.design_state().is_asking_for_generation());
        assert_eq!(runtime.mode(), ChatMode::Design);
        assert_eq!(
            phase_changes(&bus.drain()),
            vec![
                (DesignPhase::AskingGeneration, DesignPhase::DownloadRequested),
                (DesignPhase::DownloadRequested, DesignPhase::AskingGeneration),
            ]
        );
    }

    #[test]
    fn test_stop_slot_aborts_only_the_armed_exchange() {
        let slot = StopSlot::default();
        assert!(!slot.stop());

        let (mut runtime, _bus) = runtime_with(Rc::new(MemStore::default()));
        let chat = ScriptedChat::new(vec![ScriptedChat::text("不会送达")]);
        let reg = slot.arm();
        assert!(slot.is_armed());
        assert!(slot.clone().stop());
        let err = block_on(runtime.send("你好", &chat, reg)).unwrap_err();
        assert_eq!(err, PecError::Cancelled);
        assert!(!slot.is_armed());

        let reg = slot.arm();
        slot.disarm();
        assert!(!slot.stop());
        let chat = ScriptedChat::new(vec![ScriptedChat::text("送达")]);
        block_on(runtime.retry(&chat, reg)).unwrap();
        assert_eq!(runtime.messages().len(), 2);
    }

    #[test]
    fn test_runtime_empty_reply_is_error() {
        let (mut runtime, _bus) = runtime_with(Rc::new(MemStore::default()));
        let chat = ScriptedChat::new(vec![vec![
            ChatStreamEvent::ReasoningDelta("思考".to_string()),
            ChatStreamEvent::Done,
        ]]);
        let err = block_on(runtime.send("你好", &chat, registration())).unwrap_err();
        assert_eq!(err, PecError::EmptyResponse);
        assert!(runtime.messages().is_empty());
    }

    #[test]
    fn test_runtime_non_streaming_mode() {
        let (mut runtime, bus) = runtime_with(Rc::new(MemStore::default()));
        runtime.config.llm.stream = false;
        let chat = ScriptedChat::new(vec![ScriptedChat::text("**加粗**回复")]);

        block_on(runtime.send("你好", &chat, registration())).unwrap();
        assert_eq!(runtime.messages()[1].content, "加粗回复");
        assert!(!bus.drain().iter().any(|e| matches!(e, ChatEvent::ContentDelta { .. })));
    }

    #[test]
    fn test_runtime_new_chat_resets_design_state() {
        let (mut runtime, _bus) = runtime_with(Rc::new(MemStore::default()));
        let chat = ScriptedChat::new(vec![ScriptedChat::text(CONFIRMATION_SUMMARY)]);
        block_on(runtime.send(SCENARIO_REQUEST, &chat, registration())).unwrap();
        assert!(runtime.design_state().is_asking_for_generation());

        let first = runtime.sessions().current_id().unwrap().to_string();
        block_on(runtime.new_chat()).unwrap();
        assert_eq!(runtime.design_state().phase(), DesignPhase::Idle);
        assert!(runtime.messages().is_empty());
        assert!(runtime.outcome().is_none());

        runtime.switch_session(&first).unwrap();
        assert_eq!(runtime.messages().len(), 2);
        assert_eq!(runtime.design_state().phase(), DesignPhase::Idle);
    }

    #[test]
    fn test_runtime_export_requires_design() {
        let (runtime, _bus) = runtime_with(Rc::new(MemStore::default()));
        let err = block_on(runtime.export(ReportKind::Bom, &MockRenderer::new(true))).unwrap_err();
        assert!(matches!(err, PecError::Other(_)));
    }
}
