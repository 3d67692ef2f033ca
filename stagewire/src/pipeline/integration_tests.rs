//! End-to-end tests for wiring, propagation and aggregation.

#[cfg(test)]
mod tests {
    use crate::core::StageKind;
    use crate::errors::{PipelineError, TransformError};
    use crate::events::CollectingEventSink;
    use crate::monitor::Monitor;
    use crate::pipeline::{message_pipeline, PipelineBuilder};
    use crate::stages::{FnTransform, Stage, Transform};
    use crate::testing::{
        ConstTransform, EchoTransform, FailOnTransform, FailingSetupTransform, SlowTransform,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn stage<T: Transform>(transform: T) -> Arc<Stage<T>> {
        Arc::new(Stage::new(transform))
    }

    #[tokio::test]
    async fn test_three_stage_scenario() {
        let monitor = Arc::new(Monitor::new());
        let orchestrator = PipelineBuilder::new(stage(EchoTransform::new("A")))
            .then(stage(FailOnTransform::new("B", "bad", "ValueError")))
            .then(stage(ConstTransform::<String, bool>::new("C", true)))
            .with_monitor(monitor.clone())
            .build();

        assert_eq!(orchestrator.completed(), 0);
        assert_eq!(orchestrator.not_completed(), 0);

        orchestrator.initialize().await.unwrap();

        let mut failures = 0;
        for input in ["ok1", "bad", "ok2"] {
            if let Err(e) = orchestrator.submit(input.to_string()).await {
                assert!(matches!(e, PipelineError::Handle(ref h) if h.stage == "B"));
                failures += 1;
            }
        }

        assert_eq!(failures, 1);
        assert_eq!(monitor.success_count("A.handle"), 3);
        assert_eq!(monitor.success_count("B.handle"), 2);
        assert_eq!(monitor.error_count("B.handle"), 1);
        assert_eq!(monitor.error_kind_count("B.handle", "ValueError"), 1);
        assert_eq!(monitor.success_count("C.handle"), 2);
        assert_eq!(monitor.error_count("A.handle"), 0);
        assert_eq!(orchestrator.completed(), 2);
        assert_eq!(orchestrator.not_completed(), 0);
    }

    #[tokio::test]
    async fn test_completion_counters_split_truthy_and_falsy() {
        let orchestrator = PipelineBuilder::new(stage(FnTransform::new(
            "judge",
            |n: u32| Ok(n % 3 == 0),
        )))
        .build();

        assert_eq!(orchestrator.completed(), 0);
        assert_eq!(orchestrator.not_completed(), 0);

        orchestrator.initialize().await.unwrap();
        for n in 0..9 {
            orchestrator.submit(n).await.unwrap();
        }

        // 0, 3, 6 are truthy
        assert_eq!(orchestrator.completed(), 3);
        assert_eq!(orchestrator.not_completed(), 6);
        assert_eq!(orchestrator.counters().total(), 9);
    }

    #[tokio::test]
    async fn test_option_outcome() {
        let orchestrator = PipelineBuilder::new(stage(FnTransform::new(
            "maybe",
            |s: String| Ok(s.parse::<i64>().ok()),
        )))
        .build();
        orchestrator.initialize().await.unwrap();

        orchestrator.submit("12".to_string()).await.unwrap();
        orchestrator.submit("twelve".to_string()).await.unwrap();

        assert_eq!(orchestrator.completed(), 1);
        assert_eq!(orchestrator.not_completed(), 1);
    }

    #[tokio::test]
    async fn test_success_counts_match_invocations() {
        let monitor = Arc::new(Monitor::with_capacity(10));
        let orchestrator = PipelineBuilder::new(stage(EchoTransform::new("only")))
            .then(stage(ConstTransform::<String, bool>::new("end", true)))
            .with_monitor(monitor.clone())
            .build();
        orchestrator.initialize().await.unwrap();

        for i in 0..25 {
            orchestrator.submit(format!("unit-{i}")).await.unwrap();
        }

        assert_eq!(monitor.success_count("only.handle"), 25);
        assert_eq!(monitor.retained_samples("only.handle").len(), 10);
        assert_eq!(orchestrator.completed(), 25);
    }

    #[tokio::test]
    async fn test_failures_count_per_kind() {
        let monitor = Arc::new(Monitor::new());
        let orchestrator = PipelineBuilder::new(stage(FailOnTransform::new(
            "gate", "reject", "PolicyError",
        )))
        .then(stage(ConstTransform::<String, bool>::new("end", true)))
        .with_monitor(monitor.clone())
        .build();
        orchestrator.initialize().await.unwrap();

        for _ in 0..4 {
            assert!(orchestrator.submit("reject".to_string()).await.is_err());
        }

        assert_eq!(monitor.error_count("gate.handle"), 4);
        assert_eq!(monitor.error_kind_count("gate.handle", "PolicyError"), 4);
        assert_eq!(monitor.success_count("end.handle"), 0);
        assert_eq!(orchestrator.completed(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_reset_window() {
        let monitor = Arc::new(Monitor::new());
        let orchestrator = PipelineBuilder::new(stage(SlowTransform::new(
            "slow",
            Duration::from_millis(2),
        )))
        .then(stage(ConstTransform::<String, bool>::new("end", true)))
        .with_monitor(monitor.clone())
        .build();
        orchestrator.initialize().await.unwrap();

        for i in 0..5 {
            orchestrator.submit(i.to_string()).await.unwrap();
        }

        let snapshot = monitor.snapshot();
        let slow = snapshot.get("slow.handle").unwrap();
        assert_eq!(slow.success_count, 5);
        assert!(slow.latency.p50 >= 0.002);
        assert!(slow.latency.p50 <= slow.latency.p95);
        assert!(slow.latency.p95 <= slow.latency.p99);

        monitor.reset();
        let after = monitor.snapshot();
        assert_eq!(after.success_count("slow.handle"), 0);
        assert!(after.get("slow.handle").is_none());
    }

    #[tokio::test]
    async fn test_multiple_sinks_receive_events() {
        let monitor = Arc::new(Monitor::new());
        let collector = Arc::new(CollectingEventSink::new());
        let orchestrator = PipelineBuilder::new(stage(EchoTransform::new("A")))
            .then(stage(FailOnTransform::new("B", "bad", "ValueError")))
            .then(stage(ConstTransform::<String, bool>::new("C", true)))
            .with_monitor(monitor.clone())
            .with_sink(collector.clone())
            .build();
        orchestrator.initialize().await.unwrap();

        orchestrator.submit("ok".to_string()).await.unwrap();
        let _ = orchestrator.submit("bad".to_string()).await;

        assert_eq!(collector.successes().len(), 4);
        assert_eq!(collector.errors().len(), 1);
        assert_eq!(collector.successes_for("C").len(), 1);
        assert_eq!(monitor.snapshot().total_successes(), 4);
    }

    #[tokio::test]
    async fn test_wire_is_idempotent() {
        let collector = Arc::new(CollectingEventSink::new());
        let first = stage(EchoTransform::new("A"));
        let orchestrator = PipelineBuilder::new(first.clone())
            .then(stage(ConstTransform::<String, bool>::new("B", true)))
            .with_sink(collector.clone())
            .build();

        assert!(!orchestrator.is_wired());
        orchestrator.wire();
        orchestrator.wire();
        orchestrator.initialize().await.unwrap();
        assert!(orchestrator.is_wired());
        assert_eq!(first.handled_subscribers(), 1);

        orchestrator.submit("x".to_string()).await.unwrap();
        assert_eq!(collector.successes().len(), 2);
        assert_eq!(orchestrator.completed(), 1);
    }

    #[tokio::test]
    async fn test_submit_before_initialize_is_rejected() {
        let orchestrator =
            PipelineBuilder::new(stage(ConstTransform::<String, bool>::new("A", true))).build();

        let err = orchestrator.submit("x".to_string()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotInitialized));
        assert_eq!(orchestrator.completed(), 0);
    }

    #[tokio::test]
    async fn test_initialize_aborts_naming_failing_stage() {
        let monitor = Arc::new(Monitor::new());
        let orchestrator = PipelineBuilder::new(stage(EchoTransform::new("A")))
            .then(stage(FailingSetupTransform::new("B", "socket unavailable")))
            .then(stage(ConstTransform::<String, bool>::new("C", true)))
            .with_monitor(monitor)
            .build();

        let err = orchestrator.initialize().await.unwrap_err();
        match err {
            PipelineError::Init(init) => {
                assert_eq!(init.stage, "B");
                assert!(init.message.contains("socket unavailable"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!orchestrator.is_initialized());
        assert!(!orchestrator.is_wired());
    }

    #[tokio::test]
    async fn test_message_pipeline_end_to_end() {
        let monitor = Arc::new(Monitor::new());
        let pipeline = message_pipeline(monitor.clone(), Vec::new());
        let orchestrator = &pipeline.orchestrator;

        assert_eq!(
            orchestrator.stage_names(),
            vec!["ingest", "process", "metrics", "export"]
        );

        orchestrator.initialize().await.unwrap();
        assert!(pipeline.export.transform().is_running());

        let inputs = [
            r#"{"id": 1, "type": "event", "data": "first message"}"#,
            r#"{"id": 4, "type": "metric", "value": 42}"#,
            "not json",
            "[1, 2]",
        ];
        for input in inputs {
            let _ = orchestrator.submit(input.to_string()).await;
        }

        assert_eq!(monitor.success_count("ingest.handle"), 3);
        assert_eq!(monitor.error_kind_count("ingest.handle", "ParseError"), 1);
        assert_eq!(monitor.success_count("process.handle"), 2);
        assert_eq!(monitor.error_kind_count("process.handle", "ValueError"), 1);
        assert_eq!(monitor.success_count("export.handle"), 2);
        assert_eq!(orchestrator.completed(), 2);
        assert_eq!(pipeline.export.transform().exported(), 2);

        let last = pipeline.export.transform().last_exported().unwrap();
        assert_eq!(last.message_type.as_deref(), Some("metric"));
        assert_eq!(last.values.get("value"), Some(&42.0));

        orchestrator.shutdown().await;
        assert!(!pipeline.export.transform().is_running());
    }

    #[tokio::test]
    async fn test_kind_is_visible_through_stage() {
        let export = stage(
            FnTransform::new("sink", |_: String| Ok::<_, TransformError>(true))
                .with_kind(StageKind::Export),
        );
        assert_eq!(export.transform().kind(), StageKind::Export);

        let orchestrator = PipelineBuilder::new(export.clone()).build();
        orchestrator.initialize().await.unwrap();
        orchestrator.submit("x".to_string()).await.unwrap();
        assert_eq!(orchestrator.completed(), 1);
    }
}
