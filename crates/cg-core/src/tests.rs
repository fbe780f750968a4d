//! Unit tests for cg-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, ChannelId, LinkId};

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert_eq!(ChannelId::default(), ChannelId::INVALID);
    }

    #[test]
    fn offset_and_display() {
        assert_eq!(LinkId(100).checked_offset(2), Some(LinkId(102)));
        assert_eq!(ChannelId(u32::MAX - 2).checked_offset(1), Some(ChannelId(u32::MAX - 1)));
        assert_eq!(ChannelId(u32::MAX - 1).checked_offset(1), None);
        assert_eq!(LinkId(u32::MAX).checked_offset(1), None);
        assert_eq!(ChannelId(7).to_string(), "ChannelId(7)");
    }
}

#[cfg(test)]
mod schedule {
    use crate::ScheduleMetadata;

    #[test]
    fn cyclic_requires_positive_cycle_time() {
        assert!(ScheduleMetadata::new(false, 1, 0, 0, 0).is_err());
        assert!(ScheduleMetadata::new(false, 1, 0, 0, -100).is_err());
        let ok = ScheduleMetadata::new(false, 1, 10, 20, 100).unwrap();
        assert_eq!(ok.cycle_time(), 100);
        assert_eq!(ok.offset_time(), 10);
        assert_eq!(ok.response_time(), 20);
    }

    #[test]
    fn init_forces_zero_timing() {
        let m = ScheduleMetadata::new(true, 5, 10, 20, 100).unwrap();
        assert!(m.is_init());
        assert_eq!(m.priority(), 5);
        assert_eq!((m.offset_time(), m.response_time(), m.cycle_time()), (0, 0, 0));
    }
}

#[cfg(test)]
mod parameters {
    use crate::{CoreError, NormalDistribution, ParameterSet, ParameterValue};

    #[test]
    fn typed_getters() {
        let set = ParameterSet::new()
            .with("Type", "AlgorithmAgentFollowingDriverModel")
            .with("Id", 3)
            .with("Latency", 0.1)
            .with("Enabled", true);
        assert_eq!(set.string("Type").unwrap(), "AlgorithmAgentFollowingDriverModel");
        assert_eq!(*set.int("Id").unwrap(), 3);
        assert_eq!(*set.double("Latency").unwrap(), 0.1);
        assert!(*set.bool("Enabled").unwrap());
    }

    #[test]
    fn missing_and_mistyped() {
        let set = ParameterSet::new().with("Id", 3);
        assert!(matches!(set.string("Type"), Err(CoreError::MissingParameter(k)) if k == "Type"));
        assert!(matches!(
            set.double("Id"),
            Err(CoreError::ParameterType { expected: "double", found: "int", .. })
        ));
    }

    #[test]
    fn insert_replaces() {
        let mut set = ParameterSet::new().with("Latency", 0.0);
        let old = set.insert("Latency", 0.25);
        assert_eq!(old, Some(ParameterValue::Double(0.0)));
        assert_eq!(*set.double("Latency").unwrap(), 0.25);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn nested_list() {
        let link = ParameterSet::new().with("SensorId", 0).with("InputId", "Camera");
        let set = ParameterSet::new().with("SensorLinks", vec![link.clone()]);
        assert_eq!(set.list("SensorLinks").unwrap(), &vec![link]);
    }

    #[test]
    fn distribution_validation() {
        assert!(NormalDistribution::new(1.0, -1.0, 0.0, 2.0).is_err());
        assert!(NormalDistribution::new(1.0, 1.0, 3.0, 2.0).is_err());
        let d = NormalDistribution::new(1.0, 0.5, 0.0, 2.0).unwrap();
        assert_eq!(d.clamp(5.0), 2.0);
        assert!(d.contains(0.0));
    }
}

#[cfg(test)]
mod stochastics {
    use crate::{SimStochastics, Stochastics};

    #[test]
    fn same_seed_same_sequence() {
        let a = SimStochastics::new(42);
        let b = SimStochastics::new(42);
        for _ in 0..10 {
            assert_eq!(a.uniform(0.0, 1.0), b.uniform(0.0, 1.0));
        }
    }

    #[test]
    fn reseed_restarts_sequence() {
        let s = SimStochastics::new(7);
        let first = s.normal(0.0, 1.0);
        s.uniform(0.0, 1.0);
        s.init_generator(7);
        assert_eq!(s.normal(0.0, 1.0), first);
        assert_eq!(s.seed(), 7);
    }

    #[test]
    fn uniform_within_bounds() {
        let s = SimStochastics::new(1);
        for _ in 0..1_000 {
            let v = s.uniform(2.0, 3.0);
            assert!((2.0..3.0).contains(&v), "got {v}");
        }
    }

    #[test]
    fn degenerate_inputs() {
        let s = SimStochastics::new(1);
        assert_eq!(s.normal(4.0, 0.0), 4.0);
        assert_eq!(s.uniform(1.0, 1.0), 1.0);
        assert!(s.exponential(0.0).is_infinite());
    }

    #[test]
    fn normal_mean_roughly_right() {
        let s = SimStochastics::new(3);
        let n = 20_000;
        let mean: f64 = (0..n).map(|_| s.normal(10.0, 2.0)).sum::<f64>() / n as f64;
        assert!((mean - 10.0).abs() < 0.1, "got {mean}");
    }
}

#[cfg(test)]
mod run_result {
    use crate::{AgentId, RunResult, RunStatus, SimTime};

    #[test]
    fn collisions_recorded_once() {
        let mut r = RunResult::new();
        assert_eq!(r.status(), RunStatus::Running);
        r.add_collision(AgentId(1));
        r.add_collision(AgentId(1));
        assert!(r.is_collision());
        assert_eq!(r.collision_ids(), &[AgentId(1)]);
    }

    #[test]
    fn finish_keeps_end_condition_time() {
        let mut r = RunResult::new();
        r.set_end_condition(SimTime(500));
        r.finish(SimTime(1000));
        assert_eq!(r.end_time(), Some(SimTime(500)));
        assert!(r.is_end_condition());
    }
}

#[cfg(test)]
mod signal {
    use crate::{Signal, ValueSignal};

    #[test]
    fn downcast_value_signal() {
        let s: Signal = ValueSignal::shared(3.5_f64);
        assert_eq!(s.kind(), "ValueSignal");
        assert_eq!(s.downcast_ref::<ValueSignal<f64>>().unwrap().value, 3.5);
        assert!(s.downcast_ref::<ValueSignal<i32>>().is_none());
    }
}
