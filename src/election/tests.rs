#[cfg(test)]
mod tests {
    use crate::config::Timings;
    use crate::election::engine::{ElectionEngine, ElectionOutcome, ElectionPhase, ElectionReaction};
    use crate::membership::types::PeerId;
    use std::time::{Duration, Instant};

    fn engine() -> ElectionEngine {
        ElectionEngine::new(&Timings::default())
    }

    #[test]
    fn test_start_arms_decision_deadline() {
        let mut engine = engine();
        let t0 = Instant::now();

        assert!(engine.start(t0));
        assert_eq!(
            engine.phase(),
            ElectionPhase::Electing {
                started_at: t0,
                decide_at: t0 + Duration::from_secs(3)
            }
        );
        assert_eq!(engine.rounds_started(), 1);
    }

    #[test]
    fn test_start_is_noop_while_electing() {
        let mut engine = engine();
        let t0 = Instant::now();

        assert!(engine.start(t0));
        assert!(!engine.start(t0 + Duration::from_secs(1)));
        assert_eq!(engine.rounds_started(), 1);
    }

    #[test]
    fn test_victory_only_after_deadline() {
        let mut engine = engine();
        let t0 = Instant::now();
        engine.start(t0);

        assert_eq!(engine.poll(t0 + Duration::from_millis(2999)), ElectionOutcome::Pending);
        assert_eq!(engine.poll(t0 + Duration::from_secs(3)), ElectionOutcome::Victory);
        assert_eq!(engine.phase(), ElectionPhase::Idle);
        assert_eq!(
            engine.poll(t0 + Duration::from_secs(10)),
            ElectionOutcome::Pending,
            "The deadline fires once"
        );
    }

    #[test]
    fn test_higher_candidate_makes_us_yield() {
        let mut engine = engine();
        let me = PeerId::from("m");
        let t0 = Instant::now();
        engine.start(t0);

        let reaction = engine.on_election(&me, &PeerId::from("z"), t0);

        assert_eq!(reaction, ElectionReaction::Yield);
        assert!(!engine.is_electing());
        assert_eq!(engine.poll(t0 + Duration::from_secs(3)), ElectionOutcome::Pending);
    }

    #[test]
    fn test_lower_candidate_triggers_competition_when_idle() {
        let mut engine = engine();
        let me = PeerId::from("m");

        assert_eq!(
            engine.on_election(&me, &PeerId::from("a"), Instant::now()),
            ElectionReaction::Compete
        );
    }

    #[test]
    fn test_lower_candidate_ignored_while_electing() {
        let mut engine = engine();
        let me = PeerId::from("m");
        let t0 = Instant::now();
        engine.start(t0);

        assert_eq!(engine.on_election(&me, &PeerId::from("a"), t0), ElectionReaction::Ignore);
        assert!(engine.is_electing());
    }

    #[test]
    fn test_lower_candidate_ignored_after_yielding() {
        let mut engine = engine();
        let me = PeerId::from("m");
        let t0 = Instant::now();
        engine.start(t0);
        engine.on_election(&me, &PeerId::from("z"), t0);

        assert_eq!(engine.on_election(&me, &PeerId::from("a"), t0), ElectionReaction::Ignore);
        assert_eq!(engine.rounds_started(), 1);
    }

    #[test]
    fn test_yield_expires_without_coordinator() {
        let mut engine = engine();
        let me = PeerId::from("m");
        let t0 = Instant::now();
        engine.on_election(&me, &PeerId::from("z"), t0);

        assert_eq!(engine.poll(t0 + Duration::from_secs(5)), ElectionOutcome::Pending);
        assert_eq!(engine.poll(t0 + Duration::from_secs(6)), ElectionOutcome::YieldExpired);
        assert_eq!(engine.phase(), ElectionPhase::Idle);
    }

    #[test]
    fn test_clear_drops_round() {
        let mut engine = engine();
        let t0 = Instant::now();
        engine.start(t0);
        engine.clear();

        assert_eq!(engine.poll(t0 + Duration::from_secs(3)), ElectionOutcome::Pending);
        assert!(engine.start(t0), "A fresh round can be opened after clearing");
        assert_eq!(engine.rounds_started(), 2);
    }

    #[test]
    fn test_two_racing_candidates_higher_wins() {
        let low_id = PeerId::from("1111");
        let high_id = PeerId::from("9999");
        let mut low = engine();
        let mut high = engine();
        let t0 = Instant::now();

        low.start(t0);
        high.start(t0 + Duration::from_millis(10));

        // each hears the other's ELECTION
        assert_eq!(low.on_election(&low_id, &high_id, t0), ElectionReaction::Yield);
        assert_eq!(high.on_election(&high_id, &low_id, t0), ElectionReaction::Ignore);

        let decide = t0 + Duration::from_secs(4);
        assert_eq!(high.poll(decide), ElectionOutcome::Victory);
        assert_eq!(low.poll(decide), ElectionOutcome::Pending);
    }
}
