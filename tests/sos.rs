mod common;

mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration as StdDuration, Instant as StdInstant};

    use dimly_torch::{
        Duration, SosPlayer, SosSequence, SosTimings, TileState, TileView, TorchCapability,
        TorchController, TorchError,
    };

    use super::common::{CallLog, FAST_SOS, RecordingTorch, TorchCall};

    fn player(timings: &SosTimings) -> (SosPlayer<RecordingTorch>, CallLog) {
        let (device, log) = RecordingTorch::new(Some(TorchCapability::with_levels(5)));
        (SosPlayer::new(Arc::new(TorchController::new(device)), timings), log)
    }

    fn wait_idle(player: &SosPlayer<RecordingTorch>, timeout: StdDuration) -> StdDuration {
        let started = StdInstant::now();
        while player.is_playing() {
            assert!(started.elapsed() < timeout, "player still busy after {timeout:?}");
            thread::sleep(StdDuration::from_millis(5));
        }
        started.elapsed()
    }

    #[test]
    fn test_sequence_timeline() {
        let sequence = SosSequence::default();
        assert_eq!(sequence.steps().len(), dimly_torch::sos::SOS_STEP_COUNT);
        assert_eq!(sequence.steps().iter().filter(|step| step.lit).count(), 9);
        assert_eq!(sequence.total_duration(), Duration::from_millis(5600));
        assert_eq!(sequence.longest_step(), Duration::from_millis(600));

        // S: 0..1200, gap: 1200..1600, O: 1600..4000, gap: 4000..4400, S: 4400..5600
        assert_eq!(sequence.light_at(Duration::from_millis(0)), Some(true));
        assert_eq!(sequence.light_at(Duration::from_millis(200)), Some(false));
        assert_eq!(sequence.light_at(Duration::from_millis(1300)), Some(false));
        assert_eq!(sequence.light_at(Duration::from_millis(1600)), Some(true));
        assert_eq!(sequence.light_at(Duration::from_millis(2199)), Some(true));
        assert_eq!(sequence.light_at(Duration::from_millis(2200)), Some(false));
        assert_eq!(sequence.light_at(Duration::from_millis(4400)), Some(true));
        assert_eq!(sequence.light_at(Duration::from_millis(5599)), Some(false));
        assert_eq!(sequence.light_at(Duration::from_millis(5600)), None);
    }

    #[test]
    fn test_plays_to_completion_once() {
        let (mut player, log) = player(&FAST_SOS);

        player.start().unwrap();
        assert!(player.is_playing());
        // Second start while playing is ignored
        player.start().unwrap();
        assert!(player.is_playing());

        player.wait();
        assert!(!player.is_playing());
        assert_eq!(log.count(TorchCall::On(true)), 9);
        assert_eq!(log.last(), Some(TorchCall::On(false)));
    }

    #[test]
    fn test_can_replay_after_completion() {
        let (mut player, log) = player(&FAST_SOS);

        player.start().unwrap();
        player.wait();
        player.start().unwrap();
        player.wait();

        assert_eq!(log.count(TorchCall::On(true)), 18);
    }

    #[test]
    fn test_immediate_stop_ends_dark() {
        let (mut player, log) = player(&SosTimings::DEFAULT);

        player.start().unwrap();
        player.stop();
        player.wait();

        assert!(!player.is_playing());
        assert!(log.count(TorchCall::On(true)) <= 1);
        assert_eq!(log.last(), Some(TorchCall::On(false)));
    }

    #[test]
    fn test_stop_observed_within_one_phase() {
        let (mut player, log) = player(&SosTimings::DEFAULT);

        player.start().unwrap();
        // Inside the first dash, which is lit from 1600 ms to 2200 ms
        thread::sleep(StdDuration::from_millis(1700));
        player.stop();
        let latency = wait_idle(&player, StdDuration::from_secs(3));
        player.wait();

        assert!(latency <= StdDuration::from_millis(600 + 150), "took {latency:?}");
        assert_eq!(log.count(TorchCall::On(true)), 4);
        assert_eq!(log.last(), Some(TorchCall::On(false)));
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (mut player, log) = player(&FAST_SOS);
        player.stop();
        assert!(!player.is_playing());

        // A stale stop must not cancel the next run
        player.start().unwrap();
        player.wait();
        assert_eq!(log.count(TorchCall::On(true)), 9);
    }

    #[test]
    fn test_start_after_stop_resumes_pattern() {
        let (mut player, log) = player(&SosTimings::DEFAULT);

        player.start().unwrap();
        // Inside the first dot, before the worker looks for a stop
        thread::sleep(StdDuration::from_millis(50));
        player.stop();
        player.start().unwrap();
        assert!(player.is_playing());

        player.wait();
        assert!(!player.is_playing());
        assert_eq!(log.count(TorchCall::On(true)), 9);
        assert_eq!(log.last(), Some(TorchCall::On(false)));
    }

    #[test]
    fn test_quick_stop_start_plays_full_pattern() {
        let (mut player, log) = player(&FAST_SOS);

        player.start().unwrap();
        player.stop();
        player.start().unwrap();
        player.wait();

        // Either the stop is withdrawn or the worker replays after switching off
        assert_eq!(log.count(TorchCall::On(true)), 9);
        assert_eq!(log.last(), Some(TorchCall::On(false)));
    }

    #[test]
    fn test_toggle_double_tap_keeps_playing() {
        let (mut player, log) = player(&FAST_SOS);

        assert_eq!(player.toggle(), Ok(true));
        assert_eq!(player.toggle(), Ok(false));
        assert_eq!(player.toggle(), Ok(true));
        assert!(player.is_playing());

        player.wait();
        assert_eq!(log.count(TorchCall::On(true)), 9);
    }

    #[test]
    fn test_toggle() {
        let (mut player, log) = player(&SosTimings::DEFAULT);

        assert_eq!(player.toggle(), Ok(true));
        assert!(player.is_playing());
        assert_eq!(player.toggle(), Ok(false));
        player.wait();

        assert!(!player.is_playing());
        assert_eq!(log.last(), Some(TorchCall::On(false)));
    }

    #[test]
    fn test_missing_flash_does_not_start() {
        let (device, log) = RecordingTorch::new(None);
        let mut player = SosPlayer::new(Arc::new(TorchController::new(device)), &FAST_SOS);

        assert_eq!(player.start(), Err(TorchError::Unavailable));
        assert!(!player.is_playing());
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_hardware_fault_resets_to_idle() {
        let (device, log) = RecordingTorch::failing_from(Some(TorchCapability::binary()), 3);
        let mut player = SosPlayer::new(Arc::new(TorchController::new(device)), &FAST_SOS);

        player.start().unwrap();
        player.wait();

        assert!(!player.is_playing());
        // Two good calls, the failing one, then the best-effort switch off
        assert_eq!(
            log.calls(),
            vec![
                TorchCall::On(true),
                TorchCall::On(false),
                TorchCall::On(true),
                TorchCall::On(false),
            ]
        );
    }

    #[test]
    fn test_sos_tile_view() {
        let active = TileView::sos(true);
        assert_eq!(active.state, TileState::Active);
        assert_eq!(active.description, "SOS Active");

        let idle = TileView::sos(false);
        assert_eq!(idle.state, TileState::Inactive);
        assert_eq!(idle.label, "SOS");
        assert_eq!(idle.description, "Activate SOS");
    }
}
