use super::*;
use chrono::{Duration, TimeZone};

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
}

fn settings(mode: StudyMode, warning_secs: u32) -> MonitorSettings {
    MonitorSettings::from_config(mode, &MonitorConfig::default()).with_warning_secs(warning_secs)
}

fn frame(label: &str) -> Vec<Prediction> {
    vec![Prediction::new(label, 0.95), Prediction::new("Other", 0.05)]
}

// Helper driving the monitor one second at a time
struct Driver {
    monitor: SessionMonitor,
    now: DateTime<Utc>,
}

impl Driver {
    fn new(settings: MonitorSettings) -> Self {
        Self {
            monitor: SessionMonitor::new(settings, start_time()),
            now: start_time(),
        }
    }

    fn tick(&mut self) -> Vec<Effect> {
        self.now += Duration::seconds(1);
        self.monitor.on_tick(self.now)
    }

    fn ticks(&mut self, n: u32) -> Vec<Effect> {
        (0..n).flat_map(|_| self.tick()).collect()
    }

    fn classify(&mut self, label: &str) {
        self.monitor.on_classification(&frame(label));
    }
}

fn log_entries(effects: &[Effect]) -> Vec<&LogEntry> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::AppendLog(entry) => Some(entry),
            _ => None,
        })
        .collect()
}

fn popups_shown(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::ShowPopup { .. }))
        .count()
}

#[test]
fn test_duration_tracks_constant_status() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 100));
    driver.classify("Focused");
    for expected in 1..=20 {
        driver.tick();
        assert_eq!(driver.monitor.snapshot().duration, expected);
    }
}

#[test]
fn test_status_change_resets_duration_same_tick() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 100));
    driver.classify("Focused");
    driver.ticks(7);
    driver.classify("Absent");
    let effects = driver.tick();

    let snapshot = driver.monitor.snapshot();
    assert_eq!(snapshot.status, Status::Absent);
    assert_eq!(snapshot.duration, 1);
    assert!(effects.contains(&Effect::StatusChanged {
        status: Status::Absent,
        duration: 1
    }));
}

#[test]
fn test_low_confidence_leaves_pending_unchanged() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 100));
    driver.classify("Focused");
    driver.tick();

    let accepted = driver
        .monitor
        .on_classification(&[Prediction::new("Absent", 0.4)]);
    assert_eq!(accepted, None);
    assert_eq!(driver.monitor.on_classification(&[]), None);

    driver.tick();
    let snapshot = driver.monitor.snapshot();
    assert_eq!(snapshot.status, Status::Focused);
    assert_eq!(snapshot.duration, 2);
}

#[test]
fn test_distracted_popup_after_threshold() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 5));
    driver.classify("Distracted");

    let before = driver.ticks(5);
    assert_eq!(popups_shown(&before), 0);
    assert!(log_entries(&before).is_empty());

    let effects = driver.tick();
    assert_eq!(popups_shown(&effects), 1);
    assert!(effects.contains(&Effect::Background(Background::Warning)));

    let entries = log_entries(&effects);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].phase, LogPhase::Study);
    assert_eq!(entries[0].status, LogStatus::Attention(Status::Distracted));

    let snapshot = driver.monitor.snapshot();
    assert_eq!(snapshot.popup, Some(Status::Distracted));
    assert_eq!(snapshot.stats.warnings, 0);
}

#[test]
fn test_sustained_popup_logs_once() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 5));
    driver.classify("Distracted");
    let effects = driver.ticks(30);

    assert_eq!(popups_shown(&effects), 1);
    assert_eq!(log_entries(&effects).len(), 1);
    assert_eq!(driver.monitor.log().len(), 1);
}

#[test]
fn test_absent_warning_counted_per_shown_transition() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 3));
    driver.classify("Absent");
    driver.ticks(20);
    assert_eq!(driver.monitor.stats().warnings, 1);

    // Focus long enough to clear the popup, then leave again
    driver.classify("Focused");
    let cleared = driver.ticks(4);
    assert!(cleared.contains(&Effect::HidePopup));
    assert!(cleared.contains(&Effect::Background(Background::Calm)));
    assert_eq!(driver.monitor.snapshot().popup, None);

    driver.classify("Absent");
    let effects = driver.ticks(4);
    assert_eq!(popups_shown(&effects), 1);
    assert!(effects.contains(&Effect::Background(Background::Alert)));
    assert_eq!(driver.monitor.stats().warnings, 2);
    assert_eq!(driver.monitor.log().len(), 2);
}

#[test]
fn test_new_warning_kind_replaces_visible_popup() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 2));
    driver.classify("Distracted");
    driver.ticks(3);
    assert_eq!(driver.monitor.snapshot().popup, Some(Status::Distracted));

    driver.classify("Absent");
    let below = driver.ticks(2);
    assert_eq!(popups_shown(&below), 0);
    assert_eq!(driver.monitor.snapshot().popup, Some(Status::Distracted));

    let effects = driver.tick();
    assert_eq!(popups_shown(&effects), 1);
    assert_eq!(driver.monitor.snapshot().popup, Some(Status::Absent));
    assert_eq!(driver.monitor.stats().warnings, 1);
}

#[test]
fn test_stats_count_study_ticks() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 1000));
    driver.ticks(3);
    driver.classify("Focused");
    driver.ticks(10);
    driver.classify("Distracted");
    driver.ticks(4);

    let stats = driver.monitor.stats();
    assert_eq!(stats.focused, 10);
    assert_eq!(stats.distracted, 4);
    assert_eq!(stats.total(), 14);
    assert_eq!(driver.monitor.snapshot().elapsed_secs, 17);
}

#[test]
fn test_pomodoro_focus_to_break() {
    let settings = settings(StudyMode::Pomodoro, 1000).with_pomodoro_minutes(1, 2);
    let mut driver = Driver::new(settings);
    driver.classify("Focused");

    let effects = driver.ticks(60);
    let snapshot = driver.monitor.snapshot();
    assert_eq!(snapshot.phase, MonitorPhase::Break);
    assert_eq!(snapshot.remaining_secs, Some(120));
    assert_eq!(snapshot.pomodoro_sessions, 0);
    assert_eq!(snapshot.stats.focused, 60);

    let entries = log_entries(&effects);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].phase, LogPhase::Break);
    assert_eq!(entries[0].status, LogStatus::Break);
}

#[test]
fn test_pomodoro_break_suppresses_escalation() {
    let settings = settings(StudyMode::Pomodoro, 2).with_pomodoro_minutes(1, 1);
    let mut driver = Driver::new(settings);
    driver.classify("Absent");
    driver.ticks(60);
    assert_eq!(driver.monitor.stats().warnings, 1);

    let effects = driver.ticks(59);
    assert_eq!(popups_shown(&effects), 0);
    assert!(log_entries(&effects).is_empty());

    let snapshot = driver.monitor.snapshot();
    assert_eq!(snapshot.phase, MonitorPhase::Break);
    assert_eq!(snapshot.background, Background::Neutral);
    assert_eq!(snapshot.popup, None);
    assert_eq!(snapshot.break_secs, 59);
    assert_eq!(snapshot.stats.absent, 60);
}

#[test]
fn test_pomodoro_session_counter_on_break_to_focus() {
    let settings = settings(StudyMode::Pomodoro, 1000).with_pomodoro_minutes(1, 1);
    let mut driver = Driver::new(settings);
    driver.classify("Focused");

    driver.ticks(60);
    assert_eq!(driver.monitor.snapshot().pomodoro_sessions, 0);

    driver.ticks(60);
    let snapshot = driver.monitor.snapshot();
    assert_eq!(snapshot.phase, MonitorPhase::Focus);
    assert_eq!(snapshot.remaining_secs, Some(60));
    assert_eq!(snapshot.pomodoro_sessions, 1);
    assert_eq!(snapshot.break_secs, 60);
}

#[test]
fn test_normal_clock_reports_elapsed() {
    let mut driver = Driver::new(settings(StudyMode::Normal, 10));
    driver.tick();
    let effects = driver.tick();
    assert!(effects.contains(&Effect::Clock {
        phase: MonitorPhase::Studying,
        seconds: 2
    }));
}

#[test]
fn test_finish_summarizes_and_stops() {
    let settings = settings(StudyMode::Pomodoro, 1000).with_pomodoro_minutes(1, 1);
    let mut driver = Driver::new(settings);
    driver.classify("Focused");
    driver.ticks(40);
    driver.classify("Distracted");
    driver.ticks(10);
    driver.classify("Absent");
    driver.ticks(10);
    driver.ticks(30);

    let summary = driver.monitor.finish(driver.now);
    assert_eq!(summary.focused_secs, 40);
    assert_eq!(summary.distracted_secs, 10);
    assert_eq!(summary.absent_secs, 10);
    assert_eq!(summary.total_study_secs(), 60);
    assert_eq!(summary.break_secs, 30);
    assert_eq!(summary.log.len(), 1);
    assert!(!driver.monitor.is_running());

    assert!(driver.tick().is_empty());
    assert_eq!(driver.monitor.on_classification(&frame("Focused")), None);
}
