use std::{cell::RefCell, convert::Infallible};

use embassy_futures::block_on;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, signal::Signal};
use embassy_time::Duration;
use embedded_hal_1::digital::{ErrorType, OutputPin, StatefulOutputPin};
use wobbulator::{
    config::{SweepBand, SweepConfig},
    divider::{DividerFormat, DividerValue},
    error::{ConfigError, SweepError},
    peripheral::{Pacer, RampGenerator, RefClockGenerator},
    sweep::{SweepController, SweepReport},
};

const REF_48_MHZ: u32 = 48_000_000;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Event {
    Divider(u32),
    Enable,
    Ramp(u16),
    Beat,
    Pace,
}

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<Event>>,
}

impl Recorder {
    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    fn dividers(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Divider(word) => Some(word),
                _ => None,
            })
            .collect()
    }

    fn ramp_steps(&self) -> Vec<u16> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Ramp(step) => Some(step),
                _ => None,
            })
            .collect()
    }
}

struct FakeClock<'a> {
    recorder: &'a Recorder,
    reject_word: Option<u32>,
}

impl RefClockGenerator for FakeClock<'_> {
    const FORMAT: DividerFormat = DividerFormat::REFO;

    fn set_divider(&mut self, divider: DividerValue) -> Result<(), SweepError> {
        if self.reject_word == Some(divider.word()) {
            return Err(SweepError::DividerRejected {
                word: divider.word(),
            });
        }
        self.recorder.push(Event::Divider(divider.word()));
        Ok(())
    }

    fn enable(&mut self) {
        self.recorder.push(Event::Enable);
    }
}

struct FakeRamp<'a> {
    recorder: &'a Recorder,
    period: u16,
}

impl RampGenerator for FakeRamp<'_> {
    fn period(&self) -> u16 {
        self.period
    }

    fn set_step(&mut self, step: u16) {
        self.recorder.push(Event::Ramp(step));
    }
}

/// LED pin; every level change counts as one heartbeat.
struct FakeLed<'a> {
    recorder: &'a Recorder,
    high: bool,
}

impl ErrorType for FakeLed<'_> {
    type Error = Infallible;
}

impl OutputPin for FakeLed<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        self.recorder.push(Event::Beat);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        self.recorder.push(Event::Beat);
        Ok(())
    }
}

impl StatefulOutputPin for FakeLed<'_> {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

/// Stands in for the wall clock: counts elapsed pacing intervals and raises
/// `stop` after `budget` of them.
struct FakePacer<'a> {
    recorder: &'a Recorder,
    stop: &'a Signal<NoopRawMutex, ()>,
    interval: Duration,
    elapsed: Duration,
    budget: usize,
}

impl Pacer for FakePacer<'_> {
    async fn pace(&mut self) {
        self.recorder.push(Event::Pace);
        self.elapsed += self.interval;
        self.budget = self.budget.saturating_sub(1);
        if self.budget == 0 {
            self.stop.signal(());
        }
    }
}

type Controller<'a> = SweepController<FakeClock<'a>, FakeRamp<'a>, FakeLed<'a>, FakePacer<'a>>;

fn controller<'a>(
    config: &SweepConfig,
    recorder: &'a Recorder,
    stop: &'a Signal<NoopRawMutex, ()>,
    budget: usize,
) -> Result<Controller<'a>, ConfigError> {
    SweepController::new(
        config,
        FakeClock {
            recorder,
            reject_word: None,
        },
        FakeRamp {
            recorder,
            period: config.step_count,
        },
        FakeLed {
            recorder,
            high: false,
        },
        FakePacer {
            recorder,
            stop,
            interval: config.pacing_interval,
            elapsed: Duration::from_ticks(0),
            budget,
        },
    )
}

fn audio_sweep() -> SweepConfig {
    SweepConfig::new(SweepBand::AUDIO, REF_48_MHZ)
}

#[test]
fn audio_sweep_from_48_mhz() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let mut sweep = controller(&audio_sweep(), &recorder, &stop, 100).unwrap();

    let report = block_on(sweep.run(&stop)).unwrap();
    assert_eq!(
        report,
        SweepReport {
            steps: 100,
            cycles: 1,
            saturated_steps: 0,
        }
    );

    let dividers = recorder.dividers();
    // start-up programming, then one per step
    assert_eq!(dividers.len(), 101);
    assert_eq!(dividers[0], 12_288_000);
    assert_eq!(dividers[1], 12_288_000);
    // step 50 is 10.5 kHz: 12_288_000 / 10.5 = 1_170_285.7
    assert_eq!(dividers[51], 1_170_286);

    let ramp = recorder.ramp_steps();
    assert_eq!(ramp[50], 50);
    assert_eq!(ramp, (0..100).collect::<Vec<u16>>());
}

#[test]
fn start_programs_low_endpoint_before_enabling() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let mut sweep = controller(&audio_sweep(), &recorder, &stop, 1).unwrap();

    sweep.start().unwrap();
    assert_eq!(
        recorder.events(),
        vec![Event::Divider(12_288_000), Event::Enable]
    );
    assert_eq!(sweep.current_step(), 0);
}

#[test]
fn each_step_writes_divider_then_ramp_then_paces() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let mut sweep = controller(&audio_sweep(), &recorder, &stop, 3).unwrap();

    block_on(sweep.run(&stop)).unwrap();
    let events = recorder.events();
    let steps = &events[2..];
    assert_eq!(steps.len(), 3 * 4);
    for (i, chunk) in steps.chunks(4).enumerate() {
        assert!(matches!(chunk[0], Event::Divider(_)));
        assert_eq!(chunk[1], Event::Ramp(i as u16));
        assert_eq!(chunk[2], Event::Beat);
        assert_eq!(chunk[3], Event::Pace);
    }
}

#[test]
fn sweep_repeats_exactly() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let config = audio_sweep().with_step_count(40);
    let mut sweep = controller(&config, &recorder, &stop, 100).unwrap();

    let report = block_on(sweep.run(&stop)).unwrap();
    assert_eq!(report.steps, 100);
    assert_eq!(report.cycles, 2);
    assert_eq!(sweep.current_step(), 20);

    let dividers = recorder.dividers();
    let dividers = &dividers[1..];
    for i in 0..60 {
        assert_eq!(dividers[i], dividers[i + 40]);
    }
    let ramp = recorder.ramp_steps();
    assert_eq!(ramp[39], 39);
    assert_eq!(ramp[40], 0);
}

#[test]
fn step_outcomes_track_the_range() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let mut sweep = controller(&audio_sweep(), &recorder, &stop, usize::MAX).unwrap();

    sweep.start().unwrap();
    let mut previous = 0.0;
    for i in 0..100u16 {
        let outcome = block_on(sweep.step()).unwrap();
        assert_eq!(outcome.index, i);
        assert!(outcome.frequency_khz >= previous);
        assert_eq!(outcome.saturation, None);
        assert_eq!(
            outcome.divider,
            DividerFormat::REFO
                .encode(REF_48_MHZ, outcome.frequency_khz)
                .unwrap()
        );
        previous = outcome.frequency_khz;
    }
    assert!((previous - (20.0 - 19.0 / 100.0)).abs() < 1e-12);

    let wrapped = block_on(sweep.step()).unwrap();
    assert_eq!(wrapped.index, 0);
    assert_eq!(wrapped.frequency_khz, 1.0);
}

#[test]
fn full_divider_range_never_clamps() {
    let format = DividerFormat::REFO;
    let band = SweepBand::new(format.lowest_khz(REF_48_MHZ), format.highest_khz(REF_48_MHZ));
    let config = SweepConfig::new(band, REF_48_MHZ).with_step_count(1000);
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let mut sweep = controller(&config, &recorder, &stop, 1000).unwrap();

    let report = block_on(sweep.run(&stop)).unwrap();
    assert_eq!(report.cycles, 1);
    assert_eq!(report.saturated_steps, 0);

    let dividers = recorder.dividers();
    assert_eq!(dividers[0], format.max_word());
    assert!(dividers
        .iter()
        .all(|&word| word >= format.min_word() && word <= format.max_word()));
}

#[test]
fn fixed_frequency_still_moves_the_ramp() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let config = SweepConfig::new(SweepBand::new(455.0, 455.0), REF_48_MHZ).with_step_count(10);
    let mut sweep = controller(&config, &recorder, &stop, 10).unwrap();

    block_on(sweep.run(&stop)).unwrap();
    let dividers = recorder.dividers();
    assert!(dividers.iter().all(|&word| word == dividers[0]));
    assert_eq!(recorder.ramp_steps(), (0..10).collect::<Vec<u16>>());
}

#[test]
fn stop_before_run_only_starts_the_output() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    stop.signal(());
    let mut sweep = controller(&audio_sweep(), &recorder, &stop, 5).unwrap();

    let report = block_on(sweep.run(&stop)).unwrap();
    assert_eq!(report, SweepReport::default());
    // started, but no step taken
    assert_eq!(
        recorder.events(),
        vec![Event::Divider(12_288_000), Event::Enable]
    );
}

#[test]
fn pacing_accumulates_virtual_time() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let config = audio_sweep().with_pacing_interval(Duration::from_millis(7));
    let mut sweep = controller(&config, &recorder, &stop, 12).unwrap();

    block_on(sweep.run(&stop)).unwrap();
    let (_, _, _, pacer) = sweep.into_parts();
    assert_eq!(pacer.elapsed, Duration::from_millis(84));
}

#[test]
fn rejected_divider_ends_the_sweep() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let config = audio_sweep();
    let rejected = DividerFormat::REFO
        .encode(REF_48_MHZ, 10.5)
        .unwrap()
        .word();
    let mut sweep = SweepController::new(
        &config,
        FakeClock {
            recorder: &recorder,
            reject_word: Some(rejected),
        },
        FakeRamp {
            recorder: &recorder,
            period: 100,
        },
        FakeLed {
            recorder: &recorder,
            high: false,
        },
        FakePacer {
            recorder: &recorder,
            stop: &stop,
            interval: config.pacing_interval,
            elapsed: Duration::from_ticks(0),
            budget: usize::MAX,
        },
    )
    .unwrap();

    let result = block_on(sweep.run(&stop));
    assert_eq!(result, Err(SweepError::DividerRejected { word: rejected }));
    // steps 0..=49 completed, step 50 never reached the ramp
    assert_eq!(sweep.report().steps, 50);
    assert_eq!(recorder.ramp_steps().last(), Some(&49));
}

#[test]
fn refuses_invalid_configurations() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();

    let zero_steps = audio_sweep().with_step_count(0);
    assert_eq!(
        controller(&zero_steps, &recorder, &stop, 1).err(),
        Some(ConfigError::ZeroSteps)
    );

    let too_low = SweepConfig::new(SweepBand::new(0.1, 20.0), REF_48_MHZ);
    assert!(matches!(
        controller(&too_low, &recorder, &stop, 1).err(),
        Some(ConfigError::LowOutOfRange { .. })
    ));

    // nothing reached the hardware
    assert!(recorder.events().is_empty());
}

#[test]
fn refuses_a_ramp_shorter_than_the_sweep() {
    let recorder = Recorder::default();
    let stop = Signal::<NoopRawMutex, ()>::new();
    let config = audio_sweep();
    let result = SweepController::new(
        &config,
        FakeClock {
            recorder: &recorder,
            reject_word: None,
        },
        FakeRamp {
            recorder: &recorder,
            period: 50,
        },
        FakeLed {
            recorder: &recorder,
            high: false,
        },
        FakePacer {
            recorder: &recorder,
            stop: &stop,
            interval: config.pacing_interval,
            elapsed: Duration::from_ticks(0),
            budget: 1,
        },
    );
    assert_eq!(
        result.err(),
        Some(ConfigError::RampTooShort {
            step_count: 100,
            period: 50,
        })
    );
}
