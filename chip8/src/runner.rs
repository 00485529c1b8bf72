use crate::error::Fault;
use crate::machine::{Machine, StepResult};

pub const CPU_HZ: f32 = 700.0;
pub const TIMER_HZ: f32 = 60.0;

const TIMER_TIME_STEP: f32 = 1.0 / TIMER_HZ;

/// High-level emulator runner that turns elapsed time into machine cycles.
///
/// The CPU and the timers run on two independent fixed-step accumulators.
/// The host measures `dt`; the runner never reads the clock.
pub struct Runner {
    machine: Machine,
    cpu_time_step: f32,
    cpu_dt_accumulator: f32,
    timer_dt_accumulator: f32,
}

impl Runner {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            cpu_time_step: 1.0 / CPU_HZ,
            cpu_dt_accumulator: 0.0,
            timer_dt_accumulator: 0.0,
        }
    }

    /// Sets the CPU clock rate in instructions per second.
    ///
    /// Panics if `cpu_hz` is not positive.
    pub fn with_cpu_hz(mut self, cpu_hz: f32) -> Self {
        assert!(cpu_hz > 0.0, "cpu_hz must be positive");
        self.cpu_time_step = 1.0 / cpu_hz;
        self
    }

    /// Update emulator by delta time, handles both CPU and timer cycles.
    ///
    /// Runs as many timer ticks and CPU steps as fit in the accumulated time
    /// and returns the number of steps taken. Stops early, dropping the
    /// leftover CPU time, when the machine starts waiting for a key or, with
    /// the display wait quirk, after a draw.
    pub fn update(&mut self, dt: f32) -> Result<usize, Fault> {
        self.cpu_dt_accumulator += dt;
        self.timer_dt_accumulator += dt;

        while self.timer_dt_accumulator >= TIMER_TIME_STEP {
            self.timer_dt_accumulator -= TIMER_TIME_STEP;
            self.machine.tick_timers();
        }

        let display_wait = self.machine.quirks().display_wait;
        let mut steps = 0;

        while self.cpu_dt_accumulator >= self.cpu_time_step {
            self.cpu_dt_accumulator -= self.cpu_time_step;
            steps += 1;

            match self.machine.step()? {
                StepResult::Continue => {}
                StepResult::Drew if !display_wait => {}
                StepResult::Drew | StepResult::AwaitingKey => {
                    // Don't let the next frame catch up on the time spent waiting.
                    self.cpu_dt_accumulator = 0.0;
                    break;
                }
            }
        }

        Ok(steps)
    }

    /// Returns true if the sound timer is active, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.machine.wants_sound()
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nibble::u4;
    use crate::quirks::Quirks;

    fn runner_with(program: &[u16], quirks: Quirks) -> Runner {
        let rom: Vec<u8> = program.iter().flat_map(|word| word.to_be_bytes()).collect();
        let mut machine = Machine::with_seed(1).with_quirks(quirks);
        machine.load(&rom).unwrap();
        Runner::new(machine)
    }

    #[test]
    fn one_second_runs_cpu_hz_steps() {
        // Tight loop: JP 0x200
        let mut runner = runner_with(&[0x1200], Quirks::default()).with_cpu_hz(500.0);
        let mut steps = 0;
        for _ in 0..100 {
            steps += runner.update(0.01).unwrap();
        }
        assert!((499..=500).contains(&steps), "{steps} steps");
    }

    #[test]
    fn timers_tick_at_60hz_regardless_of_cpu_rate() {
        // LD V0, 120; LD DT, V0; JP 0x204
        let program = [0x6078, 0xF015, 0x1204];
        let mut runner = runner_with(&program, Quirks::default()).with_cpu_hz(10_000.0);
        runner.update(0.001).unwrap();
        assert_eq!(runner.machine().delay_timer(), 120);

        for _ in 0..50 {
            runner.update(0.01).unwrap();
        }
        let remaining = runner.machine().delay_timer();
        assert!((89..=91).contains(&remaining), "{remaining} left");
    }

    #[test]
    fn display_wait_ends_the_batch_after_a_draw() {
        // Draw, then jump back to the draw.
        let program = [0xA000, 0xD005, 0x1202];
        let mut runner = runner_with(&program, Quirks::cosmac());
        assert_eq!(runner.update(1.0 / 60.0).unwrap(), 2);
        assert_eq!(runner.update(1.0 / 60.0).unwrap(), 2);

        let mut runner = runner_with(&program, Quirks::default());
        assert!(runner.update(1.0 / 60.0).unwrap() > 2);
    }

    #[test]
    fn key_wait_ends_the_batch() {
        let mut runner = runner_with(&[0xF50A, 0x1202], Quirks::default());
        assert_eq!(runner.update(0.1).unwrap(), 1);
        assert_eq!(runner.update(0.1).unwrap(), 1);

        runner.machine_mut().set_key(u4::new(0x7), true);
        assert!(runner.update(0.1).unwrap() > 1);
        assert_eq!(runner.machine().v(u4::new(5)), 0x7);
    }

    #[test]
    fn faults_propagate() {
        let mut runner = runner_with(&[0x00EE], Quirks::default());
        assert_eq!(runner.update(0.1), Err(Fault::StackUnderflow));
    }
}
