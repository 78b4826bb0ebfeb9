//! Sine wave generator

use std::f64::consts::TAU;

use serde::Deserialize;

use crate::error::{ConfigError, ProgramError};
use crate::program::{reject_unknown_inputs, Inputs, Program, ProgramInit};
use crate::registry::{DocEntry, ProgramRegistry};

const DOC: &str = "\
# Sine wave generator

Generates a sine signal sampled at the engine cycle time.

Output: `out = amplitude * sin(2π * t / period + phase)` where `t` is the
elapsed simulated time of the current cycle.

```yaml
- name: sin1
  type: SINE_WAVE
  init_args:
    amplitude: 100.0
    period: 1200
    phase: 0.0
  expression: sin1.execute()
```
";

const PARAMS_TABLE: &str = "\
| 参数名 | 含义 | 初值 |
|--------|------|------|
| amplitude | 振幅，正弦波的最大值 | 100.0 |
| period | 周期（秒），一个完整正弦波的时间长度 | 1200.0 |
| phase | 相位（弧度），初始相位偏移 | 0.0 |
";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SineWaveParams {
    amplitude: f64,
    period: f64,
    phase: f64,
}

impl Default for SineWaveParams {
    fn default() -> Self {
        Self {
            amplitude: 100.0,
            period: 1200.0,
            phase: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct SineWave {
    amplitude: f64,
    period: f64,
    phase: f64,
    cycle_time: f64,
    cycle_count: u64,
    out: f64,
}

fn build(init: &ProgramInit) -> Result<Box<dyn Program>, ConfigError> {
    let params: SineWaveParams = init.params()?;
    if params.period <= 0.0 {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: format!("period must be positive, got {}", params.period),
        });
    }
    Ok(Box::new(SineWave {
        amplitude: params.amplitude,
        period: params.period,
        phase: params.phase,
        cycle_time: init.cycle_time,
        cycle_count: 0,
        out: 0.0,
    }))
}

impl Program for SineWave {
    fn execute(&mut self, inputs: &Inputs) -> Result<(), ProgramError> {
        reject_unknown_inputs(inputs, &[])?;
        self.cycle_count += 1;
        let t = self.cycle_count as f64 * self.cycle_time;
        let position = (t % self.period) / self.period;
        self.out = self.amplitude * (TAU * position + self.phase).sin();
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "out" => Some(self.out),
            "amplitude" => Some(self.amplitude),
            "period" => Some(self.period),
            "phase" => Some(self.phase),
            _ => None,
        }
    }

    fn stored_attributes(&self) -> &'static [&'static str] {
        &["out", "amplitude", "period", "phase"]
    }
}

pub fn register(registry: &mut ProgramRegistry) {
    registry.register_algorithm(
        "SINE_WAVE",
        build,
        DocEntry::new("sine_wave", "正弦波", DOC, PARAMS_TABLE),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::init_from_yaml;

    #[test]
    fn test_quarter_period() {
        let init = init_from_yaml("s", 1.0, "{amplitude: 1.0, period: 4.0, phase: 0.0}");
        let mut wave = build(&init).unwrap();
        wave.execute(&Inputs::new()).unwrap();
        // First cycle: sin(2π * 1 / 4) = 1
        assert!((wave.attribute("out").unwrap() - 1.0).abs() < 1e-12);
        wave.execute(&Inputs::new()).unwrap();
        assert!(wave.attribute("out").unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_rejects_inputs() {
        let init = init_from_yaml("s", 1.0, "");
        let mut wave = build(&init).unwrap();
        let mut inputs = Inputs::new();
        inputs.insert("bogus".to_string(), 1.0);
        assert!(wave.execute(&inputs).is_err());
    }

    #[test]
    fn test_zero_period_rejected() {
        let init = init_from_yaml("s", 1.0, "{period: 0.0}");
        assert!(build(&init).is_err());
    }
}
