//! Triangle wave generator

use serde::Deserialize;

use crate::error::{ConfigError, ProgramError};
use crate::program::{reject_unknown_inputs, Inputs, Program, ProgramInit};
use crate::registry::{DocEntry, ProgramRegistry};

const DOC: &str = "\
# Triangle wave generator

Rises linearly from `-amplitude` to `amplitude` over the first half of
each period, then falls back over the second half. `phase` shifts the
waveform by a fraction of the period (0..1).
";

const PARAMS_TABLE: &str = "\
| 参数名 | 含义 | 初值 |
|--------|------|------|
| amplitude | 振幅，三角波的最大值 | 100.0 |
| period | 周期（秒） | 1200.0 |
| phase | 相位偏移（0-1，周期内的偏移比例） | 0.0 |
";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TriangleWaveParams {
    amplitude: f64,
    period: f64,
    phase: f64,
}

impl Default for TriangleWaveParams {
    fn default() -> Self {
        Self {
            amplitude: 100.0,
            period: 1200.0,
            phase: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct TriangleWave {
    amplitude: f64,
    period: f64,
    phase: f64,
    cycle_time: f64,
    cycle_count: u64,
    out: f64,
}

fn build(init: &ProgramInit) -> Result<Box<dyn Program>, ConfigError> {
    let params: TriangleWaveParams = init.params()?;
    if params.period <= 0.0 {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: format!("period must be positive, got {}", params.period),
        });
    }
    Ok(Box::new(TriangleWave {
        amplitude: params.amplitude,
        period: params.period,
        phase: params.phase,
        cycle_time: init.cycle_time,
        cycle_count: 0,
        out: 0.0,
    }))
}

impl Program for TriangleWave {
    fn execute(&mut self, inputs: &Inputs) -> Result<(), ProgramError> {
        reject_unknown_inputs(inputs, &[])?;
        self.cycle_count += 1;
        let t = self.cycle_count as f64 * self.cycle_time;
        let position = ((t % self.period) / self.period + self.phase).rem_euclid(1.0);
        self.out = if position < 0.5 {
            -self.amplitude + 4.0 * self.amplitude * position
        } else {
            self.amplitude - 4.0 * self.amplitude * (position - 0.5)
        };
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
        "TRIANGLE_WAVE",
        build,
        DocEntry::new("triangle_wave", "三角波", DOC, PARAMS_TABLE),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_up_then_down() {
        let init =
            crate::program::init_from_yaml("tri", 1.0, "{amplitude: 100.0, period: 4.0}");
        let mut wave = build(&init).unwrap();
        let mut outs = Vec::new();
        for _ in 0..4 {
            wave.execute(&Inputs::new()).unwrap();
            outs.push(wave.attribute("out").unwrap());
        }
        // position per cycle: 0.25, 0.5, 0.75, 0.0
        assert_eq!(outs, vec![0.0, 100.0, 0.0, -100.0]);
    }
}
