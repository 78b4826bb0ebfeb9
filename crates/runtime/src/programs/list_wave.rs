//! List wave generator

use serde::Deserialize;

use crate::error::{ConfigError, ProgramError};
use crate::program::{reject_unknown_inputs, Inputs, Program, ProgramInit};
use crate::registry::{DocEntry, ProgramRegistry};

const DOC: &str = "\
# List wave generator

Plays back a configured list of `(value, duration_seconds)` segments,
holding each value for `duration / cycle_time` cycles, and loops the list
indefinitely.

```yaml
- name: list1
  type: LIST_WAVE
  init_args:
    wave_list:
      - [10.0, 5.0]
      - [20.0, 3.0]
      - [0.0, 2.0]
  expression: list1.execute()
```
";

const PARAMS_TABLE: &str = "\
| 参数名 | 含义 | 初值 |
|--------|------|------|
| wave_list | 波形列表 [(值, 持续时间秒), ...] | [[0.0, 1.0]] |
";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ListWaveParams {
    wave_list: Vec<(f64, f64)>,
}

impl Default for ListWaveParams {
    fn default() -> Self {
        Self {
            wave_list: vec![(0.0, 1.0)],
        }
    }
}

#[derive(Debug)]
pub struct ListWave {
    wave_list: Vec<(f64, f64)>,
    /// Cycles each segment is held for, parallel to `wave_list`.
    segment_cycles: Vec<u64>,
    segment: usize,
    segment_cycle: u64,
    out: f64,
}

fn build(init: &ProgramInit) -> Result<Box<dyn Program>, ConfigError> {
    let params: ListWaveParams = init.params()?;
    if params.wave_list.is_empty() {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: "wave_list must not be empty".to_string(),
        });
    }
    let mut segment_cycles = Vec::with_capacity(params.wave_list.len());
    for &(_, duration) in &params.wave_list {
        if duration <= 0.0 {
            return Err(ConfigError::InvalidInitArgs {
                name: init.name.clone(),
                message: format!("segment duration must be positive, got {duration}"),
            });
        }
        segment_cycles.push(((duration / init.cycle_time).round() as u64).max(1));
    }
    Ok(Box::new(ListWave {
        wave_list: params.wave_list,
        segment_cycles,
        segment: 0,
        segment_cycle: 0,
        out: 0.0,
    }))
}

impl Program for ListWave {
    fn execute(&mut self, inputs: &Inputs) -> Result<(), ProgramError> {
        reject_unknown_inputs(inputs, &[])?;
        self.out = self.wave_list[self.segment].0;
        self.segment_cycle += 1;
        if self.segment_cycle >= self.segment_cycles[self.segment] {
            self.segment_cycle = 0;
            self.segment = (self.segment + 1) % self.wave_list.len();
        }
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "out" => Some(self.out),
            _ => None,
        }
    }

    fn stored_attributes(&self) -> &'static [&'static str] {
        &["out"]
    }
}

pub fn register(registry: &mut ProgramRegistry) {
    registry.register_algorithm(
        "LIST_WAVE",
        build,
        DocEntry::new("list_wave", "列表波", DOC, PARAMS_TABLE),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_loop() {
        let init = crate::program::init_from_yaml(
            "lw",
            1.0,
            "{wave_list: [[10.0, 2.0], [20.0, 1.0]]}",
        );
        let mut wave = build(&init).unwrap();
        let mut outs = Vec::new();
        for _ in 0..7 {
            wave.execute(&Inputs::new()).unwrap();
            outs.push(wave.attribute("out").unwrap());
        }
        assert_eq!(outs, vec![10.0, 10.0, 20.0, 10.0, 10.0, 20.0, 10.0]);
    }

    #[test]
    fn test_empty_list_rejected() {
        let init = crate::program::init_from_yaml("lw", 1.0, "{wave_list: []}");
        assert!(build(&init).is_err());
    }
}
