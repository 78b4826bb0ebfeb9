//! Valve model

use serde::Deserialize;

use crate::error::{ConfigError, ProgramError};
use crate::program::{reject_unknown_inputs, Inputs, Program, ProgramInit};
use crate::registry::{DocEntry, ProgramRegistry};

const DOC: &str = "\
# Valve model

The opening slews toward `target_opening` at most
`max_opening * cycle_time / full_travel_time` per cycle; intermediate
positions are quantized to the `step` grid and the result is clipped to
`[min_opening, max_opening]`.

```yaml
- name: valve1
  type: VALVE
  init_args:
    min_opening: 0.0
    max_opening: 100.0
    step: 1.0
    full_travel_time: 10.0
  expression: valve1.execute(target_opening=pid1.MV)
```
";

const PARAMS_TABLE: &str = "\
| 参数名 | 含义 | 初值 |
|--------|------|------|
| min_opening | 最小开度（%） | 0.0 |
| max_opening | 最大开度（%） | 100.0 |
| step | 开度量化步长（%） | 1.0 |
| full_travel_time | 满行程时间（秒） | 10.0 |
| initial_opening | 初始开度（%） | 0.0 |
";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ValveParams {
    min_opening: f64,
    max_opening: f64,
    step: f64,
    full_travel_time: f64,
    initial_opening: f64,
}

impl Default for ValveParams {
    fn default() -> Self {
        Self {
            min_opening: 0.0,
            max_opening: 100.0,
            step: 1.0,
            full_travel_time: 10.0,
            initial_opening: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct Valve {
    min_opening: f64,
    max_opening: f64,
    step: f64,
    full_travel_time: f64,
    cycle_time: f64,
    current_opening: f64,
    target_opening: f64,
}

fn build(init: &ProgramInit) -> Result<Box<dyn Program>, ConfigError> {
    let params: ValveParams = init.params()?;
    if params.max_opening < params.min_opening {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: format!(
                "max_opening ({}) must be >= min_opening ({})",
                params.max_opening, params.min_opening
            ),
        });
    }
    if params.step < 0.0 {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: format!("step must be >= 0, got {}", params.step),
        });
    }
    let initial = params
        .initial_opening
        .clamp(params.min_opening, params.max_opening);
    Ok(Box::new(Valve {
        min_opening: params.min_opening,
        max_opening: params.max_opening,
        step: params.step,
        full_travel_time: params.full_travel_time,
        cycle_time: init.cycle_time,
        current_opening: initial,
        target_opening: initial,
    }))
}

impl Program for Valve {
    fn execute(&mut self, inputs: &Inputs) -> Result<(), ProgramError> {
        reject_unknown_inputs(inputs, &["target_opening"])?;
        if let Some(target) = inputs.get("target_opening") {
            self.target_opening = target.clamp(self.min_opening, self.max_opening);
        }

        let rate = if self.full_travel_time > 0.0 {
            self.max_opening * self.cycle_time / self.full_travel_time
        } else {
            f64::INFINITY
        };

        let diff = self.target_opening - self.current_opening;
        if diff.abs() <= rate {
            self.current_opening = self.target_opening;
        } else {
            let mut next = self.current_opening + rate.copysign(diff);
            if self.step > 0.0 {
                next = (next / self.step).round() * self.step;
            }
            self.current_opening = next.clamp(self.min_opening, self.max_opening);
        }
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "current_opening" => Some(self.current_opening),
            "target_opening" => Some(self.target_opening),
            "min_opening" => Some(self.min_opening),
            "max_opening" => Some(self.max_opening),
            "step" => Some(self.step),
            "full_travel_time" => Some(self.full_travel_time),
            _ => None,
        }
    }

    fn stored_attributes(&self) -> &'static [&'static str] {
        &["current_opening", "target_opening"]
    }
}

pub fn register(registry: &mut ProgramRegistry) {
    registry.register_algorithm(
        "VALVE",
        build,
        DocEntry::new("valve", "阀门", DOC, PARAMS_TABLE),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valve(yaml: &str, cycle_time: f64) -> Box<dyn Program> {
        build(&crate::program::init_from_yaml("v", cycle_time, yaml)).unwrap()
    }

    #[test]
    fn test_slew_rate_limit() {
        // max_opening * cycle_time / full_travel_time = 100 * 1 / 10 = 10 per cycle
        let mut v = valve(
            "{min_opening: 0.0, max_opening: 100.0, step: 1.0, full_travel_time: 10.0}",
            1.0,
        );
        let mut inputs = Inputs::new();
        inputs.insert("target_opening".to_string(), 35.0);
        let mut openings = Vec::new();
        for _ in 0..4 {
            v.execute(&inputs).unwrap();
            openings.push(v.attribute("current_opening").unwrap());
        }
        assert_eq!(openings, vec![10.0, 20.0, 30.0, 35.0]);
    }

    #[test]
    fn test_target_clamped() {
        let mut v = valve("{min_opening: 0.0, max_opening: 50.0, full_travel_time: 0.0}", 1.0);
        let mut inputs = Inputs::new();
        inputs.insert("target_opening".to_string(), 300.0);
        v.execute(&inputs).unwrap();
        assert_eq!(v.attribute("current_opening"), Some(50.0));
    }

    #[test]
    fn test_quantized_to_step() {
        let mut v = valve(
            "{min_opening: 0.0, max_opening: 100.0, step: 5.0, full_travel_time: 30.0}",
            1.0,
        );
        // rate = 100 / 30 ≈ 3.33; the intermediate position snaps to 5.0
        let mut inputs = Inputs::new();
        inputs.insert("target_opening".to_string(), 50.0);
        v.execute(&inputs).unwrap();
        assert_eq!(v.attribute("current_opening"), Some(5.0));
    }

    #[test]
    fn test_holds_target_without_input() {
        let mut v = valve("{full_travel_time: 10.0}", 1.0);
        let mut inputs = Inputs::new();
        inputs.insert("target_opening".to_string(), 20.0);
        v.execute(&inputs).unwrap();
        v.execute(&Inputs::new()).unwrap();
        assert_eq!(v.attribute("current_opening"), Some(20.0));
    }
}
