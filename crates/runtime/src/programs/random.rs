//! Bounded random walk

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::{ConfigError, ProgramError};
use crate::program::{reject_unknown_inputs, Inputs, Program, ProgramInit};
use crate::registry::{DocEntry, ProgramRegistry};

const DOC: &str = "\
# Random walk generator

Holds a value inside `[L, H]` and moves it toward a fresh uniform target
each cycle, with the per-cycle change clamped to `max_step`. A run-level
`seed` makes the walk reproducible.

```yaml
- name: r1
  type: RANDOM
  init_args: {L: 0.0, H: 100.0, max_step: 3.0}
  expression: r1.execute()
```
";

const PARAMS_TABLE: &str = "\
| 参数名 | 含义 | 初值 |
|--------|------|------|
| L | 最小值 | 0.0 |
| H | 最大值 | 100.0 |
| max_step | 每周期最大变化量 | 3.0 |
";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RandomParams {
    #[serde(rename = "L")]
    l: f64,
    #[serde(rename = "H")]
    h: f64,
    max_step: f64,
}

impl Default for RandomParams {
    fn default() -> Self {
        Self {
            l: 0.0,
            h: 100.0,
            max_step: 3.0,
        }
    }
}

#[derive(Debug)]
pub struct Random {
    l: f64,
    h: f64,
    max_step: f64,
    rng: StdRng,
    out: f64,
}

fn build(init: &ProgramInit) -> Result<Box<dyn Program>, ConfigError> {
    let params: RandomParams = init.params()?;
    if params.h < params.l {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: format!("H ({}) must be >= L ({})", params.h, params.l),
        });
    }
    if params.max_step < 0.0 {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: format!("max_step must be >= 0, got {}", params.max_step),
        });
    }
    let mut rng = StdRng::seed_from_u64(init.seed);
    let out = rng.gen_range(params.l..=params.h);
    Ok(Box::new(Random {
        l: params.l,
        h: params.h,
        max_step: params.max_step,
        rng,
        out,
    }))
}

impl Program for Random {
    fn execute(&mut self, inputs: &Inputs) -> Result<(), ProgramError> {
        reject_unknown_inputs(inputs, &[])?;
        let target = self.rng.gen_range(self.l..=self.h);
        let change = (target - self.out).clamp(-self.max_step, self.max_step);
        self.out = (self.out + change).clamp(self.l, self.h);
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "out" => Some(self.out),
            "L" => Some(self.l),
            "H" => Some(self.h),
            "max_step" => Some(self.max_step),
            _ => None,
        }
    }

    fn stored_attributes(&self) -> &'static [&'static str] {
        &["out"]
    }
}

pub fn register(registry: &mut ProgramRegistry) {
    registry.register_algorithm(
        "RANDOM",
        build,
        DocEntry::new("random", "随机游走", DOC, PARAMS_TABLE),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_in_bounds_and_respects_step() {
        let init =
            crate::program::init_from_yaml("r", 0.5, "{L: 10.0, H: 20.0, max_step: 0.5}");
        let mut walk = build(&init).unwrap();
        let mut prev = walk.attribute("out").unwrap();
        for _ in 0..200 {
            walk.execute(&Inputs::new()).unwrap();
            let out = walk.attribute("out").unwrap();
            assert!((10.0..=20.0).contains(&out));
            assert!((out - prev).abs() <= 0.5 + 1e-12);
            prev = out;
        }
    }

    #[test]
    fn test_zero_step_is_constant() {
        let init = crate::program::init_from_yaml("r", 0.5, "{L: 0.0, H: 100.0, max_step: 0.0}");
        let mut walk = build(&init).unwrap();
        let first = walk.attribute("out").unwrap();
        for _ in 0..10 {
            walk.execute(&Inputs::new()).unwrap();
            assert_eq!(walk.attribute("out").unwrap(), first);
        }
    }

    #[test]
    fn test_seeded_runs_match() {
        let init = crate::program::init_from_yaml("r", 0.5, "{L: 0.0, H: 100.0, max_step: 3.0}");
        let mut a = build(&init).unwrap();
        let mut b = build(&init).unwrap();
        for _ in 0..50 {
            a.execute(&Inputs::new()).unwrap();
            b.execute(&Inputs::new()).unwrap();
            assert_eq!(a.attribute("out"), b.attribute("out"));
        }
    }
}
