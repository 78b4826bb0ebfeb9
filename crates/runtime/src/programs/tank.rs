//! Cylindrical tank model

use std::f64::consts::PI;

use serde::Deserialize;

use crate::error::{ConfigError, ProgramError};
use crate::program::{reject_unknown_inputs, Inputs, Program, ProgramInit};
use crate::registry::{DocEntry, ProgramRegistry};

/// Gravitational acceleration (m/s²)
const GRAVITY: f64 = 9.81;

const DOC: &str = "\
# Cylindrical tank model

A cylindrical tank with a valve-controlled inlet at the top and a free
outlet at the bottom. The outlet velocity follows Torricelli's law
(`v = sqrt(2gh)`); the level integrates inflow minus outflow over the
cycle time and is clipped to `[0, height]`.

```yaml
- name: tank1
  type: CYLINDRICAL_TANK
  init_args: {height: 10.0, radius: 1.0, initial_level: 0.0}
  expression: tank1.execute(valve_opening=valve1.current_opening)
```
";

const PARAMS_TABLE: &str = "\
| 参数名 | 含义 | 初值 |
|--------|------|------|
| height | 水箱高度（米） | 2.0 |
| radius | 水箱半径（米） | 0.5 |
| inlet_area | 入水管面积（平方米） | 0.06 |
| inlet_velocity | 入水口水流速（米/秒） | 3.0 |
| outlet_area | 出水口面积（平方米） | 0.001 |
| initial_level | 初始水位（米） | 0.0 |
";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TankParams {
    height: f64,
    radius: f64,
    inlet_area: f64,
    inlet_velocity: f64,
    outlet_area: f64,
    initial_level: f64,
}

impl Default for TankParams {
    fn default() -> Self {
        Self {
            height: 2.0,
            radius: 0.5,
            inlet_area: 0.06,
            inlet_velocity: 3.0,
            outlet_area: 0.001,
            initial_level: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct CylindricalTank {
    height: f64,
    radius: f64,
    inlet_area: f64,
    inlet_velocity: f64,
    outlet_area: f64,
    base_area: f64,
    cycle_time: f64,
    level: f64,
    valve_opening: f64,
}

fn build(init: &ProgramInit) -> Result<Box<dyn Program>, ConfigError> {
    let params: TankParams = init.params()?;
    if params.height <= 0.0 || params.radius <= 0.0 {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: "height and radius must be positive".to_string(),
        });
    }
    Ok(Box::new(CylindricalTank {
        height: params.height,
        radius: params.radius,
        inlet_area: params.inlet_area,
        inlet_velocity: params.inlet_velocity,
        outlet_area: params.outlet_area,
        base_area: PI * params.radius * params.radius,
        cycle_time: init.cycle_time,
        level: params.initial_level.clamp(0.0, params.height),
        valve_opening: 0.0,
    }))
}

impl Program for CylindricalTank {
    fn execute(&mut self, inputs: &Inputs) -> Result<(), ProgramError> {
        reject_unknown_inputs(inputs, &["valve_opening"])?;
        if let Some(opening) = inputs.get("valve_opening") {
            self.valve_opening = opening.clamp(0.0, 100.0);
        }

        let inlet_flow = self.inlet_area * self.inlet_velocity * (self.valve_opening / 100.0);

        let outlet_flow = if self.level > 0.0 {
            self.outlet_area * (2.0 * GRAVITY * self.level).sqrt()
        } else {
            0.0
        };

        let level_change = (inlet_flow - outlet_flow) * self.cycle_time / self.base_area;
        self.level = (self.level + level_change).clamp(0.0, self.height);
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "level" => Some(self.level),
            "valve_opening" => Some(self.valve_opening),
            "height" => Some(self.height),
            "radius" => Some(self.radius),
            "inlet_area" => Some(self.inlet_area),
            "inlet_velocity" => Some(self.inlet_velocity),
            "outlet_area" => Some(self.outlet_area),
            _ => None,
        }
    }

    fn stored_attributes(&self) -> &'static [&'static str] {
        &["level", "valve_opening"]
    }
}

pub fn register(registry: &mut ProgramRegistry) {
    registry.register_algorithm(
        "CYLINDRICAL_TANK",
        build,
        DocEntry::new("cylindrical_tank", "圆柱水箱", DOC, PARAMS_TABLE),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tank(yaml: &str) -> Box<dyn Program> {
        build(&crate::program::init_from_yaml("tank", 1.0, yaml)).unwrap()
    }

    #[test]
    fn test_fills_with_open_valve() {
        let mut t = tank("{height: 2.0, radius: 0.5}");
        let mut inputs = Inputs::new();
        inputs.insert("valve_opening".to_string(), 100.0);
        t.execute(&inputs).unwrap();
        // Full inlet, empty tank: level rises by inlet_flow * ct / base_area
        let expected = 0.06 * 3.0 / (PI * 0.25);
        assert!((t.attribute("level").unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_drains_when_closed() {
        let mut t = tank("{height: 2.0, radius: 0.5, initial_level: 1.0}");
        t.execute(&Inputs::new()).unwrap();
        assert!(t.attribute("level").unwrap() < 1.0);
    }

    #[test]
    fn test_level_clipped_to_height() {
        let mut t = tank("{height: 0.1, radius: 0.1, initial_level: 0.1}");
        let mut inputs = Inputs::new();
        inputs.insert("valve_opening".to_string(), 100.0);
        for _ in 0..100 {
            t.execute(&inputs).unwrap();
        }
        assert!(t.attribute("level").unwrap() <= 0.1);
    }
}
