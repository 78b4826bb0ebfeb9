//! Proportional-band PID controller

use serde::Deserialize;

use crate::error::{ConfigError, ProgramError};
use crate::program::{reject_unknown_inputs, Inputs, Program, ProgramInit};
use crate::registry::{DocEntry, ProgramRegistry};

const DOC: &str = "\
# PID controller

Proportional-band PID for process control.

- Inputs: `PV` (process variable), `SV` (setpoint); both optional per
  cycle, the last value is held.
- Output: `MV`, clamped to `[l, h]`.

Control law per cycle:

- proportional: `p = pb * error`
- integral: `i = pb / ti * ∫ error dt` (when `ti > 0`)
- derivative: `d = pb * td * d(error)/dt`
- `MV = clamp(p + i + d, l, h)`

Deterministic given its inputs and prior state.

```yaml
- name: pid1
  type: PID
  init_args: {pb: 120, ti: 30, td: 0.15, h: 100.0, l: 0.0}
  expression: pid1.execute(PV=tank1.level, SV=sin1.out)
```
";

const PARAMS_TABLE: &str = "\
| 参数名 | 含义 | 初值 |
|--------|------|------|
| pb | 比例带，控制器的比例增益参数 | 12.0 |
| ti | 积分时间（秒），用于消除稳态误差 | 30.0 |
| td | 微分时间（秒），用于改善动态响应 | 0.15 |
| pv | 过程变量初始值 | 0.0 |
| sv | 设定值初始值 | 0.0 |
| mv | 输出初始值 | 0.0 |
| h | 输出上限 | 100.0 |
| l | 输出下限 | 0.0 |
";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PidParams {
    pb: f64,
    ti: f64,
    td: f64,
    pv: f64,
    sv: f64,
    mv: f64,
    h: f64,
    l: f64,
}

impl Default for PidParams {
    fn default() -> Self {
        Self {
            pb: 12.0,
            ti: 30.0,
            td: 0.15,
            pv: 0.0,
            sv: 0.0,
            mv: 0.0,
            h: 100.0,
            l: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct Pid {
    pb: f64,
    ti: f64,
    td: f64,
    h: f64,
    l: f64,
    cycle_time: f64,
    pv: f64,
    sv: f64,
    mv: f64,
    error: f64,
    last_error: f64,
    integral: f64,
}

fn build(init: &ProgramInit) -> Result<Box<dyn Program>, ConfigError> {
    let params: PidParams = init.params()?;
    if params.h < params.l {
        return Err(ConfigError::InvalidInitArgs {
            name: init.name.clone(),
            message: format!("h ({}) must be >= l ({})", params.h, params.l),
        });
    }
    Ok(Box::new(Pid {
        pb: params.pb,
        ti: params.ti,
        td: params.td,
        h: params.h,
        l: params.l,
        cycle_time: init.cycle_time,
        pv: params.pv,
        sv: params.sv,
        mv: params.mv,
        error: 0.0,
        last_error: 0.0,
        integral: 0.0,
    }))
}

impl Program for Pid {
    fn execute(&mut self, inputs: &Inputs) -> Result<(), ProgramError> {
        reject_unknown_inputs(inputs, &["PV", "SV"])?;
        if let Some(pv) = inputs.get("PV") {
            self.pv = *pv;
        }
        if let Some(sv) = inputs.get("SV") {
            self.sv = *sv;
        }

        self.error = self.sv - self.pv;

        let p_term = self.pb * self.error;

        self.integral += self.error * self.cycle_time;
        let i_term = if self.ti > 0.0 {
            self.pb / self.ti * self.integral
        } else {
            0.0
        };

        let d_term = self.pb * self.td * (self.error - self.last_error) / self.cycle_time;
        self.last_error = self.error;

        self.mv = (p_term + i_term + d_term).clamp(self.l, self.h);
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "MV" => Some(self.mv),
            "PV" => Some(self.pv),
            "SV" => Some(self.sv),
            "error" => Some(self.error),
            "pb" => Some(self.pb),
            "ti" => Some(self.ti),
            "td" => Some(self.td),
            "h" => Some(self.h),
            "l" => Some(self.l),
            _ => None,
        }
    }

    fn stored_attributes(&self) -> &'static [&'static str] {
        &["MV", "PV", "SV", "error"]
    }
}

pub fn register(registry: &mut ProgramRegistry) {
    registry.register_algorithm("PID", build, DocEntry::new("pid", "PID控制器", DOC, PARAMS_TABLE));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> Box<dyn Program> {
        let init = crate::program::init_from_yaml(
            "pid",
            1.0,
            "{pb: 2.0, ti: 0.0, td: 0.0, h: 100.0, l: -100.0}",
        );
        build(&init).unwrap()
    }

    #[test]
    fn test_proportional_only() {
        let mut pid = controller();
        let mut inputs = Inputs::new();
        inputs.insert("PV".to_string(), 1.0);
        inputs.insert("SV".to_string(), 4.0);
        pid.execute(&inputs).unwrap();
        // error = 3, p = pb * error = 6, no integral (ti = 0), no derivative (td = 0)
        assert_eq!(pid.attribute("error"), Some(3.0));
        assert_eq!(pid.attribute("MV"), Some(6.0));
    }

    #[test]
    fn test_inputs_held_between_cycles() {
        let mut pid = controller();
        let mut inputs = Inputs::new();
        inputs.insert("SV".to_string(), 10.0);
        pid.execute(&inputs).unwrap();
        pid.execute(&Inputs::new()).unwrap();
        assert_eq!(pid.attribute("SV"), Some(10.0));
    }

    #[test]
    fn test_output_clamped() {
        let init = crate::program::init_from_yaml(
            "pid",
            1.0,
            "{pb: 1000.0, ti: 0.0, td: 0.0, h: 50.0, l: 0.0}",
        );
        let mut pid = build(&init).unwrap();
        let mut inputs = Inputs::new();
        inputs.insert("PV".to_string(), 0.0);
        inputs.insert("SV".to_string(), 1.0);
        pid.execute(&inputs).unwrap();
        assert_eq!(pid.attribute("MV"), Some(50.0));
    }

    #[test]
    fn test_deterministic() {
        let mut a = controller();
        let mut b = controller();
        for i in 0..20 {
            let mut inputs = Inputs::new();
            inputs.insert("PV".to_string(), (i as f64) * 0.1);
            inputs.insert("SV".to_string(), 1.0);
            a.execute(&inputs).unwrap();
            b.execute(&inputs).unwrap();
            assert_eq!(a.attribute("MV"), b.attribute("MV"));
        }
    }

    #[test]
    fn test_integral_accumulates() {
        let init = crate::program::init_from_yaml(
            "pid",
            1.0,
            "{pb: 1.0, ti: 1.0, td: 0.0, h: 1000.0, l: -1000.0}",
        );
        let mut pid = build(&init).unwrap();
        let mut inputs = Inputs::new();
        inputs.insert("PV".to_string(), 0.0);
        inputs.insert("SV".to_string(), 1.0);
        // error stays 1; integral grows by 1 each cycle: MV = 1 + n
        pid.execute(&inputs).unwrap();
        assert_eq!(pid.attribute("MV"), Some(2.0));
        pid.execute(&inputs).unwrap();
        assert_eq!(pid.attribute("MV"), Some(3.0));
    }
}
