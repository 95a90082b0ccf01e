// ─────────────────────────────────────────────────────────────────────
// FPS Simulator — Input Scenario Generator
// ─────────────────────────────────────────────────────────────────────
//! Exogenous input series I_n(t). Pure: no randomness involved.

use fps_types::Scenario;

/// `steps` evenly spaced samples from 0 to `t`, both ends included.
pub fn linspace(t: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let span = (steps - 1) as f64;
            (0..steps).map(|i| t * i as f64 / span).collect()
        }
    }
}

/// Time axis of a run: floor(T / dt) samples spanning [0, T].
pub fn time_axis(t: f64, dt: f64) -> Vec<f64> {
    let steps = (t / dt).floor();
    if !(steps.is_finite() && steps > 0.0) {
        return Vec::new();
    }
    linspace(t, steps as usize)
}

/// Input value shared by every strate at time `t` of a run of length `duration`.
#[inline]
pub fn input_at(scenario: Scenario, t: f64, duration: f64) -> f64 {
    match scenario {
        Scenario::Constant => 0.3,
        Scenario::Step => {
            if t >= duration / 4.0 {
                1.0
            } else {
                0.3
            }
        }
        Scenario::Ramp => t / duration,
    }
}

/// Full I_n(t) table: one row per step, `n` columns.
pub fn generate(scenario: Scenario, duration: f64, dt: f64, n: usize) -> Vec<Vec<f64>> {
    time_axis(duration, dt)
        .into_iter()
        .map(|t| vec![input_at(scenario, t, duration); n])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_axis_endpoints() {
        let axis = time_axis(20.0, 0.05);
        assert_eq!(axis.len(), 400);
        assert_eq!(axis[0], 0.0);
        assert_eq!(*axis.last().unwrap(), 20.0);
    }

    #[test]
    fn test_time_axis_degenerate() {
        assert!(time_axis(0.01, 0.1).is_empty());
        assert_eq!(linspace(3.0, 1), vec![0.0]);
    }

    #[test]
    fn test_constant() {
        let table = generate(Scenario::Constant, 2.0, 0.1, 3);
        assert_eq!(table.len(), 20);
        assert!(table.iter().flatten().all(|&v| v == 0.3));
    }

    #[test]
    fn test_step_switches_at_quarter() {
        let duration = 8.0;
        assert_eq!(input_at(Scenario::Step, 1.99, duration), 0.3);
        assert_eq!(input_at(Scenario::Step, 2.0, duration), 1.0);
        let table = generate(Scenario::Step, duration, 0.1, 2);
        assert_eq!(table[0], vec![0.3, 0.3]);
        assert_eq!(*table.last().unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_ramp_spans_unit_interval() {
        let table = generate(Scenario::Ramp, 5.0, 0.5, 4);
        assert_eq!(table[0][0], 0.0);
        assert_eq!(table.last().unwrap()[3], 1.0);
        assert!(table.windows(2).all(|w| w[1][0] > w[0][0]));
    }

    #[test]
    fn test_generator_is_pure() {
        for scenario in Scenario::ALL {
            assert_eq!(
                generate(scenario, 3.0, 0.05, 4),
                generate(scenario, 3.0, 0.05, 4)
            );
        }
    }
}
