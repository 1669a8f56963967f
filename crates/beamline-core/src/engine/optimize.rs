use super::error::EngineError;

/// Budget for a derivative-free minimization: the search stops when the
/// simplex function spread falls below `tolerance` or after
/// `max_iterations` steps, whichever comes first.
#[derive(Debug, Clone, Copy)]
pub struct MinimizeBudget {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for MinimizeBudget {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 2000,
        }
    }
}

/// Result of a bounded minimization.
#[derive(Debug, Clone)]
pub struct MinimizeResult {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Nelder-Mead downhill simplex with an explicit iteration/tolerance budget.
///
/// The objective may fail (a step through a map sequence can hit a
/// non-physical state); failures abort the search and propagate.
pub fn nelder_mead<F>(
    mut objective: F,
    x0: &[f64],
    initial_step: f64,
    budget: &MinimizeBudget,
) -> Result<MinimizeResult, EngineError>
where
    F: FnMut(&[f64]) -> Result<f64, EngineError>,
{
    let n = x0.len();
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut vertex = x0.to_vec();
        vertex[i] += initial_step;
        simplex.push(vertex);
    }
    let mut values = Vec::with_capacity(n + 1);
    for vertex in &simplex {
        values.push(objective(vertex)?);
    }

    const REFLECTION: f64 = 1.0;
    const EXPANSION: f64 = 2.0;
    const CONTRACTION: f64 = 0.5;
    const SHRINK: f64 = 0.5;

    let mut iterations = 0;
    loop {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let spread = values[worst] - values[best];
        if spread < budget.tolerance {
            return Ok(MinimizeResult {
                x: simplex[best].clone(),
                value: values[best],
                iterations,
                converged: true,
            });
        }
        if iterations >= budget.max_iterations {
            return Ok(MinimizeResult {
                x: simplex[best].clone(),
                value: values[best],
                iterations,
                converged: false,
            });
        }
        iterations += 1;

        let mut centroid = vec![0.0; n];
        for &idx in order.iter().take(n) {
            for (c, &v) in centroid.iter_mut().zip(simplex[idx].iter()) {
                *c += v / n as f64;
            }
        }

        let reflect: Vec<f64> = centroid
            .iter()
            .zip(simplex[worst].iter())
            .map(|(c, w)| c + REFLECTION * (c - w))
            .collect();
        let f_reflect = objective(&reflect)?;

        if f_reflect < values[best] {
            let expand: Vec<f64> = centroid
                .iter()
                .zip(reflect.iter())
                .map(|(c, r)| c + EXPANSION * (r - c))
                .collect();
            let f_expand = objective(&expand)?;
            if f_expand < f_reflect {
                simplex[worst] = expand;
                values[worst] = f_expand;
            } else {
                simplex[worst] = reflect;
                values[worst] = f_reflect;
            }
            continue;
        }
        if f_reflect < values[order[n - 1]] {
            simplex[worst] = reflect;
            values[worst] = f_reflect;
            continue;
        }

        let contract: Vec<f64> = centroid
            .iter()
            .zip(simplex[worst].iter())
            .map(|(c, w)| c + CONTRACTION * (w - c))
            .collect();
        let f_contract = objective(&contract)?;
        if f_contract < values[worst] {
            simplex[worst] = contract;
            values[worst] = f_contract;
            continue;
        }

        let best_vertex = simplex[best].clone();
        for idx in 0..=n {
            if idx == best {
                continue;
            }
            let shrunk: Vec<f64> = best_vertex
                .iter()
                .zip(simplex[idx].iter())
                .map(|(b, v)| b + SHRINK * (v - b))
                .collect();
            values[idx] = objective(&shrunk)?;
            simplex[idx] = shrunk;
        }
    }
}
