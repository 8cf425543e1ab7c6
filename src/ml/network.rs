//! A minimal feed-forward yield-response regressor.
//!
//! One hidden ReLU layer, linear output, trained by plain SGD on mean
//! squared error. Deliberately small: the model only has to rank candidate
//! placements against each other, not produce calibrated yield forecasts.

use rand::seq::SliceRandom;
use rand::Rng;

/// One-hidden-layer regressor.
#[derive(Debug, Clone)]
pub struct YieldNet {
    input_dim: usize,
    hidden: usize,
    /// Hidden weights, row-major `[hidden][input_dim]`.
    w1: Vec<f64>,
    b1: Vec<f64>,
    w2: Vec<f64>,
    b2: f64,
}

impl YieldNet {
    /// Creates a network with uniform `±1/sqrt(fan_in)` weight init.
    pub fn new<R: Rng>(input_dim: usize, hidden: usize, rng: &mut R) -> Self {
        let scale1 = 1.0 / (input_dim as f64).sqrt();
        let scale2 = 1.0 / (hidden as f64).sqrt();
        Self {
            input_dim,
            hidden,
            w1: (0..hidden * input_dim).map(|_| rng.random_range(-scale1..scale1)).collect(),
            b1: vec![0.0; hidden],
            w2: (0..hidden).map(|_| rng.random_range(-scale2..scale2)).collect(),
            b2: 0.0,
        }
    }

    /// Forward pass.
    pub fn predict(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.input_dim);
        let mut out = self.b2;
        for h in 0..self.hidden {
            let row = &self.w1[h * self.input_dim..(h + 1) * self.input_dim];
            let z: f64 = row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + self.b1[h];
            if z > 0.0 {
                out += self.w2[h] * z;
            }
        }
        out
    }

    /// Trains in place with SGD, shuffling samples each epoch.
    ///
    /// Returns the mean squared error over the final epoch.
    pub fn train<R: Rng>(
        &mut self,
        xs: &[Vec<f64>],
        ys: &[f64],
        epochs: usize,
        learning_rate: f64,
        rng: &mut R,
    ) -> f64 {
        assert_eq!(xs.len(), ys.len());
        let mut order: Vec<usize> = (0..xs.len()).collect();
        let mut last_mse = 0.0;

        for _ in 0..epochs {
            order.shuffle(rng);
            let mut sse = 0.0;
            for &i in &order {
                sse += self.sgd_step(&xs[i], ys[i], learning_rate);
            }
            last_mse = sse / xs.len().max(1) as f64;
        }
        last_mse
    }

    /// One backprop step; returns the squared error before the update.
    fn sgd_step(&mut self, x: &[f64], y: f64, lr: f64) -> f64 {
        // Forward, keeping pre-activations.
        let mut z = vec![0.0; self.hidden];
        let mut out = self.b2;
        for h in 0..self.hidden {
            let row = &self.w1[h * self.input_dim..(h + 1) * self.input_dim];
            z[h] = row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + self.b1[h];
            if z[h] > 0.0 {
                out += self.w2[h] * z[h];
            }
        }

        let err = out - y;

        // Backward.
        for h in 0..self.hidden {
            if z[h] <= 0.0 {
                continue;
            }
            let grad_w2 = err * z[h];
            let grad_h = err * self.w2[h];
            self.w2[h] -= lr * grad_w2;
            self.b1[h] -= lr * grad_h;
            let row = &mut self.w1[h * self.input_dim..(h + 1) * self.input_dim];
            for (w, &xi) in row.iter_mut().zip(x) {
                *w -= lr * grad_h * xi;
            }
        }
        self.b2 -= lr * err;

        err * err
    }
}
