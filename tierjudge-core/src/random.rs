/// Injected randomness for pair selection.
///
/// The engine never reaches for a global generator: every function that
/// shuffles or draws takes a `RandomSource`, so runs can be replayed exactly.

/// A source of uniform floats in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: rand::Rng> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Replays a fixed sequence of values, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`. An empty script always yields 0.0.
#[derive(Debug, Clone)]
pub struct ReplayRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl ReplayRandom {
    pub fn new(values: Vec<f64>) -> Self {
        ReplayRandom { values, cursor: 0 }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ReplayRandom {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Uniform index in `0..len`. `len` must be non-zero.
pub(crate) fn index_below<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> usize {
    let idx = (rng.next_f64() * len as f64).floor() as usize;
    idx.min(len - 1)
}
