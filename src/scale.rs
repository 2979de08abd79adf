use std::collections::HashMap;

use crate::core::Rgba8;
use crate::data::Dataset;

/// Continuous linear mapping from a value domain onto a pixel range.
///
/// Domains are recomputed every frame (the chart re-ranks per year), so the
/// scale is a cheap value type rather than a cached object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    d0: f64,
    d1: f64,
    r0: f64,
    r1: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            d0: domain.0,
            d1: domain.1,
            r0: range.0,
            r1: range.1,
        }
    }

    /// Map a domain value into the range. A degenerate domain maps everything
    /// to the range start.
    pub fn scale(&self, v: f64) -> f64 {
        let span = self.d1 - self.d0;
        if span == 0.0 || !span.is_finite() {
            return self.r0;
        }
        self.r0 + (v - self.d0) / span * (self.r1 - self.r0)
    }

    /// Round tick values covering the domain, at most roughly `count` of them.
    ///
    /// Steps are powers of ten times 1, 2, or 5, so tick identity is stable
    /// across frames whenever the domain only moves a little.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (start, stop) = (self.d0.min(self.d1), self.d0.max(self.d1));
        if start == stop || count == 0 {
            return vec![start];
        }
        let step = tick_step(start, stop, count);
        if step <= 0.0 || !step.is_finite() {
            return vec![start];
        }
        let first = (start / step).ceil();
        let last = (stop / step).floor();
        let n = (last - first) as i64;
        let mut out = Vec::with_capacity((n.max(0) as usize) + 1);
        for i in 0..=n.max(0) {
            out.push((first + i as f64) * step);
        }
        out
    }
}

fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();
    let step0 = (stop - start) / count.max(1) as f64;
    let power = step0.log10().floor();
    let base = 10f64.powf(power);
    let error = step0 / base;
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };
    base * factor
}

/// Ordinal band scale: evenly spaced rows with inner/outer padding.
#[derive(Clone, Debug)]
pub struct BandScale {
    names: Vec<String>,
    r0: f64,
    r1: f64,
    padding: f64,
}

impl BandScale {
    pub fn new(names: Vec<String>, range: (f64, f64), padding: f64) -> Self {
        Self {
            names,
            r0: range.0,
            r1: range.1,
            padding: padding.clamp(0.0, 1.0),
        }
    }

    fn step(&self) -> f64 {
        let n = self.names.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        (self.r1 - self.r0) / (n - self.padding + 2.0 * self.padding)
    }

    /// Height of one band.
    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Top edge of the band at ordinal position `i`.
    pub fn position_at(&self, i: usize) -> f64 {
        self.r0 + self.step() * (self.padding + i as f64)
    }

    /// Top edge of the named band, if present in the domain.
    pub fn position(&self, name: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == name)?;
        Some(self.position_at(i))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The ten-color categorical palette used for bars.
pub const TABLEAU10: [Rgba8; 10] = [
    Rgba8::rgb(0x4e, 0x79, 0xa7),
    Rgba8::rgb(0xf2, 0x8e, 0x2b),
    Rgba8::rgb(0xe1, 0x57, 0x59),
    Rgba8::rgb(0x76, 0xb7, 0xb2),
    Rgba8::rgb(0x59, 0xa1, 0x4f),
    Rgba8::rgb(0xed, 0xc9, 0x48),
    Rgba8::rgb(0xb0, 0x7a, 0xa1),
    Rgba8::rgb(0xff, 0x9d, 0xa7),
    Rgba8::rgb(0x9c, 0x75, 0x5f),
    Rgba8::rgb(0xba, 0xb0, 0xac),
];

/// Ordinal color assignment keyed by entity name.
///
/// Names are assigned palette slots in first-seen order across the whole
/// dataset so an entity keeps its color for the entire animation, including
/// when it drops out of the ranking and later re-enters.
#[derive(Clone, Debug, Default)]
pub struct Palette {
    slot_by_name: HashMap<String, usize>,
}

impl Palette {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut slot_by_name = HashMap::new();
        for snap in dataset.snapshots() {
            for entity in &snap.data {
                let next = slot_by_name.len();
                slot_by_name.entry(entity.name.clone()).or_insert(next);
            }
        }
        Self { slot_by_name }
    }

    pub fn color_for(&self, name: &str) -> Rgba8 {
        let slot = self.slot_by_name.get(name).copied().unwrap_or(0);
        TABLEAU10[slot % TABLEAU10.len()]
    }
}
