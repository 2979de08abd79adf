use std::collections::HashMap;

use crate::chart::ChartScene;
use crate::ease::Ease;

/// Result of a keyed join between two element sets: what must be added,
/// what survives, and what must be removed.
#[derive(Debug)]
pub struct Join<'a, T> {
    pub entered: Vec<&'a T>,
    pub updated: Vec<(&'a T, &'a T)>,
    pub exited: Vec<&'a T>,
}

/// Match `next` against `prev` by key, in `next` order; exits keep `prev`
/// order. Keys are assumed unique within each set.
pub fn join_by_key<'a, T, K, F>(prev: &'a [T], next: &'a [T], key: F) -> Join<'a, T>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let prev_by_key: HashMap<K, &T> = prev.iter().map(|t| (key(t), t)).collect();
    let next_keys: std::collections::HashSet<K> = next.iter().map(|t| key(t)).collect();

    let mut entered = Vec::new();
    let mut updated = Vec::new();
    for n in next {
        match prev_by_key.get(&key(n)) {
            Some(p) => updated.push((*p, n)),
            None => entered.push(n),
        }
    }
    let exited = prev
        .iter()
        .filter(|p| !next_keys.contains(&key(p)))
        .collect();

    Join {
        entered,
        updated,
        exited,
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Eased interpolation between two consecutive resolved scenes.
///
/// Elements are matched by identity (entity name for bars/labels/category
/// ticks, tick value for gridlines and axis labels). Entering bars grow from
/// zero width at the baseline, exiting bars shrink back to zero and are gone
/// at `t = 1`; survivors move between their rank rows. `blend(_, next, 1.0)`
/// is exactly `next`.
pub fn blend_scenes(prev: &ChartScene, next: &ChartScene, t: f64, ease: Ease) -> ChartScene {
    let te = ease.apply(t);
    if te >= 1.0 {
        return next.clone();
    }
    if te <= 0.0 {
        return prev.clone();
    }

    let mut out = next.clone();

    // Bars keyed by entity name.
    let bars = join_by_key(&prev.bars, &next.bars, |b| b.name.clone());
    let prev_bars: HashMap<&str, &crate::chart::BarNode> =
        prev.bars.iter().map(|b| (b.name.as_str(), b)).collect();
    for bar in &mut out.bars {
        match prev_bars.get(bar.name.as_str()) {
            Some(p) => {
                bar.y = lerp(p.y, bar.y, te);
                bar.width = lerp(p.width, bar.width, te);
                bar.height = lerp(p.height, bar.height, te);
            }
            None => {
                // Enter: grow from zero width at the baseline, final row.
                bar.width *= te;
            }
        }
    }
    for p in bars.exited {
        let mut bar = p.clone();
        bar.width *= 1.0 - te;
        bar.opacity *= 1.0 - te;
        out.bars.push(bar);
    }

    // Value labels move with their bars.
    let labels = join_by_key(&prev.value_labels, &next.value_labels, |l| l.name.clone());
    let prev_labels: HashMap<&str, &crate::chart::ValueLabelNode> = prev
        .value_labels
        .iter()
        .map(|l| (l.name.as_str(), l))
        .collect();
    for label in &mut out.value_labels {
        match prev_labels.get(label.name.as_str()) {
            Some(p) => {
                label.x = lerp(p.x, label.x, te);
                label.y = lerp(p.y, label.y, te);
            }
            None => label.opacity *= te,
        }
    }
    for p in labels.exited {
        let mut label = p.clone();
        label.opacity *= 1.0 - te;
        out.value_labels.push(label);
    }

    // Category (left axis) labels follow the same join as bars.
    let cats = join_by_key(&prev.category_ticks, &next.category_ticks, |c| {
        c.name.clone()
    });
    let prev_cats: HashMap<&str, &crate::chart::CategoryTickNode> = prev
        .category_ticks
        .iter()
        .map(|c| (c.name.as_str(), c))
        .collect();
    for cat in &mut out.category_ticks {
        match prev_cats.get(cat.name.as_str()) {
            Some(p) => cat.y = lerp(p.y, cat.y, te),
            None => cat.opacity *= te,
        }
    }
    for p in cats.exited {
        let mut cat = p.clone();
        cat.opacity *= 1.0 - te;
        out.category_ticks.push(cat);
    }

    // Gridlines and axis tick labels keyed by tick value: surviving ticks
    // slide with the rescaled domain, the rest cross-fade.
    let grid_prev: HashMap<u64, &crate::chart::GridlineNode> =
        prev.gridlines.iter().map(|g| (g.tick.to_bits(), g)).collect();
    for g in &mut out.gridlines {
        match grid_prev.get(&g.tick.to_bits()) {
            Some(p) => g.x = lerp(p.x, g.x, te),
            None => g.opacity *= te,
        }
    }
    let next_grid_keys: std::collections::HashSet<u64> =
        next.gridlines.iter().map(|g| g.tick.to_bits()).collect();
    for p in &prev.gridlines {
        if !next_grid_keys.contains(&p.tick.to_bits()) {
            let mut g = p.clone();
            g.opacity *= 1.0 - te;
            out.gridlines.push(g);
        }
    }

    let tick_prev: HashMap<u64, &crate::chart::ValueTickNode> = prev
        .value_ticks
        .iter()
        .map(|v| (v.tick.to_bits(), v))
        .collect();
    for v in &mut out.value_ticks {
        match tick_prev.get(&v.tick.to_bits()) {
            Some(p) => v.x = lerp(p.x, v.x, te),
            None => v.opacity *= te,
        }
    }
    let next_tick_keys: std::collections::HashSet<u64> =
        next.value_ticks.iter().map(|v| v.tick.to_bits()).collect();
    for p in &prev.value_ticks {
        if !next_tick_keys.contains(&p.tick.to_bits()) {
            let mut v = p.clone();
            v.opacity *= 1.0 - te;
            out.value_ticks.push(v);
        }
    }

    // Progress marker slides continuously; year/total text swap at the
    // transition start.
    out.progress.x = lerp(prev.progress.x, next.progress.x, te);

    out
}
