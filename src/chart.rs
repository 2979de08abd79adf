use crate::core::{Canvas, Margins, Rgba8, format_thousands};
use crate::data::Dataset;
use crate::error::{RankraceError, RankraceResult};
use crate::playback::progress_fraction;
use crate::scale::{BandScale, LinearScale, Palette};

/// Fixed layout of the chart: canvas size, margins, row padding, transition
/// timing. Defaults match the classic 1200x600 race chart; callers can
/// override them.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChartLayout {
    pub canvas: Canvas,
    pub margin: Margins,
    /// Transition (and tick) interval in milliseconds.
    pub transition_ms: u64,
    /// Inner/outer padding of the rank rows.
    pub band_padding: f64,
    /// Requested count for value-axis ticks.
    pub tick_count: usize,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1200,
                height: 600,
            },
            margin: Margins {
                top: 50.0,
                right: 80.0,
                bottom: 80.0,
                left: 400.0,
            },
            transition_ms: 150,
            band_padding: 0.15,
            tick_count: 5,
        }
    }
}

impl ChartLayout {
    /// Left edge of the plotting area.
    pub fn plot_left(&self) -> f64 {
        self.margin.left
    }

    /// Right edge of the plotting area.
    pub fn plot_right(&self) -> f64 {
        self.canvas.width as f64 - self.margin.right
    }

    pub fn plot_top(&self) -> f64 {
        self.margin.top
    }

    pub fn plot_bottom(&self) -> f64 {
        self.canvas.height as f64 - self.margin.bottom
    }
}

/// Horizontal text anchoring relative to the node's `x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

/// Vertical placement of text relative to the node's `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum VAlign {
    /// `y` is the vertical center of the text block.
    Center,
    /// `y` is the text baseline.
    Baseline,
}

/// A positioned text block.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TextNode {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub size_px: f64,
    pub anchor: Anchor,
    pub valign: VAlign,
    pub color: Rgba8,
    pub opacity: f64,
}

/// One ranked bar, keyed by entity name across frames.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BarNode {
    pub name: String,
    pub value: u64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: Rgba8,
    pub opacity: f64,
}

/// Value label just past a bar's end, keyed like its bar.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ValueLabelNode {
    pub name: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
}

/// Dashed vertical gridline at a value-axis tick, keyed by tick value.
#[derive(Clone, Debug, serde::Serialize)]
pub struct GridlineNode {
    pub tick: f64,
    pub x: f64,
    pub y0: f64,
    pub y1: f64,
    pub opacity: f64,
}

/// Top-axis tick label, keyed by tick value.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ValueTickNode {
    pub tick: f64,
    pub x: f64,
    pub label: String,
    pub opacity: f64,
}

/// Left-axis category label, keyed by entity name.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CategoryTickNode {
    pub name: String,
    pub y: f64,
    pub opacity: f64,
}

/// Static timeline furniture below the chart: baseline, a major tick with a
/// year label every 4th year, a minor tick every year.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TimelineNode {
    pub y: f64,
    pub x0: f64,
    pub x1: f64,
    pub major: Vec<(i32, f64)>,
    pub minor: Vec<(i32, f64)>,
}

/// The moving progress marker: a short vertical line with a dot and
/// the current year underneath the displayed frame position.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ProgressNode {
    pub x: f64,
    pub y0: f64,
    pub y1: f64,
    pub year_label: String,
}

/// Everything drawn for one frame, fully resolved to pixel coordinates.
///
/// Scenes are pure values: building one mutates nothing, and the same
/// `(dataset, index, layout)` always yields the same scene.
#[derive(Clone, Debug, serde::Serialize)]
pub struct ChartScene {
    pub index: usize,
    pub year: i32,
    pub gridlines: Vec<GridlineNode>,
    pub value_ticks: Vec<ValueTickNode>,
    pub category_ticks: Vec<CategoryTickNode>,
    pub bars: Vec<BarNode>,
    pub value_labels: Vec<ValueLabelNode>,
    pub year_text: TextNode,
    pub total_text: TextNode,
    pub timeline: TimelineNode,
    pub progress: ProgressNode,
}

impl ChartScene {
    /// The per-frame chart update: derive scales from the snapshot at
    /// `index`, then lay out axes, gridlines, bars, labels, the year/total
    /// readout, and the progress marker.
    pub fn build(
        dataset: &Dataset,
        index: usize,
        layout: &ChartLayout,
        palette: &Palette,
    ) -> RankraceResult<Self> {
        let snapshot = dataset.get(index).ok_or_else(|| {
            RankraceError::validation(format!(
                "frame index {index} out of bounds (dataset has {} years)",
                dataset.len()
            ))
        })?;

        // Re-ranked every frame: the snapshot is already ordered, but render
        // order must not depend on that.
        let mut ranked = snapshot.data.clone();
        ranked.sort_by(|a, b| b.value.cmp(&a.value));

        let max_value = ranked.first().map(|e| e.value).unwrap_or(0).max(1);
        let x = LinearScale::new(
            (0.0, max_value as f64),
            (layout.plot_left(), layout.plot_right()),
        );
        let y = BandScale::new(
            ranked.iter().map(|e| e.name.clone()).collect(),
            (layout.plot_top(), layout.plot_bottom()),
            layout.band_padding,
        );

        let ticks = x.ticks(layout.tick_count);
        let gridlines = ticks
            .iter()
            .map(|&t| GridlineNode {
                tick: t,
                x: x.scale(t),
                y0: layout.plot_top(),
                y1: layout.plot_bottom(),
                opacity: 1.0,
            })
            .collect();
        let value_ticks = ticks
            .iter()
            .map(|&t| ValueTickNode {
                tick: t,
                x: x.scale(t),
                label: format_thousands(t.round().max(0.0) as u64),
                opacity: 1.0,
            })
            .collect();

        let bandwidth = y.bandwidth();
        let bars = ranked
            .iter()
            .enumerate()
            .map(|(i, e)| BarNode {
                name: e.name.clone(),
                value: e.value,
                x: x.scale(0.0),
                y: y.position_at(i),
                width: x.scale(e.value as f64) - x.scale(0.0),
                height: bandwidth,
                color: palette.color_for(&e.name),
                opacity: 1.0,
            })
            .collect::<Vec<_>>();

        let value_labels = ranked
            .iter()
            .enumerate()
            .map(|(i, e)| ValueLabelNode {
                name: e.name.clone(),
                text: format_thousands(e.value),
                x: (x.scale(e.value as f64) + 5.0).min(layout.plot_right()),
                y: y.position_at(i) + bandwidth / 2.0,
                opacity: 1.0,
            })
            .collect();

        let category_ticks = ranked
            .iter()
            .enumerate()
            .map(|(i, e)| CategoryTickNode {
                name: e.name.clone(),
                y: y.position_at(i) + bandwidth / 2.0,
                opacity: 1.0,
            })
            .collect();

        let year_text = TextNode {
            text: snapshot.year.to_string(),
            x: layout.plot_right(),
            y: layout.plot_bottom() - 60.0,
            size_px: 70.0,
            anchor: Anchor::End,
            valign: VAlign::Baseline,
            color: Rgba8::rgb(0x33, 0x33, 0x33),
            opacity: 1.0,
        };
        let total_text = TextNode {
            text: format!("Total: {}", format_thousands(snapshot.total)),
            x: layout.plot_right() - 10.0,
            y: layout.plot_bottom() - 10.0,
            size_px: 20.0,
            anchor: Anchor::End,
            valign: VAlign::Baseline,
            color: Rgba8::rgb(0x33, 0x33, 0x33),
            opacity: 1.0,
        };

        let timeline = Self::build_timeline(dataset, layout);

        let fraction = progress_fraction(index, dataset.len());
        let progress_x =
            layout.plot_left() + fraction * (layout.plot_right() - layout.plot_left());
        let progress = ProgressNode {
            x: progress_x,
            y0: layout.plot_bottom() + 35.0,
            y1: layout.plot_bottom() + 40.0,
            year_label: snapshot.year.to_string(),
        };

        Ok(Self {
            index,
            year: snapshot.year,
            gridlines,
            value_ticks,
            category_ticks,
            bars,
            value_labels,
            year_text,
            total_text,
            timeline,
            progress,
        })
    }

    fn build_timeline(dataset: &Dataset, layout: &ChartLayout) -> TimelineNode {
        let y = layout.plot_bottom() + 45.0;
        let (x0, x1) = (layout.plot_left(), layout.plot_right());
        let Some((first, last)) = dataset.year_span() else {
            return TimelineNode {
                y,
                x0,
                x1,
                major: Vec::new(),
                minor: Vec::new(),
            };
        };

        let scale = LinearScale::new((first as f64, last as f64), (x0, x1));
        let mut major = Vec::new();
        let mut minor = Vec::new();
        for snap in dataset.snapshots() {
            let x = scale.scale(snap.year as f64);
            minor.push((snap.year, x));
            if snap.year % 4 == 0 {
                major.push((snap.year, x));
            }
        }
        TimelineNode {
            y,
            x0,
            x1,
            major,
            minor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DEFAULT_RANK_CAP;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_reader(csv.as_bytes(), DEFAULT_RANK_CAP).unwrap()
    }

    fn scene_at(ds: &Dataset, index: usize) -> ChartScene {
        let layout = ChartLayout::default();
        let palette = Palette::from_dataset(ds);
        ChartScene::build(ds, index, &layout, &palette).unwrap()
    }

    const CSV: &str = "Year,Country name,Population\n\
                       1950,Alpha,1000\n1950,Beta,500\n1950,Gamma,250\n\
                       1951,Beta,1200\n1951,Alpha,1100\n1951,Gamma,300\n";

    #[test]
    fn bar_widths_are_proportional_to_values() {
        let ds = dataset(CSV);
        let scene = scene_at(&ds, 0);
        assert_eq!(scene.bars.len(), 3);
        assert_eq!(scene.bars[0].name, "Alpha");
        // Alpha holds the domain max, so its bar spans the full plot width.
        let layout = ChartLayout::default();
        let full = layout.plot_right() - layout.plot_left();
        assert!((scene.bars[0].width - full).abs() < 1e-9);
        assert!((scene.bars[1].width - full / 2.0).abs() < 1e-9);
        assert!((scene.bars[2].width - full / 4.0).abs() < 1e-9);
        // All bars start at the baseline.
        for bar in &scene.bars {
            assert_eq!(bar.x, layout.plot_left());
        }
    }

    #[test]
    fn ranking_is_recomputed_per_frame() {
        let ds = dataset(CSV);
        let s0 = scene_at(&ds, 0);
        let s1 = scene_at(&ds, 1);
        assert_eq!(s0.bars[0].name, "Alpha");
        assert_eq!(s1.bars[0].name, "Beta");
        // Beta moved up a row; rows themselves stay fixed.
        assert_eq!(s1.bars[0].y, s0.bars[0].y);
    }

    #[test]
    fn value_labels_sit_past_the_bar_and_clamp_at_the_margin() {
        let ds = dataset(CSV);
        let layout = ChartLayout::default();
        let scene = scene_at(&ds, 0);
        // Max bar's label would overflow; it clamps to the right edge.
        assert_eq!(scene.value_labels[0].x, layout.plot_right());
        // A short bar's label sits 5px past its end.
        let beta = &scene.bars[1];
        assert!((scene.value_labels[1].x - (beta.x + beta.width + 5.0)).abs() < 1e-9);
        assert_eq!(scene.value_labels[1].text, "500");
    }

    #[test]
    fn gridlines_match_value_ticks() {
        let ds = dataset(CSV);
        let scene = scene_at(&ds, 0);
        assert_eq!(scene.gridlines.len(), scene.value_ticks.len());
        for (g, t) in scene.gridlines.iter().zip(&scene.value_ticks) {
            assert_eq!(g.tick, t.tick);
            assert_eq!(g.x, t.x);
        }
        let layout = ChartLayout::default();
        assert_eq!(scene.gridlines[0].y0, layout.plot_top());
        assert_eq!(scene.gridlines[0].y1, layout.plot_bottom());
    }

    #[test]
    fn year_and_total_read_from_the_snapshot() {
        let ds = dataset(CSV);
        let scene = scene_at(&ds, 1);
        assert_eq!(scene.year_text.text, "1951");
        assert_eq!(scene.total_text.text, "Total: 2,600");
    }

    #[test]
    fn progress_marker_lags_by_one_frame() {
        let csv = "Year,Country name,Population\n\
                   1950,A,1\n1951,A,2\n1952,A,3\n";
        let ds = dataset(csv);
        let layout = ChartLayout::default();
        let s0 = scene_at(&ds, 0);
        let s1 = scene_at(&ds, 1);
        let s2 = scene_at(&ds, 2);
        assert_eq!(s0.progress.x, layout.plot_left());
        // Frame 1 still sits at the left edge (the lag quirk), frame 2 at 1/2.
        assert_eq!(s1.progress.x, layout.plot_left());
        let mid = layout.plot_left() + 0.5 * (layout.plot_right() - layout.plot_left());
        assert!((s2.progress.x - mid).abs() < 1e-9);
        // Monotone across the animation.
        assert!(s0.progress.x <= s1.progress.x && s1.progress.x <= s2.progress.x);
    }

    #[test]
    fn timeline_ticks_cover_every_year_with_majors_every_fourth() {
        let mut csv = String::from("Year,Country name,Population\n");
        for year in 1950..=1960 {
            csv.push_str(&format!("{year},A,{}\n", year - 1949));
        }
        let ds = dataset(&csv);
        let scene = scene_at(&ds, 0);
        assert_eq!(scene.timeline.minor.len(), 11);
        let majors: Vec<_> = scene.timeline.major.iter().map(|&(y, _)| y).collect();
        assert_eq!(majors, [1952, 1956, 1960]);
        // Tick positions are monotone across the span.
        let xs: Vec<_> = scene.timeline.minor.iter().map(|&(_, x)| x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn out_of_bounds_index_is_an_error() {
        let ds = dataset(CSV);
        let layout = ChartLayout::default();
        let palette = Palette::from_dataset(&ds);
        assert!(ChartScene::build(&ds, 1, &layout, &palette).is_ok());
        assert!(ChartScene::build(&ds, 2, &layout, &palette).is_err());
    }

    #[test]
    fn empty_year_guard_keeps_scales_finite() {
        // A single tiny year: domain max guards to >= 1 and nothing is NaN.
        let ds = dataset("Year,Country name,Population\n2000,A,0\n");
        let scene = scene_at(&ds, 0);
        assert!(scene.bars[0].width.is_finite());
        assert_eq!(scene.bars[0].width, 0.0);
    }
}
