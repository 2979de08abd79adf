use crate::chart::{Anchor, ChartLayout, ChartScene, TextNode, VAlign};
use crate::core::{BezPath, FrameRgba, Point, Rect, Rgba8};
use crate::error::{RankraceError, RankraceResult};

const GRID_COLOR: Rgba8 = Rgba8::rgb(0xcc, 0xcc, 0xcc);
const AXIS_COLOR: Rgba8 = Rgba8::rgb(0x66, 0x66, 0x66);
const LABEL_COLOR: Rgba8 = Rgba8::rgb(0x33, 0x33, 0x33);

/// Knobs for the CPU rasterizer.
///
/// `font_bytes` is optional: without a font every text node is skipped and
/// only geometry is rasterized, which keeps headless runs and pixel tests
/// free of font files.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Background fill, straight alpha.
    pub clear_rgba: [u8; 4],
    /// Raw TTF/OTF bytes for all chart text.
    pub font_bytes: Option<Vec<u8>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            clear_rgba: [0xff, 0xff, 0xff, 0xff],
            font_bytes: None,
        }
    }
}

/// Brush carried through text layout so each glyph run knows its fill color.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl TextLayoutEngine {
    fn new(font_bytes: Vec<u8>) -> RankraceResult<Self> {
        if font_bytes.is_empty() {
            return Err(RankraceError::validation("font bytes are empty"));
        }
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| RankraceError::validation("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| RankraceError::validation("registered font family has no name"))?
            .to_string();
        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    /// Shape and lay out a single line of plain text.
    fn layout_plain(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// CPU rasterizer turning resolved scenes into RGBA8 frames.
pub struct CpuRenderer {
    opts: RenderOptions,
    text: Option<TextLayoutEngine>,
}

impl CpuRenderer {
    pub fn new(opts: RenderOptions) -> RankraceResult<Self> {
        let text = match &opts.font_bytes {
            Some(bytes) => Some(TextLayoutEngine::new(bytes.clone())?),
            None => None,
        };
        Ok(Self { opts, text })
    }

    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Rasterize one scene onto a fresh pixmap.
    ///
    /// Draw order is back to front: background, gridlines, bars, then all
    /// text and the timeline furniture. The output is opaque (the background
    /// clear is expected to have full alpha), so premultiplied and straight
    /// bytes coincide.
    #[tracing::instrument(skip_all, fields(index = scene.index, year = scene.year))]
    pub fn render_scene(
        &mut self,
        scene: &ChartScene,
        layout: &ChartLayout,
    ) -> RankraceResult<FrameRgba> {
        let width: u16 = layout
            .canvas
            .width
            .try_into()
            .map_err(|_| RankraceError::render("canvas width exceeds u16"))?;
        let height: u16 = layout
            .canvas
            .height
            .try_into()
            .map_err(|_| RankraceError::render("canvas height exceeds u16"))?;

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        let mut ctx = vello_cpu::RenderContext::new(width, height);

        // `render_to_pixmap` replaces the pixmap contents, so the background
        // must be the first drawn op rather than a pixmap pre-fill.
        let [r, g, b, a] = self.opts.clear_rgba;
        fill_rect(
            &mut ctx,
            Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
            Rgba8::rgba(r, g, b, a),
            1.0,
        );

        for grid in &scene.gridlines {
            draw_dashed_vline(&mut ctx, grid.x, grid.y0, grid.y1, GRID_COLOR, grid.opacity);
        }

        for bar in &scene.bars {
            fill_rect(
                &mut ctx,
                Rect::new(bar.x, bar.y, bar.x + bar.width, bar.y + bar.height),
                bar.color,
                bar.opacity,
            );
        }

        draw_timeline(&mut ctx, scene);
        draw_progress(&mut ctx, scene);

        if let Some(engine) = self.text.as_mut() {
            for tick in &scene.value_ticks {
                draw_text(
                    &mut ctx,
                    engine,
                    &tick.label,
                    tick.x,
                    layout.plot_top() - 8.0,
                    12.0,
                    Anchor::Middle,
                    VAlign::Baseline,
                    AXIS_COLOR,
                    tick.opacity,
                );
            }
            for cat in &scene.category_ticks {
                draw_text(
                    &mut ctx,
                    engine,
                    &cat.name,
                    layout.plot_left() - 10.0,
                    cat.y,
                    14.0,
                    Anchor::End,
                    VAlign::Center,
                    LABEL_COLOR,
                    cat.opacity,
                );
            }
            for label in &scene.value_labels {
                draw_text(
                    &mut ctx,
                    engine,
                    &label.text,
                    label.x,
                    label.y,
                    14.0,
                    Anchor::Start,
                    VAlign::Center,
                    LABEL_COLOR,
                    label.opacity,
                );
            }
            draw_text_node(&mut ctx, engine, &scene.year_text);
            draw_text_node(&mut ctx, engine, &scene.total_text);
            for &(year, x) in &scene.timeline.major {
                draw_text(
                    &mut ctx,
                    engine,
                    &year.to_string(),
                    x,
                    scene.timeline.y + 16.0,
                    12.0,
                    Anchor::Middle,
                    VAlign::Baseline,
                    AXIS_COLOR,
                    1.0,
                );
            }
            draw_text(
                &mut ctx,
                engine,
                &scene.progress.year_label,
                scene.progress.x,
                scene.progress.y0 - 6.0,
                12.0,
                Anchor::Middle,
                VAlign::Baseline,
                LABEL_COLOR,
                1.0,
            );
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRgba {
            width: layout.canvas.width,
            height: layout.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }
}

fn set_color(ctx: &mut vello_cpu::RenderContext, color: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
}

fn fill_rect(ctx: &mut vello_cpu::RenderContext, rect: Rect, color: Rgba8, opacity: f64) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    set_color(ctx, color);
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity as f32);
    }
    ctx.fill_rect(&rect_to_cpu(rect));
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// There is no stroking on this pipeline, so a dashed 1px line is a run of
/// thin filled rects.
fn draw_dashed_vline(
    ctx: &mut vello_cpu::RenderContext,
    x: f64,
    y0: f64,
    y1: f64,
    color: Rgba8,
    opacity: f64,
) {
    const DASH: f64 = 4.0;
    const GAP: f64 = 4.0;
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    set_color(ctx, color);
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity as f32);
    }
    let mut y = y0;
    while y < y1 {
        let end = (y + DASH).min(y1);
        ctx.fill_rect(&rect_to_cpu(Rect::new(x - 0.5, y, x + 0.5, end)));
        y = end + GAP;
    }
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn draw_timeline(ctx: &mut vello_cpu::RenderContext, scene: &ChartScene) {
    let tl = &scene.timeline;
    fill_rect(
        ctx,
        Rect::new(tl.x0, tl.y - 0.5, tl.x1, tl.y + 0.5),
        AXIS_COLOR,
        1.0,
    );
    for &(_, x) in &tl.minor {
        fill_rect(
            ctx,
            Rect::new(x - 0.5, tl.y - 3.0, x + 0.5, tl.y),
            AXIS_COLOR,
            1.0,
        );
    }
    for &(_, x) in &tl.major {
        fill_rect(
            ctx,
            Rect::new(x - 0.5, tl.y - 6.0, x + 0.5, tl.y),
            AXIS_COLOR,
            1.0,
        );
    }
}

/// Progress marker: a short vertical line with a dot at its foot.
fn draw_progress(ctx: &mut vello_cpu::RenderContext, scene: &ChartScene) {
    use kurbo::Shape as _;

    let p = &scene.progress;
    fill_rect(
        ctx,
        Rect::new(p.x - 0.5, p.y0, p.x + 0.5, p.y1),
        LABEL_COLOR,
        1.0,
    );
    let dot: BezPath = kurbo::Circle::new((p.x, p.y1), 3.0).to_path(0.1);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    set_color(ctx, LABEL_COLOR);
    ctx.fill_path(&bezpath_to_cpu(&dot));
}

fn draw_text_node(
    ctx: &mut vello_cpu::RenderContext,
    engine: &mut TextLayoutEngine,
    node: &TextNode,
) {
    draw_text(
        ctx,
        engine,
        &node.text,
        node.x,
        node.y,
        node.size_px,
        node.anchor,
        node.valign,
        node.color,
        node.opacity,
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    engine: &mut TextLayoutEngine,
    text: &str,
    x: f64,
    y: f64,
    size_px: f64,
    anchor: Anchor,
    valign: VAlign,
    color: Rgba8,
    opacity: f64,
) {
    if text.is_empty() || opacity <= 0.0 {
        return;
    }

    let layout = engine.layout_plain(text, size_px as f32, color.into());

    let mut width = 0.0f64;
    let mut height = 0.0f64;
    let mut first_ascent = 0.0f64;
    for (i, line) in layout.lines().enumerate() {
        let m = line.metrics();
        width = width.max(f64::from(m.advance));
        height += f64::from(m.ascent + m.descent + m.leading);
        if i == 0 {
            first_ascent = f64::from(m.ascent);
        }
    }

    let dx = match anchor {
        Anchor::Start => x,
        Anchor::Middle => x - width / 2.0,
        Anchor::End => x - width,
    };
    let dy = match valign {
        // Glyph y coordinates are baselines measured from the layout top.
        VAlign::Baseline => y - first_ascent,
        VAlign::Center => y - height / 2.0,
    };

    ctx.set_transform(vello_cpu::kurbo::Affine::translate((dx, dy)));
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity as f32);
    }

    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&engine.font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }

    if opacity < 1.0 {
        ctx.pop_layer();
    }
}
