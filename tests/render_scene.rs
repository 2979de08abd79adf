use rankrace::{
    ChartLayout, ChartScene, CpuRenderer, DEFAULT_RANK_CAP, Dataset, Ease, Palette, RenderOptions,
    blend_scenes,
};

const CSV: &str = "Year,Country name,Population\n\
                   1950,Alpha,1000\n1950,Beta,500\n1950,Gamma,250\n\
                   1951,Beta,1200\n1951,Alpha,1100\n1951,Delta,600\n";

fn setup() -> (Dataset, ChartLayout, Palette) {
    let dataset = Dataset::from_reader(CSV.as_bytes(), DEFAULT_RANK_CAP).unwrap();
    let layout = ChartLayout::default();
    let palette = Palette::from_dataset(&dataset);
    (dataset, layout, palette)
}

fn px(frame: &rankrace::FrameRgba, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn scene_renders_bars_over_white_background() {
    let (dataset, layout, palette) = setup();
    let scene = ChartScene::build(&dataset, 0, &layout, &palette).unwrap();
    let mut renderer = CpuRenderer::new(RenderOptions::default()).unwrap();
    let frame = renderer.render_scene(&scene, &layout).unwrap();

    assert_eq!(frame.data.len(), frame.expected_len());
    assert_eq!(px(&frame, 1, 1), [0xff, 0xff, 0xff, 0xff]);

    for bar in &scene.bars {
        let cx = (bar.x + bar.width / 2.0) as u32;
        let cy = (bar.y + bar.height / 2.0) as u32;
        let got = px(&frame, cx, cy);
        assert_eq!(
            [got[0], got[1], got[2]],
            [bar.color.r, bar.color.g, bar.color.b],
            "bar '{}' center pixel",
            bar.name
        );
    }
}

#[test]
fn blended_scene_renders_without_font() {
    let (dataset, layout, palette) = setup();
    let prev = ChartScene::build(&dataset, 0, &layout, &palette).unwrap();
    let next = ChartScene::build(&dataset, 1, &layout, &palette).unwrap();
    let mid = blend_scenes(&prev, &next, 0.5, Ease::InOutCubic);

    let mut renderer = CpuRenderer::new(RenderOptions::default()).unwrap();
    let frame = renderer.render_scene(&mid, &layout).unwrap();
    assert_eq!(frame.data.len(), frame.expected_len());

    // The entering bar is mid-growth: some colored pixel sits inside it.
    let delta = mid.bars.iter().find(|b| b.name == "Delta").unwrap();
    assert!(delta.width > 0.0);
    let cx = (delta.x + delta.width / 2.0) as u32;
    let cy = (delta.y + delta.height / 2.0) as u32;
    let got = px(&frame, cx, cy);
    assert_ne!([got[0], got[1], got[2]], [0xff, 0xff, 0xff]);
}

#[test]
fn identical_scenes_produce_identical_bytes() {
    let (dataset, layout, palette) = setup();
    let scene = ChartScene::build(&dataset, 1, &layout, &palette).unwrap();
    let mut renderer = CpuRenderer::new(RenderOptions::default()).unwrap();
    let a = renderer.render_scene(&scene, &layout).unwrap();
    let b = renderer.render_scene(&scene, &layout).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn scene_serializes_to_json() {
    let (dataset, layout, palette) = setup();
    let scene = ChartScene::build(&dataset, 0, &layout, &palette).unwrap();
    let json = serde_json::to_value(&scene).unwrap();
    assert_eq!(json["year"], 1950);
    assert_eq!(json["bars"].as_array().unwrap().len(), 3);
    assert_eq!(json["bars"][0]["name"], "Alpha");
    assert_eq!(json["total_text"]["text"], "Total: 1,750");
}
