use glam::DVec2;
use sac_core::config::{ChartConfig, GateConfig};
use sac_core::model::image::ImageRef;
use sac_core::render::{score_color, Palette, TextStyle};
use sac_core::visibility::session::MemorySessionStore;
use sac_core::visibility::timer::TimerQueue;
use sac_core::{
    ChartRenderer, LayoutError, Person, ScoreBand, SessionUser, Surface, SvgSurface, Viewport,
    VisibilityGate,
};

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Clear { width: f64, height: f64 },
    Rect,
    Line { width: f64 },
    Fill { center: DVec2, radius: f64, color: String },
    Stroke { center: DVec2, radius: f64, color: String },
    Image { center: DVec2 },
    Text { text: String, rotation_deg: f64 },
}

#[derive(Default)]
struct RecordingSurface {
    ops: Vec<Op>,
}

impl RecordingSurface {
    fn count(&self, predicate: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| predicate(op)).count()
    }

    fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn stroke_colors(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Stroke { color, .. } => Some(color.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.ops.clear();
        self.ops.push(Op::Clear { width, height });
    }

    fn fill_rect(&mut self, _origin: DVec2, _size: DVec2, _color: &str) {
        self.ops.push(Op::Rect);
    }

    fn line(&mut self, _from: DVec2, _to: DVec2, _color: &str, width: f64) {
        self.ops.push(Op::Line { width });
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: &str) {
        self.ops.push(Op::Fill {
            center,
            radius,
            color: color.to_string(),
        });
    }

    fn stroke_circle(&mut self, center: DVec2, radius: f64, color: &str, _width: f64) {
        self.ops.push(Op::Stroke {
            center,
            radius,
            color: color.to_string(),
        });
    }

    fn draw_image_circle(&mut self, _image: &ImageRef, center: DVec2, _radius: f64) {
        self.ops.push(Op::Image { center });
    }

    fn text(&mut self, text: &str, _anchor: DVec2, style: &TextStyle) {
        self.ops.push(Op::Text {
            text: text.to_string(),
            rotation_deg: style.rotation_deg,
        });
    }
}

fn logged_out_gate() -> VisibilityGate {
    VisibilityGate::new(&GateConfig::default(), Box::new(MemorySessionStore::new()))
}

fn authenticated_gate() -> VisibilityGate {
    let mut gate = logged_out_gate();
    gate.login(
        SessionUser {
            user_id: "mo".to_string(),
            username: "Mo".to_string(),
            emoji: "🍰".to_string(),
        },
        &mut TimerQueue::new(),
    );
    gate
}

fn cast() -> Vec<Person> {
    let mut people = vec![
        Person::new("@upper", 10, 90).unwrap(),
        Person::new("@high", 100, 100).unwrap(),
        Person::new("@low", 0, 0).unwrap(),
    ];
    for person in &mut people {
        person.avatar = Some(ImageRef::Remote(format!(
            "https://example.test/{}.png",
            person.handle()
        )));
    }
    people
}

fn render(people: &[Person], gate: &VisibilityGate) -> RecordingSurface {
    let renderer = ChartRenderer::new(ChartConfig::default());
    let viewport = Viewport::new(1240.0, 700.0, false);
    let mut surface = RecordingSurface::default();
    renderer
        .render(&mut surface, people, &viewport, gate)
        .unwrap();
    surface
}

#[test]
fn frame_has_grid_axes_and_labels() {
    let surface = render(&[], &logged_out_gate());

    assert_eq!(
        surface.ops[0],
        Op::Clear {
            width: 1240.0,
            height: 700.0
        }
    );
    assert_eq!(surface.count(|op| *op == Op::Rect), 1);
    assert_eq!(surface.count(|op| *op == Op::Line { width: 1.0 }), 22);
    assert_eq!(surface.count(|op| *op == Op::Line { width: 3.0 }), 2);

    let texts = surface.texts();
    for label in ["Dietary Restrictions", "Epicurean", "Pristine", "Rotten"] {
        assert!(texts.contains(&label), "missing {label}");
    }
    assert_eq!(texts.iter().filter(|text| **text == "50").count(), 2);
    assert_eq!(
        surface.count(|op| matches!(op, Op::Text { rotation_deg, .. } if *rotation_deg == -90.0)),
        2
    );
}

#[test]
fn hidden_content_draws_plain_markers() {
    let people = cast();
    let surface = render(&people, &logged_out_gate());

    assert_eq!(surface.count(|op| matches!(op, Op::Image { .. })), 0);
    assert_eq!(
        surface.count(|op| matches!(op, Op::Fill { color, .. } if color == "#E91E63")),
        3
    );
    let texts = surface.texts();
    for person in &people {
        assert!(!texts.contains(&person.handle()));
    }
}

#[test]
fn visible_content_draws_avatars() {
    let surface = render(&cast(), &authenticated_gate());
    assert_eq!(surface.count(|op| matches!(op, Op::Image { .. })), 3);
    assert_eq!(surface.count(|op| matches!(op, Op::Fill { .. })), 0);
}

#[test]
fn people_without_avatar_fall_back_to_a_fill() {
    let mut people = cast();
    people[1].avatar = None;
    let surface = render(&people, &authenticated_gate());
    assert_eq!(surface.count(|op| matches!(op, Op::Image { .. })), 2);
    assert_eq!(surface.count(|op| matches!(op, Op::Fill { .. })), 1);
}

#[test]
fn borders_follow_score_bands() {
    let palette = Palette::default();
    let surface = render(&cast(), &logged_out_gate());

    assert_eq!(
        surface.stroke_colors(),
        vec![
            score_color(&palette, ScoreBand::Upper),
            score_color(&palette, ScoreBand::High),
            score_color(&palette, ScoreBand::Low),
        ]
    );
    assert_eq!(score_color(&palette, ScoreBand::Upper), "#FF69B4");
    assert_eq!(
        surface.count(|op| matches!(op, Op::Stroke { radius, .. } if *radius == 12.5)),
        3
    );
}

#[test]
fn markers_sit_at_layout_positions() {
    let renderer = ChartRenderer::new(ChartConfig::default());
    let viewport = Viewport::new(1240.0, 700.0, false);
    let mut surface = RecordingSurface::default();
    let people = vec![
        Person::new("@a", 50, 50).unwrap(),
        Person::new("@b", 50, 50).unwrap(),
    ];

    let placements = renderer
        .render(&mut surface, &people, &viewport, &logged_out_gate())
        .unwrap();

    let centers: Vec<DVec2> = surface
        .ops
        .iter()
        .filter_map(|op| match op {
            Op::Stroke { center, .. } => Some(*center),
            _ => None,
        })
        .collect();
    let positions: Vec<DVec2> = placements.iter().map(|p| p.position).collect();
    assert_eq!(centers, positions);
    assert!(placements[1].is_displaced());
}

#[test]
fn unusable_viewport_paints_nothing() {
    let renderer = ChartRenderer::new(ChartConfig::default());
    let mut surface = RecordingSurface::default();
    let err = renderer
        .render(
            &mut surface,
            &cast(),
            &Viewport::new(80.0, 700.0, false),
            &logged_out_gate(),
        )
        .unwrap_err();
    assert!(matches!(err, LayoutError::EmptyPlotArea { .. }));
    assert!(surface.ops.is_empty());
}

#[test]
fn svg_output_contains_every_marker() {
    let renderer = ChartRenderer::new(ChartConfig::default());
    let mut surface = SvgSurface::new();
    renderer
        .render(
            &mut surface,
            &cast(),
            &Viewport::new(1240.0, 700.0, false),
            &authenticated_gate(),
        )
        .unwrap();

    let svg = surface.into_svg();
    assert!(svg.starts_with("<svg "));
    assert!(svg.ends_with("</svg>"));
    assert_eq!(svg.matches("<image ").count(), 3);
    assert!(svg.contains("https://example.test/@high.png"));
    assert!(svg.contains(">Epicurean</text>"));
}
