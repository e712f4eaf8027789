//! Built-in shape kinds

use crate::shape::{Props, Shape};
use crate::shape_util::ShapeUtil;
use serde_json::{json, Value};

const GEO_STYLES: &[&str] = &[
    "color",
    "labelColor",
    "dash",
    "fill",
    "size",
    "font",
    "geo",
    "horizontalAlign",
    "verticalAlign",
];

const TEXT_STYLES: &[&str] = &["color", "size", "font", "horizontalAlign"];

fn box_props(w: f64, h: f64) -> Props {
    let mut props = Props::new();
    props.insert("x".to_string(), json!(0.0));
    props.insert("y".to_string(), json!(0.0));
    props.insert("w".to_string(), json!(w));
    props.insert("h".to_string(), json!(h));
    props
}

/// Rectangles, ellipses and the other closed geometric shapes
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoShapeUtil;

impl ShapeUtil for GeoShapeUtil {
    fn kind(&self) -> &'static str {
        "geo"
    }

    fn style_keys(&self) -> &'static [&'static str] {
        GEO_STYLES
    }

    fn default_props(&self) -> Props {
        let mut props = box_props(100.0, 100.0);
        for (key, value) in [
            ("color", "black"),
            ("labelColor", "black"),
            ("dash", "draw"),
            ("fill", "none"),
            ("size", "m"),
            ("font", "draw"),
            ("geo", "rectangle"),
            ("horizontalAlign", "middle"),
            ("verticalAlign", "middle"),
        ] {
            props.insert(key.to_string(), json!(value));
        }
        props
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextShapeUtil;

impl ShapeUtil for TextShapeUtil {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn style_keys(&self) -> &'static [&'static str] {
        TEXT_STYLES
    }

    fn default_props(&self) -> Props {
        let mut props = box_props(0.0, 0.0);
        props.insert("text".to_string(), json!(""));
        for (key, value) in [
            ("color", "black"),
            ("size", "m"),
            ("font", "draw"),
            ("horizontalAlign", "middle"),
        ] {
            props.insert(key.to_string(), json!(value));
        }
        props
    }
}

/// Groups carry no style and take their bounds from their children. A
/// group holding fewer than two children dissolves.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupShapeUtil;

impl ShapeUtil for GroupShapeUtil {
    fn kind(&self) -> &'static str {
        "group"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn on_children_change(&self, parent: &Shape, children: &[&Shape]) -> Option<Shape> {
        let bounds = children.iter().filter_map(|child| Bounds::of(child)).reduce(Bounds::union)?;

        let mut next = parent.clone();
        bounds.write_to(&mut next.props);

        (next != *parent).then_some(next)
    }

    fn should_delete(&self, shape: &Shape) -> bool {
        shape.children().len() < 2
    }
}

/// Frames clip their children and stay put when emptied
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameShapeUtil;

impl ShapeUtil for FrameShapeUtil {
    fn kind(&self) -> &'static str {
        "frame"
    }

    fn is_container(&self) -> bool {
        true
    }

    fn default_props(&self) -> Props {
        let mut props = box_props(160.0, 90.0);
        props.insert("name".to_string(), Value::String(String::new()));
        props
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Bounds {
    fn of(shape: &Shape) -> Option<Self> {
        let x = shape.prop_f64("x")?;
        let y = shape.prop_f64("y")?;
        let w = shape.prop_f64("w").unwrap_or(0.0);
        let h = shape.prop_f64("h").unwrap_or(0.0);
        Some(Self {
            min_x: x,
            min_y: y,
            max_x: x + w,
            max_y: y + h,
        })
    }

    fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    fn write_to(&self, props: &mut Props) {
        props.insert("x".to_string(), json!(self.min_x));
        props.insert("y".to_string(), json!(self.min_y));
        props.insert("w".to_string(), json!(self.max_x - self.min_x));
        props.insert("h".to_string(), json!(self.max_y - self.min_y));
    }
}
