// THEORY:
// The `detection` module is the entry point for data coming from the inference
// service. A `Detection` is a "dumb" data container describing one object the
// detector found: its bounding box in image pixel space, the debris class it was
// assigned and the model's confidence.
//
// Key architectural principles:
// 1.  **Schema Mirror**: The structs derive serde traits and mirror the JSON the
//     inference endpoint returns, so a response body can be parsed directly.
//     Unknown fields (annotated images, timings) are ignored.
// 2.  **Center Resolution**: The heatmap only cares about one point per object.
//     The endpoint sometimes reports an explicit center; when it does not, the
//     center of the bounding box is used instead.
// 3.  **Categorisation**: Detectors trained on different datasets emit many raw
//     class names ("Bottle", "Fishing-net", "Can"). These are folded into the
//     three debris families the rest of the system reasons about.

use crate::core_modules::error::DensityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;

/// A point in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Center {
    pub x: f64,
    pub y: f64,
}

impl Center {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One object instance reported by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Bounding box as `[x0, y0, x1, y1]` in image pixels.
    pub bbox: [f64; 4],
    /// The categorised debris class name.
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub confidence: f64,
    /// Explicit center reported by the detector, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Center>,
    /// The class name exactly as the model emitted it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_class: Option<String>,
}

impl Detection {
    pub fn new(bbox: [f64; 4], class_name: impl Into<String>, confidence: f64) -> Self {
        Self {
            bbox,
            class_name: class_name.into(),
            confidence,
            center: None,
            raw_class: None,
        }
    }

    /// A zero-area detection located exactly at `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self::new([x, y, x, y], DebrisClass::Plastic.as_str(), 1.0).with_center(Center::new(x, y))
    }

    pub fn with_center(mut self, center: Center) -> Self {
        self.center = Some(center);
        self
    }

    /// The point used for density estimation: the explicit center when present,
    /// otherwise the midpoint of the bounding box.
    pub fn center(&self) -> Center {
        self.center.unwrap_or_else(|| {
            let [x0, y0, x1, y1] = self.bbox;
            Center::new((x0 + x1) / 2.0, (y0 + y1) / 2.0)
        })
    }

    pub fn debris_class(&self) -> DebrisClass {
        categorize(&self.class_name)
    }
}

/// The body returned by the inference endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_objects: Option<usize>,
}

impl InferenceResponse {
    pub fn from_json(body: &str) -> Result<Self, DensityError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DensityError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// The three debris families tracked by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebrisClass {
    #[serde(rename = "plastic")]
    Plastic,
    #[serde(rename = "metal")]
    Metal,
    #[serde(rename = "fishing waste")]
    FishingWaste,
}

impl DebrisClass {
    pub const ALL: [DebrisClass; 3] = [DebrisClass::Plastic, DebrisClass::Metal, DebrisClass::FishingWaste];

    pub fn as_str(&self) -> &'static str {
        match self {
            DebrisClass::Plastic => "plastic",
            DebrisClass::Metal => "metal",
            DebrisClass::FishingWaste => "fishing waste",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            DebrisClass::Plastic => &["plastic", "plastic waste", "plastic wastes"],
            DebrisClass::Metal => &["metal", "metal waste", "metal wastes"],
            DebrisClass::FishingWaste => &["fishing waste", "fishing wastes", "fishing gear"],
        }
    }

    fn sub_classes(&self) -> &'static [&'static str] {
        match self {
            DebrisClass::Plastic => &[
                "Bottle",
                "Shampoo-bottle",
                "Standing-bottle",
                "Drink-carton",
                "Plastic-bag",
                "Food-wrapper",
                "Straw",
                "Cup",
                "Lid",
                "Container",
                "plastic",
            ],
            DebrisClass::Metal => &[
                "Can",
                "Tin",
                "Aluminum-foil",
                "Metal-cap",
                "Metal-container",
                "Metal-scrap",
                "Wire",
                "Nail",
                "Bolt",
                "Screw",
                "metal",
            ],
            DebrisClass::FishingWaste => &[
                "Hook",
                "Fishing-line",
                "Fishing-net",
                "Buoy",
                "Fishing-gear",
                "Rope",
                "Float",
                "Trap",
                "Crab-pot",
                "Lead-weight",
                "fishing waste",
            ],
        }
    }
}

impl fmt::Display for DebrisClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Folds a raw detector class name into one of the debris families.
///
/// Matching runs from strictest to loosest: known aliases, exact sub-class
/// membership, then a case-insensitive substring match in either direction.
/// Unrecognised or empty names fall back to plastic.
pub fn categorize(raw_class: &str) -> DebrisClass {
    let normalized = raw_class.trim().to_lowercase();
    if normalized.is_empty() {
        return DebrisClass::Plastic;
    }

    if let Some(class) = DebrisClass::ALL
        .into_iter()
        .find(|class| class.aliases().contains(&normalized.as_str()))
    {
        return class;
    }

    if let Some(class) = DebrisClass::ALL
        .into_iter()
        .find(|class| class.sub_classes().contains(&raw_class))
    {
        return class;
    }

    DebrisClass::ALL
        .into_iter()
        .find(|class| {
            class.sub_classes().iter().any(|sub| {
                let sub = sub.to_lowercase();
                normalized.contains(&sub) || sub.contains(&normalized)
            })
        })
        .unwrap_or(DebrisClass::Plastic)
}

/// Number of detections per debris family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionCounts {
    pub plastic: usize,
    pub metal: usize,
    #[serde(rename = "fishing waste")]
    pub fishing_waste: usize,
}

impl DetectionCounts {
    pub fn from_detections<'a, I>(detections: I) -> Self
    where
        I: IntoIterator<Item = &'a Detection>,
    {
        let mut counts = Self::default();
        for detection in detections {
            counts.record(detection.debris_class());
        }
        counts
    }

    pub fn record(&mut self, class: DebrisClass) {
        match class {
            DebrisClass::Plastic => self.plastic += 1,
            DebrisClass::Metal => self.metal += 1,
            DebrisClass::FishingWaste => self.fishing_waste += 1,
        }
    }

    pub fn get(&self, class: DebrisClass) -> usize {
        match class {
            DebrisClass::Plastic => self.plastic,
            DebrisClass::Metal => self.metal,
            DebrisClass::FishingWaste => self.fishing_waste,
        }
    }

    pub fn total(&self) -> usize {
        self.plastic + self.metal + self.fishing_waste
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_falls_back_to_bbox_midpoint() {
        let detection = Detection::new([10.0, 20.0, 30.0, 60.0], "plastic", 0.9);
        assert_eq!(detection.center(), Center::new(20.0, 40.0));
    }

    #[test]
    fn explicit_center_wins_over_bbox() {
        let detection = Detection::new([0.0, 0.0, 100.0, 100.0], "metal", 0.5)
            .with_center(Center::new(12.0, 7.0));
        assert_eq!(detection.center(), Center::new(12.0, 7.0));
    }

    #[test]
    fn parses_response_with_extra_fields() {
        let body = r#"{
            "success": true,
            "total_objects": 2,
            "detections": [
                {"bbox": [0, 0, 50, 50], "class_name": "plastic", "confidence": 0.91,
                 "center": {"x": 25, "y": 25}, "raw_class": "Bottle"},
                {"bbox": [100, 100, 120, 140], "class_name": "metal", "confidence": 0.4}
            ]
        }"#;
        let response = InferenceResponse::from_json(body).expect("valid response");
        assert_eq!(response.total_objects, Some(2));
        assert_eq!(response.detections.len(), 2);
        assert_eq!(response.detections[0].raw_class.as_deref(), Some("Bottle"));
        assert_eq!(response.detections[1].center(), Center::new(110.0, 120.0));
    }

    #[test]
    fn malformed_response_is_an_error() {
        let err = InferenceResponse::from_json(r#"{"detections": [{"bbox": "nope"}]}"#).unwrap_err();
        assert!(matches!(err, DensityError::ParseResponse(_)));
    }

    #[test]
    fn categorize_handles_aliases_and_sub_classes() {
        assert_eq!(categorize("Plastic Wastes"), DebrisClass::Plastic);
        assert_eq!(categorize("fishing gear"), DebrisClass::FishingWaste);
        assert_eq!(categorize("Can"), DebrisClass::Metal);
        assert_eq!(categorize("Fishing-net"), DebrisClass::FishingWaste);
        assert_eq!(categorize("crab-pot-large"), DebrisClass::FishingWaste);
        assert_eq!(categorize("rusty metal-scrap"), DebrisClass::Metal);
    }

    #[test]
    fn categorize_defaults_to_plastic() {
        assert_eq!(categorize(""), DebrisClass::Plastic);
        assert_eq!(categorize("   "), DebrisClass::Plastic);
        assert_eq!(categorize("seaweed"), DebrisClass::Plastic);
    }

    #[test]
    fn counts_per_class() {
        let detections = vec![
            Detection::new([0.0; 4], "plastic", 0.9),
            Detection::new([0.0; 4], "metal", 0.9),
            Detection::new([0.0; 4], "fishing waste", 0.9),
            Detection::new([0.0; 4], "Bottle", 0.9),
        ];
        let counts = DetectionCounts::from_detections(&detections);
        assert_eq!(counts.get(DebrisClass::Plastic), 2);
        assert_eq!(counts.metal, 1);
        assert_eq!(counts.fishing_waste, 1);
        assert_eq!(counts.total(), 4);

        let json = serde_json::to_value(counts).expect("serialize");
        assert_eq!(json["fishing waste"], 1);
    }
}
