use std::collections::BTreeMap;

use crate::{
    animation::{config::AnimationOverride, during::DuringHook},
    element::{
        props::{AttrGroup, TransformProp},
        value::PropMap,
    },
    foundation::error::{TesselError, TesselResult},
};

/// Closed set of element kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    Rect,
    Circle,
    Ellipse,
    Sector,
    Ring,
    Polygon,
    Polyline,
    Line,
    BezierCurve,
    Path,
    Image,
    Text,
    Group,
}

impl ElementKind {
    pub fn is_group(self) -> bool {
        matches!(self, Self::Group)
    }

    /// Kinds with an outline the morph machinery can resample.
    pub fn has_geometry(self) -> bool {
        !matches!(self, Self::Image | Self::Text | Self::Group)
    }
}

/// Which keys a `transition` declaration animates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "TransitionRepr", into = "TransitionRepr")]
pub enum TransitionSpec {
    All,
    Keys(Vec<String>),
}

impl TransitionSpec {
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Self::All => true,
            Self::Keys(keys) => keys.iter().any(|k| k == key),
        }
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum TransitionRepr {
    One(String),
    Many(Vec<String>),
}

impl From<TransitionRepr> for TransitionSpec {
    fn from(repr: TransitionRepr) -> Self {
        match repr {
            TransitionRepr::One(s) if s == "all" => Self::All,
            TransitionRepr::One(s) => Self::Keys(vec![s]),
            TransitionRepr::Many(keys) => Self::Keys(keys),
        }
    }
}

impl From<TransitionSpec> for TransitionRepr {
    fn from(spec: TransitionSpec) -> Self {
        match spec {
            TransitionSpec::All => Self::One("all".to_string()),
            TransitionSpec::Keys(keys) => Self::Many(keys),
        }
    }
}

/// Payload of one keyed attribute group together with its transition directives.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttrOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enter_from: Option<PropMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_to: Option<PropMap>,
    #[serde(flatten)]
    pub values: PropMap,
}

/// Transform fields as written in an option, including the legacy pair forms.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<[f64; 2]>,
}

impl TransformOption {
    pub fn get(&self, prop: TransformProp) -> Option<f64> {
        match prop {
            TransformProp::X => self.x,
            TransformProp::Y => self.y,
            TransformProp::ScaleX => self.scale_x,
            TransformProp::ScaleY => self.scale_y,
            TransformProp::OriginX => self.origin_x,
            TransformProp::OriginY => self.origin_y,
            TransformProp::Rotation => self.rotation,
        }
    }

    pub fn set(&mut self, prop: TransformProp, v: f64) {
        let slot = match prop {
            TransformProp::X => &mut self.x,
            TransformProp::Y => &mut self.y,
            TransformProp::ScaleX => &mut self.scale_x,
            TransformProp::ScaleY => &mut self.scale_y,
            TransformProp::OriginX => &mut self.origin_x,
            TransformProp::OriginY => &mut self.origin_y,
            TransformProp::Rotation => &mut self.rotation,
        };
        *slot = Some(v);
    }

    /// Resolved steady-state transform values. Pair forms apply first, scalar fields win.
    pub fn resolved(&self) -> BTreeMap<TransformProp, f64> {
        let mut out = BTreeMap::new();
        for (name, pair) in [
            ("position", self.position),
            ("scale", self.scale),
            ("origin", self.origin),
        ] {
            if let (Some([a, b]), Some([pa, pb])) = (pair, TransformProp::legacy_pair(name)) {
                out.insert(pa, a);
                out.insert(pb, b);
            }
        }
        for prop in TransformProp::ALL {
            if let Some(v) = self.get(prop) {
                out.insert(prop, v);
            }
        }
        out
    }
}

/// How the children of a group option are matched against the retained children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeChildren {
    /// Rebuild the children; only those carrying a matching `id` keep their element.
    #[default]
    Replace,
    /// Pair children by position.
    ByIndex,
    /// Pair children by `name`, falling back to position.
    ByName,
}

/// Declarative description of one element for one reconciliation pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementOption {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub transform: TransformOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<AttrOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<AttrOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<AttrOption>,

    /// Node-level transition: transform fields and/or group names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSpec>,
    /// Transform values the element enters from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter_from: Option<PropMap>,
    /// Transform values the element leaves toward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_to: Option<PropMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enter_animation: Option<AnimationOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_animation: Option<AnimationOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_animation: Option<AnimationOverride>,

    /// `Some(false)` opts out of geometry morphing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morph: Option<bool>,
    /// Ids of previous-pass elements whose geometry this element takes over.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub morph_from: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invisible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Option<ElementOption>>,
    #[serde(default, rename = "$mergeChildren")]
    pub merge_children: MergeChildren,

    #[serde(skip)]
    pub during: Option<DuringHook>,
}

impl ElementOption {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            id: None,
            name: None,
            transform: TransformOption::default(),
            shape: None,
            style: None,
            extra: None,
            transition: None,
            enter_from: None,
            leave_to: None,
            enter_animation: None,
            update_animation: None,
            leave_animation: None,
            morph: None,
            morph_from: Vec::new(),
            ignore: None,
            invisible: None,
            silent: None,
            info: None,
            children: Vec::new(),
            merge_children: MergeChildren::Replace,
            during: None,
        }
    }

    /// Payload for a keyed group; `None` for the transform group.
    pub fn attr(&self, group: AttrGroup) -> Option<&AttrOption> {
        match group {
            AttrGroup::Transform => None,
            AttrGroup::Shape => self.shape.as_ref(),
            AttrGroup::Style => self.style.as_ref(),
            AttrGroup::Extra => self.extra.as_ref(),
        }
    }

    pub fn attr_mut(&mut self, group: AttrGroup) -> Option<&mut AttrOption> {
        match group {
            AttrGroup::Transform => None,
            AttrGroup::Shape => Some(self.shape.get_or_insert_with(AttrOption::default)),
            AttrGroup::Style => Some(self.style.get_or_insert_with(AttrOption::default)),
            AttrGroup::Extra => Some(self.extra.get_or_insert_with(AttrOption::default)),
        }
    }

    /// Geometric elements and groups take part in morphs unless `morph: false`. A group
    /// morphs through the paths among its descendants.
    pub fn morph_enabled(&self) -> bool {
        (self.kind.has_geometry() || self.kind.is_group()) && self.morph.unwrap_or(true)
    }

    /// Shape or style value whose change forces the element to be rebuilt.
    pub(crate) fn recreate_key(&self) -> Option<&crate::element::value::PropValue> {
        match self.kind {
            ElementKind::Path => self
                .shape
                .as_ref()
                .and_then(|s| s.values.get("pathData").or_else(|| s.values.get("d"))),
            ElementKind::Image => self.style.as_ref().and_then(|s| s.values.get("image")),
            _ => None,
        }
    }

    /// Structural checks over the whole subtree.
    pub fn validate(&self) -> TesselResult<()> {
        if !self.kind.is_group() && !self.children.is_empty() {
            return Err(TesselError::validation(format!(
                "element '{}' of kind {:?} cannot have children",
                self.display_key(),
                self.kind
            )));
        }
        if self.kind.is_group() && self.shape.is_some() {
            return Err(TesselError::validation(format!(
                "group '{}' cannot carry a shape",
                self.display_key()
            )));
        }
        for v in self.transform.resolved().values() {
            if !v.is_finite() {
                return Err(TesselError::validation(format!(
                    "element '{}' has a non-finite transform value",
                    self.display_key()
                )));
            }
        }
        for child in self.children.iter().flatten() {
            child.validate()?;
        }
        Ok(())
    }

    pub(crate) fn display_key(&self) -> &str {
        self.id
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("<anonymous>")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/option.rs"]
mod tests;
