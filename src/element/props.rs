use std::collections::BTreeMap;

use crate::{
    element::value::{PropMap, PropValue},
    foundation::core::Transform2D,
};

/// One of the seven transform fields an element carries.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TransformProp {
    X,
    Y,
    ScaleX,
    ScaleY,
    OriginX,
    OriginY,
    Rotation,
}

impl TransformProp {
    pub const ALL: [TransformProp; 7] = [
        Self::X,
        Self::Y,
        Self::ScaleX,
        Self::ScaleY,
        Self::OriginX,
        Self::OriginY,
        Self::Rotation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::OriginX => "originX",
            Self::OriginY => "originY",
            Self::Rotation => "rotation",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn default_value(self) -> f64 {
        match self {
            Self::ScaleX | Self::ScaleY => 1.0,
            _ => 0.0,
        }
    }

    /// Pair form (`position`, `scale`, `origin`) expanded into its two scalar fields.
    pub fn legacy_pair(name: &str) -> Option<[TransformProp; 2]> {
        match name {
            "position" => Some([Self::X, Self::Y]),
            "scale" => Some([Self::ScaleX, Self::ScaleY]),
            "origin" => Some([Self::OriginX, Self::OriginY]),
            _ => None,
        }
    }
}

/// Unit at which transition behavior is configured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttrGroup {
    Transform,
    Shape,
    Style,
    Extra,
}

impl AttrGroup {
    pub const ALL: [AttrGroup; 4] = [Self::Transform, Self::Shape, Self::Style, Self::Extra];

    /// Groups keyed by free-form string keys.
    pub const KEYED: [AttrGroup; 3] = [Self::Shape, Self::Style, Self::Extra];

    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Shape => "shape",
            Self::Style => "style",
            Self::Extra => "extra",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }
}

const OPACITY_KEYS: [&str; 3] = ["opacity", "fillOpacity", "strokeOpacity"];

/// Value a key takes when an element has never been given one.
pub fn default_value(group: AttrGroup, key: &str) -> PropValue {
    if group == AttrGroup::Transform {
        return PropValue::Number(TransformProp::parse(key).map_or(0.0, |p| p.default_value()));
    }
    if group == AttrGroup::Style && OPACITY_KEYS.contains(&key) {
        return PropValue::Number(1.0);
    }
    PropValue::Number(0.0)
}

/// Partial property set over all four attribute groups.
///
/// Used both for an element's current values and for the maps a transition plan
/// produces. Absent keys mean "not set", not "zero".
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementProps {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub transform: BTreeMap<TransformProp, f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub shape: PropMap,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub style: PropMap,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: PropMap,
}

impl ElementProps {
    pub fn is_empty(&self) -> bool {
        self.transform.is_empty()
            && self.shape.is_empty()
            && self.style.is_empty()
            && self.extra.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transform.len() + self.shape.len() + self.style.len() + self.extra.len()
    }

    /// Keyed map for `shape`, `style` or `extra`; `None` for the transform group.
    pub fn group(&self, group: AttrGroup) -> Option<&PropMap> {
        match group {
            AttrGroup::Transform => None,
            AttrGroup::Shape => Some(&self.shape),
            AttrGroup::Style => Some(&self.style),
            AttrGroup::Extra => Some(&self.extra),
        }
    }

    pub fn group_mut(&mut self, group: AttrGroup) -> Option<&mut PropMap> {
        match group {
            AttrGroup::Transform => None,
            AttrGroup::Shape => Some(&mut self.shape),
            AttrGroup::Style => Some(&mut self.style),
            AttrGroup::Extra => Some(&mut self.extra),
        }
    }

    pub fn get(&self, group: AttrGroup, key: &str) -> Option<PropValue> {
        match group {
            AttrGroup::Transform => TransformProp::parse(key)
                .and_then(|p| self.transform.get(&p))
                .map(|v| PropValue::Number(*v)),
            _ => self.group(group).and_then(|m| m.get(key)).cloned(),
        }
    }

    /// Set one key. Returns `false` when the key cannot live in `group` (unknown transform
    /// field or non-numeric transform value).
    pub fn set(&mut self, group: AttrGroup, key: &str, value: PropValue) -> bool {
        if group == AttrGroup::Transform {
            let (Some(prop), Some(v)) = (TransformProp::parse(key), value.as_number()) else {
                return false;
            };
            self.transform.insert(prop, v);
            return true;
        }
        match self.group_mut(group) {
            Some(map) => {
                map.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, group: AttrGroup, key: &str) -> Option<PropValue> {
        match group {
            AttrGroup::Transform => TransformProp::parse(key)
                .and_then(|p| self.transform.remove(&p))
                .map(PropValue::Number),
            _ => self.group_mut(group).and_then(|m| m.remove(key)),
        }
    }

    pub fn contains(&self, group: AttrGroup, key: &str) -> bool {
        match group {
            AttrGroup::Transform => {
                TransformProp::parse(key).is_some_and(|p| self.transform.contains_key(&p))
            }
            _ => self.group(group).is_some_and(|m| m.contains_key(key)),
        }
    }

    /// Every `(group, key)` pair present, in group order.
    pub fn keys(&self) -> Vec<(AttrGroup, String)> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(
            self.transform
                .keys()
                .map(|p| (AttrGroup::Transform, p.name().to_string())),
        );
        for group in AttrGroup::KEYED {
            if let Some(map) = self.group(group) {
                out.extend(map.keys().map(|k| (group, k.clone())));
            }
        }
        out
    }

    /// Overlay `other` onto `self`, key by key.
    pub fn merge(&mut self, other: &ElementProps) {
        self.transform.extend(other.transform.iter().map(|(k, v)| (*k, *v)));
        for group in AttrGroup::KEYED {
            if let (Some(dst), Some(src)) = (self.group_mut(group), other.group(group)) {
                dst.extend(src.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
    }

    /// Copy of `self` without the keys present in `mask`.
    pub fn without_keys_of(&self, mask: &ElementProps) -> ElementProps {
        let mut out = self.clone();
        for (group, key) in mask.keys() {
            out.remove(group, &key);
        }
        out
    }

    /// Subset of `self` restricted to the keys present in `mask`.
    pub fn restricted_to(&self, mask: &ElementProps) -> ElementProps {
        let mut out = ElementProps::default();
        for (group, key) in mask.keys() {
            if let Some(v) = self.get(group, &key) {
                out.set(group, &key, v);
            }
        }
        out
    }

    /// Resolve the transform with defaults filled in.
    pub fn transform2d(&self) -> Transform2D {
        let get = |p: TransformProp| self.transform.get(&p).copied().unwrap_or(p.default_value());
        Transform2D {
            x: get(TransformProp::X),
            y: get(TransformProp::Y),
            scale_x: get(TransformProp::ScaleX),
            scale_y: get(TransformProp::ScaleY),
            origin_x: get(TransformProp::OriginX),
            origin_y: get(TransformProp::OriginY),
            rotation: get(TransformProp::Rotation),
        }
    }

    /// Deep copy: arrays get fresh allocations.
    pub fn deep_clone(&self) -> ElementProps {
        let clone_map = |m: &PropMap| -> PropMap {
            m.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect()
        };
        ElementProps {
            transform: self.transform.clone(),
            shape: clone_map(&self.shape),
            style: clone_map(&self.style),
            extra: clone_map(&self.extra),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/element/props.rs"]
mod tests;
