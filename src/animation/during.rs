use std::rc::Rc;

use crate::{
    element::{
        props::{ElementProps, TransformProp},
        value::PropValue,
    },
    foundation::ids::ElementId,
};

const RESERVED_KEYS: [&str; 3] = ["transition", "enterFrom", "leaveTo"];

/// Per-frame callback attached to an element option.
///
/// Identity matters: the renderer only runs the hook most recently registered for an
/// element, compared by pointer.
#[derive(Clone)]
pub struct DuringHook(Rc<dyn Fn(&mut DuringApi<'_>)>);

impl DuringHook {
    pub fn new(f: impl Fn(&mut DuringApi<'_>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, api: &mut DuringApi<'_>) {
        (self.0)(api)
    }

    pub fn ptr_eq(&self, other: &DuringHook) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for DuringHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DuringHook(<fn>)")
    }
}

impl PartialEq for DuringHook {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Read/write view over one element's current values, handed to a [`DuringHook`].
pub struct DuringApi<'a> {
    element: ElementId,
    props: &'a mut ElementProps,
}

impl<'a> DuringApi<'a> {
    pub(crate) fn new(element: ElementId, props: &'a mut ElementProps) -> Self {
        Self { element, props }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn get_transform(&self, prop: TransformProp) -> f64 {
        self.props
            .transform
            .get(&prop)
            .copied()
            .unwrap_or(prop.default_value())
    }

    pub fn set_transform(&mut self, prop: TransformProp, v: f64) -> &mut Self {
        self.props.transform.insert(prop, v);
        self
    }

    pub fn get_shape(&self, key: &str) -> Option<&PropValue> {
        if self.reserved(key) {
            return None;
        }
        self.props.shape.get(key)
    }

    pub fn set_shape(&mut self, key: &str, v: impl Into<PropValue>) -> &mut Self {
        if !self.reserved(key) {
            self.props.shape.insert(key.to_string(), v.into());
        }
        self
    }

    pub fn get_style(&self, key: &str) -> Option<&PropValue> {
        if self.reserved(key) {
            return None;
        }
        self.props.style.get(key)
    }

    pub fn set_style(&mut self, key: &str, v: impl Into<PropValue>) -> &mut Self {
        if self.reserved(key) {
            return self;
        }
        let v = v.into();
        if v.as_number().is_some_and(f64::is_nan) {
            tracing::warn!(element = %self.element, key, "style value must not be NaN");
            return self;
        }
        self.props.style.insert(key.to_string(), v);
        self
    }

    pub fn get_extra(&self, key: &str) -> Option<&PropValue> {
        if self.reserved(key) {
            return None;
        }
        self.props.extra.get(key)
    }

    pub fn set_extra(&mut self, key: &str, v: impl Into<PropValue>) -> &mut Self {
        if !self.reserved(key) {
            self.props.extra.insert(key.to_string(), v.into());
        }
        self
    }

    fn reserved(&self, key: &str) -> bool {
        let hit = RESERVED_KEYS.contains(&key);
        if hit {
            tracing::warn!(element = %self.element, key, "reserved key in during hook");
        }
        hit
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/during.rs"]
mod tests;
