use crate::{
    animation::{config::AnimationOverride, during::DuringHook},
    element::{
        option::{ElementKind, ElementOption, MergeChildren, TransitionSpec},
        props::{AttrGroup, TransformProp},
        value::PropValue,
    },
    foundation::error::{TesselError, TesselResult},
};

/// Fluent construction of [`ElementOption`] trees.
pub struct ElementBuilder {
    opt: ElementOption,
    errors: Vec<String>,
}

impl ElementBuilder {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            opt: ElementOption::new(kind),
            errors: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.opt.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.opt.name = Some(name.into());
        self
    }

    pub fn transform(mut self, prop: TransformProp, v: f64) -> Self {
        self.opt.transform.set(prop, v);
        self
    }

    pub fn position(self, x: f64, y: f64) -> Self {
        self.transform(TransformProp::X, x)
            .transform(TransformProp::Y, y)
    }

    pub fn shape(self, key: &str, v: impl Into<PropValue>) -> Self {
        self.attr(AttrGroup::Shape, key, v)
    }

    pub fn style(self, key: &str, v: impl Into<PropValue>) -> Self {
        self.attr(AttrGroup::Style, key, v)
    }

    pub fn extra(self, key: &str, v: impl Into<PropValue>) -> Self {
        self.attr(AttrGroup::Extra, key, v)
    }

    /// Steady-state value in a keyed group.
    pub fn attr(mut self, group: AttrGroup, key: &str, v: impl Into<PropValue>) -> Self {
        match self.opt.attr_mut(group) {
            Some(a) => {
                a.values.insert(key.to_string(), v.into());
            }
            None => self.errors.push(format!(
                "transform field '{key}' must be set through `transform`"
            )),
        }
        self
    }

    /// Group-level transition (explicit key list or `All`).
    pub fn attr_transition(mut self, group: AttrGroup, spec: TransitionSpec) -> Self {
        if let Some(a) = self.opt.attr_mut(group) {
            a.transition = Some(spec);
        }
        self
    }

    pub fn attr_enter_from(mut self, group: AttrGroup, key: &str, v: impl Into<PropValue>) -> Self {
        match group {
            AttrGroup::Transform => return self.enter_from(key, v),
            _ => {
                if let Some(a) = self.opt.attr_mut(group) {
                    a.enter_from
                        .get_or_insert_with(Default::default)
                        .insert(key.to_string(), v.into());
                }
            }
        }
        self
    }

    pub fn attr_leave_to(mut self, group: AttrGroup, key: &str, v: impl Into<PropValue>) -> Self {
        match group {
            AttrGroup::Transform => return self.leave_to(key, v),
            _ => {
                if let Some(a) = self.opt.attr_mut(group) {
                    a.leave_to
                        .get_or_insert_with(Default::default)
                        .insert(key.to_string(), v.into());
                }
            }
        }
        self
    }

    /// Node-level transition over transform fields and group names.
    pub fn transition<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opt.transition = Some(TransitionSpec::Keys(
            keys.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn transition_all(mut self) -> Self {
        self.opt.transition = Some(TransitionSpec::All);
        self
    }

    pub fn enter_from(mut self, key: &str, v: impl Into<PropValue>) -> Self {
        self.opt
            .enter_from
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), v.into());
        self
    }

    pub fn leave_to(mut self, key: &str, v: impl Into<PropValue>) -> Self {
        self.opt
            .leave_to
            .get_or_insert_with(Default::default)
            .insert(key.to_string(), v.into());
        self
    }

    pub fn enter_animation(mut self, o: AnimationOverride) -> Self {
        self.opt.enter_animation = Some(o);
        self
    }

    pub fn update_animation(mut self, o: AnimationOverride) -> Self {
        self.opt.update_animation = Some(o);
        self
    }

    pub fn leave_animation(mut self, o: AnimationOverride) -> Self {
        self.opt.leave_animation = Some(o);
        self
    }

    pub fn morph(mut self, enabled: bool) -> Self {
        self.opt.morph = Some(enabled);
        self
    }

    pub fn morph_from(mut self, id: impl Into<String>) -> Self {
        self.opt.morph_from.push(id.into());
        self
    }

    pub fn invisible(mut self, v: bool) -> Self {
        self.opt.invisible = Some(v);
        self
    }

    pub fn info(mut self, info: serde_json::Value) -> Self {
        self.opt.info = Some(info);
        self
    }

    pub fn during(mut self, hook: DuringHook) -> Self {
        self.opt.during = Some(hook);
        self
    }

    pub fn merge_children(mut self, mode: MergeChildren) -> Self {
        self.opt.merge_children = mode;
        self
    }

    pub fn child(mut self, child: ElementOption) -> Self {
        self.opt.children.push(Some(child));
        self
    }

    /// Placeholder child slot that removes whatever was matched at this position.
    pub fn empty_child(mut self) -> Self {
        self.opt.children.push(None);
        self
    }

    pub fn build(self) -> TesselResult<ElementOption> {
        if let Some(first) = self.errors.into_iter().next() {
            return Err(TesselError::validation(first));
        }
        self.opt.validate()?;
        Ok(self.opt)
    }
}

/// Rect option with the given id and geometry.
pub fn rect(id: &str, x: f64, y: f64, width: f64, height: f64) -> ElementBuilder {
    ElementBuilder::new(ElementKind::Rect)
        .id(id)
        .shape("x", x)
        .shape("y", y)
        .shape("width", width)
        .shape("height", height)
}

/// Circle option with the given id and geometry.
pub fn circle(id: &str, cx: f64, cy: f64, r: f64) -> ElementBuilder {
    ElementBuilder::new(ElementKind::Circle)
        .id(id)
        .shape("cx", cx)
        .shape("cy", cy)
        .shape("r", r)
}

pub fn group(id: &str) -> ElementBuilder {
    ElementBuilder::new(ElementKind::Group).id(id)
}

#[cfg(test)]
#[path = "../../tests/unit/element/dsl.rs"]
mod tests;
