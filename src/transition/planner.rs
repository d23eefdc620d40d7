use crate::{
    element::{
        option::{AttrOption, ElementOption, TransitionSpec},
        props::{AttrGroup, ElementProps, TransformProp, default_value},
        value::PropValue,
    },
    foundation::{core::is_animatable_number, error::TesselResult},
    transition::contract::ContractMode,
};

/// Property deltas computed for one element in one pass.
///
/// `all_props` holds the steady-state values to assign; `from_props` the values the
/// element snaps to before animating toward its targets. Entries of `from_props` that
/// already equal their target are dropped, so an unchanged option yields an empty map.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPlan {
    pub all_props: ElementProps,
    pub from_props: ElementProps,
}

impl TransitionPlan {
    /// Target each `from_props` entry animates toward: the steady value, else the
    /// element's current value, else the key's default.
    pub fn target_of(&self, current: Option<&ElementProps>, group: AttrGroup, key: &str) -> PropValue {
        self.all_props
            .get(group, key)
            .or_else(|| current.and_then(|c| c.get(group, key)))
            .unwrap_or_else(|| default_value(group, key))
    }

    /// `to` side of the animation for every key in `from_props`.
    pub fn animation_targets(&self, current: Option<&ElementProps>) -> ElementProps {
        let mut out = ElementProps::default();
        for (group, key) in self.from_props.keys() {
            out.set(group, &key, self.target_of(current, group, &key));
        }
        out
    }
}

/// Compute the transition plan for one element.
///
/// `current` is the live element's values (absent on first creation). `leave_cache` is
/// the element's pending leave-target cache: `leaveTo` declarations are merged into it,
/// creating it on first use. Nothing is written to the cache when the call fails.
pub fn plan_transition(
    option: &ElementOption,
    current: Option<&ElementProps>,
    is_init: bool,
    leave_cache: &mut Option<ElementProps>,
    mode: ContractMode,
) -> TesselResult<TransitionPlan> {
    let mut plan = TransitionPlan::default();
    let mut leave = ElementProps::default();

    plan.all_props.transform = option.transform.resolved();
    plan_transform(option, current, is_init, &mut plan, &mut leave, mode)?;

    for group in AttrGroup::KEYED {
        let Some(attr) = option.attr(group) else {
            continue;
        };
        if let Some(dst) = plan.all_props.group_mut(group) {
            dst.extend(attr.values.iter().map(|(k, v)| (k.clone(), v.deep_clone())));
        }
        plan_keyed(
            group,
            attr,
            option.transition.as_ref(),
            current,
            is_init,
            &mut plan.from_props,
            &mut leave,
            mode,
        )?;
    }

    prune_noop(&mut plan, current);

    if !leave.is_empty() {
        leave_cache
            .get_or_insert_with(ElementProps::default)
            .merge(&leave);
    }
    Ok(plan)
}

fn plan_transform(
    option: &ElementOption,
    current: Option<&ElementProps>,
    is_init: bool,
    plan: &mut TransitionPlan,
    leave: &mut ElementProps,
    mode: ContractMode,
) -> TesselResult<()> {
    if is_init {
        if let Some(enter) = &option.enter_from {
            for (key, v) in enter {
                match (TransformProp::parse(key), v.as_number()) {
                    (Some(p), Some(n)) => {
                        plan.from_props.transform.insert(p, n);
                    }
                    _ => mode.violation(format!(
                        "`{key}` is not permitted in enterFrom, only transform fields are"
                    ))?,
                }
            }
        }
    } else if let Some(cur) = current {
        let current_of = |p: TransformProp| cur.transform.get(&p).copied().unwrap_or(p.default_value());
        match &option.transition {
            Some(TransitionSpec::All) => {
                for (p, _) in plan.all_props.transform.clone() {
                    plan.from_props.transform.insert(p, current_of(p));
                }
            }
            Some(TransitionSpec::Keys(keys)) => {
                for key in keys {
                    if AttrGroup::parse(key).is_some_and(|g| g != AttrGroup::Transform) {
                        continue;
                    }
                    let Some(p) = TransformProp::parse(key) else {
                        mode.violation(format!(
                            "`{key}` is not permitted in transition, only transform fields and group names are"
                        ))?;
                        continue;
                    };
                    if !plan.all_props.transform.get(&p).is_some_and(|v| is_animatable_number(*v)) {
                        mode.violation(format!(
                            "transition key `{key}` must refer to a finite number"
                        ))?;
                        continue;
                    }
                    plan.from_props.transform.insert(p, current_of(p));
                }
            }
            None => {
                for p in [TransformProp::X, TransformProp::Y] {
                    plan.from_props.transform.insert(p, current_of(p));
                }
            }
        }
    }

    if let Some(leave_to) = &option.leave_to {
        for (key, v) in leave_to {
            match (TransformProp::parse(key), v.as_number()) {
                (Some(p), Some(n)) => {
                    leave.transform.insert(p, n);
                }
                _ => mode.violation(format!(
                    "`{key}` is not permitted in leaveTo, only transform fields are"
                ))?,
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn plan_keyed(
    group: AttrGroup,
    attr: &AttrOption,
    node_transition: Option<&TransitionSpec>,
    current: Option<&ElementProps>,
    is_init: bool,
    from: &mut ElementProps,
    leave: &mut ElementProps,
    mode: ContractMode,
) -> TesselResult<()> {
    let Some(from_map) = from.group_mut(group) else {
        return Ok(());
    };

    if is_init {
        if let Some(enter) = &attr.enter_from {
            for (key, v) in enter {
                if attr.values.get(key).is_some_and(|steady| steady.same_instance(v)) {
                    mode.violation(format!(
                        "{}.enterFrom.{key} reuses the steady-state array instance",
                        group.name()
                    ))?;
                    continue;
                }
                from_map.insert(key.clone(), v.clone());
            }
        }
    } else if let Some(cur_map) = current.and_then(|c| c.group(group)) {
        if let Some(spec) = &attr.transition {
            let keys: Vec<String> = match spec {
                TransitionSpec::All => attr.values.keys().cloned().collect(),
                TransitionSpec::Keys(keys) => keys.clone(),
            };
            for key in keys {
                let el_val = cur_map.get(&key);
                let Some(opt_val) = attr.values.get(&key) else {
                    let msg = if el_val.is_some() {
                        format!("{}.transition key `{key}` has no target value", group.name())
                    } else {
                        format!("{}.transition key `{key}` names an unknown property", group.name())
                    };
                    mode.violation(msg)?;
                    continue;
                };
                if !opt_val.is_interpolable() {
                    mode.violation(format!(
                        "{}.{key} must refer to a finite number or an array for transition",
                        group.name()
                    ))?;
                    continue;
                }
                if el_val.is_some_and(|ev| ev.same_instance(opt_val)) {
                    mode.violation(format!(
                        "{}.{key} must use a different array instance each pass for transition",
                        group.name()
                    ))?;
                    continue;
                }
                let v = el_val.cloned().unwrap_or_else(|| default_value(group, &key));
                from_map.insert(key, v);
            }
        } else if node_transition.is_some_and(|t| t.contains(group.name())) {
            for (key, el_val) in cur_map {
                let enabled = match attr.values.get(key) {
                    Some(PropValue::Number(n)) => is_animatable_number(*n),
                    Some(v @ PropValue::Array(_)) if v.same_instance(el_val) => {
                        mode.violation(format!(
                            "{}.{key} must use a different array instance each pass for transition",
                            group.name()
                        ))?;
                        false
                    }
                    Some(PropValue::Array(_)) => true,
                    _ => false,
                };
                if enabled {
                    from_map.insert(key.clone(), el_val.clone());
                }
            }
        }
    }

    if let (Some(leave_to), Some(dst)) = (&attr.leave_to, leave.group_mut(group)) {
        dst.extend(leave_to.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Ok(())
}

fn prune_noop(plan: &mut TransitionPlan, current: Option<&ElementProps>) {
    for (group, key) in plan.from_props.keys() {
        let target = plan.target_of(current, group, &key);
        if plan.from_props.get(group, &key).is_some_and(|v| v == target) {
            plan.from_props.remove(group, &key);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/planner.rs"]
mod tests;
