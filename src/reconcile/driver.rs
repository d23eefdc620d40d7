use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    animation::config::{
        AnimatableModel, AnimationConfig, AnimationKind, AnimationOverride, AnimationPayload,
        morph_animation_config, resolve_animation_config,
    },
    element::{
        option::{ElementKind, ElementOption, MergeChildren},
        props::{ElementProps, default_value},
        value::PropValue,
    },
    foundation::{core::Affine, error::TesselResult, ids::ElementId},
    morph::{
        coordinator::{MorphCoordinator, MorphOpts, MorphPath, MorphSide, TempAllocator},
        geometry::{Outline, element_path},
    },
    reconcile::{
        arena::Arena,
        differ::{DiffKey, DiffOp, KeyedDiffer},
    },
    render::backend::{AnimateRequest, AnimationDone, DoneToken, ElementFlags, Renderer},
    transition::{
        contract::ContractMode,
        planner::{TransitionPlan, plan_transition},
    },
};

/// Reconciler configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconcileOpts {
    pub contract_mode: ContractMode,
    pub morph: MorphOpts,
}

/// Where a retained element is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lifecycle {
    /// Enter animation running.
    Entering,
    Steady,
    /// Animating toward its leave values; destroyed when that finishes.
    Leaving,
    /// Hidden behind morph temporaries.
    Morphing,
}

/// Result of asking for an element's removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoveOutcome {
    Destroyed,
    /// A leave animation started; the element is destroyed when it finishes.
    Leaving,
    /// Already leaving; destruction waits for the running leave animation.
    Deferred,
    Unknown,
}

/// Plan computed for one element in one pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPlan {
    pub element: ElementId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub kind: ElementKind,
    pub scope: AnimationKind,
    pub plan: TransitionPlan,
}

/// Summary of one reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub plans: Vec<ElementPlan>,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub recreated: usize,
    pub resurrected: usize,
    pub morphs: usize,
}

impl PassReport {
    /// Plan recorded for the element whose option id is `key`.
    pub fn plan_for(&self, key: &str) -> Option<&TransitionPlan> {
        self.plans
            .iter()
            .find(|p| p.key.as_deref() == Some(key))
            .map(|p| &p.plan)
    }
}

#[derive(Debug)]
struct Node {
    kind: ElementKind,
    key: Option<String>,
    name: Option<String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    /// Removed children still playing their leave animation.
    leaving: Vec<ElementId>,
    lifecycle: Lifecycle,
}

impl Node {
    fn new(
        kind: ElementKind,
        key: Option<String>,
        parent: Option<ElementId>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            kind,
            key,
            name: None,
            parent,
            children: Vec::new(),
            leaving: Vec::new(),
            lifecycle,
        }
    }
}

/// Engine bookkeeping kept beside each retained element.
#[derive(Debug, Default)]
struct ElementInner {
    /// Position among siblings in the pass that last placed the element.
    slot: usize,
    data_index: usize,
    /// Every steady value handed to the renderer so far.
    steady: ElementProps,
    leave_to: Option<ElementProps>,
    /// Values the leave animation started from, restored on resurrection.
    pre_leave: Option<ElementProps>,
    leave_animation: Option<AnimationOverride>,
    info: Option<serde_json::Value>,
    morph_enabled: bool,
    recreate_key: Option<PropValue>,
    flags: ElementFlags,
}

impl TempAllocator for Arena<Node> {
    fn alloc_temp(&mut self) -> ElementId {
        self.insert(Node::new(
            ElementKind::Polygon,
            None,
            None,
            Lifecycle::Morphing,
        ))
    }

    fn free_temp(&mut self, id: ElementId) {
        self.remove(id);
    }
}

#[derive(Clone, Copy)]
struct Placement {
    parent: Option<ElementId>,
    slot: usize,
    data_index: usize,
}

struct PassCx<'a> {
    model: &'a dyn AnimatableModel,
    payload: Option<&'a AnimationPayload>,
    report: PassReport,
}

#[derive(Default)]
struct MorphPlan {
    /// Item indices of the new root options.
    targets: Vec<usize>,
    sources: Vec<ElementId>,
}

fn done_token(scope: AnimationKind) -> DoneToken {
    match scope {
        AnimationKind::Enter => DoneToken::Enter,
        AnimationKind::Update => DoneToken::Update,
        AnimationKind::Leave => DoneToken::Leave,
    }
}

fn option_key(opt: &ElementOption, slot: usize, by_name: bool) -> DiffKey {
    match (&opt.id, &opt.name) {
        (Some(id), _) => DiffKey::Id(id.clone()),
        (None, Some(name)) if by_name => DiffKey::Name(name.clone()),
        _ => DiffKey::Index(slot),
    }
}

/// Entries of `next` that differ from `prev`.
fn changed_values(prev: &ElementProps, next: &ElementProps) -> ElementProps {
    let mut out = ElementProps::default();
    for (group, key) in next.keys() {
        let Some(v) = next.get(group, &key) else {
            continue;
        };
        if prev.get(group, &key).as_ref() != Some(&v) {
            out.set(group, &key, v);
        }
    }
    out
}

/// Live value of every key in `mask`, falling back to the key default.
fn live_values(current: &ElementProps, mask: &ElementProps) -> ElementProps {
    let mut out = ElementProps::default();
    for (group, key) in mask.keys() {
        let v = current
            .get(group, &key)
            .unwrap_or_else(|| default_value(group, &key));
        out.set(group, &key, v);
    }
    out
}

/// Retained element tree plus the pass logic that keeps it in step with option trees.
///
/// Every pass receives the full option list again. Elements are matched by `id`, else by
/// position, then created, updated, recreated, removed or morphed. The renderer only ever
/// sees the resulting create/apply/animate/destroy calls.
#[derive(Default)]
pub struct Reconciler {
    opts: ReconcileOpts,
    nodes: Arena<Node>,
    inner: BTreeMap<ElementId, ElementInner>,
    roots: Vec<ElementId>,
    leaving_roots: Vec<ElementId>,
    morph: MorphCoordinator,
}

impl Reconciler {
    pub fn new(opts: ReconcileOpts) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    pub fn opts(&self) -> &ReconcileOpts {
        &self.opts
    }

    /// Live root elements, in item order.
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    /// Root elements still playing their leave animation.
    pub fn leaving(&self) -> &[ElementId] {
        &self.leaving_roots
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn lifecycle(&self, id: ElementId) -> Option<Lifecycle> {
        self.nodes.get(id).map(|n| n.lifecycle)
    }

    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.nodes.get(id).map(|n| n.kind)
    }

    pub fn info(&self, id: ElementId) -> Option<&serde_json::Value> {
        self.inner.get(&id).and_then(|i| i.info.as_ref())
    }

    pub fn is_morphing(&self, id: ElementId) -> bool {
        self.morph.is_morphing(id)
    }

    /// First live element whose option `id` is `key`, searched depth first.
    pub fn find(&self, key: &str) -> Option<ElementId> {
        let mut stack: Vec<ElementId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if node.key.as_deref() == Some(key) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Run one reconciliation pass over the root option list.
    ///
    /// `None` items hold a position without describing an element; whatever matched that
    /// position before is removed. `payload` overrides animation timing for this pass only.
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn reconcile(
        &mut self,
        renderer: &mut dyn Renderer,
        model: &dyn AnimatableModel,
        items: &[Option<ElementOption>],
        payload: Option<&AnimationPayload>,
    ) -> TesselResult<PassReport> {
        for item in items.iter().flatten() {
            item.validate()?;
        }
        let mut cx = PassCx {
            model,
            payload,
            report: PassReport::default(),
        };

        let old_roots = std::mem::take(&mut self.roots);
        let old_keys: Vec<DiffKey> = old_roots.iter().map(|id| self.diff_key(*id, false)).collect();
        let new_keys: Vec<Option<DiffKey>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| item.as_ref().map(|o| option_key(o, i, false)))
            .collect();
        let ops = KeyedDiffer::diff(&old_keys, &new_keys);

        let morphs = self.plan_morphs(&cx, &ops, &old_roots, items);
        let morph_targets: BTreeSet<usize> = morphs
            .iter()
            .flat_map(|(m, _)| m.targets.iter().copied())
            .collect();
        let morph_sources: BTreeSet<ElementId> = morphs
            .iter()
            .flat_map(|(m, _)| m.sources.iter().copied())
            .collect();

        let mut placed: Vec<(usize, ElementId)> = Vec::with_capacity(items.len());
        let mut created: BTreeMap<usize, ElementId> = BTreeMap::new();
        let mut outcome = Ok(());
        for op in ops {
            let step = self.apply_root_op(
                renderer,
                &mut cx,
                op,
                items,
                &old_roots,
                (&morph_targets, &morph_sources),
                &mut created,
            );
            match step {
                Ok(Some(entry)) => placed.push(entry),
                Ok(None) => {}
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        // On failure the untouched old roots stay tracked so the next pass still finds them.
        self.roots = self.settle_order(placed, &old_roots);
        outcome?;

        for (plan, config) in morphs {
            self.run_morph(renderer, &mut cx, plan, config, &created)?;
        }
        debug!(
            created = cx.report.created,
            updated = cx.report.updated,
            removed = cx.report.removed,
            "pass complete"
        );
        Ok(cx.report)
    }

    /// Run one root diff op. Returns the item index and element placed by it.
    #[allow(clippy::too_many_arguments)]
    fn apply_root_op(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        op: DiffOp,
        items: &[Option<ElementOption>],
        old_roots: &[ElementId],
        (morph_targets, morph_sources): (&BTreeSet<usize>, &BTreeSet<ElementId>),
        created: &mut BTreeMap<usize, ElementId>,
    ) -> TesselResult<Option<(usize, ElementId)>> {
        let at = |new| Placement {
            parent: None,
            slot: new,
            data_index: new,
        };
        match op {
            DiffOp::Update { old, new } => {
                let Some(opt) = items[new].as_ref() else {
                    return Ok(None);
                };
                let id = self.update_or_recreate(renderer, cx, old_roots[old], opt, at(new))?;
                Ok(Some((new, id)))
            }
            DiffOp::Add { new } => {
                let Some(opt) = items[new].as_ref() else {
                    return Ok(None);
                };
                let id = match self.find_leaving_root(opt) {
                    Some(id) => self.resurrect(renderer, cx, id, opt, at(new))?,
                    None => {
                        let is_target = morph_targets.contains(&new);
                        let id = self.create_element(renderer, cx, opt, at(new), None, !is_target)?;
                        if is_target {
                            created.insert(new, id);
                        }
                        id
                    }
                };
                Ok(Some((new, id)))
            }
            DiffOp::Remove { old } => {
                let id = old_roots[old];
                if !morph_sources.contains(&id) {
                    self.remove_element(renderer, cx, id)?;
                }
                Ok(None)
            }
        }
    }

    /// Placed elements in item order, then the old elements that are still live, not
    /// leaving and not placed. That tail holds morph sources waiting for their morph, or
    /// whatever a failed pass never reached.
    fn settle_order(&self, mut placed: Vec<(usize, ElementId)>, old: &[ElementId]) -> Vec<ElementId> {
        placed.sort_by_key(|(i, _)| *i);
        let mut out: Vec<ElementId> = placed.into_iter().map(|(_, id)| id).collect();
        for id in old {
            let live = self
                .nodes
                .get(*id)
                .is_some_and(|n| n.lifecycle != Lifecycle::Leaving);
            if live && !out.contains(id) {
                out.push(*id);
            }
        }
        out
    }

    /// Advance the renderer clock and settle lifecycles of finished animations.
    #[instrument(skip(self, renderer))]
    pub fn advance(
        &mut self,
        renderer: &mut dyn Renderer,
        elapsed_ms: f64,
    ) -> TesselResult<Vec<AnimationDone>> {
        let done = renderer.advance(elapsed_ms);
        for d in &done {
            match d.token {
                DoneToken::Enter => {
                    if let Some(n) = self.nodes.get_mut(d.element) {
                        if n.lifecycle == Lifecycle::Entering {
                            n.lifecycle = Lifecycle::Steady;
                        }
                    }
                }
                DoneToken::Update => {}
                DoneToken::Leave => {
                    if self.lifecycle(d.element) == Some(Lifecycle::Leaving) {
                        debug!(element = %d.element, "leave finished");
                        self.destroy_subtree(renderer, d.element);
                    }
                }
                DoneToken::Morph { morph, piece } => {
                    let revealed = self
                        .morph
                        .on_piece_done(renderer, &mut self.nodes, morph, piece)?;
                    for id in revealed {
                        if let Some(n) = self.nodes.get_mut(id) {
                            if n.lifecycle == Lifecycle::Morphing {
                                n.lifecycle = Lifecycle::Steady;
                            }
                        }
                    }
                }
            }
        }
        Ok(done)
    }

    /// Remove one element outside of a pass, playing its leave animation if it has one.
    pub fn remove(
        &mut self,
        renderer: &mut dyn Renderer,
        model: &dyn AnimatableModel,
        id: ElementId,
    ) -> TesselResult<RemoveOutcome> {
        let mut cx = PassCx {
            model,
            payload: None,
            report: PassReport::default(),
        };
        self.remove_element(renderer, &mut cx, id)
    }

    /// Destroy everything, leaving animations and morphs included.
    pub fn clear(&mut self, renderer: &mut dyn Renderer) {
        self.morph.clear(renderer, &mut self.nodes);
        let roots = std::mem::take(&mut self.roots);
        let leaving = std::mem::take(&mut self.leaving_roots);
        for id in roots.into_iter().chain(leaving) {
            self.destroy_subtree(renderer, id);
        }
    }

    fn diff_key(&self, id: ElementId, by_name: bool) -> DiffKey {
        let node = self.nodes.get(id);
        match (node.and_then(|n| n.key.clone()), node.and_then(|n| n.name.clone())) {
            (Some(key), _) => DiffKey::Id(key),
            (None, Some(name)) if by_name => DiffKey::Name(name),
            _ => DiffKey::Index(self.inner.get(&id).map_or(usize::MAX, |i| i.slot)),
        }
    }

    fn find_leaving_root(&self, opt: &ElementOption) -> Option<ElementId> {
        let key = opt.id.as_deref()?;
        self.leaving_roots.iter().copied().find(|id| {
            self.nodes
                .get(*id)
                .is_some_and(|n| n.key.as_deref() == Some(key) && n.kind == opt.kind)
        })
    }

    fn sync_inner(&mut self, id: ElementId, opt: &ElementOption, at: Placement) {
        if let Some(inner) = self.inner.get_mut(&id) {
            inner.slot = at.slot;
            inner.data_index = at.data_index;
            inner.info = opt.info.clone();
            inner.morph_enabled = opt.morph_enabled();
            inner.recreate_key = opt.recreate_key().cloned();
            inner.leave_animation = opt.leave_animation;
            if let Some(v) = opt.invisible {
                inner.flags.invisible = v;
            }
            if let Some(v) = opt.silent {
                inner.flags.silent = v;
            }
            if let Some(v) = opt.ignore {
                inner.flags.ignore = v;
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.name = opt.name.clone();
        }
    }

    fn plan_for(
        &mut self,
        id: ElementId,
        opt: &ElementOption,
        current: Option<&ElementProps>,
        is_init: bool,
    ) -> TesselResult<TransitionPlan> {
        let mut cache = self.inner.get(&id).and_then(|i| i.leave_to.clone());
        let plan = plan_transition(opt, current, is_init, &mut cache, self.opts.contract_mode)?;
        if let Some(inner) = self.inner.get_mut(&id) {
            inner.leave_to = cache;
        }
        Ok(plan)
    }

    /// Push a plan to the renderer. Returns `true` when an animation was started.
    ///
    /// Only steady values that changed since the last pass are assigned; they take over
    /// from any older animation still driving them.
    #[allow(clippy::too_many_arguments)]
    fn apply_plan(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &PassCx<'_>,
        id: ElementId,
        opt: &ElementOption,
        plan: &TransitionPlan,
        scope: AnimationKind,
        current: Option<&ElementProps>,
        animate: bool,
    ) -> TesselResult<bool> {
        let inner = self.inner.get(&id);
        renderer.set_flags(id, inner.map(|i| i.flags).unwrap_or_default())?;
        renderer.set_during(id, opt.during.clone())?;

        let element_override = match scope {
            AnimationKind::Enter => opt.enter_animation.as_ref(),
            AnimationKind::Update => opt.update_animation.as_ref(),
            AnimationKind::Leave => opt.leave_animation.as_ref(),
        };
        let config = if animate && !plan.from_props.is_empty() {
            resolve_animation_config(
                scope,
                cx.model,
                inner.map_or(0, |i| i.data_index),
                element_override,
                cx.payload,
            )
            .filter(|c| c.is_animated())
        } else {
            None
        };

        let changed = match inner {
            Some(i) => changed_values(&i.steady, &plan.all_props),
            None => plan.all_props.clone(),
        };
        if let Some(inner) = self.inner.get_mut(&id) {
            inner.steady.merge(&plan.all_props);
        }

        let Some(config) = config else {
            if !changed.is_empty() {
                renderer.animate(
                    id,
                    AnimateRequest {
                        from: ElementProps::default(),
                        to: changed,
                        config: AnimationConfig::instant(),
                        scope,
                        during: None,
                        done: None,
                    },
                )?;
            }
            return Ok(false);
        };

        renderer.apply(id, &changed.without_keys_of(&plan.from_props))?;
        let mut to = changed;
        to.merge(&plan.animation_targets(current));
        renderer.animate(
            id,
            AnimateRequest {
                from: plan.from_props.clone(),
                to,
                config,
                scope,
                during: opt.during.clone(),
                done: Some(done_token(scope)),
            },
        )?;
        Ok(true)
    }

    fn record(cx: &mut PassCx<'_>, id: ElementId, opt: &ElementOption, scope: AnimationKind, plan: TransitionPlan) {
        cx.report.plans.push(ElementPlan {
            element: id,
            key: opt.id.clone(),
            kind: opt.kind,
            scope,
            plan,
        });
    }

    /// Create an element and its subtree. A `seed` marks a recreation: the new element
    /// starts from the seeded values and is planned as an update.
    fn create_element(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        opt: &ElementOption,
        at: Placement,
        seed: Option<ElementProps>,
        animate: bool,
    ) -> TesselResult<ElementId> {
        let id = self.nodes.insert(Node::new(
            opt.kind,
            opt.id.clone(),
            at.parent,
            Lifecycle::Entering,
        ));
        self.inner.insert(id, ElementInner::default());
        self.sync_inner(id, opt, at);
        if let Err(err) = self.populate(renderer, cx, id, opt, at, seed, animate) {
            debug!(element = %id, key = opt.display_key(), "creation rolled back");
            self.destroy_subtree(renderer, id);
            return Err(err);
        }
        Ok(id)
    }

    #[allow(clippy::too_many_arguments)]
    fn populate(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        id: ElementId,
        opt: &ElementOption,
        at: Placement,
        seed: Option<ElementProps>,
        animate: bool,
    ) -> TesselResult<()> {
        renderer.create(id, opt.kind, at.parent)?;
        debug!(element = %id, key = opt.display_key(), kind = ?opt.kind, "created");
        cx.report.created += 1;

        let scope = if seed.is_some() {
            AnimationKind::Update
        } else {
            AnimationKind::Enter
        };
        if let Some(seed) = &seed {
            renderer.apply(id, seed)?;
        }
        let plan = self.plan_for(id, opt, seed.as_ref(), seed.is_none())?;
        let animated = self.apply_plan(renderer, cx, id, opt, &plan, scope, seed.as_ref(), animate)?;
        if let Some(n) = self.nodes.get_mut(id) {
            n.lifecycle = if animated && scope == AnimationKind::Enter {
                Lifecycle::Entering
            } else {
                Lifecycle::Steady
            };
        }
        Self::record(cx, id, opt, scope, plan);
        self.reconcile_children(renderer, cx, id, opt, at.data_index, animate)
    }

    fn update_element(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        id: ElementId,
        opt: &ElementOption,
        at: Placement,
    ) -> TesselResult<()> {
        self.sync_inner(id, opt, at);
        let current = renderer.read(id).cloned();
        let plan = self.plan_for(id, opt, current.as_ref(), false)?;
        self.apply_plan(
            renderer,
            cx,
            id,
            opt,
            &plan,
            AnimationKind::Update,
            current.as_ref(),
            true,
        )?;
        if let Some(n) = self.nodes.get_mut(id) {
            if n.lifecycle == Lifecycle::Entering {
                n.lifecycle = Lifecycle::Steady;
            }
        }
        cx.report.updated += 1;
        Self::record(cx, id, opt, AnimationKind::Update, plan);
        self.reconcile_children(renderer, cx, id, opt, at.data_index, true)
    }

    /// Update in place, or rebuild when the kind or the geometry source changed.
    fn update_or_recreate(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        id: ElementId,
        opt: &ElementOption,
        at: Placement,
    ) -> TesselResult<ElementId> {
        let recreate = match (self.nodes.get(id), self.inner.get(&id)) {
            (Some(n), Some(i)) => n.kind != opt.kind || i.recreate_key.as_ref() != opt.recreate_key(),
            _ => true,
        };
        if !recreate {
            self.update_element(renderer, cx, id, opt, at)?;
            return Ok(id);
        }
        let seed = renderer.read(id).map(|p| ElementProps {
            transform: p.transform.clone(),
            style: p.style.clone(),
            ..ElementProps::default()
        });
        debug!(element = %id, key = opt.display_key(), "recreating");
        self.destroy_subtree(renderer, id);
        cx.report.recreated += 1;
        self.create_element(renderer, cx, opt, at, seed, true)
    }

    /// Bring a leaving root back: stop its leave animation and restore what `leaveTo`
    /// changed, then continue as a normal update.
    fn resurrect(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        id: ElementId,
        opt: &ElementOption,
        at: Placement,
    ) -> TesselResult<ElementId> {
        renderer.stop(id, Some(AnimationKind::Leave));
        self.leaving_roots.retain(|r| *r != id);
        let pre = self.inner.get_mut(&id).and_then(|i| {
            let pre = i.pre_leave.take()?;
            i.steady = i.steady.without_keys_of(&pre);
            Some(pre)
        });
        if let Some(n) = self.nodes.get_mut(id) {
            n.lifecycle = Lifecycle::Steady;
        }
        self.sync_inner(id, opt, at);
        debug!(element = %id, key = opt.display_key(), "resurrected");

        let current = renderer.read(id).cloned();
        let mut plan = self.plan_for(id, opt, current.as_ref(), false)?;
        if let Some(pre) = pre {
            for (group, key) in pre.keys() {
                let Some(steady) = pre.get(group, &key) else {
                    continue;
                };
                if !plan.all_props.contains(group, &key) {
                    plan.all_props.set(group, &key, steady);
                }
                if plan.from_props.contains(group, &key) {
                    continue;
                }
                let live = current
                    .as_ref()
                    .and_then(|c| c.get(group, &key))
                    .unwrap_or_else(|| default_value(group, &key));
                if live != plan.target_of(current.as_ref(), group, &key) {
                    plan.from_props.set(group, &key, live);
                }
            }
        }
        self.apply_plan(
            renderer,
            cx,
            id,
            opt,
            &plan,
            AnimationKind::Update,
            current.as_ref(),
            true,
        )?;
        cx.report.resurrected += 1;
        Self::record(cx, id, opt, AnimationKind::Update, plan);
        self.reconcile_children(renderer, cx, id, opt, at.data_index, true)?;
        Ok(id)
    }

    fn remove_element(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        id: ElementId,
    ) -> TesselResult<RemoveOutcome> {
        let Some(node) = self.nodes.get(id) else {
            return Ok(RemoveOutcome::Unknown);
        };
        if node.lifecycle == Lifecycle::Leaving {
            debug!(element = %id, "destroy deferred until leave finishes");
            return Ok(RemoveOutcome::Deferred);
        }
        let parent = node.parent;
        cx.report.removed += 1;

        let leave = if self.morph.is_morphing(id) {
            None
        } else {
            self.inner.get(&id).and_then(|inner| {
                let leave = inner.leave_to.clone().filter(|l| !l.is_empty())?;
                let config = resolve_animation_config(
                    AnimationKind::Leave,
                    cx.model,
                    inner.data_index,
                    inner.leave_animation.as_ref(),
                    cx.payload,
                )
                .filter(|c| c.is_animated())?;
                Some((leave, config))
            })
        };
        let Some((leave, config)) = leave else {
            debug!(element = %id, "removed");
            self.destroy_subtree(renderer, id);
            return Ok(RemoveOutcome::Destroyed);
        };

        let current = renderer.read(id).cloned().unwrap_or_default();
        let pre = live_values(&current, &leave);
        renderer.animate(
            id,
            AnimateRequest {
                from: pre.clone(),
                to: leave,
                config,
                scope: AnimationKind::Leave,
                during: None,
                done: Some(DoneToken::Leave),
            },
        )?;
        if let Some(inner) = self.inner.get_mut(&id) {
            inner.pre_leave = Some(pre);
        }
        if let Some(n) = self.nodes.get_mut(id) {
            n.lifecycle = Lifecycle::Leaving;
        }
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => {
                p.children.retain(|c| *c != id);
                p.leaving.push(id);
            }
            None => {
                self.roots.retain(|r| *r != id);
                self.leaving_roots.push(id);
            }
        }
        debug!(element = %id, "leaving");
        Ok(RemoveOutcome::Leaving)
    }

    fn destroy_subtree(&mut self, renderer: &mut dyn Renderer, id: ElementId) {
        let Some(Node {
            parent,
            children,
            leaving,
            ..
        }) = self.nodes.remove(id)
        else {
            return;
        };
        self.inner.remove(&id);
        for child in children.into_iter().chain(leaving) {
            self.destroy_subtree(renderer, child);
        }
        self.morph.forget(renderer, &mut self.nodes, id);
        renderer.destroy(id);
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => {
                p.children.retain(|c| *c != id);
                p.leaving.retain(|c| *c != id);
            }
            None => {
                self.roots.retain(|r| *r != id);
                self.leaving_roots.retain(|r| *r != id);
            }
        }
    }

    /// Diff a group's child options against its retained children. `animate` is `false`
    /// while the group itself is created without an enter animation.
    fn reconcile_children(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        parent: ElementId,
        opt: &ElementOption,
        data_index: usize,
        animate: bool,
    ) -> TesselResult<()> {
        if !opt.kind.is_group() {
            return Ok(());
        }
        let old = match self.nodes.get_mut(parent) {
            Some(n) => std::mem::take(&mut n.children),
            None => return Ok(()),
        };
        let base = Placement {
            parent: Some(parent),
            slot: 0,
            data_index,
        };

        let mut placed = Vec::with_capacity(opt.children.len());
        let outcome = match opt.merge_children {
            MergeChildren::Replace => {
                self.replace_children(renderer, cx, &old, opt, base, animate, &mut placed)
            }
            MergeChildren::ByIndex | MergeChildren::ByName => {
                self.merge_children(renderer, cx, &old, opt, base, animate, &mut placed)
            }
        };
        let children = self.settle_order(placed, &old);
        if let Some(n) = self.nodes.get_mut(parent) {
            n.children = children;
        }
        outcome
    }

    /// Children carrying an id keep their element; everything else is rebuilt.
    #[allow(clippy::too_many_arguments)]
    fn replace_children(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        old: &[ElementId],
        opt: &ElementOption,
        base: Placement,
        animate: bool,
        placed: &mut Vec<(usize, ElementId)>,
    ) -> TesselResult<()> {
        let mut kept: Vec<Option<ElementId>> = vec![None; opt.children.len()];
        let mut matched = BTreeSet::new();
        for (i, child) in opt.children.iter().enumerate() {
            let Some(key) = child.as_ref().and_then(|c| c.id.as_deref()) else {
                continue;
            };
            kept[i] = old.iter().copied().find(|o| {
                !matched.contains(o)
                    && self.nodes.get(*o).is_some_and(|n| n.key.as_deref() == Some(key))
            });
            if let Some(o) = kept[i] {
                matched.insert(o);
            }
        }
        for o in old.iter().filter(|o| !matched.contains(*o)) {
            self.remove_element(renderer, cx, *o)?;
        }
        for (i, child) in opt.children.iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            let at = Placement { slot: i, ..base };
            let id = match kept[i] {
                Some(o) => self.update_or_recreate(renderer, cx, o, child, at)?,
                None => self.create_element(renderer, cx, child, at, None, animate)?,
            };
            placed.push((i, id));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_children(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        old: &[ElementId],
        opt: &ElementOption,
        base: Placement,
        animate: bool,
        placed: &mut Vec<(usize, ElementId)>,
    ) -> TesselResult<()> {
        let by_name = opt.merge_children == MergeChildren::ByName;
        let old_keys: Vec<DiffKey> = old.iter().map(|id| self.diff_key(*id, by_name)).collect();
        let new_keys: Vec<Option<DiffKey>> = opt
            .children
            .iter()
            .enumerate()
            .map(|(i, c)| c.as_ref().map(|c| option_key(c, i, by_name)))
            .collect();
        for op in KeyedDiffer::diff(&old_keys, &new_keys) {
            match op {
                DiffOp::Update { old: o, new } => {
                    let Some(child) = opt.children[new].as_ref() else {
                        continue;
                    };
                    let at = Placement { slot: new, ..base };
                    let id = self.update_or_recreate(renderer, cx, old[o], child, at)?;
                    placed.push((new, id));
                }
                DiffOp::Add { new } => {
                    let Some(child) = opt.children[new].as_ref() else {
                        continue;
                    };
                    let at = Placement { slot: new, ..base };
                    let id = self.create_element(renderer, cx, child, at, None, animate)?;
                    placed.push((new, id));
                }
                DiffOp::Remove { old: o } => {
                    self.remove_element(renderer, cx, old[o])?;
                }
            }
        }
        Ok(())
    }

    /// Group added roots with the removed roots they declare in `morphFrom`. Roots sharing
    /// a source end up in one plan.
    fn plan_morphs(
        &self,
        cx: &PassCx<'_>,
        ops: &[DiffOp],
        old_roots: &[ElementId],
        items: &[Option<ElementOption>],
    ) -> Vec<(MorphPlan, AnimationConfig)> {
        if !self.opts.morph.enabled {
            return Vec::new();
        }
        let removed: BTreeMap<&str, ElementId> = ops
            .iter()
            .filter_map(|op| match op {
                DiffOp::Remove { old } => Some(old_roots[*old]),
                _ => None,
            })
            .filter(|id| self.inner.get(id).is_some_and(|i| i.morph_enabled))
            .filter_map(|id| Some((self.nodes.get(id)?.key.as_deref()?, id)))
            .collect();
        if removed.is_empty() {
            return Vec::new();
        }

        let mut plans: Vec<MorphPlan> = Vec::new();
        let mut owner: BTreeMap<ElementId, usize> = BTreeMap::new();
        for op in ops {
            let DiffOp::Add { new } = op else {
                continue;
            };
            let Some(opt) = items[*new].as_ref().filter(|o| o.morph_enabled()) else {
                continue;
            };
            let mut sources: Vec<ElementId> = Vec::new();
            for id in opt.morph_from.iter().filter_map(|k| removed.get(k.as_str())) {
                if !sources.contains(id) {
                    sources.push(*id);
                }
            }
            if sources.is_empty() {
                continue;
            }
            let mut touching: Vec<usize> = sources.iter().filter_map(|s| owner.get(s).copied()).collect();
            touching.sort_unstable();
            touching.dedup();
            let into = match touching.first() {
                Some(&first) => first,
                None => {
                    plans.push(MorphPlan::default());
                    plans.len() - 1
                }
            };
            for &other in touching.iter().skip(1) {
                let moved = std::mem::take(&mut plans[other]);
                plans[into].targets.extend(moved.targets);
                plans[into].sources.extend(moved.sources);
            }
            plans[into].targets.push(*new);
            for s in sources {
                if !plans[into].sources.contains(&s) {
                    plans[into].sources.push(s);
                }
            }
            for s in &plans[into].sources {
                owner.insert(*s, into);
            }
        }

        plans
            .into_iter()
            .filter(|p| !p.targets.is_empty())
            .filter_map(|mut p| {
                p.targets.sort_unstable();
                let config = morph_animation_config(cx.model, p.targets[0], cx.payload);
                config.is_animated().then_some((p, config))
            })
            .collect()
    }

    fn run_morph(
        &mut self,
        renderer: &mut dyn Renderer,
        cx: &mut PassCx<'_>,
        plan: MorphPlan,
        config: AnimationConfig,
        created: &BTreeMap<usize, ElementId>,
    ) -> TesselResult<()> {
        let targets: Vec<ElementId> = plan
            .targets
            .iter()
            .filter_map(|i| created.get(i).copied())
            .collect();
        let from: Vec<MorphSide> = plan
            .sources
            .iter()
            .filter_map(|id| self.morph_side(&*renderer, *id))
            .collect();
        let to: Vec<MorphSide> = targets
            .iter()
            .filter_map(|id| self.morph_side(&*renderer, *id))
            .collect();

        let started = self
            .morph
            .apply(renderer, &mut self.nodes, from, to, config, &self.opts.morph)?;
        if started.is_some() {
            cx.report.morphs += 1;
        }
        for target in targets {
            let mut hidden = self.path_owners(target);
            hidden.push(target);
            for id in hidden {
                if !self.morph.is_morphing(id) {
                    continue;
                }
                if let Some(n) = self.nodes.get_mut(id) {
                    n.lifecycle = Lifecycle::Morphing;
                }
            }
        }
        for id in plan.sources {
            if started.is_some() {
                cx.report.removed += 1;
                self.destroy_subtree(renderer, id);
            } else {
                self.remove_element(renderer, cx, id)?;
            }
        }
        Ok(())
    }

    /// Outlines `id` brings to a morph: its own, or those of its path descendants when it
    /// is a group.
    fn morph_side(&self, renderer: &dyn Renderer, id: ElementId) -> Option<MorphSide> {
        let paths: Vec<MorphPath> = self
            .path_owners(id)
            .into_iter()
            .filter_map(|owner| self.morph.side(renderer, owner, self.outline(renderer, owner)))
            .flat_map(|side| side.paths)
            .collect();
        (!paths.is_empty()).then_some(MorphSide { element: id, paths })
    }

    /// Geometric elements in the subtree of `id`, depth first, skipping invisible, ignored
    /// and opted-out ones.
    fn path_owners(&self, id: ElementId) -> Vec<ElementId> {
        let mut owners = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(node) = self.nodes.get(cur) else {
                continue;
            };
            if node.kind.is_group() {
                stack.extend(node.children.iter().rev().copied());
                continue;
            }
            let usable = self
                .inner
                .get(&cur)
                .is_some_and(|i| i.morph_enabled && !i.flags.invisible && !i.flags.ignore);
            if usable && node.kind.has_geometry() {
                owners.push(cur);
            }
        }
        owners
    }

    /// Root-space outline of a geometric element.
    fn outline(&self, renderer: &dyn Renderer, id: ElementId) -> Option<Outline> {
        let kind = self.nodes.get(id)?.kind;
        let props = renderer.read(id)?;
        let path = element_path(kind, &props.shape)?;
        Some(Outline::from_path(&path).transformed(self.world_affine(renderer, id)))
    }

    fn world_affine(&self, renderer: &dyn Renderer, id: ElementId) -> Affine {
        let mut affine = Affine::IDENTITY;
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let local = renderer
                .read(cur)
                .map_or(Affine::IDENTITY, |p| p.transform2d().to_affine());
            affine = local * affine;
            cursor = self.nodes.get(cur).and_then(|n| n.parent);
        }
        affine
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconcile/driver.rs"]
mod tests;
