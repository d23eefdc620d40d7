use std::collections::{BTreeMap, BTreeSet};

use crate::{
    animation::{
        config::AnimationKind,
        during::{DuringApi, DuringHook},
        lerp::Lerp,
    },
    element::{option::ElementKind, props::ElementProps},
    foundation::{
        error::{TesselError, TesselResult},
        ids::ElementId,
    },
    render::backend::{AnimateRequest, AnimationDone, ElementFlags, Renderer},
};

#[derive(Debug)]
struct SceneNode {
    kind: ElementKind,
    parent: Option<ElementId>,
    props: ElementProps,
    flags: ElementFlags,
    visible: bool,
    during: Option<DuringHook>,
}

#[derive(Debug)]
struct ActiveAnimation {
    element: ElementId,
    request: AnimateRequest,
    elapsed: f64,
}

/// Create/destroy counters, used to check identity stability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SceneStats {
    pub created: u64,
    pub destroyed: u64,
}

/// In-memory retained renderer with a manual frame clock.
#[derive(Debug, Default)]
pub struct SceneRenderer {
    nodes: BTreeMap<ElementId, SceneNode>,
    animations: Vec<ActiveAnimation>,
    pending_done: Vec<AnimationDone>,
    clock_ms: f64,
    stats: SceneStats,
}

/// Serializable view of one element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotElement {
    pub id: ElementId,
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
    pub visible: bool,
    pub flags: ElementFlags,
    pub props: ElementProps,
}

/// Serializable view of the whole scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub clock_ms: f64,
    pub stats: SceneStats,
    pub active_animations: usize,
    pub elements: Vec<SnapshotElement>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.nodes.get(&id).map(|n| n.kind)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn is_visible(&self, id: ElementId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.visible)
    }

    pub fn flags(&self, id: ElementId) -> Option<ElementFlags> {
        self.nodes.get(&id).map(|n| n.flags)
    }

    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            clock_ms: self.clock_ms,
            stats: self.stats,
            active_animations: self.animations.len(),
            elements: self
                .nodes
                .iter()
                .map(|(id, n)| SnapshotElement {
                    id: *id,
                    kind: n.kind,
                    parent: n.parent,
                    visible: n.visible,
                    flags: n.flags,
                    props: n.props.clone(),
                })
                .collect(),
        }
    }

    fn node_mut(&mut self, id: ElementId) -> TesselResult<&mut SceneNode> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| TesselError::render(format!("unknown element {id}")))
    }
}

impl Renderer for SceneRenderer {
    fn create(
        &mut self,
        id: ElementId,
        kind: ElementKind,
        parent: Option<ElementId>,
    ) -> TesselResult<()> {
        if self.nodes.contains_key(&id) {
            return Err(TesselError::render(format!("element {id} already exists")));
        }
        self.nodes.insert(
            id,
            SceneNode {
                kind,
                parent,
                props: ElementProps::default(),
                flags: ElementFlags::default(),
                visible: true,
                during: None,
            },
        );
        self.stats.created += 1;
        Ok(())
    }

    fn read(&self, id: ElementId) -> Option<&ElementProps> {
        self.nodes.get(&id).map(|n| &n.props)
    }

    fn apply(&mut self, id: ElementId, props: &ElementProps) -> TesselResult<()> {
        self.node_mut(id)?.props.merge(props);
        Ok(())
    }

    fn set_flags(&mut self, id: ElementId, flags: ElementFlags) -> TesselResult<()> {
        self.node_mut(id)?.flags = flags;
        Ok(())
    }

    fn set_visible(&mut self, id: ElementId, visible: bool) -> TesselResult<()> {
        self.node_mut(id)?.visible = visible;
        Ok(())
    }

    fn set_during(&mut self, id: ElementId, hook: Option<DuringHook>) -> TesselResult<()> {
        self.node_mut(id)?.during = hook;
        Ok(())
    }

    fn animate(&mut self, id: ElementId, request: AnimateRequest) -> TesselResult<()> {
        self.node_mut(id)?.props.merge(&request.from);

        // Newer keys win; an animation left with nothing to drive is dropped uncompleted.
        self.animations.retain_mut(|a| {
            if a.element != id {
                return true;
            }
            a.request.to = a.request.to.without_keys_of(&request.to);
            a.request.from = a.request.from.without_keys_of(&request.to);
            !a.request.to.is_empty()
        });

        if !request.config.is_animated() {
            self.node_mut(id)?.props.merge(&request.to);
            if let Some(token) = request.done {
                self.pending_done.push(AnimationDone { element: id, token });
            }
            return Ok(());
        }

        self.animations.push(ActiveAnimation {
            element: id,
            request,
            elapsed: 0.0,
        });
        Ok(())
    }

    fn stop(&mut self, id: ElementId, scope: Option<AnimationKind>) {
        self.animations
            .retain(|a| a.element != id || scope.is_some_and(|s| s != a.request.scope));
    }

    fn is_animating(&self, id: ElementId) -> bool {
        self.animations.iter().any(|a| a.element == id)
    }

    fn destroy(&mut self, id: ElementId) {
        if self.nodes.remove(&id).is_some() {
            self.stats.destroyed += 1;
        }
        self.animations.retain(|a| a.element != id);
    }

    fn advance(&mut self, elapsed_ms: f64) -> Vec<AnimationDone> {
        let dt = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0)
        } else {
            0.0
        };
        self.clock_ms += dt;

        let mut done = std::mem::take(&mut self.pending_done);
        let mut hooked = BTreeSet::new();
        let nodes = &mut self.nodes;

        self.animations.retain_mut(|a| {
            let Some(node) = nodes.get_mut(&a.element) else {
                return false;
            };
            a.elapsed += dt;
            let local = a.elapsed - a.request.config.delay;
            if local < 0.0 {
                return true;
            }
            let t = (local / a.request.config.duration).clamp(0.0, 1.0);
            let eased = a.request.config.easing.apply(t);
            let values = ElementProps::lerp(&a.request.from, &a.request.to, eased);
            node.props.merge(&values);

            let latest = match (&a.request.during, &node.during) {
                (Some(mine), Some(latest)) => mine.ptr_eq(latest),
                _ => false,
            };
            if latest {
                hooked.insert(a.element);
            }

            let finished = t >= 1.0;
            if finished {
                if let Some(token) = a.request.done {
                    done.push(AnimationDone {
                        element: a.element,
                        token,
                    });
                }
            }
            !finished
        });

        for id in hooked {
            if let Some(node) = self.nodes.get_mut(&id) {
                if let Some(hook) = node.during.clone() {
                    hook.call(&mut DuringApi::new(id, &mut node.props));
                }
            }
        }
        done
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
