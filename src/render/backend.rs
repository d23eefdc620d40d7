use crate::{
    animation::{
        config::{AnimationConfig, AnimationKind},
        during::DuringHook,
    },
    element::{option::ElementKind, props::ElementProps},
    foundation::{
        error::TesselResult,
        ids::{ElementId, MorphId},
    },
};

/// Miscellaneous per-element flags copied from the option when present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementFlags {
    pub invisible: bool,
    pub silent: bool,
    pub ignore: bool,
}

/// Tag handed back when an animation runs to completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DoneToken {
    Enter,
    Update,
    Leave,
    /// One piece of a morph group finished.
    Morph { morph: MorphId, piece: usize },
}

/// Completion notice produced by [`Renderer::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnimationDone {
    pub element: ElementId,
    pub token: DoneToken,
}

/// One property animation.
///
/// The renderer snaps the element to `from` when the request is issued and drives every key
/// of `to` from there. Keys of `to` take over from older animations on the same element.
#[derive(Clone, Debug)]
pub struct AnimateRequest {
    pub from: ElementProps,
    pub to: ElementProps,
    pub config: AnimationConfig,
    pub scope: AnimationKind,
    pub during: Option<DuringHook>,
    pub done: Option<DoneToken>,
}

/// Retained renderer collaborator driven by the reconciler.
///
/// Implementations own the concrete scene nodes. The reconciler never touches them except
/// through this trait.
pub trait Renderer {
    /// Create an element of `kind` under `parent` (`None` for the root).
    fn create(
        &mut self,
        id: ElementId,
        kind: ElementKind,
        parent: Option<ElementId>,
    ) -> TesselResult<()>;

    /// Current values, including mid-animation interpolated ones.
    fn read(&self, id: ElementId) -> Option<&ElementProps>;

    /// Assign values immediately.
    fn apply(&mut self, id: ElementId, props: &ElementProps) -> TesselResult<()>;

    fn set_flags(&mut self, id: ElementId, flags: ElementFlags) -> TesselResult<()>;

    /// Engine-level visibility, independent of the `invisible` flag.
    fn set_visible(&mut self, id: ElementId, visible: bool) -> TesselResult<()>;

    /// Register the element's latest per-frame hook. Older hooks stop running.
    fn set_during(&mut self, id: ElementId, hook: Option<DuringHook>) -> TesselResult<()>;

    fn animate(&mut self, id: ElementId, request: AnimateRequest) -> TesselResult<()>;

    /// Stop animations on `id` without completing them. `None` stops every scope.
    fn stop(&mut self, id: ElementId, scope: Option<AnimationKind>);

    fn is_animating(&self, id: ElementId) -> bool;

    fn destroy(&mut self, id: ElementId);

    /// Advance the frame clock and report animations that finished.
    fn advance(&mut self, elapsed_ms: f64) -> Vec<AnimationDone>;
}
