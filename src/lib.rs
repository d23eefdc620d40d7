//! Tessel keeps a retained element tree in step with declarative option trees.
//!
//! Every pass hands the full option list to a [`Reconciler`], which matches it against
//! the live elements and turns the differences into create/update/remove calls on a
//! [`Renderer`]:
//!
//! - Plan per-element transitions with [`plan_transition`]
//! - Resolve enter/update/leave timing with [`resolve_animation_config`]
//! - Morph removed shapes into added ones through a [`MorphCoordinator`]
//!
//! [`SceneRenderer`] is an in-memory renderer with a manual clock, used by the CLI and
//! the tests.
#![forbid(unsafe_code)]

pub(crate) mod animation;
pub(crate) mod element;
pub(crate) mod foundation;
pub(crate) mod morph;
pub(crate) mod reconcile;
pub(crate) mod render;
pub(crate) mod transition;

pub use crate::foundation::core::{Affine, BezPath, Point, Transform2D};
pub use crate::foundation::error::{TesselError, TesselResult};
pub use crate::foundation::ids::{ElementId, MorphId};

pub use crate::element::dsl::{ElementBuilder, circle, group, rect};
pub use crate::element::option::{
    AttrOption, ElementKind, ElementOption, MergeChildren, TransformOption, TransitionSpec,
};
pub use crate::element::props::{AttrGroup, ElementProps, TransformProp, default_value};
pub use crate::element::value::{PropMap, PropValue};

pub use crate::animation::config::{
    AnimatableModel, AnimationConfig, AnimationKind, AnimationOptions, AnimationOverride,
    AnimationPayload, SeriesModel, Timing, morph_animation_config, resolve_animation_config,
};
pub use crate::animation::during::{DuringApi, DuringHook};
pub use crate::animation::ease::Ease;
pub use crate::animation::lerp::Lerp;

pub use crate::transition::contract::ContractMode;
pub use crate::transition::planner::{TransitionPlan, plan_transition};

pub use crate::morph::batch::{MorphBatch, prepare_morph_batches};
pub use crate::morph::coordinator::{
    MorphCoordinator, MorphOpts, MorphPath, MorphSide, TempAllocator,
};
pub use crate::morph::divide::{DivideShape, Piece, divide};
pub use crate::morph::geometry::{Outline, element_path};

pub use crate::reconcile::differ::{DiffKey, DiffOp, KeyedDiffer};
pub use crate::reconcile::driver::{
    ElementPlan, Lifecycle, PassReport, ReconcileOpts, Reconciler, RemoveOutcome,
};

pub use crate::render::backend::{
    AnimateRequest, AnimationDone, DoneToken, ElementFlags, Renderer,
};
pub use crate::render::scene::{SceneRenderer, SceneSnapshot, SceneStats, SnapshotElement};
