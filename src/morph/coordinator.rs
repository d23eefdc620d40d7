use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    animation::config::{AnimationConfig, AnimationKind},
    element::{
        option::ElementKind,
        props::ElementProps,
        value::{PropMap, PropValue},
    },
    foundation::{
        core::Point,
        error::TesselResult,
        ids::{ElementId, MorphId},
    },
    morph::{
        batch::prepare_morph_batches,
        divide::{DivideShape, divide},
        geometry::{Outline, align_closed, from_flat, to_flat},
    },
    render::backend::{AnimateRequest, DoneToken, Renderer},
};

/// Morph behaviour switches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MorphOpts {
    pub enabled: bool,
    pub divide_shape: DivideShape,
    /// Points per resampled outline.
    pub sample_count: usize,
    /// Rotate point order so closed outlines travel as little as possible.
    pub align: bool,
}

impl Default for MorphOpts {
    fn default() -> Self {
        Self {
            enabled: true,
            divide_shape: DivideShape::Split,
            sample_count: 48,
            align: true,
        }
    }
}

/// Hands out element handles for temporary morph paths.
pub trait TempAllocator {
    fn alloc_temp(&mut self) -> ElementId;
    fn free_temp(&mut self, id: ElementId);
}

/// One drawable outline taking part in a morph, in root coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct MorphPath {
    /// Element the outline belongs to.
    pub owner: ElementId,
    pub outline: Outline,
    pub style: PropMap,
}

/// All paths one element contributes. An element that is itself mid-morph contributes the
/// live outlines of its temporaries.
#[derive(Clone, Debug, PartialEq)]
pub struct MorphSide {
    pub element: ElementId,
    pub paths: Vec<MorphPath>,
}

#[derive(Debug)]
struct MorphPiece {
    temp: ElementId,
    target: ElementId,
    done: bool,
}

#[derive(Debug, Default)]
struct MorphGroup {
    pieces: Vec<MorphPiece>,
    /// Unfinished piece count per hidden target.
    pending: BTreeMap<ElementId, usize>,
}

struct Task {
    from: Vec<Point>,
    from_style: PropMap,
    to: Vec<Point>,
    to_style: PropMap,
    closed: bool,
    target: ElementId,
}

/// Runs combine, separate and one-to-one geometry morphs through temporary polygons.
///
/// Targets stay hidden until every piece heading for them has finished; the temporaries
/// are destroyed as their pieces complete.
#[derive(Debug, Default)]
pub struct MorphCoordinator {
    next_id: u64,
    groups: BTreeMap<MorphId, MorphGroup>,
    targets: BTreeMap<ElementId, MorphId>,
}

fn opacity_of(style: &PropMap) -> f64 {
    style
        .get("opacity")
        .and_then(|v| v.as_number())
        .unwrap_or(1.0)
}

fn with_opacity(style: &PropMap, opacity: Option<f64>) -> PropMap {
    let mut out = style.clone();
    if let Some(o) = opacity {
        out.insert("opacity".to_string(), PropValue::Number(o));
    }
    out
}

impl MorphCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while `element` is hidden behind morph temporaries.
    pub fn is_morphing(&self, element: ElementId) -> bool {
        self.targets.contains_key(&element)
    }

    pub fn active_groups(&self) -> usize {
        self.groups.len()
    }

    /// Morph side for `element`: its temporaries' live outlines when it is mid-morph,
    /// otherwise `outline` with the element's live style.
    pub fn side(
        &self,
        renderer: &dyn Renderer,
        element: ElementId,
        outline: Option<Outline>,
    ) -> Option<MorphSide> {
        if let Some(group) = self.targets.get(&element).and_then(|m| self.groups.get(m)) {
            let paths: Vec<MorphPath> = group
                .pieces
                .iter()
                .filter(|p| p.target == element && !p.done)
                .filter_map(|p| {
                    let props = renderer.read(p.temp)?;
                    let points = props.shape.get("points")?.as_array()?;
                    Some(MorphPath {
                        owner: element,
                        outline: Outline {
                            points: from_flat(points),
                            closed: true,
                        },
                        style: props.style.clone(),
                    })
                })
                .collect();
            if !paths.is_empty() {
                return Some(MorphSide { element, paths });
            }
        }
        let outline = outline?;
        let style = renderer
            .read(element)
            .map(|p| p.style.clone())
            .unwrap_or_default();
        Some(MorphSide {
            element,
            paths: vec![MorphPath {
                owner: element,
                outline,
                style,
            }],
        })
    }

    /// Start one morph from `from` to `to`, all pieces sharing `config`.
    ///
    /// Several sources into one target combine and one source into several targets
    /// separates. With several on both sides, the smaller side takes turns over the larger
    /// one and each group morphs on its own. Returns `None` when there is nothing to
    /// animate. Sources that were mid-morph have their old temporaries retired.
    #[instrument(skip_all, fields(from = from.len(), to = to.len()))]
    pub fn apply(
        &mut self,
        renderer: &mut dyn Renderer,
        alloc: &mut dyn TempAllocator,
        from: Vec<MorphSide>,
        to: Vec<MorphSide>,
        config: AnimationConfig,
        opts: &MorphOpts,
    ) -> TesselResult<Option<MorphId>> {
        let from_paths: usize = from.iter().map(|s| s.paths.len()).sum();
        let to_paths: usize = to.iter().map(|s| s.paths.len()).sum();
        if from_paths == 0 || to_paths == 0 || !config.is_animated() {
            return Ok(None);
        }

        for side in &from {
            self.forget(renderer, alloc, side.element);
            for path in &side.paths {
                self.forget(renderer, alloc, path.owner);
            }
        }

        // The smaller side is spread round-robin over the larger one, so every source and
        // every target ends up in exactly one piece group.
        let mut tasks = Vec::new();
        if from.len() >= to.len() {
            for (i, t) in to.iter().enumerate() {
                let many: Vec<&MorphSide> = from.iter().skip(i).step_by(to.len()).collect();
                self.plan_group(t, &many, true, opts, &mut tasks);
            }
        } else {
            for (i, f) in from.iter().enumerate() {
                let many: Vec<&MorphSide> = to.iter().skip(i).step_by(from.len()).collect();
                self.plan_group(f, &many, false, opts, &mut tasks);
            }
        }

        if tasks.is_empty() {
            return Ok(None);
        }

        let id = MorphId(self.next_id);
        self.next_id += 1;
        let mut group = MorphGroup::default();
        for (piece, task) in tasks.into_iter().enumerate() {
            let temp = self.spawn(renderer, alloc, id, piece, task.from_points(opts), &task, config)?;
            group.pieces.push(MorphPiece {
                temp,
                target: task.target,
                done: false,
            });
            *group.pending.entry(task.target).or_insert(0) += 1;
        }
        for target in group.pending.keys() {
            renderer.set_visible(*target, false)?;
            self.targets.insert(*target, id);
        }
        debug!(morph = %id, pieces = group.pieces.len(), "morph started");
        self.groups.insert(id, group);
        Ok(Some(id))
    }

    fn plan_group(
        &self,
        one: &MorphSide,
        many: &[&MorphSide],
        from_is_many: bool,
        opts: &MorphOpts,
        tasks: &mut Vec<Task>,
    ) {
        match many {
            [] => {}
            [single] if from_is_many => self.plan_pair(&single.paths, &one.paths, opts, tasks),
            [single] => self.plan_pair(&one.paths, &single.paths, opts, tasks),
            _ => {
                let many: Vec<Vec<MorphPath>> = many.iter().map(|s| s.paths.clone()).collect();
                self.plan_batches(&one.paths, &many, from_is_many, opts, tasks);
            }
        }
    }

    fn plan_pair(
        &self,
        from: &[MorphPath],
        to: &[MorphPath],
        opts: &MorphOpts,
        tasks: &mut Vec<Task>,
    ) {
        if from.len() > to.len() {
            self.plan_batches(to, &[from.to_vec()], true, opts, tasks);
        } else {
            self.plan_batches(from, &[to.to_vec()], false, opts, tasks);
        }
    }

    fn plan_batches(
        &self,
        one: &[MorphPath],
        many: &[Vec<MorphPath>],
        from_is_many: bool,
        opts: &MorphOpts,
        tasks: &mut Vec<Task>,
    ) {
        let samples = opts.sample_count.max(3);
        for batch in prepare_morph_batches(one, many) {
            match batch.many.len() {
                0 => {}
                1 => {
                    let (src, dst) = if from_is_many {
                        (&batch.many[0], &batch.one)
                    } else {
                        (&batch.one, &batch.many[0])
                    };
                    if src.owner == dst.owner {
                        continue;
                    }
                    tasks.push(Task {
                        from: src.outline.resample(samples),
                        from_style: src.style.clone(),
                        to: dst.outline.resample(samples),
                        to_style: dst.style.clone(),
                        closed: src.outline.closed && dst.outline.closed,
                        target: dst.owner,
                    });
                }
                n => {
                    let one = &batch.one;
                    let pieces = divide(
                        &one.outline,
                        n,
                        samples,
                        opts.divide_shape,
                        opacity_of(&one.style),
                    );
                    for (other, piece) in batch.many.iter().zip(pieces) {
                        let piece_style = with_opacity(&one.style, piece.opacity);
                        let other_points = other.outline.resample(samples);
                        let closed = one.outline.closed && other.outline.closed;
                        tasks.push(if from_is_many {
                            Task {
                                from: other_points,
                                from_style: other.style.clone(),
                                to: piece.points,
                                to_style: piece_style,
                                closed,
                                target: one.owner,
                            }
                        } else {
                            Task {
                                from: piece.points,
                                from_style: piece_style,
                                to: other_points,
                                to_style: other.style.clone(),
                                closed,
                                target: other.owner,
                            }
                        });
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn(
        &self,
        renderer: &mut dyn Renderer,
        alloc: &mut dyn TempAllocator,
        id: MorphId,
        piece: usize,
        from_points: Vec<Point>,
        task: &Task,
        config: AnimationConfig,
    ) -> TesselResult<ElementId> {
        let temp = alloc.alloc_temp();
        renderer.create(temp, ElementKind::Polygon, None)?;

        let mut from = ElementProps::default();
        from.shape
            .insert("points".to_string(), PropValue::array(to_flat(&from_points)));
        from.style = task.from_style.clone();
        let mut to = ElementProps::default();
        to.shape
            .insert("points".to_string(), PropValue::array(to_flat(&task.to)));
        to.style = task.to_style.clone();

        renderer.apply(temp, &from)?;
        renderer.animate(
            temp,
            AnimateRequest {
                from,
                to,
                config,
                scope: AnimationKind::Update,
                during: None,
                done: Some(DoneToken::Morph { morph: id, piece }),
            },
        )?;
        Ok(temp)
    }

    /// Record a finished piece. Returns the targets revealed by it.
    pub fn on_piece_done(
        &mut self,
        renderer: &mut dyn Renderer,
        alloc: &mut dyn TempAllocator,
        morph: MorphId,
        piece: usize,
    ) -> TesselResult<Vec<ElementId>> {
        let mut revealed = Vec::new();
        let Some(group) = self.groups.get_mut(&morph) else {
            return Ok(revealed);
        };
        let Some(p) = group.pieces.get_mut(piece).filter(|p| !p.done) else {
            return Ok(revealed);
        };
        p.done = true;
        renderer.destroy(p.temp);
        alloc.free_temp(p.temp);

        let target = p.target;
        if let Some(n) = group.pending.get_mut(&target) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                group.pending.remove(&target);
                self.targets.remove(&target);
                renderer.set_visible(target, true)?;
                revealed.push(target);
            }
        }
        if group.pieces.iter().all(|p| p.done) {
            self.groups.remove(&morph);
            debug!(morph = %morph, "morph finished");
        }
        Ok(revealed)
    }

    /// Drop every unfinished piece heading for `element` and destroy its temporaries.
    /// The element itself is left untouched.
    pub fn forget(
        &mut self,
        renderer: &mut dyn Renderer,
        alloc: &mut dyn TempAllocator,
        element: ElementId,
    ) {
        let Some(morph) = self.targets.remove(&element) else {
            return;
        };
        let Some(group) = self.groups.get_mut(&morph) else {
            return;
        };
        group.pending.remove(&element);
        for p in group
            .pieces
            .iter_mut()
            .filter(|p| p.target == element && !p.done)
        {
            p.done = true;
            renderer.destroy(p.temp);
            alloc.free_temp(p.temp);
        }
        if group.pieces.iter().all(|p| p.done) {
            self.groups.remove(&morph);
        }
    }

    /// Destroy every temporary. Hidden targets are left to the caller.
    pub fn clear(&mut self, renderer: &mut dyn Renderer, alloc: &mut dyn TempAllocator) {
        for (_, group) in std::mem::take(&mut self.groups) {
            for p in group.pieces.iter().filter(|p| !p.done) {
                renderer.destroy(p.temp);
                alloc.free_temp(p.temp);
            }
        }
        self.targets.clear();
    }
}

impl Task {
    fn from_points(&self, opts: &MorphOpts) -> Vec<Point> {
        let mut from = self.from.clone();
        if opts.align && self.closed {
            align_closed(&self.to, &mut from);
        }
        from
    }
}

#[cfg(test)]
#[path = "../../tests/unit/morph/coordinator.rs"]
mod tests;
