//! Drag-and-drop interaction over a rendered set of employee boxes.
//!
//! A gesture runs `Idle -> Dragging -> {DroppedOnTarget, DroppedOnEmpty,
//! Cancelled}`. Pointer coordinates arrive in screen space and are mapped
//! into scene space through the [`Viewport`]. Movement is delta based: the
//! dragged box is drawn at `origin + (pointer - pointer_start)`.
//!
//! The gesture is a transient value keyed by employee id. Neither the
//! laid-out scene nor the forest is mutated while dragging, so reverting a
//! gesture is just dropping it.

use tracing::{debug, trace};

use crate::domain::entities::EmployeeId;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::geometry::{Point, Rect};
use crate::domain::layout::Layout;

/// Maps screen coordinates into scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen position of the scene origin.
    pub offset: Point,
    /// Screen pixels per scene unit.
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Point::ORIGIN,
            scale: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(offset: Point, scale: f64) -> Self {
        Self { offset, scale }
    }

    pub fn to_scene(&self, screen: Point) -> Point {
        (screen - self.offset).scale(1.0 / self.scale)
    }

    pub fn to_screen(&self, scene: Point) -> Point {
        scene.scale(self.scale) + self.offset
    }
}

/// Rendered boxes in render order, as the hit-tester sees them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    boxes: Vec<(EmployeeId, Rect)>,
    viewport: Viewport,
}

impl Scene {
    pub fn new(boxes: Vec<(EmployeeId, Rect)>, viewport: Viewport) -> Self {
        Self { boxes, viewport }
    }

    pub fn from_layout(layout: &Layout, viewport: Viewport) -> Self {
        let boxes = layout.nodes().iter().map(|n| (n.id, n.rect)).collect();
        Self::new(boxes, viewport)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn rect_of(&self, id: EmployeeId) -> Option<Rect> {
        self.boxes.iter().find(|(i, _)| *i == id).map(|(_, r)| *r)
    }

    pub fn boxes(&self) -> &[(EmployeeId, Rect)] {
        &self.boxes
    }

    /// First box in render order containing `point`, skipping `exclude`.
    pub fn hit_test(&self, point: Point, exclude: Option<EmployeeId>) -> Option<EmployeeId> {
        self.boxes
            .iter()
            .filter(|(id, _)| Some(*id) != exclude)
            .find(|(_, rect)| rect.contains(point))
            .map(|(id, _)| *id)
    }
}

/// An in-flight drag of a single box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub node: EmployeeId,
    /// Scene position of the box when the gesture started.
    pub origin: Point,
    /// Scene position of the pointer when the gesture started.
    pub pointer_start: Point,
    /// Current scene position of the box.
    pub position: Point,
}

impl Gesture {
    fn follow(&mut self, pointer: Point) -> Point {
        self.position = self.origin + (pointer - self.pointer_start);
        self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging(Gesture),
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    DroppedOnTarget {
        node: EmployeeId,
        target: EmployeeId,
        at: Point,
    },
    DroppedOnEmpty {
        node: EmployeeId,
        at: Point,
    },
    Cancelled {
        node: EmployeeId,
    },
}

impl DragOutcome {
    pub fn node(&self) -> EmployeeId {
        match *self {
            DragOutcome::DroppedOnTarget { node, .. }
            | DragOutcome::DroppedOnEmpty { node, .. }
            | DragOutcome::Cancelled { node } => node,
        }
    }

    pub fn target(&self) -> Option<EmployeeId> {
        match *self {
            DragOutcome::DroppedOnTarget { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Tracks one drag gesture at a time over a scene.
#[derive(Debug, Clone)]
pub struct DragController {
    scene: Scene,
    state: DragState,
}

impl DragController {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            state: DragState::Idle,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Replace the scene after a re-layout. Any active gesture is dropped.
    pub fn reset(&mut self, scene: Scene) {
        self.scene = scene;
        self.state = DragState::Idle;
    }

    /// Box of `id` as currently drawn: moved while dragged, laid out otherwise.
    pub fn rendered_rect(&self, id: EmployeeId) -> Option<Rect> {
        let rect = self.scene.rect_of(id)?;
        match self.state {
            DragState::Dragging(g) if g.node == id => Some(rect.moved_to(g.position)),
            _ => Some(rect),
        }
    }

    /// Grab `node` with the pointer at `screen`.
    pub fn begin(&mut self, node: EmployeeId, screen: Point) -> DomainResult<()> {
        if let DragState::Dragging(g) = self.state {
            return Err(DomainError::GestureInProgress(g.node));
        }
        let rect = self
            .scene
            .rect_of(node)
            .ok_or(DomainError::EmployeeNotFound(node))?;
        let pointer = self.scene.viewport.to_scene(screen);
        debug!("begin drag: {} at {:?}", node, pointer);
        self.state = DragState::Dragging(Gesture {
            node,
            origin: rect.origin(),
            pointer_start: pointer,
            position: rect.origin(),
        });
        Ok(())
    }

    /// Pointer moved to `screen`; returns the new box position.
    pub fn drag_to(&mut self, screen: Point) -> DomainResult<Point> {
        let pointer = self.scene.viewport.to_scene(screen);
        match &mut self.state {
            DragState::Dragging(g) => {
                let position = g.follow(pointer);
                trace!("drag {}: box at {:?}", g.node, position);
                Ok(position)
            }
            DragState::Idle => Err(DomainError::NoActiveGesture),
        }
    }

    /// Pointer released at `screen`. Resolves the drop target by hit-testing
    /// every other box; the first match in render order wins.
    pub fn end(&mut self, screen: Point) -> DomainResult<DragOutcome> {
        let DragState::Dragging(mut gesture) = self.state else {
            return Err(DomainError::NoActiveGesture);
        };
        let at = self.scene.viewport.to_scene(screen);
        gesture.follow(at);
        self.state = DragState::Idle;

        let outcome = match self.scene.hit_test(at, Some(gesture.node)) {
            Some(target) => DragOutcome::DroppedOnTarget {
                node: gesture.node,
                target,
                at,
            },
            None => DragOutcome::DroppedOnEmpty {
                node: gesture.node,
                at,
            },
        };
        debug!("end drag: {:?}", outcome);
        Ok(outcome)
    }

    /// Abort the active gesture; the box snaps back to its laid-out position.
    pub fn cancel(&mut self) -> DomainResult<DragOutcome> {
        let DragState::Dragging(gesture) = self.state else {
            return Err(DomainError::NoActiveGesture);
        };
        self.state = DragState::Idle;
        Ok(DragOutcome::Cancelled { node: gesture.node })
    }
}
