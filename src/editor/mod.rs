//! Pointer gesture state machine for box editing.
//!
//! Interprets pointer-down/move/up sequences under the current mode into
//! session mutations: drawing new boxes, selecting, dragging, corner
//! resizing, and deleting. Wheel zoom and middle-button panning run in every
//! mode. All geometry flows through the session's [`ViewTransform`] and is
//! clamped on store, so off-canvas drags and zero-size draws are interaction
//! noise rather than errors.

pub mod matcher;

use crate::constants::threshold;
use crate::model::{BBox, Corner};
use crate::state::ImageSession;
use crate::viewport::ViewTransform;

/// Editing modes, mutually exclusive and user-selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Pan/zoom only; primary clicks do nothing
    #[default]
    View,
    /// Drag out new boxes
    Draw,
    /// Select, move, resize, and delete existing boxes
    Select,
}

impl EditMode {
    /// Display name for the mode toolbar.
    pub fn name(&self) -> &'static str {
        match self {
            EditMode::View => "View",
            EditMode::Draw => "Draw",
            EditMode::Select => "Select",
        }
    }
}

/// Pointer buttons the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button: draw / select / drag / resize
    Primary,
    /// Middle button: pan
    Middle,
}

/// Pointer input, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { pos: (f32, f32), button: PointerButton },
    Moved { pos: (f32, f32) },
    Up { pos: (f32, f32), button: PointerButton },
    /// Wheel step; positive delta zooms in, anchored at the pointer.
    Wheel { pos: (f32, f32), delta: f32 },
}

/// The in-flight gesture, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    /// Rubber-banding a new box in draw mode (viewport coordinates).
    Drawing { start: (f32, f32), current: (f32, f32) },
    /// Translating the selected box; `last` is the previous pointer position.
    DraggingBox { last: (f32, f32) },
    /// Moving one corner of the selected box, opposite corner fixed.
    ResizingCorner { corner: Corner },
    /// Middle-button pan; `last` is the previous pointer position.
    Panning { last: (f32, f32) },
}

/// The selected box: a list index plus the image-space shape it had when the
/// current gesture last touched it. The shape is what the matcher uses to
/// re-identify the stored entry, since indices shift on deletion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub rect: BBox,
}

/// The edit state machine. One per workspace; operates on whichever session
/// is current.
#[derive(Debug)]
pub struct Editor {
    mode: EditMode,
    gesture: Gesture,
    selection: Option<Selection>,
    active_class: u32,
    min_drag: f32,
    handle_radius: f32,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_thresholds(threshold::MIN_DRAG, threshold::HANDLE_RADIUS)
    }

    /// Create an editor with custom gesture thresholds (viewport pixels).
    pub fn with_thresholds(min_drag: f32, handle_radius: f32) -> Self {
        Self {
            mode: EditMode::default(),
            gesture: Gesture::Idle,
            selection: None,
            active_class: 0,
            min_drag,
            handle_radius,
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Switch modes. Always clears the selection and any in-flight gesture,
    /// so no stale handles or highlight survive the switch.
    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode != mode {
            log::debug!("Edit mode: {:?}", mode);
        }
        self.mode = mode;
        self.gesture = Gesture::Idle;
        self.selection = None;
    }

    /// Class id assigned to newly drawn boxes.
    pub fn active_class(&self) -> u32 {
        self.active_class
    }

    pub fn set_active_class(&mut self, class_id: u32) {
        self.active_class = class_id;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Drop the selection without touching the store (used on image switch).
    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.gesture = Gesture::Idle;
    }

    /// The live draw-preview rectangle in viewport coordinates, if a draw
    /// gesture is in flight.
    pub fn rubber_band(&self) -> Option<((f32, f32), (f32, f32))> {
        match self.gesture {
            Gesture::Drawing { start, current } => Some((start, current)),
            _ => None,
        }
    }

    /// Corner handle positions of the selected box in viewport coordinates.
    pub fn handles(&self, view: &ViewTransform) -> Option<[(f32, f32); 4]> {
        let sel = self.selection.as_ref()?;
        Some(Corner::all().map(|c| view.image_to_viewport(sel.rect.corner(c))))
    }

    /// Feed one pointer event through the state machine, mutating the
    /// session's boxes and view as the gesture dictates.
    pub fn handle_pointer(&mut self, event: PointerEvent, session: &mut ImageSession) {
        match event {
            PointerEvent::Wheel { pos, delta } => {
                session.view = if delta > 0.0 {
                    session.view.zoomed_in(pos)
                } else {
                    session.view.zoomed_out(pos)
                };
            }
            PointerEvent::Down {
                pos,
                button: PointerButton::Middle,
            } => {
                self.gesture = Gesture::Panning { last: pos };
            }
            PointerEvent::Down {
                pos,
                button: PointerButton::Primary,
            } => match self.mode {
                EditMode::View => {}
                EditMode::Draw => {
                    self.gesture = Gesture::Drawing {
                        start: pos,
                        current: pos,
                    };
                }
                EditMode::Select => self.on_select_press(pos, session),
            },
            PointerEvent::Moved { pos } => match self.gesture {
                Gesture::Idle => {}
                Gesture::Drawing { start, .. } => {
                    self.gesture = Gesture::Drawing {
                        start,
                        current: pos,
                    };
                }
                Gesture::DraggingBox { last } => {
                    self.drag_selected(session, last, pos);
                    if matches!(self.gesture, Gesture::DraggingBox { .. }) {
                        self.gesture = Gesture::DraggingBox { last: pos };
                    }
                }
                Gesture::ResizingCorner { corner } => {
                    self.resize_selected(session, corner, pos);
                }
                Gesture::Panning { last } => {
                    session.view = session.view.panned_by(pos.0 - last.0, pos.1 - last.1);
                    self.gesture = Gesture::Panning { last: pos };
                }
            },
            PointerEvent::Up {
                button: PointerButton::Middle,
                ..
            } => {
                if matches!(self.gesture, Gesture::Panning { .. }) {
                    self.gesture = Gesture::Idle;
                }
            }
            PointerEvent::Up {
                pos,
                button: PointerButton::Primary,
            } => {
                if let Gesture::Drawing { start, .. } = self.gesture {
                    self.commit_draw(session, start, pos);
                }
                if !matches!(self.gesture, Gesture::Panning { .. }) {
                    self.gesture = Gesture::Idle;
                }
            }
        }
    }

    /// Delete the selected box from the session, resolving the stored entry
    /// through the matcher. Returns whether a box was removed. The selection
    /// is cleared either way, since indices shift on deletion.
    pub fn delete_selected(&mut self, session: &mut ImageSession) -> bool {
        let Some(sel) = self.selection.take() else {
            return false;
        };
        self.gesture = Gesture::Idle;

        match matcher::closest_box(session.boxes(), &sel.rect) {
            Some(index) => {
                session.remove_box(index);
                log::info!("Deleted box {} ({} remain)", index, session.boxes().len());
                true
            }
            None => false,
        }
    }

    fn on_select_press(&mut self, pos: (f32, f32), session: &mut ImageSession) {
        // Corner handles take precedence, and only exist on the selected box.
        if let Some(sel) = &self.selection {
            if let Some(corner) = corner_at(&sel.rect, &session.view, pos, self.handle_radius) {
                log::debug!("Resizing {:?} corner", corner);
                self.gesture = Gesture::ResizingCorner { corner };
                return;
            }
        }

        match matcher::hit_test(session.boxes(), &session.view, pos) {
            Some(index) => {
                self.selection = Some(Selection {
                    index,
                    rect: session.boxes()[index],
                });
                self.gesture = Gesture::DraggingBox { last: pos };
                log::debug!("Selected box {}", index);
            }
            None => {
                self.selection = None;
            }
        }
    }

    /// Resolve the stored index for the current selection: the remembered
    /// index when still in range, otherwise the matcher's nearest entry.
    fn resolve_index(session: &ImageSession, sel: &Selection) -> Option<usize> {
        if sel.index < session.boxes().len() {
            Some(sel.index)
        } else {
            matcher::closest_box(session.boxes(), &sel.rect)
        }
    }

    /// Write an updated shape for the selection through to the store. Runs
    /// on every drag step, not only on release, so a save or detect fired
    /// mid-drag sees consistent state.
    fn write_through(&mut self, session: &mut ImageSession, updated: BBox) {
        let Some(sel) = &mut self.selection else {
            return;
        };
        let Some(index) = Self::resolve_index(session, sel) else {
            self.selection = None;
            self.gesture = Gesture::Idle;
            return;
        };
        session.update_box(index, updated);
        sel.index = index;
        sel.rect = session.boxes()[index];
    }

    fn drag_selected(&mut self, session: &mut ImageSession, last: (f32, f32), pos: (f32, f32)) {
        let Some(sel) = &self.selection else {
            self.gesture = Gesture::Idle;
            return;
        };
        let scale = session.view.effective_scale();
        let moved = sel
            .rect
            .translated((pos.0 - last.0) / scale, (pos.1 - last.1) / scale);
        self.write_through(session, moved);
    }

    fn resize_selected(&mut self, session: &mut ImageSession, corner: Corner, pos: (f32, f32)) {
        let Some(sel) = &self.selection else {
            self.gesture = Gesture::Idle;
            return;
        };
        let grabbed = session.view.viewport_to_image(pos);
        let resized = sel.rect.with_corner_at(corner, grabbed);
        self.write_through(session, resized);
    }

    fn commit_draw(&mut self, session: &mut ImageSession, start: (f32, f32), end: (f32, f32)) {
        // Tiny drags are accidental clicks, not boxes.
        if (end.0 - start.0).abs() <= self.min_drag || (end.1 - start.1).abs() <= self.min_drag {
            log::debug!("Draw gesture below minimum size, discarded");
            return;
        }

        let a = session.view.viewport_to_image(start);
        let b = session.view.viewport_to_image(end);
        let index = session.add_box(BBox::from_corners(self.active_class, a, b));
        self.selection = Some(Selection {
            index,
            rect: session.boxes()[index],
        });
        log::info!(
            "Created box {} (class {}) at {:?}",
            index,
            self.active_class,
            session.boxes()[index]
        );
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

/// Which corner handle of `rect`, if any, sits under the pointer.
fn corner_at(rect: &BBox, view: &ViewTransform, pos: (f32, f32), radius: f32) -> Option<Corner> {
    Corner::all().into_iter().find(|c| {
        let (hx, hy) = view.image_to_viewport(rect.corner(*c));
        (pos.0 - hx).abs() <= radius && (pos.1 - hy).abs() <= radius
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::ViewTransform;
    use std::path::PathBuf;

    const EPSILON: f32 = 0.001;

    /// 800x600 image in an 800x600 viewport: effective scale 1, offset (0,0).
    fn identity_session() -> ImageSession {
        let view = ViewTransform::fitted((800.0, 600.0), (800, 600)).unwrap();
        ImageSession::from_parts(PathBuf::from("test.png"), 800, 600, view)
    }

    fn press_drag_release(editor: &mut Editor, session: &mut ImageSession, from: (f32, f32), to: (f32, f32)) {
        editor.handle_pointer(
            PointerEvent::Down {
                pos: from,
                button: PointerButton::Primary,
            },
            session,
        );
        editor.handle_pointer(PointerEvent::Moved { pos: to }, session);
        editor.handle_pointer(
            PointerEvent::Up {
                pos: to,
                button: PointerButton::Primary,
            },
            session,
        );
    }

    #[test]
    fn test_draw_commits_box_through_transform() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Draw);
        editor.set_active_class(2);
        let mut session = identity_session();

        press_drag_release(&mut editor, &mut session, (100.0, 100.0), (200.0, 150.0));

        assert_eq!(session.boxes().len(), 1);
        let b = session.boxes()[0];
        assert_eq!(b.class_id, 2);
        assert_eq!((b.x1, b.y1, b.x2, b.y2), (100.0, 100.0, 200.0, 150.0));

        let y = session.yolo_boxes()[0];
        assert!((y.x_center - 0.1875).abs() < EPSILON);
        assert!((y.y_center - 0.2083).abs() < EPSILON);
        assert!((y.width - 0.125).abs() < EPSILON);
        assert!((y.height - 0.0833).abs() < EPSILON);
    }

    #[test]
    fn test_tiny_drag_discarded() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Draw);
        let mut session = identity_session();

        // dx == 5 fails the strict `> 5` check even though dy is large.
        press_drag_release(&mut editor, &mut session, (100.0, 100.0), (105.0, 300.0));
        assert!(session.boxes().is_empty());

        press_drag_release(&mut editor, &mut session, (100.0, 100.0), (300.0, 104.0));
        assert!(session.boxes().is_empty());
    }

    #[test]
    fn test_draw_clamps_offscreen_gesture() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Draw);
        let mut session = identity_session();

        press_drag_release(&mut editor, &mut session, (750.0, 550.0), (900.0, 700.0));
        let b = session.boxes()[0];
        assert_eq!((b.x2, b.y2), (800.0, 600.0));
    }

    #[test]
    fn test_select_hit_and_miss() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Select);
        let mut session = identity_session();
        session.add_box(BBox::from_corners(0, (100.0, 100.0), (200.0, 200.0)));

        editor.handle_pointer(
            PointerEvent::Down {
                pos: (150.0, 150.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        assert_eq!(editor.selection().map(|s| s.index), Some(0));

        editor.handle_pointer(
            PointerEvent::Up {
                pos: (150.0, 150.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );

        // Pressing empty space clears the selection.
        editor.handle_pointer(
            PointerEvent::Down {
                pos: (700.0, 500.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        assert!(editor.selection().is_none());
    }

    #[test]
    fn test_overlap_selects_first_in_list() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Select);
        let mut session = identity_session();
        session.add_box(BBox::from_corners(0, (100.0, 100.0), (300.0, 300.0)));
        session.add_box(BBox::from_corners(1, (150.0, 150.0), (250.0, 250.0)));

        editor.handle_pointer(
            PointerEvent::Down {
                pos: (200.0, 200.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        assert_eq!(editor.selection().map(|s| s.index), Some(0));
    }

    #[test]
    fn test_drag_writes_through_mid_gesture() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Select);
        let mut session = identity_session();
        session.add_box(BBox::from_corners(0, (100.0, 100.0), (200.0, 200.0)));

        editor.handle_pointer(
            PointerEvent::Down {
                pos: (150.0, 150.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        editor.handle_pointer(PointerEvent::Moved { pos: (170.0, 160.0) }, &mut session);

        // Store already reflects the move before pointer-up.
        let b = session.boxes()[0];
        assert!((b.x1 - 120.0).abs() < EPSILON);
        assert!((b.y1 - 110.0).abs() < EPSILON);
        assert_eq!(session.boxes().len(), session.yolo_boxes().len());

        editor.handle_pointer(PointerEvent::Moved { pos: (180.0, 170.0) }, &mut session);
        let b = session.boxes()[0];
        assert!((b.x1 - 130.0).abs() < EPSILON);
        assert!((b.x2 - 230.0).abs() < EPSILON);
    }

    #[test]
    fn test_drag_delta_scales_with_zoom() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Select);
        let mut session = identity_session();
        session.add_box(BBox::from_corners(0, (100.0, 100.0), (200.0, 200.0)));
        session.view = session.view.zoom_to_cursor(2.0, (0.0, 0.0));

        let grab = session.view.image_to_viewport((150.0, 150.0));
        editor.handle_pointer(
            PointerEvent::Down {
                pos: grab,
                button: PointerButton::Primary,
            },
            &mut session,
        );
        editor.handle_pointer(
            PointerEvent::Moved {
                pos: (grab.0 + 40.0, grab.1),
            },
            &mut session,
        );

        // 40 viewport pixels at 2x zoom is 20 image pixels.
        let b = session.boxes()[0];
        assert!((b.x1 - 120.0).abs() < EPSILON);
    }

    #[test]
    fn test_corner_resize_keeps_opposite_fixed() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Select);
        let mut session = identity_session();
        session.add_box(BBox::from_corners(0, (100.0, 100.0), (200.0, 200.0)));

        // Select, release, then grab the bottom-right handle.
        editor.handle_pointer(
            PointerEvent::Down {
                pos: (150.0, 150.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        editor.handle_pointer(
            PointerEvent::Up {
                pos: (150.0, 150.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        editor.handle_pointer(
            PointerEvent::Down {
                pos: (201.0, 199.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        editor.handle_pointer(PointerEvent::Moved { pos: (250.0, 260.0) }, &mut session);

        let b = session.boxes()[0];
        assert_eq!((b.x1, b.y1), (100.0, 100.0));
        assert!((b.x2 - 250.0).abs() < EPSILON);
        assert!((b.y2 - 260.0).abs() < EPSILON);
    }

    #[test]
    fn test_delete_removes_one_entry_and_clears_selection() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Select);
        let mut session = identity_session();
        session.add_box(BBox::from_corners(0, (10.0, 10.0), (50.0, 50.0)));
        session.add_box(BBox::from_corners(1, (100.0, 100.0), (200.0, 200.0)));

        editor.handle_pointer(
            PointerEvent::Down {
                pos: (150.0, 150.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        assert!(editor.delete_selected(&mut session));

        assert_eq!(session.boxes().len(), 1);
        assert_eq!(session.yolo_boxes().len(), 1);
        assert_eq!(session.boxes()[0].class_id, 0);
        assert!(editor.selection().is_none());

        // Deleting again with no selection is a no-op.
        assert!(!editor.delete_selected(&mut session));
    }

    #[test]
    fn test_mode_switch_clears_selection() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Select);
        let mut session = identity_session();
        session.add_box(BBox::from_corners(0, (100.0, 100.0), (200.0, 200.0)));

        editor.handle_pointer(
            PointerEvent::Down {
                pos: (150.0, 150.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        assert!(editor.selection().is_some());

        editor.set_mode(EditMode::Draw);
        assert!(editor.selection().is_none());
        assert!(editor.handles(&session.view).is_none());
    }

    #[test]
    fn test_wheel_and_middle_pan_in_view_mode() {
        let mut editor = Editor::new();
        let mut session = identity_session();
        let before = session.view;

        editor.handle_pointer(
            PointerEvent::Wheel {
                pos: (400.0, 300.0),
                delta: 1.0,
            },
            &mut session,
        );
        assert!(session.view.user_scale() > before.user_scale());

        let offset = session.view.offset;
        editor.handle_pointer(
            PointerEvent::Down {
                pos: (400.0, 300.0),
                button: PointerButton::Middle,
            },
            &mut session,
        );
        editor.handle_pointer(PointerEvent::Moved { pos: (430.0, 280.0) }, &mut session);
        editor.handle_pointer(
            PointerEvent::Up {
                pos: (430.0, 280.0),
                button: PointerButton::Middle,
            },
            &mut session,
        );
        assert!((session.view.offset.0 - (offset.0 + 30.0)).abs() < EPSILON);
        assert!((session.view.offset.1 - (offset.1 - 20.0)).abs() < EPSILON);
    }

    #[test]
    fn test_rubber_band_visible_during_draw() {
        let mut editor = Editor::new();
        editor.set_mode(EditMode::Draw);
        let mut session = identity_session();

        assert!(editor.rubber_band().is_none());
        editor.handle_pointer(
            PointerEvent::Down {
                pos: (50.0, 50.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        editor.handle_pointer(PointerEvent::Moved { pos: (90.0, 80.0) }, &mut session);
        assert_eq!(editor.rubber_band(), Some(((50.0, 50.0), (90.0, 80.0))));

        editor.handle_pointer(
            PointerEvent::Up {
                pos: (90.0, 80.0),
                button: PointerButton::Primary,
            },
            &mut session,
        );
        assert!(editor.rubber_band().is_none());
    }
}
