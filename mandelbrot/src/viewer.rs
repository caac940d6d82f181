use crate::config::{Bindings, NavigationConfig};
use backend::input::Key;
use backend::shaders::ShaderProgram;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PanLeft,
    PanRight,
    PanDown,
    PanUp,
    ZoomOut,
    ZoomIn,
    Reset,
    Quit,
}

impl Bindings {
    /// Every action with its key, in the order the per-frame callbacks are registered.
    pub fn actions(&self) -> [(Action, Key); 8] {
        [
            (Action::PanLeft, self.pan_left),
            (Action::PanRight, self.pan_right),
            (Action::PanDown, self.pan_down),
            (Action::PanUp, self.pan_up),
            (Action::ZoomOut, self.zoom_out),
            (Action::ZoomIn, self.zoom_in),
            (Action::Reset, self.reset),
            (Action::Quit, self.quit),
        ]
    }
}

/// Which uniforms an action changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Changed {
    Nothing,
    OffsetX,
    OffsetY,
    Zoom,
    All,
}

/// Pan offset and zoom of the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionState {
    pub offset_x: f32,
    pub offset_y: f32,
    pub zoom: f32,
}

impl InteractionState {
    pub const DEFAULT_X_OFFSET: f32 = 0.0;
    pub const DEFAULT_Y_OFFSET: f32 = 0.0;
    pub const DEFAULT_ZOOM: f32 = 1.0;
    /// Zoom stays within these bounds, so it and the zoom-scaled pan step remain finite and
    /// normal. A zoom step that would leave the range is skipped.
    pub const MIN_ZOOM: f32 = 1e-18;
    pub const MAX_ZOOM: f32 = 1e18;

    /// Pan steps are scaled by this, relative to the default zoom.
    pub fn scaling_factor(&self) -> f32 {
        self.zoom / Self::DEFAULT_ZOOM
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn apply(&mut self, action: Action, nav: &NavigationConfig) -> Changed {
        let step = nav.pan_step * self.scaling_factor();
        match action {
            Action::PanLeft => pan(&mut self.offset_x, -step, Changed::OffsetX),
            Action::PanRight => pan(&mut self.offset_x, step, Changed::OffsetX),
            Action::PanDown => pan(&mut self.offset_y, -step, Changed::OffsetY),
            Action::PanUp => pan(&mut self.offset_y, step, Changed::OffsetY),
            Action::ZoomOut => self.set_zoom(self.zoom / nav.zoom_factor),
            Action::ZoomIn => self.set_zoom(self.zoom * nav.zoom_factor),
            Action::Reset => {
                self.reset();
                Changed::All
            }
            Action::Quit => Changed::Nothing,
        }
    }

    fn set_zoom(&mut self, zoom: f32) -> Changed {
        if !(Self::MIN_ZOOM..=Self::MAX_ZOOM).contains(&zoom) {
            return Changed::Nothing;
        }
        self.zoom = zoom;
        Changed::Zoom
    }
}

fn pan(offset: &mut f32, step: f32, changed: Changed) -> Changed {
    let moved = *offset + step;
    if !moved.is_finite() {
        return Changed::Nothing;
    }
    *offset = moved;
    changed
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            offset_x: Self::DEFAULT_X_OFFSET,
            offset_y: Self::DEFAULT_Y_OFFSET,
            zoom: Self::DEFAULT_ZOOM,
        }
    }
}

/// Interaction state bound to the program that renders it. Every change is pushed to the
/// program's uniforms right away.
pub struct Viewer {
    state: InteractionState,
    nav: NavigationConfig,
    program: Rc<ShaderProgram>,
}

impl Viewer {
    pub fn new(program: Rc<ShaderProgram>, nav: NavigationConfig) -> Viewer {
        Viewer {
            state: InteractionState::default(),
            nav,
            program,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn apply(&mut self, action: Action) {
        let changed = self.state.apply(action, &self.nav);
        self.push(changed);
    }

    pub fn push_all(&self) {
        self.push(Changed::All);
    }

    fn push(&self, changed: Changed) {
        let program = &self.program;
        match changed {
            Changed::Nothing => {}
            Changed::OffsetX => program.set_uniform("x_offset", self.state.offset_x),
            Changed::OffsetY => program.set_uniform("y_offset", self.state.offset_y),
            Changed::Zoom => program.set_uniform("zoom", self.state.zoom),
            Changed::All => {
                program.set_uniform("x_offset", self.state.offset_x);
                program.set_uniform("y_offset", self.state.offset_y);
                program.set_uniform("zoom", self.state.zoom);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-6;

    fn nav() -> NavigationConfig {
        NavigationConfig {
            pan_step: 0.1,
            zoom_factor: 2.0,
        }
    }

    #[test]
    fn pan_step_scales_with_zoom() {
        let mut state = InteractionState::default();
        state.apply(Action::PanRight, &nav());
        assert_relative_eq!(state.offset_x, 0.1, epsilon = EPSILON);

        state.apply(Action::ZoomIn, &nav());
        state.apply(Action::PanRight, &nav());
        assert_relative_eq!(state.offset_x, 0.1 + 0.2, epsilon = EPSILON);

        state.apply(Action::PanDown, &nav());
        assert_relative_eq!(state.offset_y, -0.2, epsilon = EPSILON);
        state.apply(Action::PanUp, &nav());
        state.apply(Action::PanLeft, &nav());
        assert_relative_eq!(state.offset_y, 0.0, epsilon = EPSILON);
        assert_relative_eq!(state.offset_x, 0.1, epsilon = EPSILON);
    }

    #[test]
    fn zoom_in_then_out_is_identity() {
        let mut state = InteractionState {
            offset_x: 0.3,
            offset_y: -0.7,
            zoom: 3.7,
        };
        let nav = NavigationConfig {
            pan_step: 0.01,
            zoom_factor: 1.05,
        };
        for _ in 0..25 {
            assert_eq!(state.apply(Action::ZoomIn, &nav), Changed::Zoom);
        }
        for _ in 0..25 {
            state.apply(Action::ZoomOut, &nav);
        }
        assert_relative_eq!(state.zoom, 3.7, max_relative = 1e-5);
    }

    #[test]
    fn held_zoom_stays_bounded_and_invertible() {
        let nav = NavigationConfig::default();
        let mut state = InteractionState::default();

        for _ in 0..5000 {
            state.apply(Action::ZoomIn, &nav);
            state.apply(Action::PanRight, &nav);
        }
        assert!(state.zoom.is_finite());
        assert!(state.zoom <= InteractionState::MAX_ZOOM);
        assert!(state.offset_x.is_finite());
        assert_eq!(state.apply(Action::ZoomIn, &nav), Changed::Nothing);

        let top = state.zoom;
        for _ in 0..10 {
            assert_eq!(state.apply(Action::ZoomOut, &nav), Changed::Zoom);
        }
        for _ in 0..10 {
            state.apply(Action::ZoomIn, &nav);
        }
        assert_relative_eq!(state.zoom, top, max_relative = 1e-5);

        for _ in 0..5000 {
            state.apply(Action::ZoomOut, &nav);
            state.apply(Action::PanLeft, &nav);
        }
        assert!(state.zoom >= InteractionState::MIN_ZOOM);
        assert!(state.zoom.is_normal());
        assert!(state.offset_x.is_finite());

        let bottom = state.zoom;
        assert_eq!(state.apply(Action::ZoomIn, &nav), Changed::Zoom);
        assert!(state.zoom > bottom);
        state.apply(Action::ZoomOut, &nav);
        assert_relative_eq!(state.zoom, bottom, max_relative = 1e-5);
    }

    #[test]
    fn pan_that_would_overflow_is_skipped() {
        let mut state = InteractionState {
            offset_x: f32::MAX,
            offset_y: 0.0,
            zoom: InteractionState::MAX_ZOOM,
        };
        let nav = NavigationConfig {
            pan_step: 1e20,
            zoom_factor: 1.05,
        };
        assert_eq!(state.apply(Action::PanRight, &nav), Changed::Nothing);
        assert_eq!(state.offset_x, f32::MAX);
    }

    #[test]
    fn reset_restores_defaults_from_any_state() {
        let mut state = InteractionState {
            offset_x: 12.0,
            offset_y: -4.5,
            zoom: 1e6,
        };
        assert_eq!(state.apply(Action::Reset, &nav()), Changed::All);
        assert_eq!(state, InteractionState::default());
        assert_eq!(
            (state.offset_x, state.offset_y, state.zoom),
            (0.0, 0.0, 1.0)
        );
    }

    #[test]
    fn quit_leaves_the_view_alone() {
        let mut state = InteractionState::default();
        assert_eq!(state.apply(Action::Quit, &nav()), Changed::Nothing);
        assert_eq!(state, InteractionState::default());
    }

    #[test]
    fn default_bindings_cover_every_action_once() {
        let actions = Bindings::default().actions();
        let keys: std::collections::HashSet<Key> = actions.iter().map(|(_, k)| *k).collect();
        assert_eq!(keys.len(), actions.len());
        assert_eq!(actions[5], (Action::ZoomIn, Key::N));
        assert_eq!(actions[7], (Action::Quit, Key::Escape));
    }
}
