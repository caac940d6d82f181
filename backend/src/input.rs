use serde::{Deserialize, Serialize};

/// Keys the viewer can bind. Names match their (de)serialized form, e.g. `"H"` or `"Escape"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
    Equals,
    Minus,
}

/// What per-frame callbacks see of the window: polled key state and the close flag.
pub trait Surface {
    fn is_key_pressed(&self, key: Key) -> bool;
    fn should_close(&self) -> bool;
    fn set_should_close(&mut self);
}

/// A per-frame input callback. Returns whether it reacted to the current input state.
pub type Callback = Box<dyn FnMut(&mut dyn Surface) -> bool>;

/// Ordered list of input callbacks, all of them invoked once per frame.
#[derive(Default)]
pub struct InputDispatcher {
    callbacks: Vec<Callback>,
}

impl InputDispatcher {
    pub fn new() -> InputDispatcher {
        InputDispatcher::default()
    }

    pub fn add<F>(&mut self, callback: F)
    where
        F: FnMut(&mut dyn Surface) -> bool + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    pub fn add_boxed(&mut self, callback: Callback) {
        self.callbacks.push(callback);
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Runs every callback in registration order and returns how many of them handled input.
    pub fn dispatch(&mut self, surface: &mut dyn Surface) -> usize {
        let mut handled = 0;
        for callback in self.callbacks.iter_mut() {
            if callback(&mut *surface) {
                handled += 1;
            }
        }
        handled
    }
}
