use crate::AccessFrame;

/// LIFO of [`AccessFrame`]s. The top frame is authoritative; an empty stack
/// denies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessStack {
    frames: Vec<AccessFrame>,
}

impl AccessStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `frame` on top.
    pub fn push(&mut self, frame: AccessFrame) {
        self.frames.push(frame);
    }

    /// Remove the top frame. Popping an empty stack is not an error; callers
    /// report it as "no access was granted".
    pub fn pop(&mut self) -> Option<AccessFrame> {
        self.frames.pop()
    }

    /// The authoritative frame, if any.
    pub fn top(&self) -> Option<&AccessFrame> {
        self.frames.last()
    }

    /// Drop every frame, returning them bottom first.
    pub fn reset(&mut self) -> Vec<AccessFrame> {
        std::mem::take(&mut self.frames)
    }

    /// Whether the top frame allows access.
    pub fn is_allowed(&self) -> bool {
        self.top().is_some_and(AccessFrame::is_allowed)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames bottom first.
    pub fn iter(&self) -> impl Iterator<Item = &AccessFrame> {
        self.frames.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut AccessFrame> {
        self.frames.iter_mut()
    }
}
