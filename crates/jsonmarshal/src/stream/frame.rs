use core::{any::Any, mem::size_of_val};

use tracing::trace;

use crate::{error::ErrorKind, event::Event, options::DecodeOptions};

/// What the decoder does after a frame handled an event or a child value.
pub enum Step {
    /// Wait for the next event.
    Continue,
    /// Push a frame that receives the next event.
    Push(Box<dyn Frame>),
    /// Push a frame and hand it the current event again.
    Delegate(Box<dyn Frame>),
    /// Swap the current frame for another one.
    Replace(Box<dyn Frame>),
    /// Pop the current frame and pass the value to its parent.
    Done(Box<dyn Any>),
}

impl core::fmt::Debug for Step {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Push(frame) => write!(f, "Push({})", frame.expecting()),
            Self::Delegate(frame) => write!(f, "Delegate({})", frame.expecting()),
            Self::Replace(frame) => write!(f, "Replace({})", frame.expecting()),
            Self::Done(_) => f.write_str("Done"),
        }
    }
}

/// Read-only state shared with every frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameCx<'a> {
    /// Options of the running decode.
    pub options: &'a DecodeOptions,
    /// Frames open beneath the one being called.
    pub outer_depth: usize,
}

impl<'a> FrameCx<'a> {
    pub(crate) fn new(options: &'a DecodeOptions, stack_depth: usize) -> Self {
        Self {
            options,
            outer_depth: stack_depth.saturating_sub(1),
        }
    }

    /// Fails if a frame that already holds `open` containers of its own
    /// cannot open another within the depth limit.
    pub(crate) fn check_nested(&self, open: usize) -> Result<(), ErrorKind> {
        let max_depth = self.options.max_depth;
        if self.outer_depth + open >= max_depth {
            return Err(ErrorKind::DepthLimitExceeded(max_depth));
        }
        Ok(())
    }
}

/// One element of the decoder's stack: the in-progress decode of a single
/// value.
pub trait Frame {
    /// Handles the next event. Only the top frame receives events.
    ///
    /// # Errors
    ///
    /// Fails when the event does not fit the value being decoded.
    fn event(&mut self, event: &Event<'_>, cx: &FrameCx<'_>) -> Result<Step, ErrorKind>;

    /// Receives the value of a child frame that completed.
    ///
    /// # Errors
    ///
    /// Fails when the value cannot be stored.
    fn child(&mut self, value: Box<dyn Any>, cx: &FrameCx<'_>) -> Result<Step, ErrorKind> {
        let _ = (value, cx);
        Err(ErrorKind::Internal("frame does not take child values"))
    }

    /// Short description for diagnostics.
    fn expecting(&self) -> &'static str;
}

/// Moves a child value out of its box.
///
/// # Errors
///
/// Fails if `value` does not hold a `T`.
pub fn take<T: 'static>(value: Box<dyn Any>) -> Result<T, ErrorKind> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| ErrorKind::Internal("child frame produced an unexpected type"))
}

/// The decoder's frame stack with its depth and footprint budget.
pub(crate) struct FrameStack {
    frames: Vec<Box<dyn Frame>>,
    bytes: usize,
    max_depth: usize,
    max_bytes: usize,
}

impl FrameStack {
    pub(crate) fn new(options: &DecodeOptions) -> Self {
        Self {
            frames: Vec::with_capacity(options.max_depth.min(32)),
            bytes: 0,
            max_depth: options.max_depth,
            max_bytes: options.max_frame_bytes,
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn bytes(&self) -> usize {
        self.bytes
    }

    pub(crate) fn top(&mut self) -> Option<&mut Box<dyn Frame>> {
        self.frames.last_mut()
    }

    pub(crate) fn push(&mut self, frame: Box<dyn Frame>) -> Result<(), ErrorKind> {
        if self.frames.len() >= self.max_depth {
            return Err(ErrorKind::DepthLimitExceeded(self.max_depth));
        }
        let size = size_of_val(&*frame);
        if self.bytes + size > self.max_bytes {
            return Err(ErrorKind::FrameMemoryExceeded(self.max_bytes));
        }
        trace!(
            frame = frame.expecting(),
            depth = self.frames.len() + 1,
            size,
            "push frame"
        );
        self.bytes += size;
        self.frames.push(frame);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Option<Box<dyn Frame>> {
        let frame = self.frames.pop()?;
        self.bytes -= size_of_val(&*frame);
        trace!(frame = frame.expecting(), depth = self.frames.len(), "pop frame");
        Some(frame)
    }

    pub(crate) fn replace(&mut self, frame: Box<dyn Frame>) -> Result<(), ErrorKind> {
        self.pop();
        self.push(frame)
    }

    #[cfg(any(test, feature = "fuzzing"))]
    pub(crate) fn assert_consistent(&self) {
        let bytes: usize = self.frames.iter().map(|frame| size_of_val(&**frame)).sum();
        assert_eq!(bytes, self.bytes, "frame footprint out of sync with the stack");
        assert!(self.frames.len() <= self.max_depth, "frame stack deeper than its limit");
    }
}
