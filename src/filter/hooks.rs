//! Optional callbacks attached to one filter instance.
//!
//! Every hook is independent and may be absent. Absence is distinct from an
//! installed no-op: the filter derives its buffering policy from which hooks
//! are present (see [`super::policy`]).

use std::fmt;

pub type CaptureBytesHook = Box<dyn FnMut(&[u8]) + Send>;
pub type CaptureTextHook = Box<dyn FnMut(&str) + Send>;
pub type TransformChunkHook = Box<dyn FnMut(Vec<u8>) -> Vec<u8> + Send>;
pub type TransformBytesHook = Box<dyn FnMut(Vec<u8>) -> Vec<u8> + Send>;
pub type TransformTextHook = Box<dyn FnMut(String) -> String + Send>;

#[derive(Default)]
pub struct RewriteHookSet {
    pub(crate) capture_bytes: Option<CaptureBytesHook>,
    pub(crate) capture_text: Option<CaptureTextHook>,
    pub(crate) transform_chunk: Option<TransformChunkHook>,
    pub(crate) transform_final_bytes: Option<TransformBytesHook>,
    pub(crate) transform_final_text: Option<TransformTextHook>,
}

impl RewriteHookSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the final buffer after all transforms.
    pub fn on_capture_bytes<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        self.capture_bytes = Some(Box::new(hook));
        self
    }

    /// Observe the final buffer decoded as text.
    pub fn on_capture_text<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str) + Send + 'static,
    {
        self.capture_text = Some(Box::new(hook));
        self
    }

    /// Rewrite each chunk before it reaches the downstream sink.
    pub fn on_transform_chunk<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Vec<u8>) -> Vec<u8> + Send + 'static,
    {
        self.transform_chunk = Some(Box::new(hook));
        self
    }

    /// Rewrite the accumulated buffer at completion.
    pub fn on_transform_final_bytes<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Vec<u8>) -> Vec<u8> + Send + 'static,
    {
        self.transform_final_bytes = Some(Box::new(hook));
        self
    }

    /// Rewrite text. Applied to every chunk on its way downstream and to the
    /// accumulated buffer at completion.
    pub fn on_transform_final_text<F>(mut self, hook: F) -> Self
    where
        F: FnMut(String) -> String + Send + 'static,
    {
        self.transform_final_text = Some(Box::new(hook));
        self
    }

    pub fn has_capture_bytes(&self) -> bool {
        self.capture_bytes.is_some()
    }

    pub fn has_capture_text(&self) -> bool {
        self.capture_text.is_some()
    }

    pub fn has_transform_chunk(&self) -> bool {
        self.transform_chunk.is_some()
    }

    pub fn has_transform_final_bytes(&self) -> bool {
        self.transform_final_bytes.is_some()
    }

    pub fn has_transform_final_text(&self) -> bool {
        self.transform_final_text.is_some()
    }
}

impl fmt::Debug for RewriteHookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteHookSet")
            .field("capture_bytes", &self.has_capture_bytes())
            .field("capture_text", &self.has_capture_text())
            .field("transform_chunk", &self.has_transform_chunk())
            .field("transform_final_bytes", &self.has_transform_final_bytes())
            .field("transform_final_text", &self.has_transform_final_text())
            .finish()
    }
}
