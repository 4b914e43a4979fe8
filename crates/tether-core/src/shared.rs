use std::sync::Arc;

/// Reference-counted byte buffer used for packet payloads.
///
/// Cloning is cheap; a payload handed to the engine and a copy kept by the
/// application share one allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SharedBytes {
    data: Arc<[u8]>,
}

impl SharedBytes {
    /// Takes ownership of a vector without copying its contents again.
    pub fn from_vec(vec: Vec<u8>) -> Self {
        Self::from_arc(Arc::from(vec.into_boxed_slice()))
    }

    /// Copies a slice into a new shared buffer.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self::from_arc(Arc::from(bytes))
    }

    /// Wraps an existing shared allocation.
    pub fn from_arc(data: Arc<[u8]>) -> Self {
        Self { data }
    }

    /// Returns the buffer as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the length of the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for SharedBytes {
    fn from(v: Vec<u8>) -> Self {
        Self::from_vec(v)
    }
}

impl From<&[u8]> for SharedBytes {
    fn from(bytes: &[u8]) -> Self {
        Self::copy_from_slice(bytes)
    }
}

impl From<Arc<[u8]>> for SharedBytes {
    fn from(a: Arc<[u8]>) -> Self {
        Self::from_arc(a)
    }
}

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
