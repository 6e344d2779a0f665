//! Owning wrapper around raw API resource identifiers.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::rc::Rc;

use crate::api::{GraphicsApi, RawHandle, NO_HANDLE};

/// How a kind of resource is released.
pub trait Deleter {
    const KIND: &'static str;

    fn release<A: GraphicsApi + ?Sized>(api: &A, raw: RawHandle);
}

/// Shader program resources.
#[derive(Debug)]
pub enum Program {}

/// Vertex and index buffer resources.
#[derive(Debug)]
pub enum Buffer {}

impl Deleter for Program {
    const KIND: &'static str = "program";

    fn release<A: GraphicsApi + ?Sized>(api: &A, raw: RawHandle) {
        api.delete_program(raw);
    }
}

impl Deleter for Buffer {
    const KIND: &'static str = "buffer";

    fn release<A: GraphicsApi + ?Sized>(api: &A, raw: RawHandle) {
        api.delete_buffer(raw);
    }
}

/// Exclusive owner of one API resource.
///
/// A handle is either absent (raw value [`NO_HANDLE`]) or the single owner of a
/// live resource, which is released when the handle is dropped or reset.
/// Handles move but never copy.
pub struct GpuHandle<A: GraphicsApi, K: Deleter> {
    api: Rc<A>,
    raw: RawHandle,
    _kind: PhantomData<K>,
}

pub type ProgramHandle<A> = GpuHandle<A, Program>;
pub type BufferHandle<A> = GpuHandle<A, Buffer>;

impl<A: GraphicsApi, K: Deleter> GpuHandle<A, K> {
    /// Takes ownership of `raw`.
    pub fn new(api: Rc<A>, raw: RawHandle) -> Self {
        Self {
            api,
            raw,
            _kind: PhantomData,
        }
    }

    pub fn absent(api: Rc<A>) -> Self {
        Self::new(api, NO_HANDLE)
    }

    #[inline]
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        self.raw == NO_HANDLE
    }

    /// Moves the resource into a new handle, leaving this one absent.
    pub fn take(&mut self) -> Self {
        let raw = mem::replace(&mut self.raw, NO_HANDLE);
        Self::new(Rc::clone(&self.api), raw)
    }

    /// Releases the current resource, if any, and adopts `raw`.
    pub fn reset(&mut self, raw: RawHandle) {
        let old = mem::replace(&mut self.raw, raw);
        if old != NO_HANDLE && old != raw {
            K::release(&*self.api, old);
        }
    }
}

impl<A: GraphicsApi, K: Deleter> Drop for GpuHandle<A, K> {
    fn drop(&mut self) {
        if self.raw != NO_HANDLE {
            K::release(&*self.api, self.raw);
        }
    }
}

impl<A: GraphicsApi, K: Deleter> fmt::Debug for GpuHandle<A, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuHandle<{}>({})", K::KIND, self.raw)
    }
}
