// Generation-counted slot arena backing every handle the library hands out.
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use uuid::Uuid;

use crate::core::error::{Error, ErrorKind};
use crate::core::stream::Stream;
use crate::core::text::Text;

const DEFAULT_CAPACITY: usize = 65_536;

/// Opaque reference to a registry slot: generation in the high 32 bits,
/// slot index in the low 32. Generations start at 1, so no valid handle is
/// ever below 2^32 and the raw value 0 doubles as the C null sentinel.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle(u64);

impl Handle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }

    fn pack(index: u32, generation: u32) -> Self {
        Self((u64::from(generation) << 32) | u64::from(index))
    }

    fn index(self) -> u32 {
        self.0 as u32
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Text,
    Uuid,
    Stream,
}

pub enum Resource {
    Text(Text),
    Uuid(Uuid),
    Stream(Stream),
}

impl Resource {
    pub fn kind(&self) -> Kind {
        match self {
            Resource::Text(_) => Kind::Text,
            Resource::Uuid(_) => Kind::Uuid,
            Resource::Stream(_) => Kind::Stream,
        }
    }
}

// Manual impl because `Stream` holds a `dyn StreamBackend` with no `Debug`.
impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Resource::Uuid(uuid) => f.debug_tuple("Uuid").field(uuid).finish(),
            Resource::Stream(_) => f.debug_struct("Stream").finish_non_exhaustive(),
        }
    }
}

struct Slot {
    generation: u32,
    state: SlotState,
}

enum SlotState {
    Live { kind: Kind, cell: Arc<Mutex<Resource>> },
    Tombstone,
}

struct Inner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

/// Tracks every live handle plus a tombstone per released one. A slot keeps
/// its generation while tombstoned and bumps it on reuse, so a stale handle
/// to a reused slot still reports `AlreadyFreed` instead of touching the
/// new occupant. A slot whose generation would wrap is retired outright.
pub struct Registry {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_capacity(default_capacity())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                free: Vec::new(),
                live: 0,
            }),
            capacity,
        }
    }

    /// Shared instance behind the C surface. Rust embedders may hold their
    /// own `Registry` instead; nothing in the core requires the global one.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn live_count(&self) -> usize {
        self.lock_inner().map(|inner| inner.live).unwrap_or(0)
    }

    pub fn register(&self, resource: Resource) -> Result<Handle, Error> {
        let kind = resource.kind();
        let cell = Arc::new(Mutex::new(resource));
        let mut inner = self.lock_inner()?;

        let handle = if let Some(index) = inner.free.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.generation += 1;
            slot.state = SlotState::Live { kind, cell };
            Handle::pack(index, slot.generation)
        } else {
            if inner.slots.len() >= self.capacity || inner.slots.len() >= u32::MAX as usize {
                return Err(Error::new(ErrorKind::OutOfMemory).with_message(format!(
                    "registry capacity exhausted ({} slots)",
                    inner.slots.len()
                )));
            }
            let index = inner.slots.len() as u32;
            inner.slots.push(Slot {
                generation: 1,
                state: SlotState::Live { kind, cell },
            });
            Handle::pack(index, 1)
        };
        inner.live += 1;
        tracing::trace!(handle = handle.as_raw(), kind = ?kind, "handle registered");
        Ok(handle)
    }

    /// Validate a handle and hand back its payload cell. The cell outlives a
    /// concurrent release, so validate-then-act cannot dangle; a release
    /// only drops the registry's reference and tombstones the slot.
    pub fn checkout(&self, handle: Handle, expected: Kind) -> Result<Arc<Mutex<Resource>>, Error> {
        let inner = self.lock_inner()?;
        let index = validate_index(&inner, handle)?;
        match &inner.slots[index].state {
            SlotState::Live { kind, cell } => {
                if *kind != expected {
                    return Err(type_mismatch(handle, *kind, expected));
                }
                Ok(Arc::clone(cell))
            }
            SlotState::Tombstone => Err(already_freed(handle)),
        }
    }

    /// Validate, lock the payload, and run `f` on it. Operations on one
    /// handle serialize on the payload lock, not the slot table.
    pub fn with_resource<T>(
        &self,
        handle: Handle,
        expected: Kind,
        f: impl FnOnce(&mut Resource) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let cell = self.checkout(handle, expected)?;
        let mut guard = cell
            .lock()
            .map_err(|_| Error::new(ErrorKind::Internal).with_message("resource lock poisoned"))?;
        f(&mut guard)
    }

    pub fn release(&self, handle: Handle, expected: Kind) -> Result<(), Error> {
        self.release_impl(handle, Some(expected))
    }

    /// The universal free: dispatches on the stored kind tag, so callers
    /// never name the type they are releasing.
    pub fn release_any(&self, handle: Handle) -> Result<(), Error> {
        self.release_impl(handle, None)
    }

    fn release_impl(&self, handle: Handle, expected: Option<Kind>) -> Result<(), Error> {
        let mut inner = self.lock_inner()?;
        let index = validate_index(&inner, handle)?;
        let kind = match &inner.slots[index].state {
            SlotState::Live { kind, .. } => *kind,
            SlotState::Tombstone => return Err(already_freed(handle)),
        };
        if let Some(expected) = expected {
            if kind != expected {
                return Err(type_mismatch(handle, kind, expected));
            }
        }

        let slot = &mut inner.slots[index];
        let generation = slot.generation;
        let cell = match std::mem::replace(&mut slot.state, SlotState::Tombstone) {
            SlotState::Live { cell, .. } => cell,
            SlotState::Tombstone => {
                return Err(
                    Error::new(ErrorKind::Internal).with_message("slot state changed under lock")
                );
            }
        };
        if generation < u32::MAX {
            inner.free.push(handle.index());
        } else {
            tracing::debug!(index, "slot generation exhausted, retiring");
        }
        inner.live -= 1;
        drop(inner);
        // Payload drops here unless a checkout still holds the cell.
        drop(cell);
        tracing::trace!(handle = handle.as_raw(), "handle released");
        Ok(())
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, Inner>, Error> {
        self.inner
            .lock()
            .map_err(|_| Error::new(ErrorKind::Internal).with_message("registry lock poisoned"))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// Liveness check shared by checkout and release: a generation behind the
// slot's means the identity was issued and later freed; a generation ahead
// was never issued at all.
fn validate_index(inner: &Inner, handle: Handle) -> Result<usize, Error> {
    if handle.generation() == 0 {
        return Err(invalid_handle(handle));
    }
    let index = handle.index() as usize;
    let slot = inner.slots.get(index).ok_or_else(|| invalid_handle(handle))?;
    if handle.generation() > slot.generation {
        return Err(invalid_handle(handle));
    }
    if handle.generation() < slot.generation {
        return Err(already_freed(handle));
    }
    Ok(index)
}

fn invalid_handle(handle: Handle) -> Error {
    Error::new(ErrorKind::InvalidHandle)
        .with_message("unknown handle")
        .with_handle(handle.as_raw())
}

fn already_freed(handle: Handle) -> Error {
    Error::new(ErrorKind::AlreadyFreed)
        .with_message("handle already released")
        .with_handle(handle.as_raw())
}

fn type_mismatch(handle: Handle, actual: Kind, expected: Kind) -> Error {
    Error::new(ErrorKind::TypeMismatch)
        .with_message(format!("handle is {actual:?}, expected {expected:?}"))
        .with_handle(handle.as_raw())
}

fn default_capacity() -> usize {
    parse_capacity(std::env::var("FERRULE_REGISTRY_CAP").ok())
}

fn parse_capacity(raw: Option<String>) -> usize {
    raw.and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_CAPACITY)
}
