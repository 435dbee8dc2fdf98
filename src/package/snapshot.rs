//! Transform snapshots and the root reference.

use tracing::debug;

use crate::export::TransformRecord;
use crate::scene::{ObjectId, ObjectKind, SceneHost};
use crate::util::{Attributes, DVec3, Error, Result};

/// Cached transform attributes of one scene object.
///
/// Attributes are only current right after [`capture`](Self::capture) or a
/// successful [`refresh`](Self::refresh); nothing refreshes them implicitly.
/// Two snapshots are equal when they refer to the same object handle.
#[derive(Clone, Debug)]
pub struct TransformSnapshot {
    id: ObjectId,
    name: String,
    attributes: Attributes,
}

impl TransformSnapshot {
    /// Resolve `id` and record its current attributes.
    ///
    /// Fails if the object is gone or is not a transform.
    pub fn capture<H: SceneHost + ?Sized>(host: &H, id: ObjectId) -> Result<Self> {
        let (name, attributes) = read(host, id)?;
        Ok(Self { id, name, attributes })
    }

    /// Re-read attributes from the live object.
    ///
    /// Returns `false`, leaving the stored values untouched, if the object no
    /// longer exists or is no longer a transform. The owner should then drop
    /// the snapshot.
    pub fn refresh<H: SceneHost + ?Sized>(&mut self, host: &H) -> bool {
        match read(host, self.id) {
            Ok((name, attributes)) => {
                self.name = name;
                self.attributes = attributes;
                true
            }
            Err(e) => {
                debug!("stale snapshot '{}' ({}): {}", self.name, self.id, e);
                false
            }
        }
    }

    /// True while the object still resolves to a transform. Cached
    /// attributes are not touched.
    pub fn is_live<H: SceneHost + ?Sized>(&self, host: &H) -> bool {
        matches!(host.resolve(self.id), Some(info) if info.kind == ObjectKind::Transform)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Display name as of the last capture or refresh.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attributes relative to `root`, as a new record.
    ///
    /// Translate and rotate are differences, scale is a ratio. Neither
    /// snapshot is modified, so repeated calls give identical results.
    /// A root with a zero scale component is rejected.
    pub fn relative_attributes(&self, root: &TransformSnapshot) -> Result<TransformRecord> {
        if root.attributes.has_zero_scale() {
            return Err(Error::ZeroRootScale(root.name.clone()));
        }
        Ok(TransformRecord::new(&self.name, self.attributes.relative_to(&root.attributes)))
    }

    /// Absolute attributes as a record.
    pub fn to_record(&self) -> TransformRecord {
        TransformRecord::new(&self.name, self.attributes)
    }
}

impl PartialEq for TransformSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TransformSnapshot {}

impl PartialEq<ObjectId> for TransformSnapshot {
    fn eq(&self, other: &ObjectId) -> bool {
        self.id == *other
    }
}

fn read<H: SceneHost + ?Sized>(host: &H, id: ObjectId) -> Result<(String, Attributes)> {
    let info = host.resolve(id).ok_or(Error::ObjectNotFound(id))?;
    if info.kind != ObjectKind::Transform {
        return Err(Error::NotATransform(info.name));
    }
    let raw = host.read_transform(id)?;
    let attributes = Attributes::new(raw.pivot_translate(), raw.rotate, raw.scale);
    Ok((info.name, attributes))
}

/// World anchor for exported placements.
///
/// Only the pivot-adjusted position of the anchor object is kept: rotation
/// is forced to zero and scale to one when the root is set.
#[derive(Clone, Debug, PartialEq)]
pub struct RootReference {
    snapshot: TransformSnapshot,
}

impl RootReference {
    pub fn capture<H: SceneHost + ?Sized>(host: &H, id: ObjectId) -> Result<Self> {
        let mut snapshot = TransformSnapshot::capture(host, id)?;
        snapshot.attributes.rotate = DVec3::ZERO;
        snapshot.attributes.scale = DVec3::ONE;
        Ok(Self { snapshot })
    }

    pub fn snapshot(&self) -> &TransformSnapshot {
        &self.snapshot
    }

    pub fn name(&self) -> &str {
        self.snapshot.name()
    }

    /// True while the anchor object still resolves to a transform.
    pub fn is_live<H: SceneHost + ?Sized>(&self, host: &H) -> bool {
        self.snapshot.is_live(host)
    }
}
