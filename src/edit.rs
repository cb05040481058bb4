use super::*;

/// A scoped in-place edit of one object, using the Android
/// BeginEditObject/SendPartialObject/TruncateObject/EndEditObject cluster.
///
/// Created with [`Session::edit_object`]; dropping it ends the edit on the
/// device. The borrow of the session keeps the edit from outliving it.
pub struct EditObjectSession<'a> {
    session: &'a Session,
    object_id: u32,
}

impl<'a> EditObjectSession<'a> {
    pub(crate) fn begin(session: &'a Session, object_id: u32) -> Result<Self> {
        if !session.edit_object_supported() {
            return Err(Error::NotSupported);
        }
        session.begin_edit_object(object_id)?;
        Ok(Self { session, object_id })
    }

    pub fn object_id(&self) -> u32 {
        self.object_id
    }

    /// Grow or shrink the object to `size` bytes.
    pub fn truncate(&self, size: u64) -> Result<()> {
        self.session.truncate_object(self.object_id, size)
    }

    /// Write `data` at `offset`. Returns the byte count the device
    /// reports written.
    pub fn send(&self, offset: u64, data: &[u8]) -> Result<u32> {
        self.session.send_partial_object(self.object_id, offset, data)
    }
}

impl Drop for EditObjectSession<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.session.end_edit_object(self.object_id) {
            warn!("ending edit of object {:#x}: {err}", self.object_id);
        }
    }
}
