/// A map that holds its keys weakly and cleans up after released keys.
///
/// Every operation of an implementor already drains pending releases
/// first; `check_queue` lets an owner of several such maps flush them
/// explicitly, e.g. before reading side tables the eviction callbacks
/// maintain.
pub trait WeakIdentityMap {
    /// Process every pending release, firing eviction callbacks.
    fn check_queue(&self);
}
