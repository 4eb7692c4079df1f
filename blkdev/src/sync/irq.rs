//! Local interrupt masking.
//!
//! The registry masks interrupts around its short fast-path sections: the protected-flag
//! test in `obtain` and the use-count decrement in `release`. How interrupts are masked
//! is platform business, so it is reached through [InterruptControl].
use utils::impl_conversion;

/// Saved interrupt state returned by [InterruptControl::disable].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqLevel {
    inner: usize,
}
impl_conversion!(IrqLevel, usize);

/// Platform hook for masking interrupts on the current processor.
///
/// [InterruptControl::disable] and [InterruptControl::restore] always appear in
/// matching pairs, possibly nested.
pub trait InterruptControl: Sync {
    fn disable(&self) -> IrqLevel;
    fn restore(&self, level: IrqLevel);
}

/// Hosted environments and tests: nothing to mask.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterrupts;

impl InterruptControl for NoInterrupts {
    fn disable(&self) -> IrqLevel {
        IrqLevel::from_const(0)
    }

    fn restore(&self, _level: IrqLevel) {}
}

/// Interrupts stay masked while the guard lives.
pub struct IrqGuard<'a> {
    ctl: &'a dyn InterruptControl,
    level: IrqLevel,
}

impl<'a> IrqGuard<'a> {
    pub fn new(ctl: &'a dyn InterruptControl) -> IrqGuard<'a> {
        IrqGuard {
            ctl,
            level: ctl.disable(),
        }
    }
}

impl Drop for IrqGuard<'_> {
    fn drop(&mut self) {
        self.ctl.restore(self.level);
    }
}
