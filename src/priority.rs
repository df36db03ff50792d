/// Best-effort scheduling priority control.
///
/// Elevation is a hint: a refused request only costs timing accuracy and
/// never aborts a read.
pub trait PriorityElevator {
    /// Requests elevated priority. Returns `true` if it was granted.
    fn request(&mut self, level: u8) -> bool;

    /// Returns to normal priority.
    fn restore(&mut self);
}

impl<P: PriorityElevator + ?Sized> PriorityElevator for &mut P {
    fn request(&mut self, level: u8) -> bool {
        (**self).request(level)
    }

    fn restore(&mut self) {
        (**self).restore()
    }
}

/// Elevator for platforms without priority control. Every request is refused.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoElevation;

impl PriorityElevator for NoElevation {
    fn request(&mut self, _level: u8) -> bool {
        false
    }

    fn restore(&mut self) {}
}

/// Holds elevated priority until dropped.
pub(crate) struct Elevated<'a, P: PriorityElevator> {
    elevator: &'a mut P,
}

impl<'a, P: PriorityElevator> Elevated<'a, P> {
    /// Requests `level` and returns the guard together with whether the
    /// request was granted.
    pub(crate) fn acquire(elevator: &'a mut P, level: u8) -> (Self, bool) {
        let granted = elevator.request(level);
        (Elevated { elevator }, granted)
    }
}

impl<P: PriorityElevator> Drop for Elevated<'_, P> {
    fn drop(&mut self) {
        self.elevator.restore();
    }
}
